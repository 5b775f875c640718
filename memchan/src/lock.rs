//! Advisory byte-range lock tokens
//!
//! Only one process ever touches an in-memory store, so there is nobody to
//! exclude. A `LockToken` records the requested range and mode and tracks
//! whether it was released. It provides no mutual exclusion: overlapping
//! tokens, shared or not, coexist freely.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::channel::Channel;
use crate::io::ByteStore;

/// Advisory lock on `[position, position + size)` of a channel's store
///
/// Valid from creation until `release()` or drop.
pub struct LockToken<'a, S: ByteStore> {
    channel: &'a Channel<S>,
    position: u64,
    size: u64,
    shared: bool,
    valid: AtomicBool,
}

impl<'a, S: ByteStore> LockToken<'a, S> {
    pub(crate) fn new(channel: &'a Channel<S>, position: u64, size: u64, shared: bool) -> Self {
        Self {
            channel,
            position,
            size,
            shared,
            valid: AtomicBool::new(true),
        }
    }

    /// The channel the lock was taken on
    #[must_use]
    pub fn channel(&self) -> &'a Channel<S> {
        self.channel
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Release the lock. Releasing twice is a no-op.
    pub fn release(&self) {
        if self.valid.swap(false, Ordering::AcqRel) {
            log::trace!("released {self:?}");
        }
    }

    /// Check whether `[position, position + size)` intersects the locked range
    #[must_use]
    pub fn overlaps(&self, position: u64, size: u64) -> bool {
        position.saturating_add(size) > self.position
            && self.position.saturating_add(self.size) > position
    }
}

impl<S: ByteStore> fmt::Debug for LockToken<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LockToken(position={}, size={}, shared={}, valid={})",
            self.position,
            self.size,
            self.shared,
            self.is_valid()
        )
    }
}

impl<S: ByteStore> Drop for LockToken<'_, S> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use crate::io::{Buffer, OpenOptions};
    use crate::Channel;

    fn rw_channel() -> Channel {
        Channel::new(Buffer::new(), OpenOptions::new().read(true).write(true))
    }

    #[test]
    fn test_token_valid_until_released() {
        let ch = rw_channel();
        let token = ch.lock(0, 10, false).unwrap();
        assert!(token.is_valid());
        token.release();
        assert!(!token.is_valid());
        token.release();
        assert!(!token.is_valid());
    }

    #[test]
    fn test_overlapping_tokens_coexist() {
        let ch = rw_channel();
        let first = ch.lock(0, 10, false).unwrap();
        let second = ch.lock(5, 10, false).unwrap();
        assert!(first.is_valid());
        assert!(second.is_valid());
        assert!(first.overlaps(second.position(), second.size()));
    }

    #[test]
    fn test_overlaps_is_half_open() {
        let ch = rw_channel();
        let token = ch.lock(10, 5, true).unwrap();
        assert!(token.overlaps(14, 1));
        assert!(token.overlaps(0, 11));
        assert!(!token.overlaps(15, 3));
        assert!(!token.overlaps(0, 10));
        assert!(token.is_shared());
        assert!(std::ptr::eq(token.channel(), &ch));
    }
}
