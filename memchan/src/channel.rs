//! Random-access channel over a shared byte store
//!
//! A `Channel` gives file-descriptor-like access to a `ByteStore`:
//! - private cursor used by `read`/`write`, explicit-position variants that
//!   leave it alone
//! - capability set fixed at construction (read, write, append)
//! - bulk transfer to `embedded_io` sinks and from `embedded_io` sources
//! - advisory lock tokens that never exclude anything
//! - explicit, idempotent close
//!
//! Any number of channels can share one store. Each keeps its own cursor.
//!
//! # Validation order
//!
//! Every operation checks, in this order, and before touching the store:
//! 1. arguments (`InvalidArgument`)
//! 2. open state (`NotOpen`)
//! 3. capability (`NotReadable` / `NotWritable`)
//!
//! A closed channel therefore reports `NotOpen` even if it also lacks the
//! capability.
//!
//! # Thread Safety
//!
//! All methods take `&self`. Each call holds the channel's
//! `parking_lot::Mutex` for its whole duration, so calls on one channel are
//! serialized and never observe a torn cursor. The mutex only covers this
//! channel's cursor and open state; content consistency across channels is
//! the store's job.
//!
//! The mutex is not reentrant. A channel cannot be its own transfer peer.
//! A transfer also holds the mutex while it calls into the peer, so two
//! channels transferring into each other from two threads deadlock: each
//! waits for the mutex the other holds. Run such transfers one at a time.
//!
//! # Example
//!
//! ```
//! use memchan::io::{Buffer, OpenOptions};
//! use memchan::Channel;
//!
//! let channel = Channel::new(Buffer::new(), OpenOptions::new().read(true).append(true));
//! assert_eq!(channel.write(b"abc").unwrap(), 3);
//! assert_eq!(channel.write(b"de").unwrap(), 2);
//! assert_eq!(channel.position().unwrap(), 5);
//!
//! let mut buf = [0u8; 5];
//! assert_eq!(channel.read_at(&mut buf, 0).unwrap(), Some(5));
//! assert_eq!(&buf, b"abcde");
//! ```

use embedded_io::SeekFrom;
use parking_lot::Mutex;
use std::convert::Infallible;
use std::fmt;

use crate::error::ChannelError;
use crate::io::{Buffer, ByteStore, MapMode, OpenOptions};
use crate::lock::LockToken;

/// Largest position or count a channel accepts
pub const MAX_POSITION: u64 = isize::MAX as u64;

/// Capability an operation needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Any,
    Read,
    Write,
}

/// Mutable part of a channel, guarded by the channel mutex
struct ChannelState<S> {
    /// `None` once closed
    store: Option<S>,
    position: u64,
}

/// Random-access channel over a `ByteStore`
pub struct Channel<S: ByteStore = Buffer> {
    state: Mutex<ChannelState<S>>,
    options: OpenOptions,
}

fn check_range(name: &'static str, value: u64) -> Result<(), ChannelError> {
    if value > MAX_POSITION {
        return Err(ChannelError::InvalidArgument {
            name,
            value: i128::from(value),
        });
    }
    Ok(())
}

impl<S: ByteStore> Channel<S> {
    /// Open a channel over `store` with the given capabilities
    ///
    /// The channel starts at position 0.
    #[must_use]
    pub fn new(store: S, options: OpenOptions) -> Self {
        Self {
            state: Mutex::new(ChannelState {
                store: Some(store),
                position: 0,
            }),
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> OpenOptions {
        self.options
    }

    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.options.is_readable()
    }

    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.options.is_writable()
    }

    #[must_use]
    pub fn is_append(&self) -> bool {
        self.options.is_append()
    }

    /// Check if the channel is still open
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.lock().store.is_some()
    }

    fn check_access(&self, access: Access) -> Result<(), ChannelError> {
        match access {
            Access::Read if !self.options.is_readable() => Err(ChannelError::NotReadable),
            Access::Write if !self.options.is_writable() => Err(ChannelError::NotWritable),
            _ => Ok(()),
        }
    }

    /// Run `op` under the channel mutex with the open store and the cursor
    fn guarded<T>(
        &self,
        access: Access,
        op: impl FnOnce(&S, &mut u64) -> Result<T, ChannelError>,
    ) -> Result<T, ChannelError> {
        let mut state = self.state.lock();
        let ChannelState { store, position } = &mut *state;
        let store = store.as_ref().ok_or(ChannelError::NotOpen)?;
        self.check_access(access)?;
        op(store, position)
    }

    /// Read into `buf` at the cursor
    ///
    /// Returns `None` at end of data, leaving the cursor where it is.
    /// Otherwise advances the cursor by the bytes read.
    pub fn read(&self, buf: &mut [u8]) -> Result<Option<usize>, ChannelError> {
        self.read_vectored(&mut [buf])
    }

    /// Scatter read: fill `bufs` in order as one logical read at the cursor
    pub fn read_vectored(&self, bufs: &mut [&mut [u8]]) -> Result<Option<usize>, ChannelError> {
        self.guarded(Access::Read, |store, position| {
            let read = store.read(*position, bufs)?;
            if let Some(n) = read {
                *position += n as u64;
            }
            log::trace!("read {read:?} bytes, position now {position}");
            Ok(read)
        })
    }

    /// Write `buf` at the cursor, or at the end of the store in append mode
    ///
    /// In append mode the cursor moves to the store size right after the
    /// append, wherever it was before. Otherwise it advances by the bytes
    /// written.
    pub fn write(&self, buf: &[u8]) -> Result<usize, ChannelError> {
        self.write_vectored(&[buf])
    }

    /// Gather write: `bufs` in order form one logical payload
    pub fn write_vectored(&self, bufs: &[&[u8]]) -> Result<usize, ChannelError> {
        self.guarded(Access::Write, |store, position| {
            if self.options.is_append() {
                let appended = store.append(bufs)?;
                *position = appended.size;
                log::trace!("appended {} bytes, position now {position}", appended.written);
                Ok(appended.written)
            } else {
                let written = store.write(*position, bufs)?;
                *position += written as u64;
                log::trace!("wrote {written} bytes, position now {position}");
                Ok(written)
            }
        })
    }

    /// Read into `buf` at `position` without touching the cursor
    pub fn read_at(&self, buf: &mut [u8], position: u64) -> Result<Option<usize>, ChannelError> {
        check_range("position", position)?;
        self.guarded(Access::Read, |store, _| Ok(store.read(position, &mut [buf])?))
    }

    /// Write `buf` at `position` without touching the cursor
    ///
    /// In append mode `position` is ignored: the bytes are appended and the
    /// cursor moves to the new end of the store, as with `write`.
    pub fn write_at(&self, buf: &[u8], position: u64) -> Result<usize, ChannelError> {
        check_range("position", position)?;
        self.guarded(Access::Write, |store, cursor| {
            if self.options.is_append() {
                let appended = store.append(&[buf])?;
                *cursor = appended.size;
                Ok(appended.written)
            } else {
                Ok(store.write(position, &[buf])?)
            }
        })
    }

    /// Current cursor
    pub fn position(&self) -> Result<u64, ChannelError> {
        self.guarded(Access::Any, |_, position| Ok(*position))
    }

    /// Move the cursor
    ///
    /// Moving past the end of the store is allowed: reads there report end of
    /// data and the next positional write zero-fills the gap.
    pub fn set_position(&self, new_position: u64) -> Result<(), ChannelError> {
        check_range("new_position", new_position)?;
        self.guarded(Access::Any, |_, position| {
            *position = new_position;
            Ok(())
        })
    }

    /// Move the cursor relative to the start, the cursor or the end
    ///
    /// A target before the start of the store fails with `InvalidArgument`
    /// and leaves the cursor unchanged.
    pub fn seek(&self, pos: SeekFrom) -> Result<u64, ChannelError> {
        self.guarded(Access::Any, |store, position| {
            let target = match pos {
                SeekFrom::Start(offset) => i128::from(offset),
                SeekFrom::Current(delta) => i128::from(*position) + i128::from(delta),
                SeekFrom::End(delta) => i128::from(store.size()) + i128::from(delta),
            };
            let new_position = u64::try_from(target)
                .ok()
                .filter(|&p| p <= MAX_POSITION)
                .ok_or(ChannelError::InvalidArgument {
                    name: "position",
                    value: target,
                })?;
            *position = new_position;
            Ok(new_position)
        })
    }

    /// Current size of the store
    pub fn size(&self) -> Result<u64, ChannelError> {
        self.guarded(Access::Any, |store, _| Ok(store.size()))
    }

    /// Shrink the store to `size`
    ///
    /// The cursor is clamped to `size` if it was beyond it. A `size` larger
    /// than the store leaves the store unchanged.
    pub fn truncate(&self, size: u64) -> Result<(), ChannelError> {
        check_range("size", size)?;
        self.guarded(Access::Write, |store, position| {
            store.truncate(size)?;
            if *position > size {
                *position = size;
            }
            Ok(())
        })
    }

    /// Flush pending writes
    ///
    /// Writes go straight to the store, so there is nothing to flush.
    pub fn flush(&self, metadata: bool) -> Result<(), ChannelError> {
        self.guarded(Access::Any, |_, _| {
            log::trace!("flush(metadata={metadata}) is a no-op");
            Ok(())
        })
    }

    /// Copy up to `count` bytes starting at `position` into `sink`
    ///
    /// Returns the number of bytes the sink accepted. The cursor is not used
    /// or changed.
    pub fn transfer_to<W>(&self, position: u64, count: u64, sink: &mut W) -> Result<u64, ChannelError>
    where
        W: embedded_io::Write + ?Sized,
    {
        check_range("position", position)?;
        check_range("count", count)?;
        self.guarded(Access::Read, |store, _| {
            Ok(store.transfer_to(position, count, sink)?)
        })
    }

    /// Read up to `count` bytes from `source` into the store at `position`
    ///
    /// In append mode the bytes go to the end of the store instead and the
    /// cursor moves to the new end. Otherwise the cursor is not changed.
    pub fn transfer_from<R>(&self, source: &mut R, position: u64, count: u64) -> Result<u64, ChannelError>
    where
        R: embedded_io::Read + ?Sized,
    {
        check_range("position", position)?;
        check_range("count", count)?;
        self.guarded(Access::Write, |store, cursor| {
            if self.options.is_append() {
                let appended = store.append_from(source, count)?;
                *cursor = appended.size;
                log::debug!("appended {} bytes from source, position now {cursor}", appended.written);
                Ok(appended.written as u64)
            } else {
                Ok(store.transfer_from(source, position, count)?)
            }
        })
    }

    /// Memory-map a region of the store
    ///
    /// Never supported: there is no file to map. Always fails with
    /// `Unsupported` without looking at the arguments or the store.
    pub fn map(&self, mode: MapMode, position: u64, size: u64) -> Result<Infallible, ChannelError> {
        log::debug!("refusing to map {size} bytes at {position} ({mode:?})");
        Err(ChannelError::Unsupported("memory mapping"))
    }

    /// Acquire an advisory lock on `[position, position + size)`
    ///
    /// A shared lock needs a readable channel, an exclusive one a writable
    /// channel. The lock is granted immediately and excludes nothing.
    pub fn lock(&self, position: u64, size: u64, shared: bool) -> Result<LockToken<'_, S>, ChannelError> {
        check_range("position", position)?;
        check_range("size", size)?;
        let access = if shared { Access::Read } else { Access::Write };
        self.guarded(access, |_, _| Ok(()))?;
        Ok(LockToken::new(self, position, size, shared))
    }

    /// Same as `lock`: locking never waits, so it never fails to acquire
    pub fn try_lock(
        &self,
        position: u64,
        size: u64,
        shared: bool,
    ) -> Result<Option<LockToken<'_, S>>, ChannelError> {
        self.lock(position, size, shared).map(Some)
    }

    /// Close the channel
    ///
    /// Drops the channel's store handle, so the store can be freed once no
    /// other handle holds it. Every later call fails with `NotOpen`, including
    /// calls already waiting on the channel mutex. Closing twice is harmless.
    pub fn close(&self) -> Result<(), ChannelError> {
        let mut state = self.state.lock();
        if state.store.take().is_some() {
            log::debug!("channel closed at position {}", state.position);
        } else {
            log::warn!("Channel::close() called on already closed channel");
        }
        Ok(())
    }
}

impl<S: ByteStore> fmt::Debug for Channel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        write!(
            f,
            "Channel(open={}, position={}, options={:?})",
            state.store.is_some(),
            state.position,
            self.options
        )
    }
}

impl<S: ByteStore> Drop for Channel<S> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.store.take().is_some() {
            log::debug!("channel dropped without close() at position {}", state.position);
        }
    }
}

impl<S: ByteStore> embedded_io::ErrorType for Channel<S> {
    type Error = ChannelError;
}

impl<S: ByteStore> embedded_io::ErrorType for &Channel<S> {
    type Error = ChannelError;
}

impl<S: ByteStore> embedded_io::Read for &Channel<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ChannelError> {
        Ok(Channel::<S>::read(*self, buf)?.unwrap_or(0))
    }
}

impl<S: ByteStore> embedded_io::Write for &Channel<S> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, ChannelError> {
        Channel::<S>::write(*self, buf)
    }

    fn flush(&mut self) -> Result<(), ChannelError> {
        Channel::<S>::flush(*self, false)
    }
}

impl<S: ByteStore> embedded_io::Seek for &Channel<S> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, ChannelError> {
        Channel::<S>::seek(*self, pos)
    }
}

impl<S: ByteStore> embedded_io::Read for Channel<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ChannelError> {
        embedded_io::Read::read(&mut &*self, buf)
    }
}

impl<S: ByteStore> embedded_io::Write for Channel<S> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, ChannelError> {
        embedded_io::Write::write(&mut &*self, buf)
    }

    fn flush(&mut self) -> Result<(), ChannelError> {
        embedded_io::Write::flush(&mut &*self)
    }
}

impl<S: ByteStore> embedded_io::Seek for Channel<S> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, ChannelError> {
        embedded_io::Seek::seek(&mut &*self, pos)
    }
}
