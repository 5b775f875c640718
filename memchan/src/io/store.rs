//! The byte store contract consumed by `Channel`

use crate::error::StoreError;

/// Outcome of an append: bytes written and the store size right after them
///
/// Both values are sampled under the same store lock, so `size` is the end of
/// this append even when other handles append concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appended {
    pub written: usize,
    pub size: u64,
}

/// Trait for in-memory byte stores backing one or more channels
///
/// A store is a cheaply cloneable handle: every clone refers to the same
/// bytes. Implementations serialize content access themselves; channels only
/// protect their own cursor.
///
/// Positions are byte offsets from the start of the store. Operations that
/// take several buffers treat them as one contiguous payload, in order.
pub trait ByteStore: Send + Sync {
    /// Current logical length
    fn size(&self) -> u64;

    /// Fill `bufs` in order with bytes starting at `position`.
    ///
    /// Returns `None` when `position >= size()`, otherwise the number of bytes
    /// copied, which may be less than the total capacity of `bufs`.
    fn read(&self, position: u64, bufs: &mut [&mut [u8]]) -> Result<Option<usize>, StoreError>;

    /// Write all of `bufs` at `position`.
    ///
    /// Grows the store when the write ends past `size()`; a gap between the
    /// old end and `position` is zero-filled.
    fn write(&self, position: u64, bufs: &[&[u8]]) -> Result<usize, StoreError>;

    /// Write all of `bufs` at the current end of the store.
    fn append(&self, bufs: &[&[u8]]) -> Result<Appended, StoreError>;

    /// Shrink the store to `size`; never grows it.
    fn truncate(&self, size: u64) -> Result<(), StoreError>;

    /// Copy up to `count` bytes starting at `position` into `sink`.
    ///
    /// Returns 0 when `position >= size()`. Stops early if the sink accepts no
    /// more bytes.
    fn transfer_to<W>(&self, position: u64, count: u64, sink: &mut W) -> Result<u64, StoreError>
    where
        W: embedded_io::Write + ?Sized;

    /// Read up to `count` bytes from `source` into the store at `position`.
    ///
    /// Returns 0 when `position > size()`. Stops early at end of source.
    fn transfer_from<R>(&self, source: &mut R, position: u64, count: u64) -> Result<u64, StoreError>
    where
        R: embedded_io::Read + ?Sized;

    /// Read up to `count` bytes from `source` onto the end of the store.
    fn append_from<R>(&self, source: &mut R, count: u64) -> Result<Appended, StoreError>
    where
        R: embedded_io::Read + ?Sized;
}
