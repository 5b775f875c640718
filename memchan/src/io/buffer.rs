//! Shared buffer with internal locking
//!
//! Provides the thread-safe in-memory `ByteStore` used by channels.

use parking_lot::{Mutex, MutexGuard};
use std::ops::Deref;
use std::sync::Arc;

use super::store::{Appended, ByteStore};
use crate::error::StoreError;

/// Size of the intermediate chunk used by bulk transfers
const TRANSFER_CHUNK: usize = 8 * 1024;

/// Read-only guard to buffer contents
///
/// Holds the lock and provides read-only access to the underlying data.
/// The lock is released when the guard is dropped.
pub struct BufferReadGuard<'a>(MutexGuard<'a, Vec<u8>>);

impl Deref for BufferReadGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for BufferReadGuard<'_> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Shared buffer with internal locking
///
/// A thread-safe buffer backed by `Arc<Mutex<Vec<u8>>>`. Multiple clones
/// share the same underlying data, so several channels can be opened over
/// one buffer, each with its own position.
///
/// # Thread Safety
///
/// Every `ByteStore` operation locks the buffer for its duration. Bulk
/// transfers lock once per chunk and never call into the peer while holding
/// the lock, so a channel over the same buffer can be the peer.
///
/// # Example
///
/// ```
/// use memchan::io::{Buffer, ByteStore};
///
/// let buffer = Buffer::new();
/// buffer.append(&[b"hello"]).unwrap();
///
/// let guard = buffer.lock();
/// assert_eq!(&*guard, b"hello");
/// ```
#[derive(Clone)]
pub struct Buffer {
    data: Arc<Mutex<Vec<u8>>>,
    limit: Option<usize>,
}

impl Buffer {
    /// Create a new empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(Vec::new())),
            limit: None,
        }
    }

    /// Create a new empty buffer that refuses to grow past `limit` bytes
    #[must_use]
    pub fn bounded(limit: usize) -> Self {
        Self {
            data: Arc::new(Mutex::new(Vec::new())),
            limit: Some(limit),
        }
    }

    /// The growth limit, if any
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Get the current length of the buffer
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    /// Check if the buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }

    /// Copy the current contents
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    /// Lock the buffer for reading
    ///
    /// Returns a read-only guard that provides access to the buffer contents.
    /// The lock is held until the guard is dropped.
    #[must_use]
    pub fn lock(&self) -> BufferReadGuard<'_> {
        BufferReadGuard(self.data.lock())
    }

    /// Number of clones sharing this buffer
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }

    fn check_limit(&self, requested: usize) -> Result<(), StoreError> {
        match self.limit {
            Some(limit) if requested > limit => Err(StoreError::CapacityExceeded {
                limit: limit as u64,
                requested: requested as u64,
            }),
            _ => Ok(()),
        }
    }

    fn too_large(&self, requested: u64) -> StoreError {
        StoreError::CapacityExceeded {
            limit: self.limit.map_or(isize::MAX as u64, |limit| limit as u64),
            requested,
        }
    }

    /// Write `bufs` at `start` into locked `data`, growing it as needed
    fn write_locked(
        &self,
        data: &mut Vec<u8>,
        start: usize,
        bufs: &[&[u8]],
    ) -> Result<usize, StoreError> {
        let total: usize = bufs.iter().map(|buf| buf.len()).sum();
        if total == 0 {
            return Ok(0);
        }
        let end = start
            .checked_add(total)
            .ok_or_else(|| self.too_large((start as u64).saturating_add(total as u64)))?;
        if end > data.len() {
            self.check_limit(end)?;
            data.try_reserve(end - data.len()).map_err(|_| self.too_large(end as u64))?;
            data.resize(end, 0);
        }

        let mut offset = start;
        for buf in bufs {
            data[offset..offset + buf.len()].copy_from_slice(buf);
            offset += buf.len();
        }
        Ok(total)
    }

    fn append_locked(&self, data: &mut Vec<u8>, bufs: &[&[u8]]) -> Result<Appended, StoreError> {
        let total: usize = bufs.iter().map(|buf| buf.len()).sum();
        let end = data.len().saturating_add(total);
        self.check_limit(end)?;
        data.try_reserve(total).map_err(|_| self.too_large(end as u64))?;
        for buf in bufs {
            data.extend_from_slice(buf);
        }
        Ok(Appended {
            written: total,
            size: data.len() as u64,
        })
    }

    /// Fill `chunk` from `source`, returning the number of bytes read
    fn fill_from<R>(source: &mut R, chunk: &mut [u8]) -> Result<usize, StoreError>
    where
        R: embedded_io::Read + ?Sized,
    {
        source
            .read(chunk)
            .map_err(|err| StoreError::Source(embedded_io::Error::kind(&err)))
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            limit: None,
        }
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Buffer(len={}, limit={:?}, handles={})",
            self.len(),
            self.limit,
            self.handle_count()
        )
    }
}

fn chunk_len(remaining: u64) -> usize {
    usize::try_from(remaining).map_or(TRANSFER_CHUNK, |n| n.min(TRANSFER_CHUNK))
}

impl ByteStore for Buffer {
    fn size(&self) -> u64 {
        self.data.lock().len() as u64
    }

    fn read(&self, position: u64, bufs: &mut [&mut [u8]]) -> Result<Option<usize>, StoreError> {
        let data = self.data.lock();
        let start = match usize::try_from(position) {
            Ok(start) if start < data.len() => start,
            _ => return Ok(None),
        };

        let mut offset = start;
        for buf in bufs.iter_mut() {
            let n = buf.len().min(data.len() - offset);
            buf[..n].copy_from_slice(&data[offset..offset + n]);
            offset += n;
            if offset == data.len() {
                break;
            }
        }
        Ok(Some(offset - start))
    }

    fn write(&self, position: u64, bufs: &[&[u8]]) -> Result<usize, StoreError> {
        let start = usize::try_from(position).map_err(|_| self.too_large(position))?;
        let mut data = self.data.lock();
        self.write_locked(&mut data, start, bufs)
    }

    fn append(&self, bufs: &[&[u8]]) -> Result<Appended, StoreError> {
        let mut data = self.data.lock();
        self.append_locked(&mut data, bufs)
    }

    fn truncate(&self, size: u64) -> Result<(), StoreError> {
        let mut data = self.data.lock();
        if let Ok(size) = usize::try_from(size) {
            data.truncate(size);
        }
        Ok(())
    }

    fn transfer_to<W>(&self, position: u64, count: u64, sink: &mut W) -> Result<u64, StoreError>
    where
        W: embedded_io::Write + ?Sized,
    {
        let mut chunk = Vec::with_capacity(chunk_len(count));
        let mut transferred = 0u64;

        while transferred < count {
            chunk.clear();
            {
                let data = self.data.lock();
                let start = match usize::try_from(position + transferred) {
                    Ok(start) if start < data.len() => start,
                    _ => break,
                };
                let n = chunk_len(count - transferred).min(data.len() - start);
                chunk.extend_from_slice(&data[start..start + n]);
            }

            let mut pending = chunk.as_slice();
            while !pending.is_empty() {
                let n = sink
                    .write(pending)
                    .map_err(|err| StoreError::Sink(embedded_io::Error::kind(&err)))?;
                if n == 0 {
                    return Ok(transferred);
                }
                pending = pending
                    .get(n..)
                    .ok_or(StoreError::Sink(embedded_io::ErrorKind::InvalidData))?;
                transferred += n as u64;
            }
        }
        Ok(transferred)
    }

    fn transfer_from<R>(&self, source: &mut R, position: u64, count: u64) -> Result<u64, StoreError>
    where
        R: embedded_io::Read + ?Sized,
    {
        if position > self.size() {
            return Ok(0);
        }

        let mut chunk = vec![0u8; chunk_len(count)];
        let mut transferred = 0u64;

        while transferred < count {
            let want = chunk_len(count - transferred);
            let n = Self::fill_from(source, &mut chunk[..want])?;
            if n == 0 {
                break;
            }
            let at = position + transferred;
            let start = usize::try_from(at).map_err(|_| self.too_large(at))?;
            let mut data = self.data.lock();
            self.write_locked(&mut data, start, &[&chunk[..n]])?;
            transferred += n as u64;
        }
        Ok(transferred)
    }

    fn append_from<R>(&self, source: &mut R, count: u64) -> Result<Appended, StoreError>
    where
        R: embedded_io::Read + ?Sized,
    {
        let mut chunk = vec![0u8; chunk_len(count)];
        let mut written = 0usize;
        let mut size = None;

        while (written as u64) < count {
            let want = chunk_len(count - written as u64);
            let n = Self::fill_from(source, &mut chunk[..want])?;
            if n == 0 {
                break;
            }
            let mut data = self.data.lock();
            let appended = self.append_locked(&mut data, &[&chunk[..n]])?;
            written += appended.written;
            size = Some(appended.size);
        }

        Ok(Appended {
            written,
            size: size.unwrap_or_else(|| self.size()),
        })
    }
}
