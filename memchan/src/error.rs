//! Error types for channels and byte stores
//!
//! `ChannelError` is what every `Channel` operation returns. Validation
//! failures (`NotOpen`, `NotReadable`, `NotWritable`, `InvalidArgument`,
//! `Unsupported`) are raised before the store is touched. Anything the store
//! reports is passed through unchanged as `ChannelError::Store`.

use embedded_io::ErrorKind;

/// Errors reported by a `ByteStore`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store would grow past its configured limit
    #[error("store capacity exceeded: {requested} bytes requested, limit is {limit}")]
    CapacityExceeded { limit: u64, requested: u64 },

    /// The sink of a `transfer_to` failed
    #[error("transfer sink failed: {}", kind_to_str(.0))]
    Sink(ErrorKind),

    /// The source of a `transfer_from` or `append_from` failed
    #[error("transfer source failed: {}", kind_to_str(.0))]
    Source(ErrorKind),
}

/// Errors reported by `Channel` operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The channel was closed
    #[error("channel is closed")]
    NotOpen,

    /// The channel was not opened for reading
    #[error("channel is not readable")]
    NotReadable,

    /// The channel was not opened for writing
    #[error("channel is not writable")]
    NotWritable,

    /// A position, size or count is negative or cannot address memory
    #[error("{name} out of range: {value}")]
    InvalidArgument { name: &'static str, value: i128 },

    /// The operation can never be supported by an in-memory channel
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Failure surfaced from the backing store
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl embedded_io::Error for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::CapacityExceeded { .. } => ErrorKind::OutOfMemory,
            Self::Sink(kind) | Self::Source(kind) => *kind,
        }
    }
}

impl embedded_io::Error for ChannelError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotOpen => ErrorKind::NotConnected,
            Self::NotReadable | Self::NotWritable => ErrorKind::PermissionDenied,
            Self::InvalidArgument { .. } => ErrorKind::InvalidInput,
            Self::Unsupported(_) => ErrorKind::Unsupported,
            Self::Store(err) => embedded_io::Error::kind(err),
        }
    }
}

/// Convert error kind to a static string description
#[must_use]
pub fn kind_to_str(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "not found",
        ErrorKind::PermissionDenied => "permission denied",
        ErrorKind::NotConnected => "not connected",
        ErrorKind::BrokenPipe => "broken pipe",
        ErrorKind::InvalidInput => "invalid input",
        ErrorKind::InvalidData => "invalid data",
        ErrorKind::TimedOut => "timed out",
        ErrorKind::Interrupted => "interrupted",
        ErrorKind::Unsupported => "unsupported",
        ErrorKind::OutOfMemory => "out of memory",
        ErrorKind::Other => "other error",
        _ => "unknown error",
    }
}
