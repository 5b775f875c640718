pub mod channel;
pub mod error;
pub mod io;
pub mod lock;

// Re-export channel types for convenience
pub use channel::{Channel, MAX_POSITION};

// Re-export error types for convenience
pub use error::{ChannelError, StoreError};

// Re-export store types for convenience
pub use io::{Appended, Buffer, BufferReadGuard, ByteStore, MapMode, OpenMode, OpenOptions};

// Re-export lock token
pub use lock::LockToken;

// Re-export the seek target used by `Channel::seek`
pub use embedded_io::SeekFrom;
