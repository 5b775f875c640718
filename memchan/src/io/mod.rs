//! I/O module for memchan
//!
//! Contains the store contract, its in-memory implementation and the
//! capability types used to open channels.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  Channel (one per open)             │
//! │  - private cursor                   │
//! │  - capability checks                │
//! │  - per-handle mutex                 │
//! └─────────────────────────────────────┘
//!      ▲         ▲           ▲
//!      │ many channels share one store
//!      ▼
//! ┌─────────────────────────────────────┐
//! │  ByteStore (shared storage)         │
//! │  - Buffer: Arc<Mutex<Vec<u8>>>      │
//! │  - positioned read/write, append    │
//! │  - bulk transfer to/from peers      │
//! └─────────────────────────────────────┘
//! ```

pub mod buffer;
pub mod store;
pub mod types;

pub use buffer::{Buffer, BufferReadGuard};
pub use store::{Appended, ByteStore};
pub use types::{MapMode, OpenMode, OpenOptions};
