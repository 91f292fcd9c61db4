//! Key-value persistence used by the engine
//!
//! Two scopes are modelled with the same trait:
//! - durable stores survive restarts (usage counter, tour state)
//! - session stores live as long as the process (alert flags, notified ids)

pub mod error;
pub mod fallback;
pub mod file;
pub mod memory;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use fallback::FallbackStore;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use types::{keys, KeyValueStore};
