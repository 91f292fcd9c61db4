//! File retention policy
//!
//! Pure calculations over a file's creation time: when it expires, how long
//! it has left, which urgency band it is in, and how to render that.

pub mod error;
pub mod policy;
pub mod types;

pub use error::{RetentionError, RetentionResult};
pub use policy::{parse_created_at, RetentionPolicy};
pub use types::{ExpirationStatus, RetentionWindow};
