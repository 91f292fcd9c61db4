mod engine;
mod error;

pub use engine::RetentionEngine;
pub use error::{EngineError, EngineResult};
