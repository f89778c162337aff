//! Application Services
//!
//! Long-running orchestration on top of the use cases.

mod engine;

pub use engine::{EngineSettings, SplitOrderEngine};
