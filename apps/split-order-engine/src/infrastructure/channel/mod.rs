//! Command channel adapters.

mod in_process;

pub use in_process::{CommandBridge, InProcessCommandChannel, command_channel};
