//! Venue gateway adapters.

mod paper;

pub use paper::{ModifyCall, ModifyTarget, PaperGateway};
