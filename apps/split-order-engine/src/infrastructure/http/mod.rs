//! HTTP/REST API adapter.
//!
//! Inbound adapter forwarding REST calls to the engine as command documents.

mod controller;
mod response;

pub use controller::{AppState, create_router};
pub use response::*;
