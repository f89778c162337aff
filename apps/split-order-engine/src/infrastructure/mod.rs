//! Infrastructure Layer
//!
//! Adapters implementing the application ports.

pub mod channel;
pub mod gateway;
pub mod http;
