//! Application Layer
//!
//! Use cases, ports, and the engine loop that drives them.

pub mod dto;
pub mod ports;
pub mod services;
pub mod use_cases;
