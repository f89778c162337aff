//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure dependencies.
//!
//! # Bounded Contexts
//!
//! - [`split_order`]: Split order groups, the leg ladder, the comment grammar and
//!   the in-memory group registry
//! - [`shared`]: Identifiers, symbols and errors used across contexts

pub mod shared;
pub mod split_order;
