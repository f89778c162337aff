// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Split Order Engine - Rust Core Library
//!
//! Fans one requested trade out into five linked venue orders with staggered
//! take-profit targets, and keeps their stop-loss protection consistent for
//! the lifetime of the group.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic with no I/O
//!   - `shared`: identifiers (`Ticket`, `GroupId`, `RequestId`), `Symbol`, errors
//!   - `split_order`: group aggregate, leg ladder, comment grammar, registry
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: `GatewayPort`, `CommandChannelPort`, `MarketFeedPort`
//!   - `use_cases`: place, trail, recover, safe shutdown, venue queries
//!   - `services`: `SplitOrderEngine`, the single consumer that owns the registry
//!   - `dto`: command and response documents
//!
//! - **Infrastructure**: Adapters
//!   - `gateway`: in-memory paper venue
//!   - `channel`: in-process framed command channel
//!   - `http`: axum REST bridge
//!
//! Ambient modules: `config` (YAML + env interpolation), `telemetry`
//! (tracing subscriber), `observability` (Prometheus metrics).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Ambient Stack
// =============================================================================

/// Configuration loading and validation.
pub mod config;

/// Prometheus metrics.
pub mod observability;

/// Tracing subscriber setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::shared::{DomainError, GroupId, RequestId, Symbol, Ticket};
pub use domain::split_order::{
    Direction, GroupRegistry, LegIndex, LegTag, OrderKind, SplitOrderGroup, SymbolSpec,
    SymbolTable,
};

// Application re-exports
pub use application::dto::{CommandEnvelope, CommandResponse, PlaceOrderDto};
pub use application::ports::{CommandChannelPort, GatewayError, GatewayPort, MarketFeedPort};
pub use application::services::{EngineSettings, SplitOrderEngine};
pub use application::use_cases::{
    PlaceSplitOrderUseCase, RecoverGroupsUseCase, SafeShutdownUseCase, TrailStopsUseCase,
    VenueQueriesUseCase,
};

// Infrastructure re-exports
pub use infrastructure::channel::{CommandBridge, InProcessCommandChannel, command_channel};
pub use infrastructure::gateway::PaperGateway;
pub use infrastructure::http::{AppState, create_router};

// Config re-exports
pub use config::{Config, ConfigError, load_config, load_config_from_string};
