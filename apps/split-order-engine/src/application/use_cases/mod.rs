//! Application Use Cases
//!
//! Use cases orchestrate domain logic against the venue gateway. None of them
//! retries a failed venue call.

mod place_split_order;
mod recover_groups;
mod safe_shutdown;
mod trail_stops;
mod venue_queries;

pub use place_split_order::{PlaceSplitOrderUseCase, PlacementSettings, SplitOrderError};
pub use recover_groups::{RecoverGroupsUseCase, RecoveryReport};
pub use safe_shutdown::SafeShutdownUseCase;
pub use trail_stops::{TrailOutcome, TrailStopsUseCase};
pub use venue_queries::VenueQueriesUseCase;
