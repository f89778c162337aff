//! Market Feed Port (Driven Port)
//!
//! Push stream of quotes that drives the trailing scan.

use tokio::sync::broadcast;

use super::gateway_port::Quote;

/// Port for market updates.
pub trait MarketFeedPort: Send + Sync {
    /// Subscribe to quote updates.
    fn market_updates(&self) -> broadcast::Receiver<Quote>;
}
