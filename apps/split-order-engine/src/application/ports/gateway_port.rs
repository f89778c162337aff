//! Gateway Port (Driven Port)
//!
//! Interface to the trading venue: individual order operations plus
//! enumeration of live positions and pending orders.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{Symbol, Ticket};
use crate::domain::split_order::{Direction, LegTag, OrderKind};

/// Request to open one venue order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenOrderRequest {
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Pending order kind.
    pub kind: OrderKind,
    /// Volume in lots.
    pub volume: Decimal,
    /// Entry price.
    pub price: Decimal,
    /// Stop-loss price (zero for none).
    pub stop_loss: Decimal,
    /// Take-profit price (zero for none).
    pub take_profit: Decimal,
    /// Allowed slippage in points.
    pub deviation: u32,
    /// Identifying marker of the placing system.
    pub magic: u64,
    /// Free-text comment carried by the venue.
    pub comment: String,
    /// Structured group metadata, for venues that can store it.
    pub tag: Option<LegTag>,
}

/// Kind of a venue order or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VenueOrderKind {
    /// Open long position.
    Buy,
    /// Open short position.
    Sell,
    /// Pending buy limit.
    BuyLimit,
    /// Pending sell limit.
    SellLimit,
    /// Pending buy stop.
    BuyStop,
    /// Pending sell stop.
    SellStop,
}

impl VenueOrderKind {
    /// Position kind for a direction.
    #[must_use]
    pub const fn position(direction: Direction) -> Self {
        match direction {
            Direction::Long => Self::Buy,
            Direction::Short => Self::Sell,
        }
    }

    /// Side of the order or position.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::Buy | Self::BuyLimit | Self::BuyStop => Direction::Long,
            Self::Sell | Self::SellLimit | Self::SellStop => Direction::Short,
        }
    }

    /// The pending order kind, `None` for positions.
    #[must_use]
    pub const fn pending_kind(self) -> Option<OrderKind> {
        match self {
            Self::Buy | Self::Sell => None,
            Self::BuyLimit => Some(OrderKind::BuyLimit),
            Self::SellLimit => Some(OrderKind::SellLimit),
            Self::BuyStop => Some(OrderKind::BuyStop),
            Self::SellStop => Some(OrderKind::SellStop),
        }
    }
}

impl From<OrderKind> for VenueOrderKind {
    fn from(kind: OrderKind) -> Self {
        match kind {
            OrderKind::BuyLimit => Self::BuyLimit,
            OrderKind::SellLimit => Self::SellLimit,
            OrderKind::BuyStop => Self::BuyStop,
            OrderKind::SellStop => Self::SellStop,
        }
    }
}

/// A live position or pending order as reported by the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueOrder {
    /// Venue ticket.
    pub ticket: Ticket,
    /// Symbol.
    pub symbol: Symbol,
    /// Order or position kind.
    pub kind: VenueOrderKind,
    /// Volume in lots.
    pub volume: Decimal,
    /// Entry price (pending) or open price (position).
    pub price: Decimal,
    /// Stop-loss price, zero when unset.
    pub stop_loss: Decimal,
    /// Take-profit price, zero when unset.
    pub take_profit: Decimal,
    /// Floating profit (positions only).
    pub profit: Decimal,
    /// Free-text comment.
    pub comment: String,
    /// Identifying marker.
    pub magic: u64,
    /// Structured group metadata, when the venue stores it.
    pub tag: Option<LegTag>,
    /// Time the order was placed or the position opened.
    pub opened_at: DateTime<Utc>,
}

impl VenueOrder {
    /// Group metadata: the structured tag if present, else the comment.
    #[must_use]
    pub fn leg_tag(&self) -> Option<LegTag> {
        self.tag.clone().or_else(|| LegTag::parse(&self.comment))
    }

    /// The stop-loss, `None` when unset.
    #[must_use]
    pub fn stop_loss(&self) -> Option<Decimal> {
        (!self.stop_loss.is_zero()).then_some(self.stop_loss)
    }
}

/// Best bid/ask for a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Symbol.
    pub symbol: Symbol,
    /// Best bid.
    pub bid: Decimal,
    /// Best ask.
    pub ask: Decimal,
    /// Quote time.
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Create a quote stamped now.
    #[must_use]
    pub fn new(symbol: Symbol, bid: Decimal, ask: Decimal) -> Self {
        Self {
            symbol,
            bid,
            ask,
            timestamp: Utc::now(),
        }
    }
}

/// Account figures reported by the venue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Balance.
    pub balance: Decimal,
    /// Equity.
    pub equity: Decimal,
    /// Used margin.
    pub margin: Decimal,
    /// Free margin.
    pub free_margin: Decimal,
    /// Floating profit.
    pub profit: Decimal,
}

/// Gateway port error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The venue refused the operation.
    #[error("rejected by venue: {reason}")]
    Rejected {
        /// Rejection reason.
        reason: String,
    },

    /// No order or position with this ticket.
    #[error("ticket not found: {ticket}")]
    NotFound {
        /// The missing ticket.
        ticket: Ticket,
    },

    /// No price available for the symbol.
    #[error("no quote for {symbol}")]
    NoQuote {
        /// Symbol without a price.
        symbol: Symbol,
    },

    /// The venue could not be reached.
    #[error("venue unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },
}

/// Port for venue interactions.
#[async_trait]
pub trait GatewayPort: Send + Sync {
    /// Open a pending order.
    async fn open_order(&self, request: OpenOrderRequest) -> Result<Ticket, GatewayError>;

    /// Modify price, stop-loss and take-profit of a pending order.
    async fn modify_pending(
        &self,
        ticket: Ticket,
        price: Decimal,
        stop_loss: Decimal,
        take_profit: Decimal,
    ) -> Result<(), GatewayError>;

    /// Modify stop-loss and take-profit of an open position.
    async fn modify_position(
        &self,
        ticket: Ticket,
        stop_loss: Decimal,
        take_profit: Decimal,
    ) -> Result<(), GatewayError>;

    /// Cancel a pending order.
    async fn cancel_order(&self, ticket: Ticket) -> Result<(), GatewayError>;

    /// Close an open position.
    async fn close_position(&self, ticket: Ticket) -> Result<(), GatewayError>;

    /// Enumerate open positions.
    async fn positions(&self) -> Result<Vec<VenueOrder>, GatewayError>;

    /// Enumerate pending orders.
    async fn pending_orders(&self) -> Result<Vec<VenueOrder>, GatewayError>;

    /// Current quote for a symbol.
    async fn quote(&self, symbol: &Symbol) -> Result<Quote, GatewayError>;

    /// Account figures.
    async fn account(&self) -> Result<AccountSnapshot, GatewayError>;
}

/// What a ticket currently identifies at the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegState<'a> {
    /// A pending order.
    Pending(&'a VenueOrder),
    /// An open position.
    Position(&'a VenueOrder),
    /// Neither: filled and closed, cancelled, or never placed.
    Gone,
}

impl LegState<'_> {
    /// Whether the ticket is still live.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        !matches!(self, Self::Gone)
    }
}

/// One enumeration of the venue, indexed by ticket.
#[derive(Debug, Clone, Default)]
pub struct VenueSnapshot {
    pending: HashMap<Ticket, VenueOrder>,
    positions: HashMap<Ticket, VenueOrder>,
}

impl VenueSnapshot {
    /// Build a snapshot from enumerations.
    #[must_use]
    pub fn new(pending: Vec<VenueOrder>, positions: Vec<VenueOrder>) -> Self {
        Self {
            pending: pending.into_iter().map(|o| (o.ticket, o)).collect(),
            positions: positions.into_iter().map(|o| (o.ticket, o)).collect(),
        }
    }

    /// Enumerate the venue once.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if either enumeration fails.
    pub async fn capture<G: GatewayPort + ?Sized>(gateway: &G) -> Result<Self, GatewayError> {
        let pending = gateway.pending_orders().await?;
        let positions = gateway.positions().await?;
        Ok(Self::new(pending, positions))
    }

    /// Resolve a leg ticket. An absent ticket is [`LegState::Gone`].
    #[must_use]
    pub fn leg_state(&self, ticket: Option<Ticket>) -> LegState<'_> {
        let Some(ticket) = ticket else {
            return LegState::Gone;
        };
        if let Some(order) = self.pending.get(&ticket) {
            LegState::Pending(order)
        } else if let Some(position) = self.positions.get(&ticket) {
            LegState::Position(position)
        } else {
            LegState::Gone
        }
    }

    /// Number of pending orders.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of positions.
    #[must_use]
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }
}
