//! Application Ports (Driver and Driven)
//!
//! - **Driver Ports** (Primary/Inbound): the command channel
//! - **Driven Ports** (Secondary/Outbound): the venue gateway and market feed

mod command_channel_port;
mod gateway_port;
mod market_feed_port;

pub use command_channel_port::{ChannelError, CommandChannelPort, InboundCommand};
pub use gateway_port::{
    AccountSnapshot, GatewayError, GatewayPort, LegState, OpenOrderRequest, Quote, VenueOrder,
    VenueOrderKind, VenueSnapshot,
};
pub use market_feed_port::MarketFeedPort;
