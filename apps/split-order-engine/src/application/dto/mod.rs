//! Data Transfer Objects
//!
//! Command documents in, response documents out.

mod command;
mod response;
mod split_dto;

pub use command::{Command, CommandAction, CommandEnvelope, CommandParseError};
pub use response::{CommandResponse, ResponseData};
pub use split_dto::{
    GroupShutdownEntry, LegPlacement, PlaceOrderDto, PlacementOutcome, SafeShutdownReport,
    StatsDto, VenueOrderDto,
};
