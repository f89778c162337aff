//! Inbound command documents.
//!
//! A command is `{"action": "...", "data": {...}}`. It is parsed only after
//! the whole frame has been received.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::shared::Ticket;

use super::split_dto::PlaceOrderDto;

/// Supported command actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandAction {
    /// Fan out one order into five legs.
    PlaceOrder,
    /// List venue positions.
    GetPositions,
    /// List venue pending orders.
    GetOrders,
    /// Cancel a pending order.
    DeleteOrder,
    /// Close a position.
    ClosePosition,
    /// Account and engine statistics.
    GetStats,
    /// Collapse unprotected take-profits to TP2.
    SafeShutdown,
}

impl CommandAction {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlaceOrder => "PLACE_ORDER",
            Self::GetPositions => "GET_POSITIONS",
            Self::GetOrders => "GET_ORDERS",
            Self::DeleteOrder => "DELETE_ORDER",
            Self::ClosePosition => "CLOSE_POSITION",
            Self::GetStats => "GET_STATS",
            Self::SafeShutdown => "SAFE_SHUTDOWN",
        }
    }
}

impl FromStr for CommandAction {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PLACE_ORDER" => Ok(Self::PlaceOrder),
            "GET_POSITIONS" => Ok(Self::GetPositions),
            "GET_ORDERS" => Ok(Self::GetOrders),
            "DELETE_ORDER" => Ok(Self::DeleteOrder),
            "CLOSE_POSITION" => Ok(Self::ClosePosition),
            "GET_STATS" => Ok(Self::GetStats),
            "SAFE_SHUTDOWN" => Ok(Self::SafeShutdown),
            other => Err(CommandParseError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw command document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Action name.
    pub action: String,
    /// Action-specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CommandEnvelope {
    /// Envelope without payload.
    #[must_use]
    pub fn bare(action: CommandAction) -> Self {
        Self {
            action: action.as_str().to_string(),
            data: None,
        }
    }

    /// Envelope with payload.
    #[must_use]
    pub fn with_data(action: CommandAction, data: Value) -> Self {
        Self {
            action: action.as_str().to_string(),
            data: Some(data),
        }
    }

    /// Envelope targeting one ticket.
    #[must_use]
    pub fn for_ticket(action: CommandAction, ticket: u64) -> Self {
        Self::with_data(action, serde_json::json!({ "ticket": ticket }))
    }
}

#[derive(Debug, Deserialize)]
struct TicketPayload {
    ticket: Ticket,
}

/// A parsed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `PLACE_ORDER`.
    PlaceOrder(PlaceOrderDto),
    /// `GET_POSITIONS`.
    GetPositions,
    /// `GET_ORDERS`.
    GetOrders,
    /// `DELETE_ORDER`.
    DeleteOrder(Ticket),
    /// `CLOSE_POSITION`.
    ClosePosition(Ticket),
    /// `GET_STATS`.
    GetStats,
    /// `SAFE_SHUTDOWN`.
    SafeShutdown,
}

impl Command {
    /// Parse a complete command document.
    ///
    /// # Errors
    ///
    /// Returns `CommandParseError` for invalid JSON, an unknown action, or a
    /// payload that does not fit the action.
    pub fn parse(body: &str) -> Result<Self, CommandParseError> {
        let envelope: CommandEnvelope = serde_json::from_str(body)
            .map_err(|e| CommandParseError::InvalidJson(e.to_string()))?;
        let action: CommandAction = envelope.action.parse()?;

        let command = match action {
            CommandAction::PlaceOrder => Self::PlaceOrder(payload(action, envelope.data)?),
            CommandAction::GetPositions => Self::GetPositions,
            CommandAction::GetOrders => Self::GetOrders,
            CommandAction::DeleteOrder => {
                Self::DeleteOrder(payload::<TicketPayload>(action, envelope.data)?.ticket)
            }
            CommandAction::ClosePosition => {
                Self::ClosePosition(payload::<TicketPayload>(action, envelope.data)?.ticket)
            }
            CommandAction::GetStats => Self::GetStats,
            CommandAction::SafeShutdown => Self::SafeShutdown,
        };
        Ok(command)
    }

    /// The action of this command.
    #[must_use]
    pub const fn action(&self) -> CommandAction {
        match self {
            Self::PlaceOrder(_) => CommandAction::PlaceOrder,
            Self::GetPositions => CommandAction::GetPositions,
            Self::GetOrders => CommandAction::GetOrders,
            Self::DeleteOrder(_) => CommandAction::DeleteOrder,
            Self::ClosePosition(_) => CommandAction::ClosePosition,
            Self::GetStats => CommandAction::GetStats,
            Self::SafeShutdown => CommandAction::SafeShutdown,
        }
    }
}

fn payload<T: serde::de::DeserializeOwned>(
    action: CommandAction,
    data: Option<Value>,
) -> Result<T, CommandParseError> {
    let data = data.ok_or_else(|| CommandParseError::InvalidPayload {
        action,
        message: "missing data".to_string(),
    })?;
    serde_json::from_value(data).map_err(|e| CommandParseError::InvalidPayload {
        action,
        message: e.to_string(),
    })
}

/// Errors parsing a command document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandParseError {
    /// Not a JSON command document.
    #[error("invalid command: {0}")]
    InvalidJson(String),

    /// Action name not recognized.
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Payload does not fit the action.
    #[error("invalid {action} payload: {message}")]
    InvalidPayload {
        /// The action being parsed.
        action: CommandAction,
        /// Error details.
        message: String,
    },
}

impl CommandParseError {
    /// Action name to echo in the failure response.
    #[must_use]
    pub fn action_name(&self) -> String {
        match self {
            Self::InvalidJson(_) => "INVALID".to_string(),
            Self::UnknownAction(action) => action.clone(),
            Self::InvalidPayload { action, .. } => action.as_str().to_string(),
        }
    }
}
