//! Outbound command responses.

use serde::Serialize;

use crate::domain::shared::Ticket;

use super::command::CommandAction;
use super::split_dto::{PlacementOutcome, SafeShutdownReport, StatsDto, VenueOrderDto};

/// Action-specific response payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseData {
    /// `PLACE_ORDER` result.
    PlacedOrder(PlacementOutcome),
    /// `GET_POSITIONS` result.
    Positions {
        /// Venue positions.
        positions: Vec<VenueOrderDto>,
    },
    /// `GET_ORDERS` result.
    Orders {
        /// Venue pending orders.
        orders: Vec<VenueOrderDto>,
    },
    /// `GET_STATS` result.
    Stats(StatsDto),
    /// `SAFE_SHUTDOWN` result.
    SafeShutdown {
        /// The consolidation report.
        safe_shutdown: SafeShutdownReport,
    },
    /// `DELETE_ORDER` / `CLOSE_POSITION` result.
    Ticket {
        /// The affected ticket.
        ticket: Ticket,
    },
}

/// Response document: `{"success", "action", "error"?, "data"?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResponse {
    /// Whether the command succeeded.
    pub success: bool,
    /// Echo of the action name.
    pub action: String,
    /// Failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl CommandResponse {
    /// Successful response.
    #[must_use]
    pub fn ok(action: CommandAction, data: ResponseData) -> Self {
        Self {
            success: true,
            action: action.as_str().to_string(),
            error: None,
            data: Some(data),
        }
    }

    /// Failed response.
    #[must_use]
    pub fn failure(action: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            action: action.into(),
            error: Some(error.into()),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_omits_data() {
        let response = CommandResponse::failure("LAUNCH", "Unknown action: LAUNCH");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Unknown action: LAUNCH");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn ticket_payload_is_flat() {
        let response = CommandResponse::ok(
            CommandAction::DeleteOrder,
            ResponseData::Ticket {
                ticket: Ticket::from_raw(12).unwrap(),
            },
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["action"], "DELETE_ORDER");
        assert_eq!(json["data"]["ticket"], 12);
        assert!(json.get("error").is_none());
    }
}
