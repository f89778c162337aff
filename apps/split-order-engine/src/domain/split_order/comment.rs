//! Leg tag carried in the venue order comment.
//!
//! Grammar: `<free text>|GROUP:<group id>|TP:<1..5>`. The comment is the only
//! state the venue keeps for us; editing it outside the engine breaks recovery.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::shared::GroupId;

use super::leg::LegIndex;

/// Group membership of one venue order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegTag {
    /// Group the order belongs to.
    pub group_id: GroupId,
    /// Slot inside the group.
    pub leg: LegIndex,
}

impl LegTag {
    /// Create a tag.
    #[must_use]
    pub const fn new(group_id: GroupId, leg: LegIndex) -> Self {
        Self { group_id, leg }
    }

    /// Render the full comment for a venue order.
    #[must_use]
    pub fn to_comment(&self, prefix: &str) -> String {
        format!("{prefix}{self}")
    }

    /// Parse the tag out of a venue comment.
    ///
    /// Returns `None` for comments that do not end in the tag grammar.
    #[must_use]
    #[allow(clippy::expect_used)] // Regex is compile-time constant
    pub fn parse(comment: &str) -> Option<Self> {
        static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
        let re = TAG_REGEX.get_or_init(|| {
            Regex::new(r"\|GROUP:([^|\s]+)\|TP:([1-5])\s*$").expect("leg tag regex is valid")
        });

        let caps = re.captures(comment)?;
        let group_id = caps.get(1)?.as_str();
        let number: u8 = caps.get(2)?.as_str().parse().ok()?;

        Some(Self {
            group_id: GroupId::new(group_id),
            leg: LegIndex::from_tp_number(number)?,
        })
    }
}

impl fmt::Display for LegTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|GROUP:{}|TP:{}", self.group_id, self.leg.tp_number())
    }
}
