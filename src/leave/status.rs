use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Lifecycle of a leave request. Only `Pending` has outgoing transitions.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum LeaveAction {
    Approve,
    Reject,
    Cancel,
}

impl LeaveStatus {
    /// Next status for `action`, or `None` when the transition is not allowed.
    pub fn transition(self, action: LeaveAction) -> Option<LeaveStatus> {
        match (self, action) {
            (LeaveStatus::Pending, LeaveAction::Approve) => Some(LeaveStatus::Approved),
            (LeaveStatus::Pending, LeaveAction::Reject) => Some(LeaveStatus::Rejected),
            (LeaveStatus::Pending, LeaveAction::Cancel) => Some(LeaveStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether a request in this status reserves its dates for overlap checks.
    pub fn blocks_dates(self) -> bool {
        matches!(self, LeaveStatus::Pending | LeaveStatus::Approved)
    }
}

impl TryFrom<String> for LeaveStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
