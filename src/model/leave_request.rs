use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::leave::calendar::DateRange;
use crate::leave::status::LeaveStatus;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    /// leave application id
    pub id: u64,
    #[schema(example = 1000)]
    /// employee for whom the leave is applied
    pub employee_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "2024-02-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-02-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 3)]
    /// working days covered by the request
    pub total_days: i32,
    #[schema(example = "Family trip")]
    pub reason: String,
    #[sqlx(try_from = "String")]
    pub status: LeaveStatus,
    #[schema(example = "2024-01-20T09:00:00Z", format = "date-time", value_type = String)]
    pub applied_at: DateTime<Utc>,
    #[schema(example = 2, nullable = true)]
    pub approved_by: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>, nullable = true)]
    pub approved_at: Option<DateTime<Utc>>,
    #[schema(nullable = true)]
    pub rejection_reason: Option<String>,
}

impl LeaveRequest {
    pub fn range(&self) -> DateRange {
        DateRange::spanning(self.start_date, self.end_date)
    }
}

/// Admitted request ready to insert; always starts out pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub leave_type_id: u64,
    pub range: DateRange,
    pub total_days: i32,
    pub reason: String,
    pub applied_at: DateTime<Utc>,
}

/// Column changes written together with a status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    Approved {
        approved_by: u64,
        approved_at: DateTime<Utc>,
    },
    Rejected {
        rejection_reason: String,
    },
    Cancelled,
}

impl StatusChange {
    pub fn status(&self) -> LeaveStatus {
        match self {
            StatusChange::Approved { .. } => LeaveStatus::Approved,
            StatusChange::Rejected { .. } => LeaveStatus::Rejected,
            StatusChange::Cancelled => LeaveStatus::Cancelled,
        }
    }

    /// Applies the change to an in-memory copy of the row.
    pub fn apply_to(&self, request: &LeaveRequest) -> LeaveRequest {
        let mut updated = request.clone();
        updated.status = self.status();
        match self {
            StatusChange::Approved {
                approved_by,
                approved_at,
            } => {
                updated.approved_by = Some(*approved_by);
                updated.approved_at = Some(*approved_at);
            }
            StatusChange::Rejected { rejection_reason } => {
                updated.rejection_reason = Some(rejection_reason.clone());
            }
            StatusChange::Cancelled => {}
        }
        updated
    }
}
