use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::leave::calendar::DateRange;
use crate::leave::scope::Scope;
use crate::leave::status::LeaveStatus;
use crate::leave::store::LeaveStore;
use crate::model::audit::AuditEntry;
use crate::model::leave_request::NewLeaveRequest;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LeaveApplication {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = "2024-02-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-02-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family trip")]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Admitted {
    #[schema(example = 12)]
    pub request_id: u64,
    #[schema(example = 3)]
    pub total_days: i32,
    pub status: LeaveStatus,
}

/// Validates an application against the calendar, the employee's balance for
/// the current year and their existing requests, then records it as pending.
///
/// Nothing is written unless every check passes.
#[instrument(
    skip(store, application),
    fields(
        employee_id = application.employee_id,
        leave_type_id = application.leave_type_id
    )
)]
pub async fn admit<S>(
    store: &mut S,
    application: &LeaveApplication,
    scope: Scope,
    actor: Option<u64>,
    now: DateTime<Utc>,
) -> Result<Admitted, AppError>
where
    S: LeaveStore,
{
    let reason = application.reason.trim();
    if reason.is_empty() {
        return Err(AppError::MissingField("reason"));
    }

    let range = DateRange::new(application.start_date, application.end_date)?;

    let employee = store
        .find_employee(application.employee_id)
        .await?
        .ok_or(AppError::EmployeeNotFound(application.employee_id))?;
    if !scope.permits(&employee) {
        return Err(AppError::OutsideScope(
            "you can only apply for leave on your own behalf",
        ));
    }
    if range.start() < employee.joining_date {
        return Err(AppError::BeforeJoining {
            start: range.start(),
            joining_date: employee.joining_date,
        });
    }

    // A weekend inside an already reserved range is a conflict, not an empty request.
    if store.has_overlap(employee.id, range, None).await? {
        return Err(AppError::OverlappingRequest);
    }

    let total_days = range.working_days();
    if total_days == 0 {
        return Err(AppError::ZeroDurationRequest {
            start: range.start(),
            end: range.end(),
        });
    }

    let year = now.year();
    let balance = store
        .find_balance(employee.id, application.leave_type_id, year)
        .await?
        .ok_or(AppError::NoBalanceRecord {
            employee_id: employee.id,
            leave_type_id: application.leave_type_id,
            year,
        })?;
    if !balance.covers(total_days) {
        return Err(AppError::InsufficientBalance {
            requested: total_days,
            available: balance.available_days(),
        });
    }

    let request = NewLeaveRequest {
        employee_id: employee.id,
        leave_type_id: application.leave_type_id,
        range,
        total_days,
        reason: reason.to_string(),
        applied_at: now,
    };
    let request_id = store.insert_request(&request).await?;

    let admitted = Admitted {
        request_id,
        total_days,
        status: LeaveStatus::Pending,
    };
    store
        .record_audit(&AuditEntry::insert(
            "leave_requests",
            request_id,
            &serde_json::json!({
                "employee_id": request.employee_id,
                "leave_type_id": request.leave_type_id,
                "start_date": range.start(),
                "end_date": range.end(),
                "total_days": total_days,
                "reason": request.reason,
                "status": admitted.status,
            }),
            actor,
        ))
        .await?;

    info!(request_id, total_days, %range, "Leave request admitted");
    Ok(admitted)
}
