use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::leave::balance::{BalanceAdjustment, LeaveBalance};
use crate::leave::store::LeaveStore;
use crate::model::audit::AuditEntry;

/// Body of `PUT /employees/{id}/leave-balances`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdjustBalance {
    #[schema(example = 1)]
    pub leave_type_id: u64,
    /// Defaults to the current year
    #[schema(example = 2024)]
    pub year: Option<i32>,
    #[serde(flatten)]
    pub adjustment: BalanceAdjustment,
}

/// Overwrites the given fields of a balance row, creating the row when the
/// employee has none for that leave type and year.
#[instrument(skip(store, request), fields(leave_type_id = request.leave_type_id))]
pub async fn adjust<S>(
    store: &mut S,
    employee_id: u64,
    request: &AdjustBalance,
    actor: Option<u64>,
    now: DateTime<Utc>,
) -> Result<LeaveBalance, AppError>
where
    S: LeaveStore,
{
    if store.find_employee(employee_id).await?.is_none() {
        return Err(AppError::EmployeeNotFound(employee_id));
    }
    if store.find_leave_type(request.leave_type_id).await?.is_none() {
        return Err(AppError::LeaveTypeNotFound(request.leave_type_id));
    }

    let year = request.year.unwrap_or_else(|| now.year());
    let current = store
        .lock_balance(employee_id, request.leave_type_id, year)
        .await?;
    let adjusted =
        request
            .adjustment
            .apply(current.as_ref(), employee_id, request.leave_type_id, year)?;

    let entry = match &current {
        Some(old) => {
            store.save_balance(&adjusted).await?;
            AuditEntry::update("employee_leave_balances", employee_id, old, &adjusted, actor)
        }
        None => {
            store.insert_balance_if_absent(&adjusted).await?;
            AuditEntry::insert("employee_leave_balances", employee_id, &adjusted, actor)
        }
    };
    store.record_audit(&entry).await?;

    info!(
        employee_id,
        year,
        allocated_days = adjusted.allocated_days,
        used_days = adjusted.used_days,
        carried_forward_days = adjusted.carried_forward_days,
        "Leave balance adjusted"
    );
    Ok(adjusted)
}
