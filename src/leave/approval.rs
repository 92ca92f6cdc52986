//! Status transitions out of `pending`.
//!
//! Each function locks the request row, checks the caller's scope and the
//! state machine, then writes the new status together with its ledger and
//! audit side effects. Only approval touches the balance ledger.

use chrono::{DateTime, Datelike, Utc};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::leave::scope::Scope;
use crate::leave::status::LeaveAction;
use crate::leave::store::LeaveStore;
use crate::model::audit::AuditEntry;
use crate::model::leave_request::{LeaveRequest, StatusChange};

/// Marks the request approved and debits its working days from the
/// employee's balance for the current year.
///
/// The balance row is locked and re-checked: an approval that would overdraw
/// it fails with `InsufficientBalance` even if admission let it through.
#[instrument(skip(store))]
pub async fn approve<S>(
    store: &mut S,
    request_id: u64,
    approved_by: u64,
    scope: Scope,
    actor: Option<u64>,
    now: DateTime<Utc>,
) -> Result<LeaveRequest, AppError>
where
    S: LeaveStore,
{
    let request = lock_pending(store, request_id, LeaveAction::Approve, scope).await?;

    if store.find_employee(approved_by).await?.is_none() {
        return Err(AppError::EmployeeNotFound(approved_by));
    }

    let year = now.year();
    let balance = store
        .lock_balance(request.employee_id, request.leave_type_id, year)
        .await?
        .ok_or(AppError::NoBalanceRecord {
            employee_id: request.employee_id,
            leave_type_id: request.leave_type_id,
            year,
        })?;
    let debited = balance.debit(request.total_days)?;

    let approved = transition(
        store,
        &request,
        StatusChange::Approved {
            approved_by,
            approved_at: now,
        },
        actor,
    )
    .await?;

    store.save_balance(&debited).await?;
    store
        .record_audit(&AuditEntry::update(
            "employee_leave_balances",
            request.employee_id,
            &balance,
            &debited,
            actor,
        ))
        .await?;

    info!(
        request_id,
        approved_by,
        used_days = debited.used_days,
        available_days = debited.available_days(),
        "Leave request approved"
    );
    Ok(approved)
}

#[instrument(skip(store, rejection_reason))]
pub async fn reject<S>(
    store: &mut S,
    request_id: u64,
    rejection_reason: &str,
    scope: Scope,
    actor: Option<u64>,
) -> Result<LeaveRequest, AppError>
where
    S: LeaveStore,
{
    let rejection_reason = rejection_reason.trim();
    if rejection_reason.is_empty() {
        return Err(AppError::RejectionReasonRequired);
    }

    let request = lock_pending(store, request_id, LeaveAction::Reject, scope).await?;
    let rejected = transition(
        store,
        &request,
        StatusChange::Rejected {
            rejection_reason: rejection_reason.to_string(),
        },
        actor,
    )
    .await?;

    info!(request_id, "Leave request rejected");
    Ok(rejected)
}

/// Withdraws a pending request. Approved requests stay approved.
#[instrument(skip(store))]
pub async fn cancel<S>(
    store: &mut S,
    request_id: u64,
    scope: Scope,
    actor: Option<u64>,
) -> Result<LeaveRequest, AppError>
where
    S: LeaveStore,
{
    let request = lock_pending(store, request_id, LeaveAction::Cancel, scope).await?;
    let cancelled = transition(store, &request, StatusChange::Cancelled, actor).await?;

    info!(request_id, "Leave request cancelled");
    Ok(cancelled)
}

/// Reads a request the caller is allowed to see.
pub async fn find_visible<S>(
    store: &mut S,
    request_id: u64,
    scope: Scope,
) -> Result<LeaveRequest, AppError>
where
    S: LeaveStore,
{
    let request = store
        .find_request(request_id)
        .await?
        .ok_or(AppError::RequestNotFound(request_id))?;
    ensure_in_scope(store, &request, scope).await?;
    Ok(request)
}

async fn ensure_in_scope<S>(
    store: &mut S,
    request: &LeaveRequest,
    scope: Scope,
) -> Result<(), AppError>
where
    S: LeaveStore,
{
    if scope == Scope::Everyone {
        return Ok(());
    }

    let owner = store
        .find_employee(request.employee_id)
        .await?
        .ok_or(AppError::EmployeeNotFound(request.employee_id))?;
    if !scope.permits(&owner) {
        warn!(request_id = request.id, ?scope, "Request outside caller scope");
        return Err(AppError::OutsideScope(
            "leave request belongs to an employee outside your scope",
        ));
    }
    Ok(())
}

async fn lock_pending<S>(
    store: &mut S,
    request_id: u64,
    action: LeaveAction,
    scope: Scope,
) -> Result<LeaveRequest, AppError>
where
    S: LeaveStore,
{
    let request = store
        .lock_request(request_id)
        .await?
        .ok_or(AppError::RequestNotFound(request_id))?;

    ensure_in_scope(store, &request, scope).await?;

    // Managers decide on their reports' requests, never their own.
    if action != LeaveAction::Cancel && scope.is_self(request.employee_id) {
        warn!(request_id, ?action, "Caller tried to decide their own request");
        return Err(AppError::OutsideScope(
            "you cannot approve or reject your own leave request",
        ));
    }

    if request.status.transition(action).is_none() {
        return Err(AppError::NotPending {
            id: request.id,
            status: request.status,
        });
    }

    Ok(request)
}

async fn transition<S>(
    store: &mut S,
    request: &LeaveRequest,
    change: StatusChange,
    actor: Option<u64>,
) -> Result<LeaveRequest, AppError>
where
    S: LeaveStore,
{
    // The guarded update is the source of truth if the row moved after it was read.
    if !store.update_request_status(request.id, &change).await? {
        return Err(AppError::NotPending {
            id: request.id,
            status: request.status,
        });
    }

    let updated = change.apply_to(request);
    store
        .record_audit(&AuditEntry::update(
            "leave_requests",
            request.id,
            request,
            &updated,
            actor,
        ))
        .await?;
    Ok(updated)
}
