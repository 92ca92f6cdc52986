//! Persistence seam for the leave workflows.
//!
//! Every workflow in [`crate::leave`] receives a `&mut impl LeaveStore` that is
//! already scoped to one database transaction. The workflow never commits;
//! the caller commits when the workflow returns `Ok` and drops (rolls back)
//! the transaction otherwise.

use async_trait::async_trait;

use crate::error::AppError;
use crate::leave::balance::LeaveBalance;
use crate::leave::calendar::DateRange;
use crate::model::audit::AuditEntry;
use crate::model::employee::{Employee, NewEmployee};
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest, StatusChange};
use crate::model::leave_type::LeaveType;

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub use mysql::MySqlStore;

#[async_trait]
pub trait LeaveStore: Send {
    async fn find_employee(&mut self, id: u64) -> Result<Option<Employee>, AppError>;

    async fn department_exists(&mut self, id: u64) -> Result<bool, AppError>;

    async fn insert_employee(&mut self, employee: &NewEmployee) -> Result<u64, AppError>;

    async fn find_leave_type(&mut self, id: u64) -> Result<Option<LeaveType>, AppError>;

    async fn active_leave_types(&mut self) -> Result<Vec<LeaveType>, AppError>;

    async fn find_balance(
        &mut self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> Result<Option<LeaveBalance>, AppError>;

    /// Same as [`LeaveStore::find_balance`] but holds a row lock until the
    /// transaction ends, so concurrent approvals serialize on the row.
    async fn lock_balance(
        &mut self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> Result<Option<LeaveBalance>, AppError>;

    /// Inserts the row unless one already exists for its key. Returns whether
    /// a row was created.
    async fn insert_balance_if_absent(&mut self, balance: &LeaveBalance) -> Result<bool, AppError>;

    /// Overwrites the day counts of an existing row.
    async fn save_balance(&mut self, balance: &LeaveBalance) -> Result<(), AppError>;

    /// True when a pending or approved request of the employee, other than
    /// `exclude`, intersects `range`.
    async fn has_overlap(
        &mut self,
        employee_id: u64,
        range: DateRange,
        exclude: Option<u64>,
    ) -> Result<bool, AppError>;

    async fn insert_request(&mut self, request: &NewLeaveRequest) -> Result<u64, AppError>;

    async fn find_request(&mut self, id: u64) -> Result<Option<LeaveRequest>, AppError>;

    /// Reads the request holding a row lock until the transaction ends.
    async fn lock_request(&mut self, id: u64) -> Result<Option<LeaveRequest>, AppError>;

    /// Applies `change` only while the request is still pending. Returns
    /// whether the row was updated.
    async fn update_request_status(
        &mut self,
        id: u64,
        change: &StatusChange,
    ) -> Result<bool, AppError>;

    async fn record_audit(&mut self, entry: &AuditEntry) -> Result<(), AppError>;
}
