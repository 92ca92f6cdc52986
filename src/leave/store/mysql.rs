use async_trait::async_trait;
use sqlx::MySqlConnection;
use sqlx::types::Json;
use tracing::debug;

use super::LeaveStore;
use crate::error::AppError;
use crate::leave::balance::LeaveBalance;
use crate::leave::calendar::DateRange;
use crate::leave::status::LeaveStatus;
use crate::model::audit::AuditEntry;
use crate::model::employee::{Employee, NewEmployee};
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest, StatusChange};
use crate::model::leave_type::LeaveType;

pub const EMPLOYEE_COLUMNS: &str =
    "id, employee_id, name, email, department_id, manager_id, joining_date, phone, is_active";

pub const LEAVE_TYPE_COLUMNS: &str = "id, name, description, max_days_per_year, \
     carry_forward_allowed, max_carry_forward_days, is_active";

pub const BALANCE_COLUMNS: &str =
    "employee_id, leave_type_id, year, allocated_days, used_days, carried_forward_days";

pub const REQUEST_COLUMNS: &str = "id, employee_id, leave_type_id, start_date, end_date, \
     total_days, reason, status, applied_at, approved_by, approved_at, rejection_reason";

/// [`LeaveStore`] over the connection of an open transaction.
///
/// ```ignore
/// let mut tx = pool.begin().await?;
/// let admitted = admission::admit(&mut MySqlStore::new(&mut tx), &application, scope, actor, now).await?;
/// tx.commit().await?;
/// ```
pub struct MySqlStore<'c> {
    conn: &'c mut MySqlConnection,
}

impl<'c> MySqlStore<'c> {
    pub fn new(conn: &'c mut MySqlConnection) -> Self {
        Self { conn }
    }

    /// The underlying connection, for statements outside the trait.
    pub fn conn(&mut self) -> &mut MySqlConnection {
        &mut *self.conn
    }

    async fn select_balance(
        &mut self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
        for_update: bool,
    ) -> Result<Option<LeaveBalance>, AppError> {
        let sql = format!(
            "SELECT {BALANCE_COLUMNS} FROM employee_leave_balances \
             WHERE employee_id = ? AND leave_type_id = ? AND year = ?{}",
            if for_update { " FOR UPDATE" } else { "" }
        );

        let balance = sqlx::query_as::<_, LeaveBalance>(&sql)
            .bind(employee_id)
            .bind(leave_type_id)
            .bind(year)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(balance)
    }

    async fn select_request(
        &mut self,
        id: u64,
        for_update: bool,
    ) -> Result<Option<LeaveRequest>, AppError> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ?{}",
            if for_update { " FOR UPDATE" } else { "" }
        );
        let request = sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(request)
    }
}

#[async_trait]
impl<'c> LeaveStore for MySqlStore<'c> {
    async fn find_employee(&mut self, id: u64) -> Result<Option<Employee>, AppError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(employee)
    }

    async fn department_exists(&mut self, id: u64) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM departments WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count > 0)
    }

    async fn insert_employee(&mut self, employee: &NewEmployee) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
                (employee_id, name, email, department_id, manager_id, joining_date, phone)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.employee_id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(employee.department_id)
        .bind(employee.manager_id)
        .bind(employee.joining_date)
        .bind(&employee.phone)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn find_leave_type(&mut self, id: u64) -> Result<Option<LeaveType>, AppError> {
        let sql = format!("SELECT {LEAVE_TYPE_COLUMNS} FROM leave_types WHERE id = ?");
        let leave_type = sqlx::query_as::<_, LeaveType>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(leave_type)
    }

    async fn active_leave_types(&mut self) -> Result<Vec<LeaveType>, AppError> {
        let sql =
            format!("SELECT {LEAVE_TYPE_COLUMNS} FROM leave_types WHERE is_active = TRUE ORDER BY id");
        let types = sqlx::query_as::<_, LeaveType>(&sql)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(types)
    }

    async fn find_balance(
        &mut self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> Result<Option<LeaveBalance>, AppError> {
        self.select_balance(employee_id, leave_type_id, year, false)
            .await
    }

    async fn lock_balance(
        &mut self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> Result<Option<LeaveBalance>, AppError> {
        self.select_balance(employee_id, leave_type_id, year, true)
            .await
    }

    async fn insert_balance_if_absent(&mut self, balance: &LeaveBalance) -> Result<bool, AppError> {
        let existing = self
            .select_balance(balance.employee_id, balance.leave_type_id, balance.year, true)
            .await?;
        if existing.is_some() {
            debug!(
                employee_id = balance.employee_id,
                leave_type_id = balance.leave_type_id,
                year = balance.year,
                "Balance row already present"
            );
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO employee_leave_balances
                (employee_id, leave_type_id, year, allocated_days, used_days, carried_forward_days)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(balance.employee_id)
        .bind(balance.leave_type_id)
        .bind(balance.year)
        .bind(balance.allocated_days)
        .bind(balance.used_days)
        .bind(balance.carried_forward_days)
        .execute(&mut *self.conn)
        .await?;

        Ok(true)
    }

    async fn save_balance(&mut self, balance: &LeaveBalance) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE employee_leave_balances
            SET allocated_days = ?, used_days = ?, carried_forward_days = ?
            WHERE employee_id = ? AND leave_type_id = ? AND year = ?
            "#,
        )
        .bind(balance.allocated_days)
        .bind(balance.used_days)
        .bind(balance.carried_forward_days)
        .bind(balance.employee_id)
        .bind(balance.leave_type_id)
        .bind(balance.year)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    async fn has_overlap(
        &mut self,
        employee_id: u64,
        range: DateRange,
        exclude: Option<u64>,
    ) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM leave_requests
            WHERE employee_id = ?
              AND status IN ('pending', 'approved')
              AND NOT (end_date < ? OR start_date > ?)
              AND (? IS NULL OR id <> ?)
            "#,
        )
        .bind(employee_id)
        .bind(range.start())
        .bind(range.end())
        .bind(exclude)
        .bind(exclude)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(count > 0)
    }

    async fn insert_request(&mut self, request: &NewLeaveRequest) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type_id, start_date, end_date, total_days, reason, status, applied_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.employee_id)
        .bind(request.leave_type_id)
        .bind(request.range.start())
        .bind(request.range.end())
        .bind(request.total_days)
        .bind(&request.reason)
        .bind(LeaveStatus::Pending.as_ref())
        .bind(request.applied_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn find_request(&mut self, id: u64) -> Result<Option<LeaveRequest>, AppError> {
        self.select_request(id, false).await
    }

    async fn lock_request(&mut self, id: u64) -> Result<Option<LeaveRequest>, AppError> {
        self.select_request(id, true).await
    }

    async fn update_request_status(
        &mut self,
        id: u64,
        change: &StatusChange,
    ) -> Result<bool, AppError> {
        let pending = LeaveStatus::Pending;
        let status = change.status();

        let query = match change {
            StatusChange::Approved {
                approved_by,
                approved_at,
            } => sqlx::query(
                "UPDATE leave_requests SET status = ?, approved_by = ?, approved_at = ? \
                 WHERE id = ? AND status = ?",
            )
            .bind(status.as_ref())
            .bind(*approved_by)
            .bind(*approved_at),
            StatusChange::Rejected { rejection_reason } => sqlx::query(
                "UPDATE leave_requests SET status = ?, rejection_reason = ? \
                 WHERE id = ? AND status = ?",
            )
            .bind(status.as_ref())
            .bind(rejection_reason.as_str()),
            StatusChange::Cancelled => {
                sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ? AND status = ?")
                    .bind(status.as_ref())
            }
        };

        let result = query
            .bind(id)
            .bind(pending.as_ref())
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_audit(&mut self, entry: &AuditEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs
                (table_name, record_id, action, old_values, new_values, changed_by)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.table_name)
        .bind(entry.record_id)
        .bind(entry.action.as_ref())
        .bind(entry.old_values.clone().map(Json))
        .bind(entry.new_values.clone().map(Json))
        .bind(entry.changed_by)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }
}
