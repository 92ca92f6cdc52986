use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::leave::balance::LeaveBalance;
use crate::leave::store::LeaveStore;
use crate::model::audit::AuditEntry;
use crate::model::employee::{CreateEmployee, Employee};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Onboarded {
    pub employee: Employee,
    /// Balance rows opened for the current year
    pub balances: Vec<LeaveBalance>,
}

/// Creates the employee and opens one balance row per active leave type for
/// the current year. Rows that already exist are left untouched.
#[instrument(skip(store, payload), fields(email = %payload.email))]
pub async fn onboard<S>(
    store: &mut S,
    payload: CreateEmployee,
    actor: Option<u64>,
    now: DateTime<Utc>,
) -> Result<Onboarded, AppError>
where
    S: LeaveStore,
{
    let new_employee = payload.normalize(now.date_naive())?;

    if !store.department_exists(new_employee.department_id).await? {
        return Err(AppError::DepartmentNotFound(new_employee.department_id));
    }
    if let Some(manager_id) = new_employee.manager_id {
        if store.find_employee(manager_id).await?.is_none() {
            return Err(AppError::EmployeeNotFound(manager_id));
        }
    }

    let id = store.insert_employee(&new_employee).await?;
    let employee = Employee {
        id,
        employee_id: new_employee.employee_id,
        name: new_employee.name,
        email: new_employee.email,
        department_id: new_employee.department_id,
        manager_id: new_employee.manager_id,
        joining_date: new_employee.joining_date,
        phone: new_employee.phone,
        is_active: true,
    };
    store
        .record_audit(&AuditEntry::insert("employees", id, &employee, actor))
        .await?;

    let year = now.year();
    let mut balances = Vec::new();
    for leave_type in store.active_leave_types().await? {
        let opening = LeaveBalance::opening(id, &leave_type, year);
        if store.insert_balance_if_absent(&opening).await? {
            balances.push(opening);
        } else {
            debug!(leave_type_id = leave_type.id, year, "Skipping existing balance");
        }
    }

    info!(
        employee_id = id,
        code = %employee.employee_id,
        balances = balances.len(),
        "Employee onboarded"
    );
    Ok(Onboarded { employee, balances })
}
