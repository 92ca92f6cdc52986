//! In-memory [`LeaveStore`] for unit tests.
//!
//! A "transaction" is a clone of the store: work happens on the clone and is
//! copied back with [`MemoryStore::commit`] only when the workflow succeeds.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use super::LeaveStore;
use crate::error::AppError;
use crate::leave::balance::LeaveBalance;
use crate::leave::calendar::DateRange;
use crate::leave::status::LeaveStatus;
use crate::model::audit::AuditEntry;
use crate::model::employee::{Employee, NewEmployee};
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest, StatusChange};
use crate::model::leave_type::LeaveType;

type BalanceKey = (u64, u64, i32);

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub departments: Vec<u64>,
    pub employees: BTreeMap<u64, Employee>,
    pub leave_types: BTreeMap<u64, LeaveType>,
    pub balances: BTreeMap<BalanceKey, LeaveBalance>,
    pub requests: BTreeMap<u64, LeaveRequest>,
    pub audit: Vec<AuditEntry>,
    /// Makes `save_balance` fail, to exercise rollback paths.
    pub fail_balance_writes: bool,
}

impl MemoryStore {
    pub fn begin(&self) -> MemoryStore {
        self.clone()
    }

    pub fn commit(&mut self, tx: MemoryStore) {
        *self = tx;
    }

    pub fn with_department(mut self, id: u64) -> Self {
        self.departments.push(id);
        self
    }

    pub fn with_leave_type(mut self, id: u64, name: &str, max_days: i32, active: bool) -> Self {
        self.leave_types.insert(
            id,
            LeaveType {
                id,
                name: name.to_string(),
                description: None,
                max_days_per_year: max_days,
                carry_forward_allowed: false,
                max_carry_forward_days: 0,
                is_active: active,
            },
        );
        self
    }

    pub fn with_employee(
        mut self,
        id: u64,
        joining_date: NaiveDate,
        manager_id: Option<u64>,
    ) -> Self {
        self.employees.insert(
            id,
            Employee {
                id,
                employee_id: format!("EMP-{id:03}"),
                name: format!("Employee {id}"),
                email: format!("employee{id}@company.com"),
                department_id: 1,
                manager_id,
                joining_date,
                phone: None,
                is_active: true,
            },
        );
        self
    }

    pub fn with_balance(mut self, balance: LeaveBalance) -> Self {
        self.balances.insert(
            (balance.employee_id, balance.leave_type_id, balance.year),
            balance,
        );
        self
    }

    pub fn with_request(
        mut self,
        id: u64,
        employee_id: u64,
        leave_type_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        status: LeaveStatus,
    ) -> Self {
        let range = DateRange::spanning(start, end);
        self.requests.insert(
            id,
            LeaveRequest {
                id,
                employee_id,
                leave_type_id,
                start_date: range.start(),
                end_date: range.end(),
                total_days: range.working_days(),
                reason: "seeded".into(),
                status,
                applied_at: Utc::now(),
                approved_by: None,
                approved_at: None,
                rejection_reason: None,
            },
        );
        self
    }

    pub fn balance(
        &self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> Option<&LeaveBalance> {
        self.balances.get(&(employee_id, leave_type_id, year))
    }

    fn next_id<V>(map: &BTreeMap<u64, V>) -> u64 {
        map.keys().next_back().map_or(1, |id| id + 1)
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn find_employee(&mut self, id: u64) -> Result<Option<Employee>, AppError> {
        Ok(self.employees.get(&id).cloned())
    }

    async fn department_exists(&mut self, id: u64) -> Result<bool, AppError> {
        Ok(self.departments.contains(&id))
    }

    async fn insert_employee(&mut self, employee: &NewEmployee) -> Result<u64, AppError> {
        if self.employees.values().any(|e| e.email == employee.email) {
            return Err(AppError::Duplicate("email".into()));
        }
        if self
            .employees
            .values()
            .any(|e| e.employee_id == employee.employee_id)
        {
            return Err(AppError::Duplicate("employee_id".into()));
        }

        let id = Self::next_id(&self.employees);
        self.employees.insert(
            id,
            Employee {
                id,
                employee_id: employee.employee_id.clone(),
                name: employee.name.clone(),
                email: employee.email.clone(),
                department_id: employee.department_id,
                manager_id: employee.manager_id,
                joining_date: employee.joining_date,
                phone: employee.phone.clone(),
                is_active: true,
            },
        );
        Ok(id)
    }

    async fn find_leave_type(&mut self, id: u64) -> Result<Option<LeaveType>, AppError> {
        Ok(self.leave_types.get(&id).cloned())
    }

    async fn active_leave_types(&mut self) -> Result<Vec<LeaveType>, AppError> {
        Ok(self
            .leave_types
            .values()
            .filter(|lt| lt.is_active)
            .cloned()
            .collect())
    }

    async fn find_balance(
        &mut self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> Result<Option<LeaveBalance>, AppError> {
        Ok(self.balance(employee_id, leave_type_id, year).cloned())
    }

    async fn lock_balance(
        &mut self,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> Result<Option<LeaveBalance>, AppError> {
        Ok(self.balance(employee_id, leave_type_id, year).cloned())
    }

    async fn insert_balance_if_absent(&mut self, balance: &LeaveBalance) -> Result<bool, AppError> {
        let key = (balance.employee_id, balance.leave_type_id, balance.year);
        if self.balances.contains_key(&key) {
            return Ok(false);
        }
        self.balances.insert(key, balance.clone());
        Ok(true)
    }

    async fn save_balance(&mut self, balance: &LeaveBalance) -> Result<(), AppError> {
        if self.fail_balance_writes {
            return Err(AppError::Persistence("simulated write failure".into()));
        }
        balance.validate()?;
        let key = (balance.employee_id, balance.leave_type_id, balance.year);
        match self.balances.get_mut(&key) {
            Some(row) => {
                *row = balance.clone();
                Ok(())
            }
            None => Err(AppError::Persistence("balance row vanished".into())),
        }
    }

    async fn has_overlap(
        &mut self,
        employee_id: u64,
        range: DateRange,
        exclude: Option<u64>,
    ) -> Result<bool, AppError> {
        Ok(crate::leave::overlap::overlaps_any(
            self.requests.values(),
            employee_id,
            &range,
            exclude,
        ))
    }

    async fn insert_request(&mut self, request: &NewLeaveRequest) -> Result<u64, AppError> {
        let id = Self::next_id(&self.requests);
        self.requests.insert(
            id,
            LeaveRequest {
                id,
                employee_id: request.employee_id,
                leave_type_id: request.leave_type_id,
                start_date: request.range.start(),
                end_date: request.range.end(),
                total_days: request.total_days,
                reason: request.reason.clone(),
                status: LeaveStatus::Pending,
                applied_at: request.applied_at,
                approved_by: None,
                approved_at: None,
                rejection_reason: None,
            },
        );
        Ok(id)
    }

    async fn find_request(&mut self, id: u64) -> Result<Option<LeaveRequest>, AppError> {
        Ok(self.requests.get(&id).cloned())
    }

    async fn lock_request(&mut self, id: u64) -> Result<Option<LeaveRequest>, AppError> {
        Ok(self.requests.get(&id).cloned())
    }

    async fn update_request_status(
        &mut self,
        id: u64,
        change: &StatusChange,
    ) -> Result<bool, AppError> {
        match self.requests.get_mut(&id) {
            Some(row) if row.status == LeaveStatus::Pending => {
                *row = change.apply_to(row);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_audit(&mut self, entry: &AuditEntry) -> Result<(), AppError> {
        self.audit.push(entry.clone());
        Ok(())
    }
}
