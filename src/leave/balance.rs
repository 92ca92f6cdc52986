use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::leave_type::LeaveType;

pub const MIN_BALANCE_YEAR: i32 = 2020;
pub const MAX_BALANCE_YEAR: i32 = 2050;
/// Upper bound for any single day count on a balance row.
pub const MAX_BALANCE_DAYS: i32 = 366;

/// Entitlement row for one (employee, leave type, year).
///
/// `available_days` is always derived; nothing stores it independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveBalance {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = 21)]
    pub allocated_days: i32,
    #[schema(example = 3)]
    pub used_days: i32,
    #[schema(example = 0)]
    pub carried_forward_days: i32,
}

impl LeaveBalance {
    /// Opening row created when an employee is onboarded.
    pub fn opening(employee_id: u64, leave_type: &LeaveType, year: i32) -> Self {
        Self {
            employee_id,
            leave_type_id: leave_type.id,
            year,
            allocated_days: leave_type.max_days_per_year,
            used_days: 0,
            carried_forward_days: 0,
        }
    }

    pub fn entitlement(&self) -> i32 {
        self.allocated_days.saturating_add(self.carried_forward_days)
    }

    pub fn available_days(&self) -> i32 {
        self.entitlement().saturating_sub(self.used_days)
    }

    pub fn covers(&self, days: i32) -> bool {
        days <= self.available_days()
    }

    /// Returns the row after consuming `days`, refusing to overdraw it.
    pub fn debit(&self, days: i32) -> Result<LeaveBalance, AppError> {
        if days <= 0 {
            return Err(AppError::InvalidInput(format!(
                "cannot debit {days} day(s) from a leave balance"
            )));
        }
        if !self.covers(days) {
            return Err(AppError::InsufficientBalance {
                requested: days,
                available: self.available_days(),
            });
        }

        Ok(LeaveBalance {
            used_days: self.used_days + days,
            ..self.clone()
        })
    }

    /// Checks the row-level invariants the store enforces with CHECK constraints.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(MIN_BALANCE_YEAR..=MAX_BALANCE_YEAR).contains(&self.year) {
            return Err(AppError::InvalidInput(format!(
                "year must be between {MIN_BALANCE_YEAR} and {MAX_BALANCE_YEAR}"
            )));
        }
        if self.allocated_days < 0 || self.used_days < 0 || self.carried_forward_days < 0 {
            return Err(AppError::InvalidInput(
                "leave balance days cannot be negative".into(),
            ));
        }
        if [self.allocated_days, self.used_days, self.carried_forward_days]
            .iter()
            .any(|&days| days > MAX_BALANCE_DAYS)
        {
            return Err(AppError::InvalidInput(format!(
                "leave balance days cannot exceed {MAX_BALANCE_DAYS}"
            )));
        }
        if self.used_days > self.entitlement() {
            return Err(AppError::InvalidInput(format!(
                "used_days {} exceeds allocated plus carried forward days {}",
                self.used_days,
                self.entitlement()
            )));
        }
        Ok(())
    }
}

/// Partial edit of a balance row issued by HR.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BalanceAdjustment {
    #[schema(example = 25)]
    pub allocated_days: Option<i32>,
    #[schema(example = 0)]
    pub used_days: Option<i32>,
    #[schema(example = 5)]
    pub carried_forward_days: Option<i32>,
}

impl BalanceAdjustment {
    pub fn is_empty(&self) -> bool {
        self.allocated_days.is_none()
            && self.used_days.is_none()
            && self.carried_forward_days.is_none()
    }

    /// Applies the edit over `current`, or over a zeroed row when none exists yet.
    pub fn apply(
        &self,
        current: Option<&LeaveBalance>,
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
    ) -> Result<LeaveBalance, AppError> {
        if self.is_empty() {
            return Err(AppError::InvalidInput(
                "at least one field must be provided for update".into(),
            ));
        }

        let base = current.cloned().unwrap_or(LeaveBalance {
            employee_id,
            leave_type_id,
            year,
            allocated_days: 0,
            used_days: 0,
            carried_forward_days: 0,
        });

        let adjusted = LeaveBalance {
            allocated_days: self.allocated_days.unwrap_or(base.allocated_days),
            used_days: self.used_days.unwrap_or(base.used_days),
            carried_forward_days: self.carried_forward_days.unwrap_or(base.carried_forward_days),
            ..base
        };
        adjusted.validate()?;
        Ok(adjusted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn annual() -> LeaveType {
        LeaveType {
            id: 4,
            name: "Annual".into(),
            description: None,
            max_days_per_year: 21,
            carry_forward_allowed: true,
            max_carry_forward_days: 5,
            is_active: true,
        }
    }

    fn balance(allocated: i32, used: i32, carried: i32) -> LeaveBalance {
        LeaveBalance {
            employee_id: 1,
            leave_type_id: 4,
            year: 2024,
            allocated_days: allocated,
            used_days: used,
            carried_forward_days: carried,
        }
    }

    #[test]
    fn test_opening_balance_allocates_yearly_maximum() {
        let row = LeaveBalance::opening(9, &annual(), 2024);
        assert_eq!(row.employee_id, 9);
        assert_eq!(row.leave_type_id, 4);
        assert_eq!(row.allocated_days, 21);
        assert_eq!(row.used_days, 0);
        assert_eq!(row.carried_forward_days, 0);
        assert_eq!(row.available_days(), 21);
    }

    #[test]
    fn test_available_days_includes_carry_forward() {
        assert_eq!(balance(21, 4, 3).available_days(), 20);
    }

    #[test]
    fn test_debit_exact_remaining_succeeds() {
        let after = balance(21, 18, 0).debit(3).unwrap();
        assert_eq!(after.used_days, 21);
        assert_eq!(after.available_days(), 0);
    }

    #[test]
    fn test_debit_beyond_available_fails() {
        let err = balance(21, 0, 0).debit(22).unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientBalance {
                requested: 22,
                available: 21
            }
        ));
    }

    #[test]
    fn test_debit_rejects_non_positive_days() {
        assert!(balance(21, 0, 0).debit(0).is_err());
        assert!(balance(21, 0, 0).debit(-2).is_err());
    }

    #[test]
    fn test_validate_year_bounds() {
        let mut row = balance(1, 0, 0);
        row.year = 2019;
        assert!(row.validate().is_err());
        row.year = 2051;
        assert!(row.validate().is_err());
        row.year = 2050;
        assert!(row.validate().is_ok());
    }

    #[test]
    fn test_adjustment_requires_a_field() {
        let err = BalanceAdjustment::default()
            .apply(None, 1, 4, 2024)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_adjustment_creates_missing_row_with_zero_defaults() {
        let adj = BalanceAdjustment {
            allocated_days: Some(10),
            ..Default::default()
        };
        let row = adj.apply(None, 1, 4, 2024).unwrap();
        assert_eq!(row, balance(10, 0, 0));
    }

    #[test]
    fn test_adjustment_keeps_untouched_fields() {
        let adj = BalanceAdjustment {
            carried_forward_days: Some(5),
            ..Default::default()
        };
        let row = adj.apply(Some(&balance(21, 7, 0)), 1, 4, 2024).unwrap();
        assert_eq!(row, balance(21, 7, 5));
    }

    #[test]
    fn test_adjustment_cannot_break_entitlement_invariant() {
        let adj = BalanceAdjustment {
            allocated_days: Some(5),
            ..Default::default()
        };
        assert!(adj.apply(Some(&balance(21, 7, 0)), 1, 4, 2024).is_err());

        let adj = BalanceAdjustment {
            used_days: Some(-1),
            ..Default::default()
        };
        assert!(adj.apply(Some(&balance(21, 7, 0)), 1, 4, 2024).is_err());
    }

    #[test]
    fn test_adjustment_rejects_oversized_day_counts() {
        let adj = BalanceAdjustment {
            allocated_days: Some(i32::MAX),
            carried_forward_days: Some(1),
            ..Default::default()
        };
        let err = adj.apply(None, 1, 4, 2024).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(msg) if msg.contains("366")));

        let adj = BalanceAdjustment {
            allocated_days: Some(MAX_BALANCE_DAYS),
            carried_forward_days: Some(MAX_BALANCE_DAYS),
            ..Default::default()
        };
        assert_eq!(adj.apply(None, 1, 4, 2024).unwrap().available_days(), 732);
    }

    #[test]
    fn test_extreme_rows_do_not_overflow() {
        let row = balance(i32::MAX, 0, i32::MAX);
        assert_eq!(row.entitlement(), i32::MAX);
        assert!(row.validate().is_err());
        assert_eq!(balance(0, i32::MAX, 0).available_days(), -i32::MAX);
    }

    proptest! {
        #[test]
        fn prop_debit_preserves_invariant(
            allocated in 0i32..60,
            carried in 0i32..10,
            used_frac in 0.0f64..=1.0,
            days in 1i32..80,
        ) {
            let used = ((allocated + carried) as f64 * used_frac) as i32;
            let row = balance(allocated, used, carried);
            prop_assert!(row.validate().is_ok());

            match row.debit(days) {
                Ok(after) => {
                    prop_assert!(days <= row.available_days());
                    prop_assert_eq!(after.used_days, used + days);
                    prop_assert_eq!(after.available_days(), row.available_days() - days);
                    prop_assert!(after.validate().is_ok());
                }
                Err(AppError::InsufficientBalance { requested, available }) => {
                    prop_assert!(days > row.available_days());
                    prop_assert_eq!(requested, days);
                    prop_assert_eq!(available, row.available_days());
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
        }
    }
}
