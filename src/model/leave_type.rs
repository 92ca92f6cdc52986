use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::leave::balance::MAX_BALANCE_DAYS;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Annual",
        "description": "Paid annual leave",
        "max_days_per_year": 21,
        "carry_forward_allowed": true,
        "max_carry_forward_days": 5,
        "is_active": true
    })
)]
pub struct LeaveType {
    pub id: u64,
    pub name: String,
    #[schema(nullable = true)]
    pub description: Option<String>,
    pub max_days_per_year: i32,
    pub carry_forward_allowed: bool,
    pub max_carry_forward_days: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLeaveType {
    #[schema(example = "Annual")]
    pub name: String,
    #[schema(example = "Paid annual leave")]
    pub description: Option<String>,
    #[schema(example = 21)]
    pub max_days_per_year: i32,
    #[serde(default)]
    pub carry_forward_allowed: bool,
    #[serde(default)]
    #[schema(example = 5)]
    pub max_carry_forward_days: i32,
    /// Defaults to true
    pub is_active: Option<bool>,
}

impl CreateLeaveType {
    /// Trims the name, checks day counts and zeroes the carry-forward cap
    /// when carry forward is not allowed.
    pub fn normalize(self) -> Result<CreateLeaveType, AppError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::MissingField("name"));
        }
        if self.max_days_per_year < 0 || self.max_carry_forward_days < 0 {
            return Err(AppError::InvalidInput("days cannot be negative".into()));
        }
        if self.max_days_per_year.max(self.max_carry_forward_days) > MAX_BALANCE_DAYS {
            return Err(AppError::InvalidInput(format!(
                "days cannot exceed {MAX_BALANCE_DAYS}"
            )));
        }

        let max_carry_forward_days = if self.carry_forward_allowed {
            self.max_carry_forward_days
        } else {
            0
        };

        Ok(CreateLeaveType {
            name,
            max_carry_forward_days,
            is_active: Some(self.is_active.unwrap_or(true)),
            ..self
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateLeaveType {
    pub name: Option<String>,
    pub description: Option<String>,
    pub max_days_per_year: Option<i32>,
    pub carry_forward_allowed: Option<bool>,
    pub max_carry_forward_days: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateLeaveType {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(AppError::InvalidInput("name cannot be empty".into()));
            }
        }
        if self.max_days_per_year.is_some_and(|d| d < 0) {
            return Err(AppError::InvalidInput(
                "max_days_per_year cannot be negative".into(),
            ));
        }
        if [self.max_days_per_year, self.max_carry_forward_days]
            .iter()
            .flatten()
            .any(|&d| d > MAX_BALANCE_DAYS)
        {
            return Err(AppError::InvalidInput(format!(
                "days cannot exceed {MAX_BALANCE_DAYS}"
            )));
        }
        if self.max_carry_forward_days.is_some_and(|d| d < 0) {
            return Err(AppError::InvalidInput(
                "max_carry_forward_days cannot be negative".into(),
            ));
        }
        if self.carry_forward_allowed == Some(false)
            && self.max_carry_forward_days.is_some_and(|d| d > 0)
        {
            return Err(AppError::InvalidInput(
                "max_carry_forward_days must be 0 when carry forward is not allowed".into(),
            ));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.max_days_per_year.is_none()
            && self.carry_forward_allowed.is_none()
            && self.max_carry_forward_days.is_none()
            && self.is_active.is_none()
    }

    /// Merges the edit over `current`. Turning carry forward off clears the cap.
    pub fn apply_to(&self, current: &LeaveType) -> Result<LeaveType, AppError> {
        if self.is_empty() {
            return Err(AppError::InvalidInput(
                "at least one field must be provided for update".into(),
            ));
        }
        self.validate()?;

        let carry_forward_allowed = self
            .carry_forward_allowed
            .unwrap_or(current.carry_forward_allowed);
        let max_carry_forward_days = match (carry_forward_allowed, self.max_carry_forward_days) {
            (false, Some(days)) if days > 0 => {
                return Err(AppError::InvalidInput(
                    "max_carry_forward_days must be 0 when carry forward is not allowed".into(),
                ));
            }
            (false, _) => 0,
            (true, days) => days.unwrap_or(current.max_carry_forward_days),
        };

        Ok(LeaveType {
            id: current.id,
            name: self
                .name
                .as_deref()
                .map_or_else(|| current.name.clone(), |n| n.trim().to_string()),
            description: self.description.clone().or_else(|| current.description.clone()),
            max_days_per_year: self.max_days_per_year.unwrap_or(current.max_days_per_year),
            carry_forward_allowed,
            max_carry_forward_days,
            is_active: self.is_active.unwrap_or(current.is_active),
        })
    }
}
