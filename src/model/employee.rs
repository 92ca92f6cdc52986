use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_id": "EMP-001",
        "name": "John Doe",
        "email": "john.doe@company.com",
        "department_id": 10,
        "manager_id": null,
        "joining_date": "2024-01-01",
        "phone": "+8801712345678",
        "is_active": true
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_id: String,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = 10)]
    pub department_id: u64,

    #[schema(example = 2, nullable = true)]
    pub manager_id: Option<u64>,

    #[schema(
        example = "2024-01-01",
        value_type = String,
        format = "date"
    )]
    pub joining_date: NaiveDate,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = true)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    /// Generated as `EMP-xxxxxxxx` when omitted
    #[schema(example = "EMP-001")]
    pub employee_id: Option<String>,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    #[schema(example = 1)]
    pub department_id: u64,
    #[schema(example = 2)]
    pub manager_id: Option<u64>,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub joining_date: NaiveDate,
    #[schema(example = "+8801712345678")]
    pub phone: Option<String>,
}

/// Validated employee ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub department_id: u64,
    pub manager_id: Option<u64>,
    pub joining_date: NaiveDate,
    pub phone: Option<String>,
}

impl CreateEmployee {
    pub fn normalize(self, today: NaiveDate) -> Result<NewEmployee, AppError> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_lowercase();

        if name.is_empty() {
            return Err(AppError::MissingField("name"));
        }
        if email.is_empty() {
            return Err(AppError::MissingField("email"));
        }
        if !looks_like_email(&email) {
            return Err(AppError::InvalidInput(format!("invalid email address: {email}")));
        }
        if self.joining_date > today {
            return Err(AppError::FutureJoiningDate(self.joining_date));
        }

        let employee_id = match self.employee_id.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => generate_employee_code(),
        };

        Ok(NewEmployee {
            employee_id,
            name,
            email,
            department_id: self.department_id,
            manager_id: self.manager_id,
            joining_date: self.joining_date,
            phone: self
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department_id: Option<u64>,
    pub manager_id: Option<u64>,
}

impl UpdateEmployee {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::InvalidInput("name cannot be empty".into()));
        }
        if let Some(email) = &self.email {
            let email = email.trim();
            if email.is_empty() {
                return Err(AppError::InvalidInput("email cannot be empty".into()));
            }
            if !looks_like_email(email) {
                return Err(AppError::InvalidInput(format!("invalid email address: {email}")));
            }
        }
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

pub fn generate_employee_code() -> String {
    let id = uuid::Uuid::new_v4().to_simple().to_string().to_uppercase();
    format!("EMP-{}", &id[..8])
}
