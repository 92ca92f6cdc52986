use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

use crate::leave::status::LeaveStatus;

/// Coarse grouping used by callers that only care whether a failure is the
/// client's fault, a missing record, a business-rule conflict or the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Authorization,
    Persistence,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("start_date {start} cannot be after end_date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("start_date {start} cannot be before employee's joining date {joining_date}")]
    BeforeJoining {
        start: NaiveDate,
        joining_date: NaiveDate,
    },

    #[error("requested range {start}..{end} contains no working days")]
    ZeroDurationRequest { start: NaiveDate, end: NaiveDate },

    #[error("joining_date {0} cannot be in the future")]
    FutureJoiningDate(NaiveDate),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{0}")]
    InvalidInput(String),

    #[error("rejection_reason is required")]
    RejectionReasonRequired,

    #[error("employee {0} not found")]
    EmployeeNotFound(u64),

    #[error("leave type {0} not found")]
    LeaveTypeNotFound(u64),

    #[error("department {0} not found")]
    DepartmentNotFound(u64),

    #[error("leave request {0} not found")]
    RequestNotFound(u64),

    #[error("no leave balance found for employee {employee_id}, leave type {leave_type_id}, year {year}")]
    NoBalanceRecord {
        employee_id: u64,
        leave_type_id: u64,
        year: i32,
    },

    #[error("insufficient leave balance: requested {requested} day(s), available {available}")]
    InsufficientBalance { requested: i32, available: i32 },

    #[error("leave request overlaps with an existing request")]
    OverlappingRequest,

    #[error("leave request {id} is {status}, only pending requests can change state")]
    NotPending { id: u64, status: LeaveStatus },

    #[error("{0} already exists")]
    Duplicate(String),

    #[error("{0}")]
    OutsideScope(&'static str),

    #[error("database error: {0}")]
    Persistence(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDateRange { .. }
            | Self::BeforeJoining { .. }
            | Self::ZeroDurationRequest { .. }
            | Self::FutureJoiningDate(_)
            | Self::MissingField(_)
            | Self::InvalidInput(_)
            | Self::RejectionReasonRequired => ErrorKind::Validation,

            Self::EmployeeNotFound(_)
            | Self::LeaveTypeNotFound(_)
            | Self::DepartmentNotFound(_)
            | Self::RequestNotFound(_)
            | Self::NoBalanceRecord { .. } => ErrorKind::NotFound,

            Self::InsufficientBalance { .. }
            | Self::OverlappingRequest
            | Self::NotPending { .. }
            | Self::Duplicate(_) => ErrorKind::Conflict,

            Self::OutsideScope(_) => ErrorKind::Authorization,

            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Stable machine-readable code returned in the `error` field.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::BeforeJoining { .. } => "BEFORE_JOINING",
            Self::ZeroDurationRequest { .. } => "ZERO_DURATION_REQUEST",
            Self::FutureJoiningDate(_) => "FUTURE_JOINING_DATE",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::EmployeeNotFound(_) => "EMPLOYEE_NOT_FOUND",
            Self::LeaveTypeNotFound(_) => "LEAVE_TYPE_NOT_FOUND",
            Self::DepartmentNotFound(_) => "DEPARTMENT_NOT_FOUND",
            Self::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            Self::NoBalanceRecord { .. } => "NO_BALANCE_RECORD",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::OverlappingRequest => "OVERLAPPING_REQUEST",
            Self::NotPending { .. } => "NOT_PENDING",
            Self::Duplicate(_) => "DUPLICATE",
            Self::OutsideScope(_) => "OUTSIDE_SCOPE",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // Admission reports a missing entitlement as a rejected request.
            Self::NoBalanceRecord { .. } => StatusCode::BAD_REQUEST,
            Self::Duplicate(_) => StatusCode::CONFLICT,
            _ => match self.kind() {
                ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Authorization => StatusCode::FORBIDDEN,
                ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Self::Persistence(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.error_code(),
            "message": message,
        }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            // MySQL reports unique key violations as SQLSTATE 23000 / errno 1062
            if db_err.code().as_deref() == Some("23000") && db_err.message().contains("Duplicate")
            {
                return AppError::Duplicate(duplicate_subject(db_err.message()));
            }
        }

        tracing::error!(error = %e, "Database operation failed");
        AppError::Persistence(e.to_string())
    }
}

/// Maps a MySQL duplicate-entry message onto the field a client would recognise.
fn duplicate_subject(message: &str) -> String {
    if message.contains("employees_email_key") {
        "email".to_string()
    } else if message.contains("employees_employee_id_key") {
        "employee_id".to_string()
    } else if message.contains("leave_types_name_key") {
        "leave type name".to_string()
    } else if message.contains("departments_name_key") {
        "department name".to_string()
    } else {
        "record".to_string()
    }
}
