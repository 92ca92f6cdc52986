use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuditAction {
    Insert,
    Update,
}

/// Audit row written in the same transaction as the change it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub table_name: &'static str,
    /// Primary key of the changed row. Balance rows are keyed by
    /// (employee, leave type, year), so `employee_leave_balances` entries
    /// carry the employee id here and the full key in the JSON values.
    pub record_id: u64,
    pub action: AuditAction,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub changed_by: Option<u64>,
}

impl AuditEntry {
    pub fn insert<T: Serialize>(
        table_name: &'static str,
        record_id: u64,
        new: &T,
        changed_by: Option<u64>,
    ) -> Self {
        Self {
            table_name,
            record_id,
            action: AuditAction::Insert,
            old_values: None,
            new_values: serde_json::to_value(new).ok(),
            changed_by,
        }
    }

    pub fn update<T: Serialize>(
        table_name: &'static str,
        record_id: u64,
        old: &T,
        new: &T,
        changed_by: Option<u64>,
    ) -> Self {
        Self {
            table_name,
            record_id,
            action: AuditAction::Update,
            old_values: serde_json::to_value(old).ok(),
            new_values: serde_json::to_value(new).ok(),
            changed_by,
        }
    }
}

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct AuditLog {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "leave_requests")]
    pub table_name: String,
    #[schema(example = 12)]
    pub record_id: u64,
    #[schema(example = "update")]
    pub action: String,
    #[schema(value_type = Option<Object>)]
    pub old_values: Option<sqlx::types::Json<Value>>,
    #[schema(value_type = Option<Object>)]
    pub new_values: Option<sqlx::types::Json<Value>>,
    #[schema(example = 3, nullable = true)]
    pub changed_by: Option<u64>,
    #[schema(example = "2024-02-01T10:00:00Z", format = "date-time", value_type = String)]
    pub changed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_entry_captures_both_sides() {
        let entry = AuditEntry::update(
            "leave_requests",
            7,
            &json!({"status": "pending"}),
            &json!({"status": "approved"}),
            Some(2),
        );
        assert_eq!(entry.action, AuditAction::Update);
        assert_eq!(entry.old_values.unwrap()["status"], "pending");
        assert_eq!(entry.new_values.unwrap()["status"], "approved");
        assert_eq!(entry.changed_by, Some(2));
    }

    #[test]
    fn test_insert_entry_has_no_old_values() {
        let entry = AuditEntry::insert("employees", 1, &json!({"name": "x"}), None);
        assert_eq!(entry.action.as_ref(), "insert");
        assert!(entry.old_values.is_none());
    }
}
