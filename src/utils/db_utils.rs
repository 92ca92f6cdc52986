use chrono::{DateTime, NaiveDate, Utc};
use sqlx::mysql::MySqlArguments;
use sqlx::{Arguments, Executor, MySql};

use crate::leave::scope::Scope;
use crate::leave::status::LeaveStatus;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    I32(i32),
    Bool(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Null,
}

impl SqlValue {
    fn add_to(&self, args: &mut MySqlArguments) {
        match self {
            SqlValue::String(v) => args.add(v.clone()),
            SqlValue::U64(v) => args.add(*v),
            SqlValue::I32(v) => args.add(*v),
            SqlValue::Bool(v) => args.add(*v),
            SqlValue::Date(v) => args.add(*v),
            SqlValue::DateTime(v) => args.add(*v),
            SqlValue::Null => args.add(None::<String>),
        }
    }
}

macro_rules! sql_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for SqlValue {
            fn from(v: $ty) -> Self {
                SqlValue::$variant(v)
            }
        })*
    };
}

sql_value_from! {
    String => String,
    u64 => U64,
    i32 => I32,
    bool => Bool,
    NaiveDate => Date,
    DateTime<Utc> => DateTime,
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::String(v.to_string())
    }
}

impl From<LeaveStatus> for SqlValue {
    fn from(v: LeaveStatus) -> Self {
        SqlValue::String(v.as_ref().to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

pub fn arguments<'a>(values: impl IntoIterator<Item = &'a SqlValue>) -> MySqlArguments {
    let mut args = MySqlArguments::default();
    for value in values {
        value.add_to(&mut args);
    }
    args
}

/// ===============================
/// Dynamic WHERE clause
/// ===============================
#[derive(Debug, Default)]
pub struct Filter {
    clauses: Vec<String>,
    values: Vec<SqlValue>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `column = ?`, skipped when `value` is `None`.
    pub fn eq<T: Into<SqlValue>>(&mut self, column: &'static str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.push(format!("{column} = ?"), [value.into()]);
        }
        self
    }

    pub fn push(
        &mut self,
        clause: impl Into<String>,
        values: impl IntoIterator<Item = SqlValue>,
    ) -> &mut Self {
        self.clauses.push(clause.into());
        self.values.extend(values);
        self
    }

    /// Restricts `column` (an employee id) to what `scope` may see.
    pub fn scoped(&mut self, column: &'static str, scope: Scope) -> &mut Self {
        match scope {
            Scope::Everyone => self,
            Scope::Team { manager_id } => self.push(
                format!("{column} IN (SELECT id FROM employees WHERE id = ? OR manager_id = ?)"),
                [SqlValue::U64(manager_id), SqlValue::U64(manager_id)],
            ),
            Scope::Own { employee_id } => {
                self.push(format!("{column} = ?"), [SqlValue::U64(employee_id)])
            }
            Scope::Nobody => self.push("1 = 0", []),
        }
    }

    /// Leading space included; empty when there are no conditions.
    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn arguments(&self) -> MySqlArguments {
        arguments(&self.values)
    }

    /// Filter values followed by `LIMIT ? OFFSET ?`.
    pub fn page_arguments(&self, page: &Pagination) -> MySqlArguments {
        let tail = [SqlValue::U64(page.per_page), SqlValue::U64(page.offset())];
        arguments(self.values.iter().chain(tail.iter()))
    }
}

/// ===============================
/// Pagination
/// ===============================
pub const DEFAULT_PER_PAGE: u64 = 10;
pub const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Pagination {
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    /// Saturates, so an absurd page yields an empty result instead of wrapping.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Collects `column = ?` assignments from typed optional fields. Column
/// names are always compile-time constants, never client input.
#[derive(Debug)]
pub struct UpdateBuilder {
    table: &'static str,
    columns: Vec<&'static str>,
    values: Vec<SqlValue>,
}

impl UpdateBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn set<T: Into<SqlValue>>(&mut self, column: &'static str, value: T) -> &mut Self {
        self.columns.push(column);
        self.values.push(value.into());
        self
    }

    /// Skips the column when `value` is `None`.
    pub fn set_opt<T: Into<SqlValue>>(
        &mut self,
        column: &'static str,
        value: Option<T>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.set(column, value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// `None` when nothing was set.
    pub fn build(&self, id_column: &'static str, id: u64) -> Option<SqlUpdate> {
        if self.is_empty() {
            return None;
        }

        let set_clause = self
            .columns
            .iter()
            .map(|c| format!("{c} = ?"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut values = self.values.clone();
        values.push(SqlValue::U64(id));

        Some(SqlUpdate {
            sql: format!("UPDATE {} SET {set_clause} WHERE {id_column} = ?", self.table),
            values,
        })
    }
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update<'c, E>(executor: E, update: &SqlUpdate) -> Result<u64, sqlx::Error>
where
    E: Executor<'c, Database = MySql>,
{
    let result = sqlx::query_with(&update.sql, arguments(&update.values))
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_update_builder_skips_missing_fields() {
        let mut builder = UpdateBuilder::new("employees");
        builder
            .set_opt("name", Some("Jane"))
            .set_opt("phone", None::<String>)
            .set("department_id", 4u64);

        let update = builder.build("id", 9).unwrap();
        assert_eq!(update.sql, "UPDATE employees SET name = ?, department_id = ? WHERE id = ?");
        assert_eq!(
            update.values,
            vec![
                SqlValue::String("Jane".into()),
                SqlValue::U64(4),
                SqlValue::U64(9)
            ]
        );
    }

    #[test]
    fn test_empty_update_builds_nothing() {
        let builder = UpdateBuilder::new("leave_types");
        assert!(builder.is_empty());
        assert!(builder.build("id", 1).is_none());
    }

    #[test]
    fn test_filter_joins_conditions() {
        let mut filter = Filter::new();
        filter
            .eq("status", Some(LeaveStatus::Pending))
            .eq("employee_id", None::<u64>)
            .scoped("employee_id", Scope::Team { manager_id: 3 });

        assert_eq!(
            filter.where_sql(),
            " WHERE status = ? AND employee_id IN \
             (SELECT id FROM employees WHERE id = ? OR manager_id = ?)"
        );
        assert_eq!(filter.values.len(), 3);
        assert_eq!(filter.values[0], SqlValue::String("pending".into()));
    }

    #[test]
    fn test_filter_scopes() {
        let mut everyone = Filter::new();
        everyone.scoped("employee_id", Scope::Everyone);
        assert_eq!(everyone.where_sql(), "");

        let mut own = Filter::new();
        own.scoped("id", Scope::Own { employee_id: 5 });
        assert_eq!(own.where_sql(), " WHERE id = ?");

        let mut nobody = Filter::new();
        nobody.scoped("id", Scope::Nobody);
        assert_eq!(nobody.where_sql(), " WHERE 1 = 0");
    }

    #[rstest]
    #[case(None, None, 1, 10, 0)]
    #[case(Some(3), Some(20), 3, 20, 40)]
    #[case(Some(0), Some(0), 1, 1, 0)]
    #[case(Some(2), Some(1000), 2, 100, 100)]
    #[case(Some(u64::MAX), Some(100), u64::MAX, 100, u64::MAX)]
    fn test_pagination(
        #[case] page: Option<u64>,
        #[case] per_page: Option<u64>,
        #[case] expected_page: u64,
        #[case] expected_per_page: u64,
        #[case] expected_offset: u64,
    ) {
        let p = Pagination::new(page, per_page);
        assert_eq!(p.page, expected_page);
        assert_eq!(p.per_page, expected_per_page);
        assert_eq!(p.offset(), expected_offset);
    }
}
