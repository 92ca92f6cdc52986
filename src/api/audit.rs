use actix_web::{HttpResponse, Responder, web};
use chrono::{Days, NaiveDate};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::debug;
use utoipa::IntoParams;

use crate::auth::auth::AuthUser;
use crate::auth::capability::Capability;
use crate::error::AppError;
use crate::model::audit::{AuditAction, AuditLog};
use crate::utils::db_utils::{Filter, SqlValue};

pub const DEFAULT_AUDIT_LIMIT: u64 = 50;
pub const MAX_AUDIT_LIMIT: u64 = 200;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AuditFilter {
    /// Filter by table, e.g. `leave_requests`
    pub table_name: Option<String>,
    pub record_id: Option<u64>,
    #[param(value_type = Option<String>, example = "update")]
    pub action: Option<AuditAction>,
    /// User id that made the change
    pub changed_by: Option<u64>,
    /// Inclusive lower bound on the change date
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the change date
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
    /// Defaults to 50, capped at 200
    pub limit: Option<u64>,
}

impl AuditFilter {
    fn to_filter(&self) -> Result<Filter, AppError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(AppError::InvalidDateRange {
                    start: from,
                    end: to,
                });
            }
        }

        let mut filter = Filter::new();
        filter
            .eq(
                "table_name",
                self.table_name.as_deref().map(str::trim).filter(|t| !t.is_empty()),
            )
            .eq("record_id", self.record_id)
            .eq("action", self.action.map(|a| a.as_ref().to_string()))
            .eq("changed_by", self.changed_by);

        if let Some(from) = self.from {
            filter.push("changed_at >= ?", [SqlValue::Date(from)]);
        }
        if let Some(to) = self.to {
            let end = to
                .checked_add_days(Days::new(1))
                .ok_or_else(|| AppError::InvalidInput("to is out of range".into()))?;
            filter.push("changed_at < ?", [SqlValue::Date(end)]);
        }
        Ok(filter)
    }

    fn limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_AUDIT_LIMIT)
            .clamp(1, MAX_AUDIT_LIMIT)
    }
}

#[utoipa::path(
    get,
    path = "/api/audit-logs",
    params(AuditFilter),
    responses(
        (status = 200, description = "Most recent audit entries first", body = [AuditLog]),
        (status = 400, description = "Invalid date range"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Audit",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_audit_logs(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AuditFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ViewAuditLogs)?;

    let filter = query.to_filter()?;
    let sql = format!(
        "SELECT id, table_name, record_id, action, old_values, new_values, changed_by, changed_at \
         FROM audit_logs{} ORDER BY changed_at DESC, id DESC LIMIT {}",
        filter.where_sql(),
        query.limit()
    );
    debug!(sql = %sql, "Fetching audit logs");

    let logs = sqlx::query_as_with::<_, AuditLog, _>(&sql, filter.arguments())
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(logs))
}
