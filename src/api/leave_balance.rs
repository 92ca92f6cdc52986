use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::auth::capability::Capability;
use crate::error::AppError;
use crate::leave::balance::{LeaveBalance, MAX_BALANCE_YEAR, MIN_BALANCE_YEAR};
use crate::leave::entitlement::{self, AdjustBalance};
use crate::leave::store::{LeaveStore, MySqlStore};

#[derive(Debug, Deserialize, IntoParams)]
pub struct BalanceQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
}

#[derive(Debug, sqlx::FromRow)]
struct BalanceRow {
    #[sqlx(flatten)]
    balance: LeaveBalance,
    leave_type_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceView {
    #[serde(flatten)]
    pub balance: LeaveBalance,
    #[schema(example = "Annual")]
    pub leave_type_name: String,
    #[schema(example = 18)]
    pub available_days: i32,
}

impl From<BalanceRow> for BalanceView {
    fn from(row: BalanceRow) -> Self {
        BalanceView {
            available_days: row.balance.available_days(),
            balance: row.balance,
            leave_type_name: row.leave_type_name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceSnapshot {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = 2024)]
    pub year: i32,
    pub balances: Vec<BalanceView>,
}

#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/leave-balances",
    params(
        ("employee_id", Path, description = "Employee ID"),
        BalanceQuery
    ),
    responses(
        (status = 200, description = "Balances for the year", body = BalanceSnapshot),
        (status = 400, description = "Year out of range"),
        (status = 403, description = "Employee outside the caller's scope"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Leave Balance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_leave_balances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<BalanceQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ViewOwnBalances)?;

    let employee_id = path.into_inner();
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    if !(MIN_BALANCE_YEAR..=MAX_BALANCE_YEAR).contains(&year) {
        return Err(AppError::InvalidInput(format!(
            "year must be between {MIN_BALANCE_YEAR} and {MAX_BALANCE_YEAR}"
        ))
        .into());
    }

    let mut conn = pool.acquire().await.map_err(AppError::from)?;
    let mut store = MySqlStore::new(&mut conn);

    let employee = store
        .find_employee(employee_id)
        .await?
        .ok_or(AppError::EmployeeNotFound(employee_id))?;
    if !auth.scope().permits(&employee) {
        return Err(AppError::OutsideScope("employee is outside your scope").into());
    }

    let rows = sqlx::query_as::<_, BalanceRow>(
        r#"
        SELECT b.employee_id, b.leave_type_id, b.year, b.allocated_days, b.used_days,
               b.carried_forward_days, lt.name AS leave_type_name
        FROM employee_leave_balances b
        JOIN leave_types lt ON lt.id = b.leave_type_id
        WHERE b.employee_id = ? AND b.year = ?
        ORDER BY lt.name
        "#,
    )
    .bind(employee_id)
    .bind(year)
    .fetch_all(store.conn())
    .await
    .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(BalanceSnapshot {
        employee_id,
        year,
        balances: rows.into_iter().map(BalanceView::from).collect(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}/leave-balances",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = AdjustBalance,
    responses(
        (status = 200, description = "Balance row after the adjustment", body = LeaveBalance),
        (status = 400, description = "Invalid year or day counts"),
        (status = 404, description = "Employee or leave type not found")
    ),
    tag = "Leave Balance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_leave_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<AdjustBalance>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageBalances)?;

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let balance = entitlement::adjust(
        &mut MySqlStore::new(&mut tx),
        path.into_inner(),
        &body,
        auth.actor(),
        Utc::now(),
    )
    .await?;
    tx.commit().await.map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(balance))
}
