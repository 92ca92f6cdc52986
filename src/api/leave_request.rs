use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::auth::capability::Capability;
use crate::error::AppError;
use crate::leave::admission::{self, LeaveApplication};
use crate::leave::approval;
use crate::leave::status::LeaveStatus;
use crate::leave::store::MySqlStore;
use crate::leave::store::mysql::REQUEST_COLUMNS;
use crate::model::leave_request::LeaveRequest;
use crate::utils::db_utils::{Filter, Pagination};

#[derive(Deserialize, ToSchema)]
pub struct ApproveLeave {
    /// Approving employee; defaults to the caller's own employee record
    #[schema(example = 2)]
    pub approved_by: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectLeave {
    #[serde(default)]
    #[schema(example = "Team is short-staffed that week")]
    pub rejection_reason: String,
}

#[derive(Deserialize, IntoParams)]
pub struct LeaveFilter {
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    /// Filter by leave type ID
    pub leave_type_id: Option<u64>,
    /// Filter by leave status
    #[param(value_type = Option<String>, example = "pending")]
    pub status: Option<LeaveStatus>,
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Items per page
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

/* =========================
Apply for leave
========================= */
#[utoipa::path(
    post,
    path = "/api/leave-requests",
    request_body(
        content = LeaveApplication,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request admitted as pending", body = Admitted),
        (status = 400, description = "Invalid range, insufficient balance or overlapping request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<LeaveApplication>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::CreateOwnRequests)?;

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let admitted = admission::admit(
        &mut MySqlStore::new(&mut tx),
        &payload,
        auth.own_scope(),
        auth.actor(),
        Utc::now(),
    )
    .await?;
    tx.commit().await.map_err(AppError::from)?;

    Ok(HttpResponse::Created().json(admitted))
}

/* =========================
List leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/leave-requests",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn list_leave_requests(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ViewOwnRequests)?;

    let page = Pagination::new(query.page, query.per_page);

    let mut filter = Filter::new();
    filter
        .eq("employee_id", query.employee_id)
        .eq("leave_type_id", query.leave_type_id)
        .eq("status", query.status)
        .scoped("employee_id", auth.scope());
    let where_sql = filter.where_sql();

    let count_sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");
    let total = sqlx::query_scalar_with::<_, i64, _>(&count_sql, filter.arguments())
        .fetch_one(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    let data_sql = format!(
        r#"
        SELECT {REQUEST_COLUMNS}
        FROM leave_requests
        {where_sql}
        ORDER BY applied_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#
    );
    let data = sqlx::query_as_with::<_, LeaveRequest, _>(&data_sql, filter.page_arguments(&page))
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

/* =========================
Leave request details
========================= */
#[utoipa::path(
    get,
    path = "/api/leave-requests/{id}",
    params(
        ("id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ViewOwnRequests)?;

    let mut conn = pool.acquire().await.map_err(AppError::from)?;
    let request = approval::find_visible(
        &mut MySqlStore::new(&mut conn),
        path.into_inner(),
        auth.scope(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(request))
}

/* =========================
Approve leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave-requests/{id}/approve",
    params(
        ("id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body = ApproveLeave,
    responses(
        (status = 200, description = "Leave approved and balance debited", body = LeaveRequest),
        (status = 400, description = "Not pending, no balance row or insufficient balance"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request or approver not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: Option<web::Json<ApproveLeave>>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ApproveTeamRequests)?;

    let approved_by = payload
        .and_then(|p| p.approved_by)
        .or(auth.employee_id)
        .ok_or(AppError::MissingField("approved_by"))?;

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let approved = approval::approve(
        &mut MySqlStore::new(&mut tx),
        path.into_inner(),
        approved_by,
        auth.scope(),
        auth.actor(),
        Utc::now(),
    )
    .await?;
    tx.commit().await.map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(approved))
}

/* =========================
Reject leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave-requests/{id}/reject",
    params(
        ("id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body = RejectLeave,
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 400, description = "Missing reason or request not pending"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<RejectLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::RejectTeamRequests)?;

    if payload.rejection_reason.trim().is_empty() {
        return Err(AppError::RejectionReasonRequired.into());
    }

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let rejected = approval::reject(
        &mut MySqlStore::new(&mut tx),
        path.into_inner(),
        &payload.rejection_reason,
        auth.scope(),
        auth.actor(),
    )
    .await?;
    tx.commit().await.map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(rejected))
}

/* =========================
Cancel leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave-requests/{id}/cancel",
    params(
        ("id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled", body = LeaveRequest),
        (status = 400, description = "Request not pending"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave_request(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::CancelOwnRequests)?;

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let cancelled = approval::cancel(
        &mut MySqlStore::new(&mut tx),
        path.into_inner(),
        auth.scope(),
        auth.actor(),
    )
    .await?;
    tx.commit().await.map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(cancelled))
}
