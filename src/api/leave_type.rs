use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::IntoParams;

use crate::auth::auth::AuthUser;
use crate::auth::capability::Capability;
use crate::error::AppError;
use crate::leave::store::mysql::LEAVE_TYPE_COLUMNS;
use crate::leave::store::{LeaveStore, MySqlStore};
use crate::model::audit::AuditEntry;
use crate::model::leave_type::{CreateLeaveType, LeaveType, UpdateLeaveType};

#[derive(Debug, Deserialize, IntoParams)]
pub struct LeaveTypeQuery {
    /// Include deactivated types (requires leave type management)
    pub include_inactive: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/api/leave-types",
    params(LeaveTypeQuery),
    responses(
        (status = 200, description = "Leave types", body = [LeaveType])
    ),
    tag = "Leave Type",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_leave_types(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveTypeQuery>,
) -> actix_web::Result<impl Responder> {
    let include_inactive =
        query.include_inactive.unwrap_or(false) && auth.role.can(Capability::ManageLeaveTypes);

    let sql = if include_inactive {
        format!("SELECT {LEAVE_TYPE_COLUMNS} FROM leave_types ORDER BY name")
    } else {
        format!("SELECT {LEAVE_TYPE_COLUMNS} FROM leave_types WHERE is_active = TRUE ORDER BY name")
    };

    let types = sqlx::query_as::<_, LeaveType>(&sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(types))
}

#[utoipa::path(
    post,
    path = "/api/leave-types",
    request_body = CreateLeaveType,
    responses(
        (status = 201, description = "Leave type created", body = LeaveType),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Leave type name already exists")
    ),
    tag = "Leave Type",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeaveType>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageLeaveTypes)?;

    let payload = payload.into_inner().normalize()?;
    let is_active = payload.is_active.unwrap_or(true);

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let mut store = MySqlStore::new(&mut tx);

    let result = sqlx::query(
        r#"
        INSERT INTO leave_types
            (name, description, max_days_per_year, carry_forward_allowed, max_carry_forward_days, is_active)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.max_days_per_year)
    .bind(payload.carry_forward_allowed)
    .bind(payload.max_carry_forward_days)
    .bind(is_active)
    .execute(store.conn())
    .await
    .map_err(AppError::from)?;

    let leave_type = LeaveType {
        id: result.last_insert_id(),
        name: payload.name,
        description: payload.description,
        max_days_per_year: payload.max_days_per_year,
        carry_forward_allowed: payload.carry_forward_allowed,
        max_carry_forward_days: payload.max_carry_forward_days,
        is_active,
    };
    store
        .record_audit(&AuditEntry::insert(
            "leave_types",
            leave_type.id,
            &leave_type,
            auth.actor(),
        ))
        .await?;
    drop(store);
    tx.commit().await.map_err(AppError::from)?;

    info!(leave_type_id = leave_type.id, name = %leave_type.name, "Leave type created");
    Ok(HttpResponse::Created().json(leave_type))
}

#[utoipa::path(
    put,
    path = "/api/leave-types/{leave_type_id}",
    params(
        ("leave_type_id", Path, description = "Leave type ID")
    ),
    request_body = UpdateLeaveType,
    responses(
        (status = 200, description = "Leave type updated", body = LeaveType),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Leave type not found")
    ),
    tag = "Leave Type",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateLeaveType>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageLeaveTypes)?;

    let leave_type_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let mut store = MySqlStore::new(&mut tx);

    let before = store
        .find_leave_type(leave_type_id)
        .await?
        .ok_or(AppError::LeaveTypeNotFound(leave_type_id))?;
    let after = body.apply_to(&before)?;

    save_leave_type(&mut store, &after).await?;
    store
        .record_audit(&AuditEntry::update(
            "leave_types",
            leave_type_id,
            &before,
            &after,
            auth.actor(),
        ))
        .await?;
    drop(store);
    tx.commit().await.map_err(AppError::from)?;

    info!(leave_type_id, "Leave type updated");
    Ok(HttpResponse::Ok().json(after))
}

/// Soft delete: the type stays referenced by existing requests and balances.
#[utoipa::path(
    delete,
    path = "/api/leave-types/{leave_type_id}",
    params(
        ("leave_type_id", Path, description = "Leave type ID")
    ),
    responses(
        (status = 200, description = "Leave type deactivated", body = LeaveType),
        (status = 404, description = "Leave type not found")
    ),
    tag = "Leave Type",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn deactivate_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageLeaveTypes)?;

    let leave_type_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let mut store = MySqlStore::new(&mut tx);

    let before = store
        .find_leave_type(leave_type_id)
        .await?
        .ok_or(AppError::LeaveTypeNotFound(leave_type_id))?;
    let after = LeaveType {
        is_active: false,
        ..before.clone()
    };

    if before.is_active {
        save_leave_type(&mut store, &after).await?;
        store
            .record_audit(&AuditEntry::update(
                "leave_types",
                leave_type_id,
                &before,
                &after,
                auth.actor(),
            ))
            .await?;
    }
    drop(store);
    tx.commit().await.map_err(AppError::from)?;

    info!(leave_type_id, "Leave type deactivated");
    Ok(HttpResponse::Ok().json(after))
}

async fn save_leave_type(
    store: &mut MySqlStore<'_>,
    leave_type: &LeaveType,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE leave_types
        SET name = ?, description = ?, max_days_per_year = ?,
            carry_forward_allowed = ?, max_carry_forward_days = ?, is_active = ?
        WHERE id = ?
        "#,
    )
    .bind(&leave_type.name)
    .bind(&leave_type.description)
    .bind(leave_type.max_days_per_year)
    .bind(leave_type.carry_forward_allowed)
    .bind(leave_type.max_carry_forward_days)
    .bind(leave_type.is_active)
    .bind(leave_type.id)
    .execute(store.conn())
    .await?;
    Ok(())
}
