use actix_web::{HttpResponse, Responder, web};
use sqlx::MySqlPool;
use tracing::info;

use crate::auth::auth::AuthUser;
use crate::auth::capability::Capability;
use crate::error::AppError;
use crate::leave::store::{LeaveStore, MySqlStore};
use crate::model::audit::AuditEntry;
use crate::model::department::{CreateDepartment, Department};

#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "All departments", body = [Department])
    ),
    tag = "Department",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_departments(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let departments = sqlx::query_as::<_, Department>(
        "SELECT id, name, description FROM departments ORDER BY name",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(departments))
}

#[utoipa::path(
    get,
    path = "/api/departments/{department_id}",
    params(
        ("department_id", Path, description = "Department ID")
    ),
    responses(
        (status = 200, description = "Department found", body = Department),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_department(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let department_id = path.into_inner();

    let department = sqlx::query_as::<_, Department>(
        "SELECT id, name, description FROM departments WHERE id = ?",
    )
    .bind(department_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(AppError::from)?
    .ok_or(AppError::DepartmentNotFound(department_id))?;

    Ok(HttpResponse::Ok().json(department))
}

#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartment,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 400, description = "Missing name"),
        (status = 409, description = "Department name already exists")
    ),
    tag = "Department",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateDepartment>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageDepartments)?;

    let payload = payload.into_inner().normalize()?;

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let mut store = MySqlStore::new(&mut tx);

    let result = sqlx::query("INSERT INTO departments (name, description) VALUES (?, ?)")
        .bind(&payload.name)
        .bind(&payload.description)
        .execute(store.conn())
        .await
        .map_err(AppError::from)?;

    let department = Department {
        id: result.last_insert_id(),
        name: payload.name,
        description: payload.description,
    };
    store
        .record_audit(&AuditEntry::insert(
            "departments",
            department.id,
            &department,
            auth.actor(),
        ))
        .await?;
    drop(store);
    tx.commit().await.map_err(AppError::from)?;

    info!(department_id = department.id, name = %department.name, "Department created");
    Ok(HttpResponse::Created().json(department))
}
