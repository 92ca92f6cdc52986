use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::auth::capability::Capability;
use crate::error::AppError;
use crate::leave::onboarding;
use crate::leave::store::mysql::EMPLOYEE_COLUMNS;
use crate::leave::store::{LeaveStore, MySqlStore};
use crate::model::audit::AuditEntry;
use crate::model::employee::{CreateEmployee, Employee, UpdateEmployee};
use crate::utils::db_utils::{Filter, Pagination, SqlValue, UpdateBuilder, execute_update};

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeQuery {
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Items per page
    pub per_page: Option<u64>,
    /// Filter by department
    pub department_id: Option<u64>,
    /// Filter by manager
    pub manager_id: Option<u64>,
    /// Filter by active flag
    pub is_active: Option<bool>,
    /// Search by name, email or employee code
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 10)]
    pub total: i64,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created with opening balances", body = Onboarded),
        (status = 400, description = "Invalid payload or future joining date"),
        (status = 404, description = "Department or manager not found"),
        (status = 409, description = "Email or employee code already exists")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageEmployees)?;

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let onboarded = onboarding::onboard(
        &mut MySqlStore::new(&mut tx),
        payload.into_inner(),
        auth.actor(),
        Utc::now(),
    )
    .await?;
    tx.commit().await.map_err(AppError::from)?;

    Ok(HttpResponse::Created().json(onboarded))
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ViewTeamEmployees)?;

    let page = Pagination::new(query.page, query.per_page);

    let mut filter = Filter::new();
    filter
        .eq("department_id", query.department_id)
        .eq("manager_id", query.manager_id)
        .eq("is_active", query.is_active)
        .scoped("id", auth.scope());

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let like = SqlValue::String(format!("%{search}%"));
        filter.push(
            "(name LIKE ? OR email LIKE ? OR employee_id LIKE ?)",
            [like.clone(), like.clone(), like],
        );
    }
    let where_sql = filter.where_sql();

    let count_sql = format!("SELECT COUNT(*) FROM employees{where_sql}");
    debug!(sql = %count_sql, "Counting employees");
    let total = sqlx::query_scalar_with::<_, i64, _>(&count_sql, filter.arguments())
        .fetch_one(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    let data_sql = format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees{where_sql} ORDER BY id DESC LIMIT ? OFFSET ?"
    );
    debug!(sql = %data_sql, page = page.page, per_page = page.per_page, "Fetching employees");
    let employees = sqlx::query_as_with::<_, Employee, _>(&data_sql, filter.page_arguments(&page))
        .fetch_all(pool.get_ref())
        .await
        .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 403, description = "Employee outside the caller's scope"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    let mut conn = pool.acquire().await.map_err(AppError::from)?;
    let employee = MySqlStore::new(&mut conn)
        .find_employee(employee_id)
        .await?
        .ok_or(AppError::EmployeeNotFound(employee_id))?;

    if !auth.scope().permits(&employee) {
        return Err(AppError::OutsideScope("employee is outside your scope").into());
    }

    Ok(HttpResponse::Ok().json(employee))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Employee, department or manager not found"),
        (status = 409, description = "Email already exists")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageEmployees)?;
    body.validate()?;

    let employee_id = path.into_inner();

    let mut builder = UpdateBuilder::new("employees");
    builder
        .set_opt("name", body.name.as_deref().map(str::trim))
        .set_opt("email", body.email.as_deref().map(|e| e.trim().to_lowercase()))
        .set_opt("phone", body.phone.as_deref().map(str::trim))
        .set_opt("department_id", body.department_id)
        .set_opt("manager_id", body.manager_id);
    let update = builder.build("id", employee_id).ok_or_else(|| {
        AppError::InvalidInput("at least one field must be provided for update".into())
    })?;

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let mut store = MySqlStore::new(&mut tx);

    let before = store
        .find_employee(employee_id)
        .await?
        .ok_or(AppError::EmployeeNotFound(employee_id))?;

    if let Some(department_id) = body.department_id {
        if !store.department_exists(department_id).await? {
            return Err(AppError::DepartmentNotFound(department_id).into());
        }
    }
    if let Some(manager_id) = body.manager_id {
        if manager_id == employee_id {
            return Err(
                AppError::InvalidInput("an employee cannot manage themselves".into()).into(),
            );
        }
        if store.find_employee(manager_id).await?.is_none() {
            return Err(AppError::EmployeeNotFound(manager_id).into());
        }
    }

    execute_update(store.conn(), &update)
        .await
        .map_err(AppError::from)?;

    let after = store
        .find_employee(employee_id)
        .await?
        .ok_or(AppError::EmployeeNotFound(employee_id))?;
    store
        .record_audit(&AuditEntry::update(
            "employees",
            employee_id,
            &before,
            &after,
            auth.actor(),
        ))
        .await?;
    drop(store);
    tx.commit().await.map_err(AppError::from)?;

    info!(employee_id, "Employee updated");
    Ok(HttpResponse::Ok().json(after))
}

/// Deactivate Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee deactivated", body = Object, example = json!({
            "message": "Employee deactivated"
        })),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn deactivate_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require(Capability::ManageEmployees)?;

    let employee_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(AppError::from)?;
    let mut store = MySqlStore::new(&mut tx);

    let before = store
        .find_employee(employee_id)
        .await?
        .ok_or(AppError::EmployeeNotFound(employee_id))?;

    if before.is_active {
        sqlx::query("UPDATE employees SET is_active = FALSE WHERE id = ?")
            .bind(employee_id)
            .execute(store.conn())
            .await
            .map_err(AppError::from)?;

        let after = Employee {
            is_active: false,
            ..before.clone()
        };
        store
            .record_audit(&AuditEntry::update(
                "employees",
                employee_id,
                &before,
                &after,
                auth.actor(),
            ))
            .await?;
    }
    drop(store);
    tx.commit().await.map_err(AppError::from)?;

    info!(employee_id, "Employee deactivated");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deactivated"
    })))
}
