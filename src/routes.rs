use std::sync::Arc;

use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, middleware::from_fn, web};
use anyhow::Context;
use serde_json::json;

use crate::{
    api::{audit, department, employee, leave_balance, leave_request, leave_type},
    auth::middleware::auth_middleware,
    config::Config,
};

pub type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter allowing `requests_per_min` with a burst of the same size.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .context("invalid rate limiter configuration")?;
    Ok(Governor::new(&cfg))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiter: Arc<Limiter>) {
    // Public routes
    cfg.route("/health", web::get().to(health));

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(limiter)
            .service(
                web::scope("/leave-requests")
                    // /leave-requests
                    .service(
                        web::resource("")
                            .route(web::post().to(leave_request::create_leave_request))
                            .route(web::get().to(leave_request::list_leave_requests)),
                    )
                    // /leave-requests/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(leave_request::get_leave_request)),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave_request)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave_request)),
                    )
                    .service(
                        web::resource("/{id}/cancel")
                            .route(web::put().to(leave_request::cancel_leave_request)),
                    ),
            )
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::deactivate_employee)),
                    )
                    // /employees/{id}/leave-balances
                    .service(
                        web::resource("/{id}/leave-balances")
                            .route(web::get().to(leave_balance::get_leave_balances))
                            .route(web::put().to(leave_balance::update_leave_balance)),
                    ),
            )
            .service(
                web::scope("/departments")
                    .service(
                        web::resource("")
                            .route(web::post().to(department::create_department))
                            .route(web::get().to(department::list_departments)),
                    )
                    .service(
                        web::resource("/{id}").route(web::get().to(department::get_department)),
                    ),
            )
            .service(
                web::scope("/leave-types")
                    .service(
                        web::resource("")
                            .route(web::post().to(leave_type::create_leave_type))
                            .route(web::get().to(leave_type::list_leave_types)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(leave_type::update_leave_type))
                            .route(web::delete().to(leave_type::deactivate_leave_type)),
                    ),
            )
            .service(web::resource("/audit-logs").route(web::get().to(audit::list_audit_logs))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenType;
    use crate::auth::jwt::testing::{access_token, issue_token};
    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use rstest::rstest;
    use serde_json::Value;
    use sqlx::MySqlPool;

    const ADMIN: u8 = 1;
    const HR: u8 = 2;
    const MANAGER: u8 = 3;
    const EMPLOYEE: u8 = 4;

    // Every request below is rejected before a connection is needed, so the
    // lazy pool never dials out.
    fn test_app(cfg: &mut web::ServiceConfig) {
        let config = Config::for_tests();
        let pool = MySqlPool::connect_lazy(&config.database_url).unwrap();
        let limiter = Arc::new(build_limiter(config.rate_protected_per_min).unwrap());

        cfg.app_data(web::Data::new(pool))
            .app_data(web::Data::new(config.clone()));
        configure(cfg, &config, limiter);
    }

    fn request(method: &str, uri: &str, role: Option<u8>) -> test::TestRequest {
        let req = match method {
            "POST" => test::TestRequest::post(),
            "PUT" => test::TestRequest::put(),
            "DELETE" => test::TestRequest::delete(),
            _ => test::TestRequest::get(),
        }
        .uri(uri)
        .peer_addr("127.0.0.1:40000".parse().unwrap());

        match role {
            Some(role) => {
                let token = access_token(role, Some(7), &Config::for_tests().jwt_secret);
                req.insert_header(("Authorization", format!("Bearer {token}")))
            }
            None => req,
        }
    }

    async fn json_body(resp: ServiceResponse) -> Value {
        let bytes = test::read_body(resp).await;
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn test_build_limiter_accepts_extreme_rates() {
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(1_000_000).is_ok());
    }

    #[actix_web::test]
    async fn test_health_is_public() {
        let app = test::init_service(App::new().configure(test_app)).await;
        let resp = test::call_service(&app, request("GET", "/health", None).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["status"], "ok");
    }

    #[actix_web::test]
    async fn test_missing_token_is_unauthorized() {
        let app = test::init_service(App::new().configure(test_app)).await;
        let resp =
            test::call_service(&app, request("GET", "/api/leave-requests", None).to_request())
                .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(resp).await["error"], "UNAUTHORIZED");
    }

    #[actix_web::test]
    async fn test_refresh_token_cannot_call_api() {
        let app = test::init_service(App::new().configure(test_app)).await;
        let token = issue_token(
            1,
            ADMIN,
            None,
            TokenType::Refresh,
            &Config::for_tests().jwt_secret,
            900,
        );
        let req = request("GET", "/api/employees", None)
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case("GET", "/api/employees", EMPLOYEE, None)]
    #[case("PUT", "/api/leave-requests/1/approve", EMPLOYEE, None)]
    #[case("POST", "/api/employees", EMPLOYEE, Some(serde_json::json!({
        "employee_id": "E-100",
        "name": "Ana",
        "email": "ana@example.com",
        "department_id": 1,
        "joining_date": "2024-01-15"
    })))]
    #[case("PUT", "/api/employees/1/leave-balances", MANAGER, Some(serde_json::json!({
        "leave_type_id": 1,
        "allocated_days": 21
    })))]
    #[case("POST", "/api/departments", MANAGER, Some(serde_json::json!({ "name": "Ops" })))]
    #[case("DELETE", "/api/leave-types/1", MANAGER, None)]
    #[case("GET", "/api/audit-logs", MANAGER, None)]
    #[actix_web::test]
    async fn test_capability_checks_run_before_the_database(
        #[case] method: &str,
        #[case] uri: &str,
        #[case] role: u8,
        #[case] body: Option<Value>,
    ) {
        let app = test::init_service(App::new().configure(test_app)).await;
        let mut req = request(method, uri, Some(role));
        if let Some(body) = body {
            req = req.set_json(body);
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_reject_requires_reason() {
        let app = test::init_service(App::new().configure(test_app)).await;
        let req = request("PUT", "/api/leave-requests/1/reject", Some(MANAGER))
            .set_json(serde_json::json!({ "rejection_reason": "   " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "REJECTION_REASON_REQUIRED");
    }

    #[actix_web::test]
    async fn test_balance_year_out_of_range() {
        let app = test::init_service(App::new().configure(test_app)).await;
        let uri = "/api/employees/7/leave-balances?year=1800";
        let req = request("GET", uri, Some(HR)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "INVALID_INPUT");
    }

    #[actix_web::test]
    async fn test_audit_log_inverted_dates() {
        let app = test::init_service(App::new().configure(test_app)).await;
        let req = request(
            "GET",
            "/api/audit-logs?from=2024-03-01&to=2024-02-01",
            Some(ADMIN),
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "INVALID_DATE_RANGE");
    }

    #[actix_web::test]
    async fn test_blank_department_name() {
        let app = test::init_service(App::new().configure(test_app)).await;
        let req = request("POST", "/api/departments", Some(HR))
            .set_json(serde_json::json!({ "name": "  " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "MISSING_FIELD");
    }
}
