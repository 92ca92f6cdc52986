use actix_web::error::{ErrorForbidden, ErrorInternalServerError, ErrorUnauthorized};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};
use serde_json::json;

use crate::auth::capability::Capability;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::leave::scope::Scope;
use crate::model::role::Role;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Normally placed there by `auth_middleware`.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ErrorInternalServerError("Config missing"))),
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        ready(AuthUser::from_claims(
            claims.user_id,
            claims.sub,
            claims.role,
            claims.employee_id,
        ))
    }
}

impl AuthUser {
    pub fn from_claims(
        user_id: u64,
        username: String,
        role_id: u8,
        employee_id: Option<u64>,
    ) -> actix_web::Result<Self> {
        let role = Role::from_id(role_id).ok_or_else(|| ErrorUnauthorized("Invalid role"))?;
        Ok(AuthUser {
            user_id,
            username,
            role,
            employee_id,
        })
    }

    pub fn require(&self, capability: Capability) -> actix_web::Result<()> {
        if self.role.can(capability) {
            Ok(())
        } else {
            Err(ErrorForbidden(json!({
                "error": "FORBIDDEN",
                "message": format!("role {} cannot {}", self.role, capability.as_ref()),
            })))
        }
    }

    /// Employees this caller may act on.
    pub fn scope(&self) -> Scope {
        Scope::for_caller(self.role, self.employee_id)
    }

    /// Scope for acting on one's own behalf, widened to everyone for HR and admin.
    pub fn own_scope(&self) -> Scope {
        match (self.role.sees_everyone(), self.employee_id) {
            (true, _) => Scope::Everyone,
            (false, Some(employee_id)) => Scope::Own { employee_id },
            (false, None) => Scope::Nobody,
        }
    }

    /// Recorded as `changed_by` in audit rows.
    pub fn actor(&self) -> Option<u64> {
        Some(self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "u".into(),
            role,
            employee_id,
        }
    }

    #[test]
    fn test_require_uses_capability_table() {
        assert!(user(Role::Hr, None).require(Capability::ManageEmployees).is_ok());

        let err = user(Role::Employee, Some(4))
            .require(Capability::ApproveTeamRequests)
            .unwrap_err();
        assert_eq!(
            err.as_response_error().status_code(),
            actix_web::http::StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_own_scope_for_manager_is_self_only() {
        assert_eq!(
            user(Role::Manager, Some(3)).own_scope(),
            Scope::Own { employee_id: 3 }
        );
        assert_eq!(
            user(Role::Manager, Some(3)).scope(),
            Scope::Team { manager_id: 3 }
        );
        assert_eq!(user(Role::Admin, None).own_scope(), Scope::Everyone);
    }

    #[test]
    fn test_unknown_role_id_is_unauthorized() {
        let err = AuthUser::from_claims(1, "u".into(), 9, None).unwrap_err();
        assert_eq!(
            err.as_response_error().status_code(),
            actix_web::http::StatusCode::UNAUTHORIZED
        );
    }
}
