use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("{0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("refresh tokens cannot be used to call the API")]
    NotAccessToken,
}

/// Verifies signature and expiry and only lets access tokens through.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?
    .claims;

    if claims.token_type != TokenType::Access {
        return Err(TokenError::NotAccessToken);
    }
    Ok(claims)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::time::{SystemTime, UNIX_EPOCH};

    use jsonwebtoken::{EncodingKey, Header, encode};
    use uuid::Uuid;

    use super::{Claims, TokenType};

    pub fn issue_token(
        user_id: u64,
        role: u8,
        employee_id: Option<u64>,
        token_type: TokenType,
        secret: &str,
        ttl: i64,
    ) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;

        let claims = Claims {
            user_id,
            sub: format!("user{user_id}"),
            role,
            exp: (now + ttl).max(0) as usize,
            jti: Uuid::new_v4().to_string(),
            token_type,
            employee_id,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    pub fn access_token(role: u8, employee_id: Option<u64>, secret: &str) -> String {
        issue_token(1, role, employee_id, TokenType::Access, secret, 900)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::issue_token;
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_access_token_round_trip() {
        let token = issue_token(7, 3, Some(12), TokenType::Access, SECRET, 900);
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.role, 3);
        assert_eq!(claims.employee_id, Some(12));
    }

    #[test]
    fn test_refresh_token_is_refused() {
        let token = issue_token(7, 3, None, TokenType::Refresh, SECRET, 900);
        assert!(matches!(
            verify_token(&token, SECRET),
            Err(TokenError::NotAccessToken)
        ));
    }

    #[test]
    fn test_wrong_secret_and_expiry() {
        let token = issue_token(7, 3, None, TokenType::Access, SECRET, 900);
        assert!(matches!(
            verify_token(&token, "other"),
            Err(TokenError::Invalid(_))
        ));

        // Beyond the default 60s leeway.
        let expired = issue_token(7, 3, None, TokenType::Access, SECRET, -3600);
        assert!(matches!(
            verify_token(&expired, SECRET),
            Err(TokenError::Invalid(_))
        ));
    }
}
