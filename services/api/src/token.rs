//! services/api/src/token.rs
//!
//! Issuance and verification of the HS256 access tokens handed out at login.

use chrono::Utc;
use educonnect_core::domain::Role;
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    /// Role name as stored on the user (`admin`, `tutor`, `student`).
    pub role: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// The caller's role. Unknown role names are treated as students.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_default()
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    /// True when the caller is `email` or an admin.
    pub fn may_act_for(&self, email: &str) -> bool {
        self.is_admin() || self.email.eq_ignore_ascii_case(email.trim())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("could not sign token: {0}")]
    Signing(String),
}

/// Signs a token for `email` with `role`, valid for `ttl`.
pub fn issue_token(
    email: &str,
    role: Role,
    secret: &str,
    ttl: chrono::Duration,
) -> Result<String, TokenError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        email: email.to_string(),
        role: role.as_str().to_string(),
        iat: now,
        exp: now + ttl.num_seconds(),
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Verifies signature and expiry and returns the claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(e.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issued_token_verifies() {
        let token = issue_token(
            "ann@example.com",
            Role::Tutor,
            SECRET,
            chrono::Duration::hours(24),
        )
        .unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.email, "ann@example.com");
        assert_eq!(claims.role(), Role::Tutor);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = issue_token(
            "ann@example.com",
            Role::Student,
            SECRET,
            chrono::Duration::hours(1),
        )
        .unwrap();
        assert!(matches!(verify_token(&token, "other"), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let token = issue_token(
            "ann@example.com",
            Role::Admin,
            SECRET,
            chrono::Duration::hours(-1),
        )
        .unwrap();
        assert!(matches!(verify_token(&token, SECRET), Err(TokenError::Expired)));
    }

    #[test]
    fn only_admins_act_for_other_users() {
        let claims = |role: &str| Claims {
            email: "ann@example.com".to_string(),
            role: role.to_string(),
            iat: 0,
            exp: 0,
        };
        assert!(claims("tutor").may_act_for("Ann@Example.com"));
        assert!(!claims("tutor").may_act_for("bob@example.com"));
        assert!(claims("admin").may_act_for("bob@example.com"));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(verify_token("not.a.jwt", SECRET), Err(TokenError::Invalid(_))));
    }
}
