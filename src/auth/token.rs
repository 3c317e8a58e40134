//! Access tokens and password-reset tokens.
//!
//! Access tokens are HS256 JWTs carrying the user id and role names.
//! Reset tokens are random strings handed to the user; only their SHA-256
//! digest is stored.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::access::Principal;
use crate::error::{ApiError, ApiResult};

const TOKEN_TTL_HOURS: i64 = 24;
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    pub fn to_principal(&self) -> ApiResult<Principal> {
        let id = Uuid::parse_str(&self.sub)
            .map_err(|_| ApiError::Unauthenticated("Invalid or expired token".into()))?;
        Ok(Principal::new(id, self.roles.iter().cloned()))
    }
}

pub fn issue_token(secret: &str, user_id: Uuid, roles: &[String]) -> ApiResult<String> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        roles: roles.to_vec(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| ApiError::Unexpected(format!("failed to sign token: {e}")))
}

pub fn verify_token(secret: &str, token: &str) -> ApiResult<TokenClaims> {
    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthenticated("Invalid or expired token".into()))
}

/// Returns a fresh reset token together with the digest to store.
pub fn generate_reset_token() -> (String, String) {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(40)
        .map(char::from)
        .collect();
    let digest = hash_reset_token(&token);
    (token, digest)
}

pub fn hash_reset_token(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_and_carries_roles() {
        let user_id = Uuid::new_v4();
        let token = issue_token("secret", user_id, &["customer".into()]).unwrap();
        let claims = verify_token("secret", &token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.roles, vec!["customer".to_string()]);
        let principal = claims.to_principal().unwrap();
        assert_eq!(principal.id, user_id);
        assert!(principal.has_role("customer"));
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = issue_token("secret-a", Uuid::new_v4(), &[]).unwrap();
        assert!(verify_token("secret-b", &token).is_err());
    }

    #[test]
    fn reset_token_digest_is_stable() {
        let (token, digest) = generate_reset_token();
        assert_eq!(token.len(), 40);
        assert_eq!(hash_reset_token(&token), digest);
    }
}
