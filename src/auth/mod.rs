//! Bearer-token authentication and role resolution.
//!
//! Tokens are verified before any resource lookup happens, so a missing or
//! expired token always yields 401 regardless of whether the resource
//! exists. Admin gating is uniform: every admin-only operation fails with
//! the same 403 body.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{errors::ServiceError, AppState};

pub const ADMIN_ROLE: &str = "admin";

/// Claims carried by marketplace tokens. `role` may sit at the top level
/// or inside the custom-claims map, depending on token generation.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub claims: Option<HashMap<String, Value>>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Authenticated caller identity, extracted from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }

    /// Uniform admin gate used by every admin-only operation.
    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::AdminAccessRequired)
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        let role = claims.role.clone().or_else(|| {
            claims
                .claims
                .as_ref()
                .and_then(|custom| custom.get("role"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        Self {
            uid: claims.sub,
            email: claims.email,
            role,
        }
    }
}

/// Verifies a bearer token and produces the caller identity.
pub fn verify_token(secret: &str, token: &str) -> Result<AuthUser, ServiceError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| ServiceError::Unauthenticated(format!("Invalid or expired token: {e}")))?;

    Ok(AuthUser::from(data.claims))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ServiceError::Unauthenticated("Missing Authorization header".to_string())
            })?;

        let token = header_value.strip_prefix("Bearer ").ok_or_else(|| {
            ServiceError::Unauthenticated("Authorization header must be a Bearer token".to_string())
        })?;

        verify_token(&state.config.jwt_secret, token)
    }
}
