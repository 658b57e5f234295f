//! Identity seam. Token issuance and verification belong to the external
//! credential provider; this crate only needs "opaque bearer token ->
//! user id + role". `TokenDirectory` is the injected realization of that
//! contract, and `AuthUser` is the axum extractor the handlers use.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Restaurant,
    Courier,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Customer => "customer",
            Role::Restaurant => "restaurant",
            Role::Courier => "courier",
            Role::Admin => "admin",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

/// Maps opaque bearer tokens to identities. `issue` exists for wiring and
/// tests; production tokens come from the credential provider out-of-band.
pub struct TokenDirectory {
    tokens: DashMap<String, Identity>,
}

impl TokenDirectory {
    pub fn new() -> Self {
        Self {
            tokens: DashMap::new(),
        }
    }

    pub fn issue(&self, user_id: impl Into<String>, role: Role) -> String {
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(
            token.clone(),
            Identity {
                user_id: user_id.into(),
                role,
            },
        );
        token
    }

    pub fn resolve_token(&self, token: &str) -> Result<Identity, AppError> {
        self.tokens
            .get(token)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::Unauthenticated("invalid or expired token".to_string()))
    }
}

impl Default for TokenDirectory {
    fn default() -> Self {
        Self::new()
    }
}

/// The authenticated caller, resolved from the `Authorization: Bearer`
/// header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

impl AuthUser {
    /// Admins pass every role gate.
    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.role == role || self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("requires {role} role")))
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthenticated("missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthenticated("expected bearer token".to_string()))?;

        let identity = state.identity.resolve_token(token)?;

        Ok(AuthUser {
            user_id: identity.user_id,
            role: identity.role,
        })
    }
}
