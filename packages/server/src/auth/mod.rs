use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token validation failed: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// Claims carried in session tokens minted by the external auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub exp: usize,
}

/// Validates session tokens. This service never mints tokens; signing
/// happens in the auth service that shares the HS256 secret.
pub struct SessionService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionService {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

/// The caller behind a request, extracted from the Bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;

        let claims = state
            .session_service
            .validate_token(token)
            .map_err(|_| ApiError::Unauthorized)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthenticatedUser { user_id, email: claims.email, name: claims.name })
    }
}
