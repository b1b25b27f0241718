use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    AppState,
    auth::session,
    errors::{Error, Result},
};

/// The verified identity behind a bearer token.
///
/// Handlers that write on behalf of a user take this extractor, and
/// extraction fails closed: a missing or unverifiable token rejects the
/// request before any blob or metadata write happens.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: Option<String>,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .ok_or(Error::Unauthenticated { message: None })?;

        let header = header.to_str().map_err(|_| Error::Unauthenticated {
            message: Some("Invalid authorization header".to_string()),
        })?;

        let token = header.strip_prefix("Bearer ").ok_or(Error::Unauthenticated {
            message: Some("Expected a bearer token".to_string()),
        })?;

        let claims = session::verify_bearer_token(token, &state.config)?;
        tracing::debug!(user_id = %claims.sub, "authenticated bearer token");

        Ok(AuthenticatedUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}
