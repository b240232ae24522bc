//! `AuthUser` extractor — reads the identity headers set by the fronting
//! auth proxy and injects a request context.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use stowage_core::error::AppError;
use stowage_service::context::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the verified principal ID.
const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the verified principal email.
const USER_EMAIL_HEADER: &str = "x-user-email";

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub RequestContext);

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::access_denied("Missing identity header"))?
            .parse::<Uuid>()
            .map_err(|_| AppError::access_denied("Invalid identity header"))?;

        let email = parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Ok(AuthUser(RequestContext::new(user_id, email)))
    }
}
