use crate::extractors::session_cookies::SessionCookies;
use crate::extractors::RejectionType;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use domain::jwt::SessionClaims;
use domain::session;
use log::*;
use serde_json::json;
use service::AppState;

/// Verifies the access-credential cookie and hands its embedded claims to the
/// handler. Missing cookie rejects with 401, failed verification with 403;
/// the claims are never re-fetched from the user store here.
pub(crate) struct AuthenticatedUser(pub(crate) SessionClaims);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = RejectionType;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = SessionCookies::from_headers(&parts.headers);

        let access_token = cookies.access_token().ok_or((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Unauthorized: No token" })),
        ))?;

        match session::verify_access(&state.config, &access_token) {
            Ok(claims) => Ok(AuthenticatedUser(claims)),
            Err(error) => {
                warn!("Access credential verification failed: {error:?}");
                Err((
                    StatusCode::FORBIDDEN,
                    Json(json!({ "error": "Invalid or expired token" })),
                ))
            }
        }
    }
}
