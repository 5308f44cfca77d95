use crate::error::Result as WebResult;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::AppState;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use domain::user;
use serde_json::json;

/// GET /me
///
/// Identity comes from the verified access-credential claims; profile fields
/// are re-fetched from the user record, which may have been deleted since the
/// credential was minted.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The authenticated user's profile"),
        (status = 401, description = "No access token cookie"),
        (status = 403, description = "Invalid or expired access token"),
        (status = 404, description = "User record no longer exists"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn me(
    AuthenticatedUser(claims): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = user::find_by_email(app_state.db_conn_ref(), &claims.email).await?;

    Ok(Json(json!({
        "email": user.email,
        "name": user.name,
        "createdAt": user.created_at,
    })))
}
