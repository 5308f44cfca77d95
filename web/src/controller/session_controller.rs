//! Controller for the session credential lifecycle.
//!
//! Note: these endpoints work via browser redirects and cookies rather than
//! JSON request bodies, so the provider callback and login cannot require
//! custom headers.

use crate::cookies;
use crate::error::{Error as WebError, Result as WebResult};
use crate::extractors::session_cookies::SessionCookies;
use crate::AppState;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use domain::error::{CredentialErrorKind, DomainErrorKind, Error as DomainError};
use domain::session;
use log::*;
use serde::Deserialize;
use serde_json::json;

/// Query parameters for the OAuth callback
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
}

fn missing_credential(kind: CredentialErrorKind) -> WebError {
    WebError::from(DomainError {
        source: None,
        error_kind: DomainErrorKind::Credential(kind),
    })
}

// 302 Found, the redirect status browsers expect from these endpoints.
// axum's Redirect helpers emit 303/307/308 only.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// GET /auth/login
///
/// Redirects the browser to the provider consent URL, requesting offline
/// access and forcing consent so a refresh token is returned on first
/// authorization.
#[utoipa::path(
    get,
    path = "/auth/login",
    responses(
        (status = 302, description = "Redirect to the provider consent URL"),
        (status = 500, description = "OAuth client not configured"),
    )
)]
pub async fn login(State(app_state): State<AppState>) -> WebResult<impl IntoResponse> {
    let url = session::login_url(&app_state.config)?;
    Ok(found(&url))
}

/// GET /auth/callback
///
/// Completes the authorization-code flow: exchanges the code, upserts the
/// user record, and sets the three session cookies. Responds with a redirect
/// when a success redirect is configured, otherwise with a 200 JSON payload.
#[utoipa::path(
    get,
    path = "/auth/callback",
    params(
        ("code" = Option<String>, Query, description = "Authorization code from the provider"),
    ),
    responses(
        (status = 200, description = "Login successful, session cookies set"),
        (status = 302, description = "Login successful, redirecting to the configured target"),
        (status = 400, description = "Missing code or identity claims"),
        (status = 500, description = "Provider rejected the code exchange"),
    )
)]
pub async fn callback(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> WebResult<impl IntoResponse> {
    let code = params
        .code
        .as_deref()
        .filter(|code| !code.is_empty())
        .ok_or_else(|| missing_credential(CredentialErrorKind::MissingCode))?;

    let issued =
        session::complete_login(app_state.db_conn_ref(), &app_state.config, code).await?;

    let config = &app_state.config;
    let secure = config.is_production();

    let mut jar = jar.add(cookies::access_token(
        issued.access_token,
        config.access_token_expiry_seconds,
        secure,
    ));
    if let Some(refresh_token) = issued.refresh_token {
        jar = jar.add(cookies::refresh_token(
            refresh_token,
            config.refresh_token_expiry_seconds,
            secure,
        ));
    }
    jar = jar.add(cookies::token_version(
        issued.token_version,
        config.refresh_token_expiry_seconds,
        secure,
    ));

    let response: Response = match config.callback_success_redirect() {
        Some(target) => found(&target),
        None => (
            StatusCode::OK,
            Json(json!({ "message": "Login successful" })),
        )
            .into_response(),
    };

    Ok((jar, response))
}

/// GET /auth/refresh
///
/// Exchanges the refresh-credential cookie for a fresh access credential and
/// re-sets the access cookie. The refresh credential is unchanged.
#[utoipa::path(
    get,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Access token refreshed"),
        (status = 401, description = "Missing refresh token cookie"),
        (status = 403, description = "Refresh token mismatched or rejected by the provider"),
    )
)]
pub async fn refresh(
    State(app_state): State<AppState>,
    jar: CookieJar,
    session_cookies: SessionCookies,
) -> WebResult<impl IntoResponse> {
    let refresh_token = session_cookies
        .refresh_token()
        .ok_or_else(|| missing_credential(CredentialErrorKind::MissingRefreshToken))?;

    let access_token =
        session::refresh(app_state.db_conn_ref(), &app_state.config, &refresh_token).await?;

    let jar = jar.add(cookies::access_token(
        access_token,
        app_state.config.access_token_expiry_seconds,
        app_state.config.is_production(),
    ));

    Ok((jar, Json(json!({ "message": "Access token refreshed" }))))
}

/// GET /auth/rotate
///
/// Replaces the refresh credential with a newly generated one, bumping the
/// token version. Requires both the access and refresh cookies; the presented
/// refresh token must match the stored one.
#[utoipa::path(
    get,
    path = "/auth/rotate",
    responses(
        (status = 200, description = "Refresh token rotated"),
        (status = 401, description = "Missing access or refresh token cookie"),
        (status = 403, description = "Presented refresh token does not match the stored one"),
        (status = 500, description = "Rotation could not be persisted"),
    )
)]
pub async fn rotate(
    State(app_state): State<AppState>,
    jar: CookieJar,
    session_cookies: SessionCookies,
) -> WebResult<impl IntoResponse> {
    let access_token = session_cookies
        .access_token()
        .ok_or_else(|| missing_credential(CredentialErrorKind::MissingAccessToken))?;
    let refresh_token = session_cookies
        .refresh_token()
        .ok_or_else(|| missing_credential(CredentialErrorKind::MissingRefreshToken))?;

    if let Some(presented_version) = session_cookies.token_version() {
        // Informational only; never trusted for authorization decisions.
        trace!("Rotation requested with token_version cookie {presented_version}");
    }

    let rotated = session::rotate(
        app_state.db_conn_ref(),
        &app_state.config,
        &access_token,
        &refresh_token,
    )
    .await?;

    let config = &app_state.config;
    let secure = config.is_production();
    let jar = jar
        .add(cookies::refresh_token(
            rotated.refresh_token,
            config.refresh_token_expiry_seconds,
            secure,
        ))
        .add(cookies::token_version(
            rotated.token_version,
            config.refresh_token_expiry_seconds,
            secure,
        ));

    Ok((jar, Json(json!({ "message": "Refresh token rotated" }))))
}

/// GET /auth/logout
///
/// Always clears the three session cookies. Revocation of the stored refresh
/// credential is best-effort: it happens when the access credential still
/// verifies and never turns the logout into a failure.
#[utoipa::path(
    get,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Cookies cleared; stored refresh token revoked when possible"),
    )
)]
pub async fn logout(
    State(app_state): State<AppState>,
    jar: CookieJar,
    session_cookies: SessionCookies,
) -> impl IntoResponse {
    if let Err(error) = session::revoke(
        app_state.db_conn_ref(),
        &app_state.config,
        session_cookies.access_token().as_deref(),
    )
    .await
    {
        warn!("Best-effort refresh credential revocation failed: {error:?}");
    }

    let secure = app_state.config.is_production();
    let jar = jar
        .add(cookies::cleared(cookies::ACCESS_TOKEN_COOKIE, secure))
        .add(cookies::cleared(cookies::REFRESH_TOKEN_COOKIE, secure))
        .add(cookies::cleared(cookies::TOKEN_VERSION_COOKIE, secure));

    (
        jar,
        Json(json!({ "message": "Logged out and refresh token revoked" })),
    )
}
