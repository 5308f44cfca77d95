use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::*;
use serde_json::json;

use domain::error::{
    CredentialErrorKind, DomainErrorKind, EntityErrorKind, Error as DomainError, ExternalErrorKind,
    InternalErrorKind,
};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(pub(crate) DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

fn error_response(status_code: StatusCode, message: &str) -> Response {
    (status_code, Json(json!({ "error": message }))).into_response()
}

// Every domain error kind maps to a status code and a generic, user-safe
// message here; internal detail stays in the server log.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!("Request failed: {:?}", self.0);

        match self.0.error_kind {
            DomainErrorKind::Credential(credential_error_kind) => match credential_error_kind {
                CredentialErrorKind::MissingCode => {
                    error_response(StatusCode::BAD_REQUEST, "Missing code")
                }
                CredentialErrorKind::MissingAccessToken => {
                    error_response(StatusCode::UNAUTHORIZED, "Unauthorized: No token")
                }
                CredentialErrorKind::InvalidOrExpired => {
                    error_response(StatusCode::FORBIDDEN, "Invalid or expired token")
                }
                CredentialErrorKind::MissingRefreshToken => {
                    error_response(StatusCode::UNAUTHORIZED, "Missing refresh token")
                }
                CredentialErrorKind::RefreshMismatch => {
                    error_response(StatusCode::FORBIDDEN, "Invalid refresh token")
                }
                CredentialErrorKind::MissingIdentity => {
                    error_response(StatusCode::BAD_REQUEST, "Missing email from payload")
                }
                CredentialErrorKind::CodeExchange => {
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
                }
                CredentialErrorKind::RefreshExchange => {
                    error_response(StatusCode::FORBIDDEN, "Refresh failed")
                }
            },
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Entity(entity_error_kind) => match entity_error_kind {
                    EntityErrorKind::NotFound => {
                        error_response(StatusCode::NOT_FOUND, "User not found")
                    }
                    EntityErrorKind::Invalid => {
                        error_response(StatusCode::UNPROCESSABLE_ENTITY, "Unprocessable entity")
                    }
                    EntityErrorKind::Other(_) => {
                        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                    }
                },
                InternalErrorKind::Config => {
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Server misconfigured")
                }
                InternalErrorKind::Other(_) => {
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
            },
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::Network => error_response(StatusCode::BAD_GATEWAY, "Bad gateway"),
                ExternalErrorKind::Other(_) => {
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
            },
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
