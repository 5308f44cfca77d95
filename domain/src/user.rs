//! Durable user-profile lookups backing identity routes.
//!
//! Access-credential claims answer "who am I" on their own; routes that need
//! profile fields stored on the record come through here instead.

use crate::error::{DomainErrorKind, EntityErrorKind, Error, InternalErrorKind};
use crate::users;
use sea_orm::DatabaseConnection;

/// Fetches the user record for a verified email, failing with a NotFound
/// kind when the record has since been deleted.
pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<users::Model, Error> {
    entity_api::user::find_by_email(db, email)
        .await?
        .ok_or_else(|| Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::NotFound,
            )),
        })
}
