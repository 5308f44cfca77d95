use super::error::Error;
use chrono::Utc;
use entity::users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ConnectionTrait, IntoActiveModel, Set};

pub async fn create(
    db: &impl ConnectionTrait,
    email: String,
    name: Option<String>,
    refresh_token: Option<String>,
) -> Result<Model, Error> {
    debug!("New user record to be inserted for {email}");

    let now = Utc::now();
    let user_active_model: ActiveModel = ActiveModel {
        id: Set(Id::new_v4()),
        email: Set(email),
        name: Set(name),
        refresh_token: Set(refresh_token),
        token_version: Set(0),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(user_active_model.insert(db).await?)
}

pub async fn find_by_email(db: &impl ConnectionTrait, email: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Email.eq(email))
        .one(db)
        .await?)
}

/// Looks up the user whose stored refresh credential equals `refresh_token`.
/// At most one row can match since a credential is stored for a single user.
pub async fn find_by_refresh_token(
    db: &impl ConnectionTrait,
    refresh_token: &str,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::RefreshToken.eq(refresh_token))
        .one(db)
        .await?)
}

/// Create-or-update keyed by email, from claims asserted by the identity
/// provider. A `None` refresh token preserves whatever is already stored; a
/// `None` name preserves the existing name.
pub async fn upsert_from_identity(
    db: &impl ConnectionTrait,
    email: &str,
    name: Option<String>,
    refresh_token: Option<String>,
) -> Result<Model, Error> {
    match find_by_email(db, email).await? {
        Some(existing) => {
            let mut user_active_model = existing.into_active_model();
            if name.is_some() {
                user_active_model.name = Set(name);
            }
            if let Some(token) = refresh_token {
                user_active_model.refresh_token = Set(Some(token));
            }
            user_active_model.updated_at = Set(Utc::now().into());
            Ok(user_active_model.update(db).await?)
        }
        None => create(db, email.to_string(), name, refresh_token).await,
    }
}

/// Stores a newly rotated refresh credential and bumps the version counter.
pub async fn rotate_refresh_token(
    db: &impl ConnectionTrait,
    user: Model,
    new_refresh_token: String,
) -> Result<Model, Error> {
    let next_version = user.token_version + 1;
    let mut user_active_model = user.into_active_model();
    user_active_model.refresh_token = Set(Some(new_refresh_token));
    user_active_model.token_version = Set(next_version);
    user_active_model.updated_at = Set(Utc::now().into());
    Ok(user_active_model.update(db).await?)
}

/// Nulls the stored refresh credential so any copy still held by a client can
/// no longer pass store validation.
pub async fn clear_refresh_token(db: &impl ConnectionTrait, user: Model) -> Result<Model, Error> {
    let mut user_active_model = user.into_active_model();
    user_active_model.refresh_token = Set(None);
    user_active_model.updated_at = Set(Utc::now().into());
    Ok(user_active_model.update(db).await?)
}
