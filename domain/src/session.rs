//! The session credential lifecycle: issuance, verification support,
//! refresh, rotation, and revocation.
//!
//! Exactly one refresh credential is valid per user at any time: the one
//! stored on the user record. Rotation replaces it and bumps the version
//! counter; revocation nulls it. Two concurrent rotations for the same user
//! resolve last-write-wins at the store, which is accepted under the single
//! active session assumption.

use crate::error::{CredentialErrorKind, DomainErrorKind, Error, InternalErrorKind};
use crate::gateway::google_oauth::GoogleOAuthClient;
use crate::jwt::{self, SessionClaims};
use entity_api::user as user_api;
use log::*;
use rand::RngCore;
use sea_orm::DatabaseConnection;
use service::config::Config;

/// Credentials minted by a successful authorization-code exchange.
///
/// `refresh_token` is `None` when the provider returned no refresh token and
/// no prior one was stored; the cookie layer then leaves that cookie unset.
#[derive(Debug)]
pub struct IssuedSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_version: i32,
}

/// Replacement credentials produced by a rotation.
#[derive(Debug)]
pub struct RotatedSession {
    pub refresh_token: String,
    pub token_version: i32,
}

/// Builds the provider consent URL the login route redirects to.
pub fn login_url(config: &Config) -> Result<String, Error> {
    let client = GoogleOAuthClient::from_config(config)?;
    Ok(client.get_authorization_url())
}

/// Completes the authorization-code flow: exchanges the code, resolves
/// identity claims, upserts the user record, and mints an access credential.
///
/// The stored refresh token is preserved when the exchange yields none.
pub async fn complete_login(
    db: &DatabaseConnection,
    config: &Config,
    code: &str,
) -> Result<IssuedSession, Error> {
    let client = GoogleOAuthClient::from_config(config)?;

    let tokens = client
        .exchange_code(code)
        .await
        .inspect_err(|e| warn!("Authorization code exchange failed: {e:?}"))?;

    let identity = client
        .get_user_info(&tokens.access_token)
        .await
        .map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: DomainErrorKind::Credential(CredentialErrorKind::CodeExchange),
        })?;

    let email = identity.email.ok_or_else(|| {
        warn!("Identity provider returned claims without an email");
        Error {
            source: None,
            error_kind: DomainErrorKind::Credential(CredentialErrorKind::MissingIdentity),
        }
    })?;

    let user =
        user_api::upsert_from_identity(db, &email, identity.name, tokens.refresh_token).await?;

    let access_token = mint_access(config, &user.email, user.name.clone())?;

    info!("Issued session credentials for {email}");

    Ok(IssuedSession {
        access_token,
        refresh_token: user.refresh_token,
        token_version: user.token_version,
    })
}

/// Exchanges a refresh credential for a new access credential. The refresh
/// credential itself is left unchanged; rotation is a separate, explicit
/// operation.
///
/// The presented token must match a stored one before the provider is
/// consulted, so a rotated-away or revoked token fails here with a mismatch
/// rather than reaching the provider.
pub async fn refresh(
    db: &DatabaseConnection,
    config: &Config,
    refresh_token: &str,
) -> Result<String, Error> {
    let user = user_api::find_by_refresh_token(db, refresh_token)
        .await?
        .ok_or_else(|| {
            warn!("Presented refresh token does not match any stored credential");
            Error {
                source: None,
                error_kind: DomainErrorKind::Credential(CredentialErrorKind::RefreshMismatch),
            }
        })?;

    let client = GoogleOAuthClient::from_config(config)?;

    let tokens = client
        .refresh_token(refresh_token)
        .await
        .inspect_err(|e| warn!("Refresh token exchange failed for {}: {e:?}", user.email))?;

    let identity = client
        .get_user_info(&tokens.access_token)
        .await
        .map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: DomainErrorKind::Credential(CredentialErrorKind::RefreshExchange),
        })?;

    let email = identity.email.ok_or_else(|| Error {
        source: None,
        error_kind: DomainErrorKind::Credential(CredentialErrorKind::MissingIdentity),
    })?;

    let access_token = mint_access(config, &email, identity.name)?;

    info!("Refreshed access credential for {email}");

    Ok(access_token)
}

/// Rotates the refresh credential: verifies the access credential, checks the
/// presented refresh token against the stored one, then persists a newly
/// generated token alongside an incremented version counter.
///
/// This is the only path that invalidates a previously issued refresh
/// credential other than logout.
pub async fn rotate(
    db: &DatabaseConnection,
    config: &Config,
    access_token: &str,
    refresh_token: &str,
) -> Result<RotatedSession, Error> {
    let claims = verify_access(config, access_token)?;

    let user = user_api::find_by_email(db, &claims.email)
        .await?
        .filter(|user| user.refresh_token.as_deref() == Some(refresh_token))
        .ok_or_else(|| {
            warn!(
                "Rotation rejected for {}: presented refresh token does not match stored value",
                claims.email
            );
            Error {
                source: None,
                error_kind: DomainErrorKind::Credential(CredentialErrorKind::RefreshMismatch),
            }
        })?;

    let new_refresh_token = generate_secure_token();
    let updated = user_api::rotate_refresh_token(db, user, new_refresh_token.clone()).await?;

    info!(
        "Rotated refresh credential for {} (version {})",
        claims.email, updated.token_version
    );

    Ok(RotatedSession {
        refresh_token: new_refresh_token,
        token_version: updated.token_version,
    })
}

/// Best-effort revocation on logout: when the presented access credential
/// still verifies, the stored refresh credential is nulled so any leaked
/// refresh cookie becomes useless. Never fails the logout itself over a
/// missing or unverifiable credential.
pub async fn revoke(
    db: &DatabaseConnection,
    config: &Config,
    access_token: Option<&str>,
) -> Result<(), Error> {
    let Some(token) = access_token else {
        return Ok(());
    };

    let Ok(claims) = verify_access(config, token) else {
        debug!("Logout presented an unverifiable access credential; skipping revocation");
        return Ok(());
    };

    if let Some(user) = user_api::find_by_email(db, &claims.email).await? {
        user_api::clear_refresh_token(db, user).await?;
        info!("Revoked stored refresh credential for {}", claims.email);
    }

    Ok(())
}

/// Verifies an access credential against the configured signing secret.
pub fn verify_access(config: &Config, access_token: &str) -> Result<SessionClaims, Error> {
    jwt::verify_access_token(&jwt_secret(config)?, access_token)
}

/// A freshly generated refresh credential: 64 random bytes, hex-encoded.
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; 64];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn mint_access(config: &Config, email: &str, name: Option<String>) -> Result<String, Error> {
    jwt::mint_access_token(
        &jwt_secret(config)?,
        config.access_token_expiry_seconds as i64,
        email,
        name,
    )
}

fn jwt_secret(config: &Config) -> Result<Vec<u8>, Error> {
    config.jwt_secret().map(String::into_bytes).ok_or_else(|| {
        warn!("No JWT secret configured");
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secure_token_is_high_entropy_hex() {
        let token = generate_secure_token();

        assert_eq!(token.len(), 128);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_secure_token_is_unique_across_calls() {
        let first = generate_secure_token();
        let second = generate_secure_token();

        assert_ne!(first, second);
    }
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod mock_db_tests {
    use super::*;
    use crate::{users, Id};
    use chrono::Utc;
    use clap::Parser;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_config() -> Config {
        Config::try_parse_from(["auth_platform_rs"])
            .unwrap()
            .set_google_client_id("client-id".to_string())
            .set_google_client_secret("client-secret".to_string())
            .set_google_redirect_uri("http://localhost:4000/auth/callback".to_string())
            .set_jwt_secret("test-signing-secret".to_string())
    }

    fn stored_user(refresh_token: Option<&str>, token_version: i32) -> users::Model {
        let now = Utc::now();
        users::Model {
            id: Id::new_v4(),
            email: "user@example.com".to_string(),
            name: Some("A User".to_string()),
            refresh_token: refresh_token.map(str::to_string),
            token_version,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn test_complete_login_creates_user_and_mints_credentials() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "access_token": "provider-access-token",
                    "refresh_token": "provider-refresh-token",
                    "expires_in": 3599,
                    "token_type": "Bearer"
                }"#,
            )
            .create_async()
            .await;
        let _mock = server
            .mock("GET", "/userinfo")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "1234", "email": "user@example.com", "name": "A User"}"#)
            .create_async()
            .await;

        let config = test_config()
            .set_google_token_url(format!("{}/token", server.url()))
            .set_google_userinfo_url(format!("{}/userinfo", server.url()));

        let created = stored_user(Some("provider-refresh-token"), 0);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()]) // find_by_email: no user yet
            .append_query_results([[created.clone()]]) // insert returning
            .into_connection();

        let issued = complete_login(&db, &config, "auth-code").await.unwrap();

        assert_eq!(issued.token_version, 0);
        assert_eq!(
            issued.refresh_token.as_deref(),
            Some("provider-refresh-token")
        );

        let claims = verify_access(&config, &issued.access_token).unwrap();
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.name.as_deref(), Some("A User"));
    }

    #[tokio::test]
    async fn test_refresh_with_unknown_token_fails_before_provider_exchange() {
        let config = test_config();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()]) // find_by_refresh_token: none
            .into_connection();

        let error = refresh(&db, &config, "rotated-away-token").await.unwrap_err();

        assert_eq!(
            error.error_kind,
            DomainErrorKind::Credential(CredentialErrorKind::RefreshMismatch)
        );
    }

    #[tokio::test]
    async fn test_rotate_increments_version_and_replaces_token() {
        let config = test_config();
        let access_token = jwt::mint_access_token(
            b"test-signing-secret",
            900,
            "user@example.com",
            Some("A User".to_string()),
        )
        .unwrap();

        let stored = stored_user(Some("current-refresh-token"), 1);
        let mut rotated = stored.clone();
        rotated.token_version = 2;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[stored]]) // find_by_email
            .append_query_results([[rotated]]) // update returning
            .into_connection();

        let result = rotate(&db, &config, &access_token, "current-refresh-token")
            .await
            .unwrap();

        assert_eq!(result.token_version, 2);
        assert_eq!(result.refresh_token.len(), 128);
        assert_ne!(result.refresh_token, "current-refresh-token");
    }

    #[tokio::test]
    async fn test_rotate_with_mismatched_refresh_token_fails() {
        let config = test_config();
        let access_token = jwt::mint_access_token(
            b"test-signing-secret",
            900,
            "user@example.com",
            None,
        )
        .unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[stored_user(Some("current-refresh-token"), 1)]])
            .into_connection();

        let error = rotate(&db, &config, &access_token, "stale-refresh-token")
            .await
            .unwrap_err();

        assert_eq!(
            error.error_kind,
            DomainErrorKind::Credential(CredentialErrorKind::RefreshMismatch)
        );
    }
}
