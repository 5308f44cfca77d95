//! Google OAuth client.
//!
//! This module provides an HTTP client for the two token grants this system
//! relies on (authorization code and refresh token) plus the userinfo lookup
//! that resolves identity claims. The client holds no per-request credential
//! state; the refresh token is always an explicit parameter.

use crate::error::{
    CredentialErrorKind, DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind,
};
use log::*;
use serde::{Deserialize, Serialize};
use service::config::Config;
use std::time::Duration;

/// OAuth token response from Google
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub token_type: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scope: String,
}

/// User info from Google
#[derive(Debug, Deserialize)]
pub struct GoogleUserInfo {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Request to exchange authorization code for tokens
#[derive(Debug, Serialize)]
struct TokenExchangeRequest {
    code: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    grant_type: String,
}

/// Request to refresh access token
#[derive(Debug, Serialize)]
struct TokenRefreshRequest {
    refresh_token: String,
    client_id: String,
    client_secret: String,
    grant_type: String,
}

/// Configuration for Google OAuth URLs
#[derive(Debug, Clone)]
pub struct GoogleOAuthUrls {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl GoogleOAuthUrls {
    pub fn from_config(config: &Config) -> Self {
        Self {
            auth_url: config.google_auth_url().to_string(),
            token_url: config.google_token_url().to_string(),
            userinfo_url: config.google_userinfo_url().to_string(),
        }
    }
}

/// Google OAuth client for the authorization-code and refresh-token grants
pub struct GoogleOAuthClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    urls: GoogleOAuthUrls,
}

impl GoogleOAuthClient {
    /// Create a new Google OAuth client with configurable URLs and a bounded
    /// per-request timeout.
    pub fn new(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        urls: GoogleOAuthUrls,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            urls,
        })
    }

    /// Build a client from config, failing with a Config error kind when any
    /// of the required Google settings are unset.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let client_id = config.google_client_id().ok_or_else(missing_config)?;
        let client_secret = config.google_client_secret().ok_or_else(missing_config)?;
        let redirect_uri = config.google_redirect_uri().ok_or_else(missing_config)?;

        Self::new(
            &client_id,
            &client_secret,
            &redirect_uri,
            GoogleOAuthUrls::from_config(config),
            Duration::from_secs(config.provider_timeout_seconds),
        )
    }

    /// Generate the OAuth authorization URL for user consent.
    ///
    /// `access_type=offline` plus `prompt=consent` guarantees Google returns a
    /// refresh token on the first authorization.
    pub fn get_authorization_url(&self) -> String {
        let scopes = ["profile", "email"].join(" ");

        format!(
            "{}?\
            client_id={}&\
            redirect_uri={}&\
            response_type=code&\
            scope={}&\
            access_type=offline&\
            prompt=consent",
            self.urls.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&scopes),
        )
    }

    /// Exchange authorization code for access and refresh tokens
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, Error> {
        let request = TokenExchangeRequest {
            code: code.to_string(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: self.redirect_uri.clone(),
            grant_type: "authorization_code".to_string(),
        };

        debug!("Exchanging Google OAuth code for tokens");

        let response = self
            .client
            .post(&self.urls.token_url)
            .form(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to exchange Google OAuth code: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::Credential(CredentialErrorKind::CodeExchange),
                }
            })?;

        if response.status().is_success() {
            let tokens: TokenResponse = response.json().await.map_err(|e| {
                warn!("Failed to parse Google token response: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Other(
                        "Invalid response from Google OAuth".to_string(),
                    )),
                }
            })?;
            info!("Successfully exchanged Google OAuth code for tokens");
            Ok(tokens)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Google OAuth code exchange rejected: {}", error_text);
            Err(Error {
                source: None,
                error_kind: DomainErrorKind::Credential(CredentialErrorKind::CodeExchange),
            })
        }
    }

    /// Exchange a refresh token for a fresh access token. The refresh token
    /// itself is unchanged by this grant.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, Error> {
        let request = TokenRefreshRequest {
            refresh_token: refresh_token.to_string(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            grant_type: "refresh_token".to_string(),
        };

        debug!("Refreshing Google access token");

        let response = self
            .client
            .post(&self.urls.token_url)
            .form(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to refresh Google token: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::Credential(CredentialErrorKind::RefreshExchange),
                }
            })?;

        if response.status().is_success() {
            let tokens: TokenResponse = response.json().await.map_err(|e| {
                warn!("Failed to parse Google token refresh response: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Other(
                        "Invalid response from Google OAuth".to_string(),
                    )),
                }
            })?;
            info!("Successfully refreshed Google access token");
            Ok(tokens)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Google token refresh rejected: {}", error_text);
            Err(Error {
                source: None,
                error_kind: DomainErrorKind::Credential(CredentialErrorKind::RefreshExchange),
            })
        }
    }

    /// Get user info using the access token
    pub async fn get_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, Error> {
        let response = self
            .client
            .get(&self.urls.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to get Google user info: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
                }
            })?;

        if response.status().is_success() {
            let user_info: GoogleUserInfo = response.json().await.map_err(|e| {
                warn!("Failed to parse Google user info: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Other(
                        "Invalid response from Google".to_string(),
                    )),
                }
            })?;
            Ok(user_info)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Google user info error: {}", error_text);
            Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(error_text)),
            })
        }
    }
}

fn missing_config() -> Error {
    Error {
        source: None,
        error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
    }
}
