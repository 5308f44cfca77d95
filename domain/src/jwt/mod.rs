//! Minting and verification of session access credentials.
//!
//! An access credential is an HS256 JWT over [`SessionClaims`], signed with
//! the shared `JWT_SECRET`. Verification is stateless: only the secret and
//! the embedded expiry are consulted, never the user store.

use crate::error::{CredentialErrorKind, DomainErrorKind, Error};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::*;

pub(crate) mod claims;

pub use claims::SessionClaims;

/// Mints a signed access credential carrying the given identity claims,
/// expiring `ttl_seconds` from now.
pub fn mint_access_token(
    secret: &[u8],
    ttl_seconds: i64,
    email: &str,
    name: Option<String>,
) -> Result<String, Error> {
    let now = Utc::now();
    let claims = SessionClaims {
        email: email.to_string(),
        name,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )?)
}

/// Verifies signature and expiry, returning the embedded claims.
pub fn verify_access_token(secret: &[u8], token: &str) -> Result<SessionClaims, Error> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!("Access credential rejected: {:?}", e.kind());
        Error {
            source: Some(Box::new(e)),
            error_kind: DomainErrorKind::Credential(CredentialErrorKind::InvalidOrExpired),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-signing-secret";

    #[test]
    fn test_mint_and_verify_round_trip() {
        let token = mint_access_token(SECRET, 900, "user@example.com", Some("A User".to_string()))
            .unwrap();

        let claims = verify_access_token(SECRET, &token).unwrap();

        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.name.as_deref(), Some("A User"));
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        // Mint a token that expired well past the default verification leeway.
        let token = mint_access_token(SECRET, -300, "user@example.com", None).unwrap();

        let error = verify_access_token(SECRET, &token).unwrap_err();

        assert_eq!(
            error.error_kind,
            DomainErrorKind::Credential(CredentialErrorKind::InvalidOrExpired)
        );
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = mint_access_token(SECRET, 900, "user@example.com", None).unwrap();

        let error = verify_access_token(b"a-different-secret", &token).unwrap_err();

        assert_eq!(
            error.error_kind,
            DomainErrorKind::Credential(CredentialErrorKind::InvalidOrExpired)
        );
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let error = verify_access_token(SECRET, "not-a-jwt").unwrap_err();

        assert_eq!(
            error.error_kind,
            DomainErrorKind::Credential(CredentialErrorKind::InvalidOrExpired)
        );
    }
}
