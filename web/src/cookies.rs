//! Session cookie construction and clearing.
//!
//! Three cookies carry session state to the client: the signed access
//! credential, the opaque refresh credential, and the informational token
//! version. All are HttpOnly, SameSite=Strict, Path=/, and Secure when the
//! server runs in production.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

pub(crate) const ACCESS_TOKEN_COOKIE: &str = "token";
pub(crate) const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub(crate) const TOKEN_VERSION_COOKIE: &str = "token_version";

fn session_cookie(
    name: &'static str,
    value: String,
    max_age: Duration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .secure(secure)
        .max_age(max_age)
        .build()
}

pub(crate) fn access_token(value: String, ttl_seconds: u64, secure: bool) -> Cookie<'static> {
    session_cookie(
        ACCESS_TOKEN_COOKIE,
        value,
        Duration::seconds(ttl_seconds as i64),
        secure,
    )
}

pub(crate) fn refresh_token(value: String, ttl_seconds: u64, secure: bool) -> Cookie<'static> {
    session_cookie(
        REFRESH_TOKEN_COOKIE,
        value,
        Duration::seconds(ttl_seconds as i64),
        secure,
    )
}

pub(crate) fn token_version(version: i32, ttl_seconds: u64, secure: bool) -> Cookie<'static> {
    session_cookie(
        TOKEN_VERSION_COOKIE,
        version.to_string(),
        Duration::seconds(ttl_seconds as i64),
        secure,
    )
}

/// An expired copy of a session cookie. Attributes must match the originals
/// for browsers to actually drop them.
pub(crate) fn cleared(name: &'static str, secure: bool) -> Cookie<'static> {
    session_cookie(name, String::new(), Duration::ZERO, secure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_cookie_attributes() {
        let cookie = access_token("signed-jwt".to_string(), 900, false);
        let rendered = cookie.to_string();

        assert!(rendered.starts_with("token=signed-jwt"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Strict"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=900"));
        assert!(!rendered.contains("Secure"));
    }

    #[test]
    fn test_refresh_token_cookie_lives_seven_days() {
        let cookie = refresh_token("opaque".to_string(), 604_800, false);

        assert!(cookie.to_string().contains("Max-Age=604800"));
    }

    #[test]
    fn test_production_cookies_are_secure() {
        let cookie = token_version(3, 604_800, true);
        let rendered = cookie.to_string();

        assert!(rendered.starts_with("token_version=3"));
        assert!(rendered.contains("Secure"));
    }

    #[test]
    fn test_cleared_cookie_expires_immediately() {
        let cookie = cleared(REFRESH_TOKEN_COOKIE, false);
        let rendered = cookie.to_string();

        assert!(rendered.starts_with("refresh_token="));
        assert!(rendered.contains("Max-Age=0"));
    }
}
