//! Typed access to the named session cookies.
//!
//! Handlers read cookies through this extractor rather than poking at raw
//! headers: one `Option<String>` per named cookie.

use crate::cookies::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, TOKEN_VERSION_COOKIE};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use std::convert::Infallible;

pub(crate) struct SessionCookies {
    jar: CookieJar,
}

impl SessionCookies {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            jar: CookieJar::from_headers(headers),
        }
    }

    pub(crate) fn access_token(&self) -> Option<String> {
        self.value_of(ACCESS_TOKEN_COOKIE)
    }

    pub(crate) fn refresh_token(&self) -> Option<String> {
        self.value_of(REFRESH_TOKEN_COOKIE)
    }

    pub(crate) fn token_version(&self) -> Option<String> {
        self.value_of(TOKEN_VERSION_COOKIE)
    }

    fn value_of(&self, name: &str) -> Option<String> {
        self.jar
            .get(name)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
    }
}

impl<S> FromRequestParts<S> for SessionCookies
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SessionCookies::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_all_three_cookies_are_read_by_name() {
        let headers =
            headers_with_cookie("token=signed-jwt; refresh_token=opaque; token_version=2");
        let cookies = SessionCookies::from_headers(&headers);

        assert_eq!(cookies.access_token().as_deref(), Some("signed-jwt"));
        assert_eq!(cookies.refresh_token().as_deref(), Some("opaque"));
        assert_eq!(cookies.token_version().as_deref(), Some("2"));
    }

    #[test]
    fn test_absent_cookies_read_as_none() {
        let cookies = SessionCookies::from_headers(&HeaderMap::new());

        assert!(cookies.access_token().is_none());
        assert!(cookies.refresh_token().is_none());
        assert!(cookies.token_version().is_none());
    }

    #[test]
    fn test_empty_cookie_values_read_as_none() {
        let headers = headers_with_cookie("token=; refresh_token=opaque");
        let cookies = SessionCookies::from_headers(&headers);

        assert!(cookies.access_token().is_none());
        assert_eq!(cookies.refresh_token().as_deref(), Some("opaque"));
    }
}
