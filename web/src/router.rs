use crate::controller::{health_check_controller, session_controller, user_controller};
use crate::AppState;
use axum::{routing::get, Router};

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Auth Platform API"
        ),
        paths(
            session_controller::login,
            session_controller::callback,
            session_controller::refresh,
            session_controller::rotate,
            session_controller::logout,
            user_controller::me,
            health_check_controller::health_check,
        ),
        components(
            schemas(
                domain::users::Model,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "auth_platform", description = "Session credential lifecycle API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines our cookie based authentication requirement for gaining access to our
// API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "token",
                    "Signed access credential returned from a successful login via Set-Cookie header",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(session_routes(app_state.clone()))
        .merge(user_routes(app_state))
        .merge(health_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

// Both deployment variants are served: the bare /auth/* paths and the
// /api/auth/* aliases hit the same handlers.
fn session_routes(app_state: AppState) -> Router {
    let routes = Router::new()
        .route("/login", get(session_controller::login))
        .route("/callback", get(session_controller::callback))
        .route("/refresh", get(session_controller::refresh))
        .route("/rotate", get(session_controller::rotate))
        .route("/logout", get(session_controller::logout));

    Router::new()
        .nest("/auth", routes.clone())
        .nest("/api/auth", routes)
        .with_state(app_state)
}

fn user_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/me", get(user_controller::me))
        .route("/api/auth/me", get(user_controller::me))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use clap::Parser;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use service::config::Config;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let config = Config::try_parse_from(["auth_platform_rs"]).unwrap();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );
        define_routes(AppState::new(config, &db))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_login_redirects_to_provider_consent_url() {
        let config = Config::try_parse_from(["auth_platform_rs"])
            .unwrap()
            .set_google_client_id("client-id".to_string())
            .set_google_client_secret("client-secret".to_string())
            .set_google_redirect_uri("http://localhost:4000/auth/callback".to_string());
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );
        let app = define_routes(AppState::new(config, &db));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/auth/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response
            .headers()
            .get("location")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(location.contains("access_type=offline"));
        assert!(location.contains("prompt=consent"));
    }

    #[tokio::test]
    async fn test_me_without_cookie_returns_401() {
        let response = test_app()
            .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "Unauthorized: No token" })
        );
    }

    #[tokio::test]
    async fn test_me_alias_route_behaves_identically() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_without_cookie_returns_401() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/auth/refresh")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "Missing refresh token" })
        );
    }

    #[tokio::test]
    async fn test_callback_without_code_returns_400() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/auth/callback")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "Missing code" })
        );
    }

    #[tokio::test]
    async fn test_logout_always_clears_all_three_cookies() {
        // No cookies presented at all; logout must still succeed and clear.
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/auth/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let cleared: Vec<String> = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect();

        assert_eq!(cleared.len(), 3);
        for name in ["token=", "refresh_token=", "token_version="] {
            assert!(
                cleared
                    .iter()
                    .any(|cookie| cookie.starts_with(name) && cookie.contains("Max-Age=0")),
                "expected a cleared {name} cookie"
            );
        }
    }

    #[tokio::test]
    async fn test_health_check_is_unauthenticated() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
