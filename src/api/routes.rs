//! API route definitions

use axum::routing::{get, post, put};
use axum::Router;

use super::handlers;
use super::server::AppState;
use super::websocket;

/// Create the API router with all routes
///
/// Authentication is enforced per handler through the `AuthenticatedUser`
/// extractor, so public and protected routes share one table.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no auth required)
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/status", get(handlers::health::status))
        // Realtime updates
        .route("/ws", get(websocket::updates::updates_ws))
        // Auth routes
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
        // Events
        .route(
            "/events",
            get(handlers::events::list_events).post(handlers::events::create_event),
        )
        .route(
            "/events/:id",
            put(handlers::events::update_event).delete(handlers::events::delete_event),
        )
        .route("/events/:id/approve", post(handlers::events::approve_event))
        .route("/events/:id/rsvp", post(handlers::rsvp::rsvp_event))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::server::test_support::test_state;
    use crate::models::{User, UserRole};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_root_banner() {
        let response = create_router(test_state())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "OK");
        assert_eq!(body["message"], "Event Management API is running");
    }

    #[tokio::test]
    async fn test_health_reports_connections() {
        let response = create_router(test_state())
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "OK");
        assert_eq!(body["connections"], 0);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_create_event_requires_token() {
        let response = create_router(test_state())
            .oneshot(json_post(
                "/events",
                r#"{"title":"t","description":"d","date":"2030-01-01T00:00:00Z","location":"l"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Authentication required");
    }

    #[tokio::test]
    async fn test_rsvp_rejects_invalid_token() {
        let mut request = json_post(
            "/events/6f1c1a52-4f5e-4a43-9a61-0c2f7a0e8b11/rsvp",
            r#"{"status":"GOING"}"#,
        );
        request
            .headers_mut()
            .insert("Authorization", "Bearer not-a-jwt".parse().unwrap());

        let response = create_router(test_state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "Invalid token");
    }

    #[tokio::test]
    async fn test_signup_rejects_short_password() {
        let response = create_router(test_state())
            .oneshot(json_post(
                "/auth/signup",
                r#"{"email":"new@example.com","password":"123"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_signup_rejects_admin_role() {
        let response = create_router(test_state())
            .oneshot(json_post(
                "/auth/signup",
                r#"{"email":"boss@example.com","password":"secret123","role":"ADMIN"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    fn bearer(state: &AppState, role: UserRole) -> String {
        let user = User {
            id: uuid::Uuid::new_v4(),
            email: "organizer@example.com".to_string(),
            password_hash: String::new(),
            role,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        format!("Bearer {}", state.jwt_auth.generate_token(&user).unwrap())
    }

    #[tokio::test]
    async fn test_signup_missing_field_uses_envelope() {
        let response = create_router(test_state())
            .oneshot(json_post("/auth/signup", r#"{"email":"a@b.co"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "application/json"
        );
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("password"));
    }

    #[tokio::test]
    async fn test_login_malformed_json_uses_envelope() {
        let response = create_router(test_state())
            .oneshot(json_post("/auth/login", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_create_event_rejects_non_rfc3339_date() {
        let state = test_state();
        let mut request = json_post(
            "/events",
            r#"{"title":"t","description":"d","date":"next friday","location":"l"}"#,
        );
        request.headers_mut().insert(
            "Authorization",
            bearer(&state, UserRole::Organizer).parse().unwrap(),
        );

        let response = create_router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_rsvp_rejects_unknown_status() {
        let state = test_state();
        let mut request = json_post(
            "/events/6f1c1a52-4f5e-4a43-9a61-0c2f7a0e8b11/rsvp",
            r#"{"status":"YES"}"#,
        );
        request.headers_mut().insert(
            "Authorization",
            bearer(&state, UserRole::Attendee).parse().unwrap(),
        );

        let response = create_router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_ws_requires_upgrade() {
        let response = create_router(test_state())
            .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
