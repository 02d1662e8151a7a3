use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            LoginRequest, LoginResponse, LogoutResponse, MeResponse, PublicUser, SignupRequest,
        },
        extractors::AuthUser,
        services::AuthService,
    },
    error::AppError,
    json::JsonBody,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users/signup", post(signup))
        .route("/users/login", post(login))
        .route("/users/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me))
}

#[instrument(skip(auth, payload))]
pub async fn signup(
    State(auth): State<AuthService>,
    JsonBody(payload): JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let user = auth.signup(&payload.username, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(auth, payload))]
pub async fn login(
    State(auth): State<AuthService>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let access_token = auth.login(&payload.username, &payload.password).await?;
    Ok(Json(LoginResponse {
        success: true,
        message: "User logged in successfully".into(),
        access_token,
    }))
}

#[instrument(skip_all)]
pub async fn logout(
    State(auth): State<AuthService>,
    AuthUser(claims): AuthUser,
) -> Result<Json<LogoutResponse>, AppError> {
    auth.logout(&claims).await?;
    Ok(Json(LogoutResponse {
        success: true,
        message: "User logged out".into(),
    }))
}

#[instrument(skip_all, fields(username = %claims.username))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let user = state
        .users
        .find_by_username(&claims.username)
        .await?
        .ok_or(AppError::NotFound("Account not found"))?;

    Ok(Json(MeResponse {
        user: user.into(),
        token_expires_at: claims.expires_at(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::{app::build_app, state::AppState, test_util::send};

    async fn signed_up_app() -> axum::Router {
        let app = build_app(AppState::fake());
        let (status, _) = send(
            &app,
            Method::POST,
            "/users/signup",
            None,
            Some(json!({ "username": "newuser123", "password": "123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        app
    }

    async fn login(app: &axum::Router) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/users/login",
            None,
            Some(json!({ "username": "newuser123", "password": "123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["accessToken"].as_str().expect("token").to_string()
    }

    #[tokio::test]
    async fn signup_response_is_redacted() {
        let app = build_app(AppState::fake());
        let (status, body) = send(
            &app,
            Method::POST,
            "/users/signup",
            None,
            Some(json!({ "username": "newuser123", "password": "123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["username"], "newuser123");
        assert!(body.get("passwordHash").is_none());
        assert!(body.get("password_hash").is_none());
        assert!(body.get("activeToken").is_none());
        assert!(body["createdAt"].is_string());
    }

    #[tokio::test]
    async fn duplicate_signup_is_400() {
        let app = signed_up_app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/users/signup",
            None,
            Some(json!({ "username": "newuser123", "password": "other" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], true);
    }

    #[tokio::test]
    async fn login_failures_map_to_status_codes() {
        let app = signed_up_app().await;

        let (status, _) = send(&app, Method::POST, "/users/login", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            Method::POST,
            "/users/login",
            None,
            Some(json!({ "username": "", "password": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            Method::POST,
            "/users/login",
            None,
            Some(json!({ "username": "nouser", "password": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Account not found");

        let (status, body) = send(
            &app,
            Method::POST,
            "/users/login",
            None,
            Some(json!({ "username": "newuser123", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid password");
    }

    #[tokio::test]
    async fn full_session_lifecycle() {
        let app = signed_up_app().await;
        let token = login(&app).await;
        assert!(!token.is_empty());

        let (status, body) = send(&app, Method::GET, "/users/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "newuser123");

        let (status, body) = send(&app, Method::POST, "/users/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, body) = send(&app, Method::POST, "/users/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Authorization error");
    }

    #[tokio::test]
    async fn bearer_prefix_is_accepted() {
        let app = signed_up_app().await;
        let token = login(&app).await;
        let header = format!("Bearer {}", token);
        let (status, _) = send(&app, Method::GET, "/users/me", Some(&header), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn logout_without_token_is_401() {
        let app = signed_up_app().await;
        let (status, body) = send(&app, Method::POST, "/users/logout", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Access token is missing");
    }

    #[tokio::test]
    async fn replaced_token_is_403() {
        let app = signed_up_app().await;
        let first = login(&app).await;
        let _second = login(&app).await;
        let (status, _) = send(&app, Method::GET, "/users/me", Some(&first), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unreadable_authorization_header_is_403() {
        use axum::{
            body::Body,
            http::{header, HeaderValue, Request},
        };
        use tower::ServiceExt;

        let app = signed_up_app().await;
        let req = Request::builder()
            .method(Method::GET)
            .uri("/users/me")
            .header(
                header::AUTHORIZATION,
                HeaderValue::from_bytes(b"\xfftoken").unwrap(),
            )
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
