// src/routes.rs

use std::sync::Arc;

use axum::{
    Router, http::Method, middleware,
    routing::{get, post},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{auth, quiz, response},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, quizzes, responses).
/// * Applies global middleware (Trace, CORS) and rate limiting on auth.
/// * Injects global state (pool, config, OTP store, mailer).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // OTP endpoints send email; keep them behind a per-IP limiter.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(5)
            .finish()
            .unwrap(),
    );

    let auth_routes = Router::new()
        .route("/request-otp", post(auth::request_otp))
        .route("/verify-otp", post(auth::verify_otp))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/request-password-reset", post(auth::request_password_reset))
        .route("/reset-password", post(auth::reset_password))
        .route("/verify-token", get(auth::verify_token))
        .layer(GovernorLayer::new(governor_conf));

    let quiz_routes = Router::new()
        // Public: the take-quiz page loads this via the share link.
        .route("/{quiz_id}", get(quiz::get_quiz))
        // Protected creator routes
        .merge(
            Router::new()
                .route("/", post(quiz::create_quiz).get(quiz::list_quizzes))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let response_routes = Router::new()
        .route("/", post(response::submit_response))
        .route("/public/{quiz_id}/{name}", get(response::public_results))
        // Leaderboard is creator-only
        .merge(
            Router::new()
                .route("/{quiz_id}", get(response::view_responses))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/responses", response_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
