use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post, put};
use cantoria_core::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Validation(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/auth/sign-in", post(handlers::auth::sign_in_handler))
        .route("/auth/sign-up", post(handlers::auth::sign_up_handler))
        .route("/auth/sign-out", post(handlers::auth::sign_out_handler))
        .route("/auth/refresh", post(handlers::auth::refresh_handler))
        .route("/auth/me", get(handlers::auth::me_handler));

    let api_routes = Router::new()
        .route(
            "/api/profile",
            put(handlers::profile::update_profile_handler),
        )
        .route(
            "/api/members/{user_id}/role",
            put(handlers::profile::assign_role_handler),
        )
        .route(
            "/api/permissions/{permission}",
            get(handlers::permissions::permission_check_handler),
        );

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/navigation", get(handlers::navigation::navigation_handler))
        .route("/sections/{resource}", get(handlers::sections::section_handler))
        .merge(auth_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state))
}
