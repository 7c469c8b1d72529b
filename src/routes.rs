// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, enrollment, mission, submission},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, enrollments, missions, stations, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins: [HeaderValue; 2] = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let enrollment_routes = Router::new()
        .route(
            "/",
            post(enrollment::enroll).put(enrollment::update_shirt_size),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let mission_routes = Router::new()
        .route("/{id}", get(mission::get_mission))
        // Protected submission routes
        .merge(
            Router::new()
                .route("/{id}/submissions", post(submission::submit_mission))
                .route("/{id}/result", get(submission::get_result))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let station_routes = Router::new().route("/{id}/missions", get(mission::list_station_missions));

    let admin_routes = Router::new()
        .route("/camps", post(admin::create_camp))
        .route("/stations", post(admin::create_station))
        .route("/missions", post(admin::create_mission))
        .route("/missions/{id}", delete(admin::delete_mission))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/enrollments", enrollment_routes)
        .nest("/api/missions", mission_routes)
        .nest("/api/stations", station_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
