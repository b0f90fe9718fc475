use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath},
    http::{HeaderName, Request, StatusCode, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    controllers::{auth, chapters, health, manga, users},
    middlewares::{admin_middleware, jwt_auth_middleware},
    response::ApiResponse,
    state::{AppState, SharedAppState},
};

const REQUEST_ID_HEADER: &str = "x-request-id";

async fn not_found() -> (StatusCode, ApiResponse<()>) {
    (StatusCode::NOT_FOUND, ApiResponse::failure("Route not found"))
}

fn public_routes() -> Router<SharedAppState> {
    Router::new()
        .route("/api/health", get(health::index))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/manga", get(manga::index))
        .route("/api/manga/{id}", get(manga::show))
        .route("/api/manga/{id}/chapters", get(manga::chapters))
        .route("/api/chapters/{id}", get(chapters::show))
}

fn authenticated_routes(state: &SharedAppState) -> Router<SharedAppState> {
    Router::new()
        .route(
            "/api/users/profile",
            get(users::profile).put(users::update_profile),
        )
        .route("/api/users/password", put(users::password))
        .route("/api/users/stats", get(users::stats))
        .route(
            "/api/users/favorites",
            get(users::favorites).post(users::store_favorite),
        )
        .route("/api/users/favorites/{id}", delete(users::destroy_favorite))
        .route(
            "/api/users/reading-history",
            get(users::reading_history).post(users::store_reading_progress),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ))
}

/// The admin gate is layered inside the authenticated gate, so a missing token
/// is reported as 401 before any role check.
fn admin_routes(state: &SharedAppState) -> Router<SharedAppState> {
    Router::new()
        .route("/api/manga", post(manga::store))
        .route("/api/manga/history", get(manga::history))
        .route("/api/manga/{id}", put(manga::update).delete(manga::destroy))
        .route("/api/manga/{id}/cover", post(manga::cover))
        .route("/api/chapters", post(chapters::store))
        .route(
            "/api/chapters/{id}",
            put(chapters::update).delete(chapters::destroy),
        )
        .route("/api/chapters/{id}/pages", post(chapters::pages))
        .route("/api/users", get(users::index))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ))
}

pub fn init_router(app_state: AppState) -> Router {
    let body_limit = app_state.config.application.body_limit;
    let state = Arc::new(app_state);

    let x_request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);
    let request_id_middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            x_request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|val| val.to_str().ok())
                    .unwrap_or_default();
                let user_agent = request
                    .headers()
                    .get(header::USER_AGENT)
                    .and_then(|val| val.to_str().ok())
                    .unwrap_or_default();

                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str);

                tracing::info_span!(
                    "http_request",
                    request_id,
                    method = ?request.method(),
                    uri = ?request.uri(),
                    path = matched_path,
                    version = ?request.version(),
                    user_agent,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::new(x_request_id_header));

    public_routes()
        .merge(authenticated_routes(&state))
        .merge(admin_routes(&state))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(request_id_middleware)
        .with_state(state)
}
