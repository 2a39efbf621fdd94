//! Router configuration for the web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use super::handlers::{
    delete_resource, download_file, get_resource, list_resources, list_users, login, register,
    update_resource, update_role, upload_path_lookup, upload_resource, AppState,
};
use super::middleware::{
    api_rate_limit, create_cors_layer, login_rate_limit, security_headers, token_auth,
    RateLimitState,
};
use super::error::ApiError;
use super::openapi::create_openapi_router;
use crate::config::WebConfig;

/// Multipart framing allowance on top of the configured file size limit.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Create the main API router.
///
/// `rate_limit_state` is shared by the login and API limiters. Its cleanup
/// task is owned by the caller.
pub fn create_router(
    app_state: Arc<AppState>,
    rate_limit_state: Arc<RateLimitState>,
    config: &WebConfig,
) -> Router {
    let body_limit = usize::try_from(app_state.max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let login_limiter = rate_limit_state.clone();
    let auth_routes = Router::new()
        .route(
            "/login",
            post(login).layer(middleware::from_fn(move |req, next| {
                login_rate_limit(login_limiter.clone(), req, next)
            })),
        )
        .route("/register", post(register))
        .route("/users", get(list_users))
        .route("/update-role/:user_id", put(update_role));

    let resource_routes = Router::new()
        .route("/", get(list_resources))
        .route("/upload", post(upload_resource).get(upload_path_lookup))
        .route(
            "/:id",
            get(get_resource)
                .put(update_resource)
                .delete(delete_resource),
        )
        .layer(DefaultBodyLimit::max(body_limit));

    let api_limiter = rate_limit_state.clone();
    let token_issuer = app_state.tokens.clone();

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/resources", resource_routes)
        .route("/files/:storage_id", get(download_file))
        .merge(create_health_router())
        .merge(create_openapi_router())
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(&config.cors_origins))
                .layer(CompressionLayer::new())
                .layer(middleware::from_fn(security_headers))
                .layer(middleware::from_fn(move |req, next| {
                    api_rate_limit(api_limiter.clone(), req, next)
                }))
                .layer(middleware::from_fn(move |req, next| {
                    token_auth(token_issuer.clone(), req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health_check))
}

/// JSON 404 for unmatched routes.
async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
