use std::path::Path;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    middleware,
    routing::{get, post},
};
use core_pitch::health_router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod clients;
pub mod headers;
pub mod logging_middleware;
pub mod shopify;
pub mod uploads;

//
// Router
//

pub fn router(public_dir: &Path) -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let upload_routes = Router::new()
        .route("/api/upload-logo", post(uploads::post_upload_logo))
        .route("/api/upload-image", post(uploads::post_upload_image))
        .layer(DefaultBodyLimit::max(uploads::UPLOAD_BODY_LIMIT));

    Router::new()
        .route("/", get(clients::get_template))
        .route("/api/create-client", post(clients::post_create_client))
        .route("/api/clients", get(clients::get_clients))
        .route("/api/client/{client_id}", get(clients::get_client))
        .route("/api/client/{client_id}/mirror", get(clients::get_mirror_status))
        .route("/client/{client_id}", get(clients::get_client_page))
        .route("/api/shopify/token", post(shopify::post_token))
        .route("/api/shopify/token/{shop}", get(shopify::get_token))
        .route("/api/shopify/tokens", get(shopify::get_tokens))
        .merge(upload_routes)
        .merge(health_router())
        // Generated pages and uploaded images, straight from disk
        .nest_service("/clients", ServeDir::new(public_dir.join("clients")))
        .nest_service("/uploads", ServeDir::new(public_dir.join("uploads")))
        // Pages are meant to be embedded by other sites
        .layer(middleware::from_fn(headers::allow_framing))
        .layer(cors)
        // Custom route access logging
        .layer(middleware::from_fn(logging_middleware::log_route_access))
        // Tracing middleware
        .layer(TraceLayer::new_for_http())
}
