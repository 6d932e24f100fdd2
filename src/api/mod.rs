use axum::{Router, routing::post};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::dispatch::Dispatcher;

pub mod handlers;
pub mod models;

/// `route_prefix` is expected normalised (see `config::normalize_prefix`);
/// an empty prefix mounts the routes at the root.
pub fn create_router(dispatcher: Dispatcher, route_prefix: &str) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes = Router::new()
        .route("/global_search", post(handlers::global_search_handler))
        .route("/local_search", post(handlers::local_search_handler))
        .route("/search", post(handlers::search_handler))
        .with_state(dispatcher);

    let router = if route_prefix.is_empty() {
        routes
    } else {
        Router::new().nest(route_prefix, routes)
    };

    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
        .on_response(DefaultOnResponse::new().level(tracing::Level::INFO));

    router.layer(trace).layer(cors)
}
