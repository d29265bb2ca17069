use axum::{routing::get, Json, Router};
use service::store::repository::StoreRepository;
use tower_http::{
    cors::CorsLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;

use common::types::Health;

use crate::{state::AppState, stores};

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router
pub fn build_router<R: StoreRepository + 'static>(state: AppState<R>, cors: CorsLayer) -> Router {
    let store_routes = Router::new()
        .route("/stores", get(stores::list::<R>).post(stores::create::<R>))
        .route(
            "/stores/:id",
            get(stores::get::<R>).patch(stores::update::<R>).delete(stores::delete::<R>),
        );

    Router::new()
        .route("/health", get(health))
        .merge(store_routes)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one INFO span per request with method and path
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // status code and latency
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
