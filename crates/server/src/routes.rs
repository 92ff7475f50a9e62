use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;

use common::types::Health;

use crate::state::WebPartState;

pub mod actions;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the web part router: page shell, health, and the six action routes
pub fn build_router(state: WebPartState, cors: CorsLayer) -> Router {
    let page = Router::new()
        .route("/", get(actions::index))
        .route("/health", get(health));

    let action_routes = Router::new()
        .route("/actions/list-all", post(actions::list_all))
        .route("/actions/get-one", post(actions::get_one))
        .route("/actions/get-last", post(actions::get_last))
        .route("/actions/create", post(actions::create))
        .route("/actions/update-last", post(actions::update_last))
        .route("/actions/delete-last", post(actions::delete_last));

    page
        .merge(action_routes)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx (SharePoint unreachable or failing) logged at ERROR
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
