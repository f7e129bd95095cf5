use axum::{routing::get, Extension, Json, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::state::{AppState, Stats};

pub mod ws;

pub fn router(state: AppState) -> Router {
    let statics = ServeDir::new(&state.static_dir);
    Router::new()
        .merge(ws::router())
        .route("/health", get(health))
        .fallback_service(statics)
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

async fn health(Extension(state): Extension<AppState>) -> Json<Stats> {
    Json(state.stats().await)
}
