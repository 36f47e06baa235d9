use axum::extract::State;
use axum::response::{IntoResponse, Response};

use crate::utils::response::success;
use crate::AppState;

/// Pull the active form listing and upsert events from it.
pub async fn sync_events(State(state): State<AppState>) -> Response {
    match state.sync.run().await {
        Ok(report) => success(report, "Event listing synchronized").into_response(),
        Err(err) => err.into_response(),
    }
}
