use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{apply_security_headers, create_cors_layer};
use crate::handlers::{
    events::sync_events,
    health_check,
    tickets::{check_in, lookup_ticket, search_tickets},
    webhook::receive_webhook,
};
use crate::AppState;

pub fn create_routes(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/api/webhook", post(receive_webhook))
        .route("/api/tickets/check-in", post(check_in))
        .route("/api/tickets/search", get(search_tickets))
        .route("/api/tickets/:invoice_no", get(lookup_ticket))
        .route("/api/events/sync", post(sync_events));

    apply_security_headers(router)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer()),
        )
        .with_state(state)
}
