use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::store::TicketKey;
use crate::utils::error::AppError;
use crate::utils::response::success;
use crate::AppState;

#[derive(Deserialize)]
pub struct CheckInRequest {
    pub ticket_id: Option<Uuid>,
    pub invoice_no: Option<String>,
    pub event_id: Option<Uuid>,
}

pub async fn check_in(
    State(state): State<AppState>,
    Json(request): Json<CheckInRequest>,
) -> Response {
    let key = match ticket_key(&request) {
        Some(key) => key,
        None => {
            return AppError::ValidationError(
                "Either ticket_id or invoice_no is required".to_string(),
            )
            .into_response()
        }
    };

    match state.tickets.check_in(&key, request.event_id).await {
        Ok(ticket) => success(ticket, "Guest checked in").into_response(),
        Err(err) => err.into_response(),
    }
}

fn ticket_key(request: &CheckInRequest) -> Option<TicketKey> {
    if let Some(id) = request.ticket_id {
        return Some(TicketKey::Id(id));
    }
    request
        .invoice_no
        .as_deref()
        .filter(|invoice_no| !invoice_no.is_empty())
        .map(|invoice_no| TicketKey::InvoiceNo(invoice_no.to_string()))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub event_id: Option<Uuid>,
    pub q: Option<String>,
}

pub async fn search_tickets(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let Some(event_id) = query.event_id else {
        return AppError::ValidationError("event_id is required".to_string()).into_response();
    };

    match state
        .tickets
        .search_tickets(event_id, query.q.as_deref())
        .await
    {
        Ok(tickets) => success(tickets, "Search results").into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Deserialize)]
pub struct LookupQuery {
    pub event_id: Option<Uuid>,
}

pub async fn lookup_ticket(
    State(state): State<AppState>,
    Path(invoice_no): Path<String>,
    Query(query): Query<LookupQuery>,
) -> Response {
    if invoice_no.is_empty() {
        return AppError::ValidationError("invoice_no is required".to_string()).into_response();
    }

    match state
        .tickets
        .lookup_ticket(&invoice_no, query.event_id)
        .await
    {
        Ok(ticket) => success(ticket, "Ticket found").into_response(),
        Err(err) => err.into_response(),
    }
}
