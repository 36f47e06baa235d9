use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::parser::normalize;
use crate::utils::response::{error as error_response, success};
use crate::AppState;

/// Webhook intake: normalize the payload, validate the required trio,
/// hand off to the lifecycle.
pub async fn receive_webhook(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    let parsed = match normalize(&payload) {
        Ok(parsed) => parsed,
        Err(err) => return err.into_response(),
    };

    if parsed.email.is_empty() || parsed.form_id.is_empty() || parsed.invoice_no.is_empty() {
        return error_response(
            "VALIDATION_ERROR",
            "Submission is missing required fields",
            Some(json!({
                "received": {
                    "email": parsed.email,
                    "formId": parsed.form_id,
                    "invoiceNo": parsed.invoice_no,
                }
            })),
            StatusCode::BAD_REQUEST,
        );
    }

    match state.tickets.process_submission(&parsed).await {
        Ok(outcome) => {
            let message = if outcome.created && !outcome.email_sent {
                "Ticket created, but the confirmation email could not be delivered"
            } else {
                "Ticket processed successfully"
            };
            success(outcome.ticket, message).into_response()
        }
        Err(err) => err.into_response(),
    }
}
