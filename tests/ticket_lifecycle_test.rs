mod common;

use std::sync::atomic::Ordering;

use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use uuid::Uuid;

use common::{harness, submission};
use usher_server::parser::normalize;
use usher_server::store::{Store, TicketKey};
use usher_server::utils::error::AppError;

#[tokio::test]
async fn first_submission_creates_event_user_and_ticket() {
    let h = harness();
    let outcome = h
        .service
        .process_submission(&submission("2041", "jane@example.org", "Jane Doe"))
        .await
        .unwrap();

    assert!(outcome.created);
    assert!(outcome.email_sent);
    let ticket = &outcome.ticket;
    assert_eq!(ticket.invoice_no, "2041");
    assert!(!ticket.checked_in);
    assert!(ticket.check_in_time.is_none());

    // The lazily created event carries the submission's event name.
    let event = h
        .store
        .find_event_by_form_id("230451")
        .await
        .unwrap()
        .expect("event should have been created");
    assert_eq!(event.title, "Winter Rally");
    assert_eq!(event.id, ticket.event_id);

    let user = h
        .store
        .find_user_by_email("jane@example.org")
        .await
        .unwrap()
        .expect("user should have been created");
    assert_eq!(user.id, ticket.user_id);
    assert!(user.password_hash.starts_with("$argon2"));

    // One confirmation email, carrying the QR for this invoice.
    let sent = h.email.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "jane@example.org");
    assert_eq!(sent[0].event_title, "Winter Rally");
    assert_eq!(sent[0].qr_data_url, "data:test/qr,2041");
}

#[tokio::test]
async fn repeat_delivery_is_a_no_op() {
    let h = harness();
    let parsed = submission("2041", "jane@example.org", "Jane Doe");

    let first = h.service.process_submission(&parsed).await.unwrap();
    let second = h.service.process_submission(&parsed).await.unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.ticket.id, second.ticket.id);
    assert_eq!(h.email.sent_count(), 1);
}

#[tokio::test]
async fn concurrent_deliveries_create_exactly_one_ticket() {
    let h = harness();
    let parsed = submission("2041", "jane@example.org", "Jane Doe");

    let (a, b) = tokio::join!(
        h.service.process_submission(&parsed),
        h.service.process_submission(&parsed)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.ticket.id, b.ticket.id);
    assert!(h.email.sent_count() <= 1);

    let hits = h
        .store
        .search_tickets(a.ticket.event_id, None)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn email_failure_does_not_uncreate_the_ticket() {
    let h = harness();
    h.email.fail.store(true, Ordering::SeqCst);

    let outcome = h
        .service
        .process_submission(&submission("2041", "jane@example.org", "Jane Doe"))
        .await
        .unwrap();

    assert!(outcome.created);
    assert!(!outcome.email_sent);

    let stored = h
        .store
        .find_ticket(&TicketKey::InvoiceNo("2041".to_string()))
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn missing_required_fields_are_rejected() {
    let h = harness();
    let mut parsed = submission("2041", "jane@example.org", "Jane Doe");
    parsed.email.clear();

    let err = h.service.process_submission(&parsed).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn check_in_transitions_once_then_conflicts() {
    let h = harness();
    h.service
        .process_submission(&submission("2041", "jane@example.org", "Jane Doe"))
        .await
        .unwrap();
    let key = TicketKey::InvoiceNo("2041".to_string());

    let checked = h.service.check_in(&key, None).await.unwrap();
    assert!(checked.checked_in);
    let at = checked.check_in_time.expect("check-in time must be set");

    let err = h.service.check_in(&key, None).await.unwrap_err();
    match err {
        AppError::AlreadyCheckedIn { name, checked_in_at } => {
            assert_eq!(name, "Jane Doe");
            assert_eq!(checked_in_at, Some(at));
        }
        other => panic!("expected AlreadyCheckedIn, got {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_check_ins_yield_one_winner() {
    let h = harness();
    h.service
        .process_submission(&submission("2041", "jane@example.org", "Jane Doe"))
        .await
        .unwrap();
    let key = TicketKey::InvoiceNo("2041".to_string());

    let (a, b) = tokio::join!(h.service.check_in(&key, None), h.service.check_in(&key, None));

    let (winner, loser) = match (a, b) {
        (Ok(t), Err(e)) => (t, e),
        (Err(e), Ok(t)) => (t, e),
        other => panic!("expected exactly one success, got {other:?}"),
    };
    let won_at = winner.check_in_time.unwrap();
    match loser {
        AppError::AlreadyCheckedIn { checked_in_at, .. } => {
            assert_eq!(checked_in_at, Some(won_at));
        }
        other => panic!("expected AlreadyCheckedIn, got {other:?}"),
    }
}

#[tokio::test]
async fn check_in_scoped_to_another_event_is_not_found() {
    let h = harness();
    let outcome = h
        .service
        .process_submission(&submission("2041", "jane@example.org", "Jane Doe"))
        .await
        .unwrap();

    let err = h
        .service
        .check_in(
            &TicketKey::InvoiceNo("2041".to_string()),
            Some(Uuid::new_v4()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Unscoped check-in still works afterwards: nothing transitioned.
    let checked = h
        .service
        .check_in(&TicketKey::Id(outcome.ticket.id), None)
        .await
        .unwrap();
    assert!(checked.checked_in);
}

#[tokio::test]
async fn lookup_respects_event_scope() {
    let h = harness();
    let outcome = h
        .service
        .process_submission(&submission("2041", "jane@example.org", "Jane Doe"))
        .await
        .unwrap();

    let found = h.service.lookup_ticket("2041", None).await.unwrap();
    assert_eq!(found.id, outcome.ticket.id);

    let scoped = h
        .service
        .lookup_ticket("2041", Some(outcome.ticket.event_id))
        .await
        .unwrap();
    assert_eq!(scoped.id, outcome.ticket.id);

    let err = h
        .service
        .lookup_ticket("2041", Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = h.service.lookup_ticket("9999", None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn search_is_scoped_filtered_and_ordered() {
    let h = harness();
    for (invoice, email, name) in [
        ("1", "jane@example.org", "Jane Doe"),
        ("2", "jane.alt@other.org", "Sam Park"),
        ("3", "ted@example.org", "Ted Mills"),
    ] {
        h.service
            .process_submission(&submission(invoice, email, name))
            .await
            .unwrap();
    }
    let event_id = h
        .store
        .find_event_by_form_id("230451")
        .await
        .unwrap()
        .unwrap()
        .id;

    let hits = h.service.search_tickets(event_id, Some("jane")).await.unwrap();
    assert_eq!(hits.len(), 2);
    // Ordered by name: Jane Doe before Sam Park (matched via email).
    assert_eq!(hits[0].name, "Jane Doe");
    assert_eq!(hits[1].name, "Sam Park");

    let none = h
        .service
        .search_tickets(Uuid::new_v4(), Some("jane"))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn nested_webhook_flows_end_to_end() {
    let h = harness();
    let fields = json!({
        "q3_name3": { "first": "Jane", "last": "Doe" },
        "q4_email4": "jane@example.org",
        "q10_invoiceId10": "# INV-2041",
        "q11_myProducts11": "General Admission (Amount: 5.00 AUD, Quantity: 15)",
    });
    let payload = json!({
        "formID": "230451",
        "rawRequest": serde_json::to_string(&fields).unwrap(),
    });

    let parsed = normalize(&payload).unwrap();
    let outcome = h.service.process_submission(&parsed).await.unwrap();

    let ticket = outcome.ticket;
    assert_eq!(ticket.invoice_no, "2041");
    assert_eq!(ticket.name, "Jane Doe");
    assert_eq!(ticket.quantity, 15);
    assert_eq!(
        ticket.total_amount,
        Decimal::from_str("75.00").unwrap()
    );
    assert_eq!(
        ticket.product_details,
        "General Admission (Amount: 5.00 AUD, Quantity: 15)"
    );
}
