#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use usher_server::forms::{FormListing, FormsSource};
use usher_server::models::ParsedSubmission;
use usher_server::notify::{EmailError, EmailSender, QrGenerator, TicketEmail};
use usher_server::service::TicketService;
use usher_server::store::MemoryStore;
use usher_server::utils::error::AppError;

/// Email double that records every send and can be told to fail.
#[derive(Default)]
pub struct RecordingEmailSender {
    pub sent: Mutex<Vec<TicketEmail>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_ticket_email(&self, email: &TicketEmail) -> Result<(), EmailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmailError("smtp unavailable".to_string()));
        }
        self.sent
            .lock()
            .expect("email mutex poisoned")
            .push(email.clone());
        Ok(())
    }
}

impl RecordingEmailSender {
    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("email mutex poisoned").len()
    }
}

/// QR double with a recognizable payload-derived output.
pub struct StaticQr;

impl QrGenerator for StaticQr {
    fn generate(&self, text: &str) -> String {
        format!("data:test/qr,{text}")
    }
}

/// Forms-source double serving a fixed listing.
pub struct FixedForms {
    pub forms: Mutex<Vec<FormListing>>,
}

#[async_trait]
impl FormsSource for FixedForms {
    async fn list_active_forms(&self) -> Result<Vec<FormListing>, AppError> {
        Ok(self.forms.lock().expect("forms mutex poisoned").clone())
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub email: Arc<RecordingEmailSender>,
    pub service: TicketService,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let email = Arc::new(RecordingEmailSender::default());
    let service = TicketService::new(store.clone(), email.clone(), Arc::new(StaticQr));
    Harness {
        store,
        email,
        service,
    }
}

pub fn submission(invoice_no: &str, email: &str, name: &str) -> ParsedSubmission {
    ParsedSubmission {
        email: email.to_string(),
        name: name.to_string(),
        invoice_no: invoice_no.to_string(),
        form_id: "230451".to_string(),
        phone: "+61 400 111 222".to_string(),
        church: "Hillcrest".to_string(),
        youth_ministry: "Ignite".to_string(),
        event_name: "Winter Rally".to_string(),
        event_date: "14 Aug 2026".to_string(),
        quantity: 2,
        product_details: "General Admission (Quantity: 2)".to_string(),
        total_amount: Decimal::new(1000, 2),
    }
}
