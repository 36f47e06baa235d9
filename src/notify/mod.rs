pub mod email;
pub mod qr;

use async_trait::async_trait;
use thiserror::Error;

pub use email::{DevEmailSender, SmtpEmailSender};
pub use qr::SvgQrGenerator;

/// Everything the ticket confirmation email needs.
#[derive(Debug, Clone)]
pub struct TicketEmail {
    pub to: String,
    pub name: String,
    pub event_title: String,
    pub event_date: String,
    pub invoice_no: String,
    pub qr_data_url: String,
}

#[derive(Debug, Error)]
#[error("email delivery failed: {0}")]
pub struct EmailError(pub String);

/// Outbound email seam. Failure is observable but never fatal to the
/// ticket that triggered it.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_ticket_email(&self, email: &TicketEmail) -> Result<(), EmailError>;
}

/// QR seam: text in, image data URL out. Pure and effectively infallible
/// for invoice-sized payloads.
pub trait QrGenerator: Send + Sync {
    fn generate(&self, text: &str) -> String;
}
