use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::config::SmtpConfig;
use crate::notify::{EmailError, EmailSender, TicketEmail};

/// SMTP sender for ticket confirmations.
///
/// A transport is built per send to avoid connection pooling issues; the
/// blocking lettre transport runs on the blocking pool.
#[derive(Clone)]
pub struct SmtpEmailSender {
    server: String,
    port: u16,
    credentials: Credentials,
    from_email: String,
    from_name: String,
}

impl SmtpEmailSender {
    pub fn new(config: SmtpConfig) -> Self {
        Self {
            server: config.server,
            port: config.port,
            credentials: Credentials::new(config.username, config.password),
            from_email: config.from_email,
            from_name: config.from_name,
        }
    }

    fn build_transport(&self) -> Result<SmtpTransport, EmailError> {
        Ok(SmtpTransport::relay(&self.server)
            .map_err(|e| EmailError(format!("SMTP relay error: {e}")))?
            .port(self.port)
            .credentials(self.credentials.clone())
            .build())
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }
}

fn ticket_email_body(ticket: &TicketEmail) -> String {
    format!(
        r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Your ticket</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #2563eb;">You're in, {name}!</h2>
        <p>Here is your ticket for <strong>{event_title}</strong> on {event_date}.</p>
        <p>Show this QR code at the door to check in:</p>
        <p style="margin: 30px 0; text-align: center;">
            <img src="{qr}" alt="Ticket QR code" width="240" height="240">
        </p>
        <p style="color: #666; font-size: 14px;">
            Invoice reference: {invoice_no}
        </p>
        <p style="color: #666; font-size: 12px; margin-top: 40px;">
            If the code does not scan, the team can look you up by name or
            invoice number at the door.
        </p>
    </div>
</body>
</html>
        "#,
        name = ticket.name,
        event_title = ticket.event_title,
        event_date = ticket.event_date,
        qr = ticket.qr_data_url,
        invoice_no = ticket.invoice_no,
    )
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send_ticket_email(&self, ticket: &TicketEmail) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_header()
                    .parse()
                    .map_err(|e| EmailError(format!("Invalid from address: {e}")))?,
            )
            .to(ticket
                .to
                .parse()
                .map_err(|e| EmailError(format!("Invalid to address: {e}")))?)
            .subject(format!("Your ticket for {}", ticket.event_title))
            .header(ContentType::TEXT_HTML)
            .body(ticket_email_body(ticket))
            .map_err(|e| EmailError(format!("Failed to build email: {e}")))?;

        let mailer = self.build_transport()?;

        tokio::task::spawn_blocking(move || {
            mailer
                .send(&email)
                .map_err(|e| EmailError(format!("Failed to send email: {e}")))
        })
        .await
        .map_err(|e| EmailError(format!("Email task failed: {e}")))?
        .map(|_| ())
    }
}

/// Development sender: logs instead of delivering. Used when SMTP is not
/// configured so local webhook testing does not need a mail account.
pub struct DevEmailSender;

#[async_trait]
impl EmailSender for DevEmailSender {
    async fn send_ticket_email(&self, ticket: &TicketEmail) -> Result<(), EmailError> {
        info!(
            to = %ticket.to,
            event = %ticket.event_title,
            invoice_no = %ticket.invoice_no,
            "SMTP not configured; ticket email logged only"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_embeds_qr_and_event_details() {
        let body = ticket_email_body(&TicketEmail {
            to: "jane@example.org".to_string(),
            name: "Jane Doe".to_string(),
            event_title: "Winter Rally".to_string(),
            event_date: "14 Aug 2026".to_string(),
            invoice_no: "2041".to_string(),
            qr_data_url: "data:image/svg+xml;base64,AAAA".to_string(),
        });
        assert!(body.contains("Winter Rally"));
        assert!(body.contains("14 Aug 2026"));
        assert!(body.contains("data:image/svg+xml;base64,AAAA"));
        assert!(body.contains("2041"));
    }
}
