use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{Event, NewEvent, NewTicket, NewUser, ParsedSubmission, Ticket, User};
use crate::notify::{EmailSender, QrGenerator, TicketEmail};
use crate::store::{CheckInUpdate, Store, StoreError, TicketKey};
use crate::utils::error::AppError;
use crate::utils::password::{generate_one_time_password, hash_password};

/// Title used when a webhook references a form the listing sync has not
/// seen yet.
const PLACEHOLDER_EVENT_TITLE: &str = "Upcoming event";

/// Window assumed for lazily created events until the sync corrects it.
const PLACEHOLDER_EVENT_DAYS: i64 = 7;

/// What processing one webhook submission amounted to.
#[derive(Debug, Clone)]
pub struct WebhookOutcome {
    pub ticket: Ticket,
    /// False when the invoice number had already been processed.
    pub created: bool,
    /// Only meaningful when `created`; false means the ticket stands but
    /// the confirmation may not have reached the recipient.
    pub email_sent: bool,
}

/// Ticket lifecycle: submission intake, check-in transition, lookups.
pub struct TicketService {
    store: Arc<dyn Store>,
    email: Arc<dyn EmailSender>,
    qr: Arc<dyn QrGenerator>,
}

impl TicketService {
    pub fn new(
        store: Arc<dyn Store>,
        email: Arc<dyn EmailSender>,
        qr: Arc<dyn QrGenerator>,
    ) -> Self {
        Self { store, email, qr }
    }

    /// Turn a canonical submission into a ticket, exactly once per invoice
    /// number.
    ///
    /// Repeat deliveries return the existing ticket with no side effects.
    /// The find-then-create sequence is only an optimistic check; the
    /// store's unique constraint on `invoice_no` breaks creation races,
    /// and losing that race is handled as "already exists".
    pub async fn process_submission(
        &self,
        parsed: &ParsedSubmission,
    ) -> Result<WebhookOutcome, AppError> {
        if parsed.email.is_empty() || parsed.form_id.is_empty() || parsed.invoice_no.is_empty() {
            return Err(AppError::ValidationError(
                "Submission is missing required fields (email, form id or invoice number)"
                    .to_string(),
            ));
        }

        let event = self.resolve_event(parsed).await?;
        let user = self.resolve_user(&parsed.email).await?;

        // Idempotency gate.
        let key = TicketKey::InvoiceNo(parsed.invoice_no.clone());
        if let Some(existing) = self.store.find_ticket(&key).await? {
            info!(invoice_no = %existing.invoice_no, "duplicate webhook delivery, returning existing ticket");
            return Ok(WebhookOutcome {
                ticket: existing,
                created: false,
                email_sent: false,
            });
        }

        let new_ticket = NewTicket {
            invoice_no: parsed.invoice_no.clone(),
            user_id: user.id,
            event_id: event.id,
            name: parsed.name.clone(),
            email: parsed.email.clone(),
            phone: parsed.phone.clone(),
            church: parsed.church.clone(),
            youth_ministry: parsed.youth_ministry.clone(),
            quantity: parsed.quantity.max(1),
            product_details: parsed.product_details.clone(),
            total_amount: parsed.total_amount,
        };

        let ticket = match self.store.insert_ticket(new_ticket).await {
            Ok(ticket) => ticket,
            Err(StoreError::UniqueViolation(_)) => {
                // A concurrent delivery of the same invoice won the insert.
                info!(invoice_no = %parsed.invoice_no, "lost creation race, returning existing ticket");
                let existing = self.store.find_ticket(&key).await?.ok_or_else(|| {
                    AppError::InternalServerError(
                        "Ticket vanished after unique-violation on insert".to_string(),
                    )
                })?;
                return Ok(WebhookOutcome {
                    ticket: existing,
                    created: false,
                    email_sent: false,
                });
            }
            Err(err) => return Err(err.into()),
        };

        // Side effects only on the fresh-creation path. Their failure must
        // not un-create the ticket.
        let email_sent = self.send_confirmation(&ticket, &event).await;

        Ok(WebhookOutcome {
            ticket,
            created: true,
            email_sent,
        })
    }

    async fn resolve_event(&self, parsed: &ParsedSubmission) -> Result<Event, AppError> {
        if let Some(event) = self.store.find_event_by_form_id(&parsed.form_id).await? {
            return Ok(event);
        }

        let now = Utc::now();
        let title = if parsed.event_name.is_empty() {
            PLACEHOLDER_EVENT_TITLE.to_string()
        } else {
            parsed.event_name.clone()
        };
        let placeholder = NewEvent {
            form_id: parsed.form_id.clone(),
            title,
            start_time: now,
            end_time: Some(now + Duration::days(PLACEHOLDER_EVENT_DAYS)),
        };

        match self.store.insert_event(placeholder).await {
            Ok(event) => {
                info!(form_id = %event.form_id, "created placeholder event for unseen form");
                Ok(event)
            }
            Err(StoreError::UniqueViolation(_)) => self
                .store
                .find_event_by_form_id(&parsed.form_id)
                .await?
                .ok_or_else(|| {
                    AppError::InternalServerError(
                        "Event vanished after unique-violation on insert".to_string(),
                    )
                }),
            Err(err) => Err(err.into()),
        }
    }

    async fn resolve_user(&self, email: &str) -> Result<User, AppError> {
        if let Some(user) = self.store.find_user_by_email(email).await? {
            return Ok(user);
        }

        let password_hash = hash_password(&generate_one_time_password())
            .map_err(AppError::InternalServerError)?;
        let placeholder = NewUser {
            email: email.to_string(),
            password_hash,
        };

        match self.store.insert_user(placeholder).await {
            Ok(user) => {
                info!(email = %user.email, "created placeholder account for first ticket");
                Ok(user)
            }
            Err(StoreError::UniqueViolation(_)) => self
                .store
                .find_user_by_email(email)
                .await?
                .ok_or_else(|| {
                    AppError::InternalServerError(
                        "User vanished after unique-violation on insert".to_string(),
                    )
                }),
            Err(err) => Err(err.into()),
        }
    }

    async fn send_confirmation(&self, ticket: &Ticket, event: &Event) -> bool {
        let qr_data_url = self.qr.generate(&ticket.invoice_no);
        let email = TicketEmail {
            to: ticket.email.clone(),
            name: ticket.name.clone(),
            event_title: event.title.clone(),
            event_date: event.start_time.format("%d %b %Y").to_string(),
            invoice_no: ticket.invoice_no.clone(),
            qr_data_url,
        };
        match self.email.send_ticket_email(&email).await {
            Ok(()) => true,
            Err(err) => {
                error!(
                    invoice_no = %ticket.invoice_no,
                    to = %ticket.email,
                    error = %err,
                    "ticket created but confirmation email failed"
                );
                false
            }
        }
    }

    /// One-way check-in transition. The conditional update in the store is
    /// the race-breaker; this method only resolves and scopes the ticket.
    pub async fn check_in(
        &self,
        key: &TicketKey,
        event_id: Option<Uuid>,
    ) -> Result<Ticket, AppError> {
        let ticket = self.resolve_scoped(key, event_id).await?;

        match self.store.check_in(ticket.id, Utc::now()).await? {
            Some(CheckInUpdate::Updated(ticket)) => {
                info!(invoice_no = %ticket.invoice_no, name = %ticket.name, "guest checked in");
                Ok(ticket)
            }
            Some(CheckInUpdate::AlreadyCheckedIn(ticket)) => Err(AppError::AlreadyCheckedIn {
                name: ticket.name,
                checked_in_at: ticket.check_in_time,
            }),
            None => Err(AppError::NotFound("Ticket not found".to_string())),
        }
    }

    pub async fn lookup_ticket(
        &self,
        invoice_no: &str,
        event_id: Option<Uuid>,
    ) -> Result<Ticket, AppError> {
        self.resolve_scoped(&TicketKey::InvoiceNo(invoice_no.to_string()), event_id)
            .await
    }

    pub async fn search_tickets(
        &self,
        event_id: Uuid,
        query: Option<&str>,
    ) -> Result<Vec<Ticket>, AppError> {
        Ok(self.store.search_tickets(event_id, query).await?)
    }

    async fn resolve_scoped(
        &self,
        key: &TicketKey,
        event_id: Option<Uuid>,
    ) -> Result<Ticket, AppError> {
        let ticket = self
            .store
            .find_ticket(key)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

        if let Some(scope) = event_id {
            if ticket.event_id != scope {
                // Same error kind as a miss; do not leak that the ticket
                // exists under another event.
                warn!(invoice_no = %ticket.invoice_no, "ticket requested under the wrong event");
                return Err(AppError::NotFound(
                    "Ticket not found for this event".to_string(),
                ));
            }
        }
        Ok(ticket)
    }
}
