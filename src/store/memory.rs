use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Event, NewEvent, NewTicket, NewUser, Ticket, User};
use crate::store::{CheckInUpdate, Store, StoreError, TicketKey, SEARCH_RESULT_CAP};

/// In-memory store for tests and database-less development.
///
/// Holds the same contract as the Postgres implementation: uniqueness on
/// `form_id`/`email`/`invoice_no`, and a check-in transition that is atomic
/// because every write happens under one mutex.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

#[derive(Default)]
struct Collections {
    events: Vec<Event>,
    users: Vec<User>,
    tickets: Vec<Ticket>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_event_by_form_id(&self, form_id: &str) -> Result<Option<Event>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.events.iter().find(|e| e.form_id == form_id).cloned())
    }

    async fn insert_event(&self, event: NewEvent) -> Result<Event, StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner.events.iter().any(|e| e.form_id == event.form_id) {
            return Err(StoreError::UniqueViolation("events.form_id"));
        }
        let now = Utc::now();
        let created = Event {
            id: Uuid::new_v4(),
            form_id: event.form_id,
            title: event.title,
            start_time: event.start_time,
            end_time: event.end_time,
            created_at: now,
            updated_at: now,
        };
        inner.events.push(created.clone());
        Ok(created)
    }

    async fn upsert_event(&self, event: NewEvent) -> Result<Event, StoreError> {
        {
            let mut inner = self.inner.lock().expect("store mutex poisoned");
            if let Some(existing) = inner.events.iter_mut().find(|e| e.form_id == event.form_id) {
                existing.title = event.title;
                existing.updated_at = Utc::now();
                return Ok(existing.clone());
            }
        }
        self.insert_event(event).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users.email"));
        }
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(created.clone());
        Ok(created)
    }

    async fn find_ticket(&self, key: &TicketKey) -> Result<Option<Ticket>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.tickets.iter().find(|t| matches_key(t, key)).cloned())
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if inner.tickets.iter().any(|t| t.invoice_no == ticket.invoice_no) {
            return Err(StoreError::UniqueViolation("tickets.invoice_no"));
        }
        let now = Utc::now();
        let created = Ticket {
            id: Uuid::new_v4(),
            invoice_no: ticket.invoice_no,
            user_id: ticket.user_id,
            event_id: ticket.event_id,
            name: ticket.name,
            email: ticket.email,
            phone: ticket.phone,
            church: ticket.church,
            youth_ministry: ticket.youth_ministry,
            quantity: ticket.quantity,
            product_details: ticket.product_details,
            total_amount: ticket.total_amount,
            checked_in: false,
            check_in_time: None,
            created_at: now,
            updated_at: now,
        };
        inner.tickets.push(created.clone());
        Ok(created)
    }

    async fn check_in(
        &self,
        ticket_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<CheckInUpdate>, StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let Some(ticket) = inner.tickets.iter_mut().find(|t| t.id == ticket_id) else {
            return Ok(None);
        };
        if ticket.checked_in {
            return Ok(Some(CheckInUpdate::AlreadyCheckedIn(ticket.clone())));
        }
        ticket.checked_in = true;
        ticket.check_in_time = Some(at);
        ticket.updated_at = at;
        Ok(Some(CheckInUpdate::Updated(ticket.clone())))
    }

    async fn search_tickets(
        &self,
        event_id: Uuid,
        query: Option<&str>,
    ) -> Result<Vec<Ticket>, StoreError> {
        let needle = query.unwrap_or("").to_lowercase();
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut matches: Vec<Ticket> = inner
            .tickets
            .iter()
            .filter(|t| t.event_id == event_id)
            .filter(|t| {
                needle.is_empty()
                    || t.name.to_lowercase().contains(&needle)
                    || t.email.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        matches.truncate(SEARCH_RESULT_CAP);
        Ok(matches)
    }
}

fn matches_key(ticket: &Ticket, key: &TicketKey) -> bool {
    match key {
        TicketKey::Id(id) => ticket.id == *id,
        TicketKey::InvoiceNo(invoice_no) => ticket.invoice_no == *invoice_no,
    }
}
