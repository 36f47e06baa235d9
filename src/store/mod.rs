pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Event, NewEvent, NewTicket, NewUser, Ticket, User};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Search results are capped; check-in staff pages by refining the query.
pub const SEARCH_RESULT_CAP: usize = 50;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write. Carries the constrained
    /// column so callers can tell idempotent races from real faults.
    #[error("unique constraint violated on {0}")]
    UniqueViolation(&'static str),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

/// Identifier accepted by ticket lookup and check-in calls.
#[derive(Debug, Clone)]
pub enum TicketKey {
    Id(Uuid),
    InvoiceNo(String),
}

/// Outcome of the conditional check-in update.
#[derive(Debug)]
pub enum CheckInUpdate {
    /// This call won the transition; the ticket carries the fresh
    /// `check_in_time`.
    Updated(Ticket),
    /// The ticket had already transitioned; carries the prior state.
    AlreadyCheckedIn(Ticket),
}

/// Document-store contract over the three collections.
///
/// Implementations must provide two guarantees the lifecycle logic relies
/// on instead of locks:
///
/// - uniqueness of `events.form_id`, `users.email` and `tickets.invoice_no`,
///   with duplicate inserts rejected as [`StoreError::UniqueViolation`];
/// - [`Store::check_in`] as an atomic conditional update that transitions a
///   ticket only while it is not yet checked in, so concurrent attempts
///   yield exactly one [`CheckInUpdate::Updated`].
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_event_by_form_id(&self, form_id: &str) -> Result<Option<Event>, StoreError>;

    async fn insert_event(&self, event: NewEvent) -> Result<Event, StoreError>;

    /// Insert the event or, when `form_id` already exists, refresh its title.
    async fn upsert_event(&self, event: NewEvent) -> Result<Event, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_ticket(&self, key: &TicketKey) -> Result<Option<Ticket>, StoreError>;

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, StoreError>;

    /// Atomically transition the ticket to checked-in. `Ok(None)` means no
    /// such ticket exists.
    async fn check_in(
        &self,
        ticket_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<CheckInUpdate>, StoreError>;

    /// Tickets of one event whose name or email contains `query`
    /// case-insensitively, ordered by name, capped at
    /// [`SEARCH_RESULT_CAP`].
    async fn search_tickets(
        &self,
        event_id: Uuid,
        query: Option<&str>,
    ) -> Result<Vec<Ticket>, StoreError>;
}
