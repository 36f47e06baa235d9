use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Event, NewEvent, NewTicket, NewUser, Ticket, User};
use crate::store::{CheckInUpdate, Store, StoreError, TicketKey, SEARCH_RESULT_CAP};

/// Postgres-backed store. The schema (see `migrations/`) carries the unique
/// indexes on `events.form_id`, `users.email` and `tickets.invoice_no` that
/// the lifecycle logic relies on as its race-breakers.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn find_event_by_form_id(&self, form_id: &str) -> Result<Option<Event>, StoreError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE form_id = $1")
            .bind(form_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn insert_event(&self, event: NewEvent) -> Result<Event, StoreError> {
        sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, form_id, title, start_time, end_time)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&event.form_id)
        .bind(&event.title)
        .bind(event.start_time)
        .bind(event.end_time)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| unique_violation(err, "events.form_id"))
    }

    async fn upsert_event(&self, event: NewEvent) -> Result<Event, StoreError> {
        let event = sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, form_id, title, start_time, end_time)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (form_id)
             DO UPDATE SET title = EXCLUDED.title, updated_at = NOW()
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&event.form_id)
        .bind(&event.title)
        .bind(event.start_time)
        .bind(event.end_time)
        .fetch_one(&self.pool)
        .await?;
        Ok(event)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, password_hash)
             VALUES ($1, $2, $3)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| unique_violation(err, "users.email"))
    }

    async fn find_ticket(&self, key: &TicketKey) -> Result<Option<Ticket>, StoreError> {
        let ticket = match key {
            TicketKey::Id(id) => {
                sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            TicketKey::InvoiceNo(invoice_no) => {
                sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE invoice_no = $1")
                    .bind(invoice_no)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };
        Ok(ticket)
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, StoreError> {
        sqlx::query_as::<_, Ticket>(
            "INSERT INTO tickets (id, invoice_no, user_id, event_id, name, email, phone,
                                  church, youth_ministry, quantity, product_details, total_amount)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&ticket.invoice_no)
        .bind(ticket.user_id)
        .bind(ticket.event_id)
        .bind(&ticket.name)
        .bind(&ticket.email)
        .bind(&ticket.phone)
        .bind(&ticket.church)
        .bind(&ticket.youth_ministry)
        .bind(ticket.quantity)
        .bind(&ticket.product_details)
        .bind(ticket.total_amount)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| unique_violation(err, "tickets.invoice_no"))
    }

    async fn check_in(
        &self,
        ticket_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<CheckInUpdate>, StoreError> {
        // Conditional update is the atomicity boundary: only one concurrent
        // caller can observe checked_in = FALSE.
        let updated = sqlx::query_as::<_, Ticket>(
            "UPDATE tickets
             SET checked_in = TRUE, check_in_time = $2, updated_at = $2
             WHERE id = $1 AND checked_in = FALSE
             RETURNING *",
        )
        .bind(ticket_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(ticket) = updated {
            return Ok(Some(CheckInUpdate::Updated(ticket)));
        }

        let existing = sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
            .bind(ticket_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(existing.map(CheckInUpdate::AlreadyCheckedIn))
    }

    async fn search_tickets(
        &self,
        event_id: Uuid,
        query: Option<&str>,
    ) -> Result<Vec<Ticket>, StoreError> {
        let pattern = format!("%{}%", escape_like(query.unwrap_or("")));
        let tickets = sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets
             WHERE event_id = $1 AND (name ILIKE $2 OR email ILIKE $2)
             ORDER BY name ASC
             LIMIT $3",
        )
        .bind(event_id)
        .bind(pattern)
        .bind(SEARCH_RESULT_CAP as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(tickets)
    }
}

fn unique_violation(err: sqlx::Error, constraint: &'static str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::UniqueViolation(constraint)
        }
        _ => StoreError::Database(err),
    }
}

/// `%` and `_` in a search term would otherwise act as wildcards.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
