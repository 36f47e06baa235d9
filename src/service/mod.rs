pub mod sync;
pub mod tickets;

pub use sync::{EventSync, SyncReport};
pub use tickets::{TicketService, WebhookOutcome};
