use std::sync::Arc;

pub mod config;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod parser;
pub mod routes;
pub mod service;
pub mod store;
pub mod utils;

use service::{EventSync, TicketService};

#[derive(Clone)]
pub struct AppState {
    pub tickets: Arc<TicketService>,
    pub sync: Arc<EventSync>,
}
