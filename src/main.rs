use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use usher_server::config::Config;
use usher_server::forms::HttpFormsSource;
use usher_server::notify::{DevEmailSender, EmailSender, SmtpEmailSender, SvgQrGenerator};
use usher_server::routes::create_routes;
use usher_server::service::{EventSync, TicketService};
use usher_server::store::PostgresStore;
use usher_server::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    let store = Arc::new(PostgresStore::new(pool));

    let email: Arc<dyn EmailSender> = match config.smtp.clone() {
        Some(smtp) => Arc::new(SmtpEmailSender::new(smtp)),
        None => {
            tracing::warn!("SMTP not configured; ticket emails will only be logged");
            Arc::new(DevEmailSender)
        }
    };

    let tickets = Arc::new(TicketService::new(
        store.clone(),
        email,
        Arc::new(SvgQrGenerator),
    ));
    let source = Arc::new(HttpFormsSource::new(
        config.forms_api_base.clone(),
        config.forms_api_key.clone(),
    ));
    let sync = Arc::new(EventSync::new(source, store));

    let app: Router = create_routes(AppState { tickets, sync });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
