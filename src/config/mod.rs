use std::env;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::apply_security_headers;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub forms_api_base: String,
    pub forms_api_key: String,
    /// None disables real delivery; ticket emails are logged instead.
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/usher".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            forms_api_base: env::var("FORMS_API_BASE")
                .unwrap_or_else(|_| "https://api.jotform.com".to_string()),
            forms_api_key: env::var("FORMS_API_KEY").unwrap_or_default(),
            smtp: SmtpConfig::from_env(),
        }
    }
}

impl SmtpConfig {
    fn from_env() -> Option<Self> {
        let server = env::var("SMTP_SERVER").ok()?;
        Some(Self {
            server,
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            username: env::var("SMTP_USERNAME").unwrap_or_default(),
            password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: env::var("SMTP_FROM_EMAIL")
                .unwrap_or_else(|_| "tickets@example.org".to_string()),
            from_name: env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "Ticketing".to_string()),
        })
    }
}
