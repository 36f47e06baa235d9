use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::utils::error::AppError;

/// One active form on the provider side; the origin of `Event.form_id`
/// and title values.
#[derive(Debug, Clone)]
pub struct FormListing {
    pub external_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Form-provider listing seam, consumed by the event sync.
#[async_trait]
pub trait FormsSource: Send + Sync {
    async fn list_active_forms(&self) -> Result<Vec<FormListing>, AppError>;
}

/// HTTP client against the provider's forms API.
pub struct HttpFormsSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpFormsSource {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FormsResponse {
    content: Vec<FormEntry>,
}

#[derive(Debug, Deserialize)]
struct FormEntry {
    id: String,
    title: String,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl FormsSource for HttpFormsSource {
    async fn list_active_forms(&self) -> Result<Vec<FormListing>, AppError> {
        let url = format!("{}/forms?status=active", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .header("APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Form provider unreachable: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::UpstreamError(format!("Form provider rejected request: {e}")))?;

        let listing: FormsResponse = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Form listing malformed: {e}")))?;

        Ok(listing
            .content
            .into_iter()
            .map(|form| FormListing {
                external_id: form.id,
                title: form.title,
                created_at: form.created_at,
            })
            .collect())
    }
}
