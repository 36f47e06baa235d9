use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::forms::FormsSource;
use crate::models::NewEvent;
use crate::store::Store;
use crate::utils::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
}

/// Seeds and refreshes Events from the form provider's active listing.
/// Webhooks for unseen forms still work without it (placeholder events),
/// but the sync is what gives events their real titles.
pub struct EventSync {
    source: Arc<dyn FormsSource>,
    store: Arc<dyn Store>,
}

impl EventSync {
    pub fn new(source: Arc<dyn FormsSource>, store: Arc<dyn Store>) -> Self {
        Self { source, store }
    }

    pub async fn run(&self) -> Result<SyncReport, AppError> {
        let forms = self.source.list_active_forms().await?;
        let mut report = SyncReport {
            fetched: forms.len(),
            created: 0,
            updated: 0,
        };

        for form in forms {
            let existing = self.store.find_event_by_form_id(&form.external_id).await?;
            self.store
                .upsert_event(NewEvent {
                    form_id: form.external_id,
                    title: form.title,
                    start_time: form.created_at,
                    end_time: None,
                })
                .await?;
            if existing.is_some() {
                report.updated += 1;
            } else {
                report.created += 1;
            }
        }

        info!(
            fetched = report.fetched,
            created = report.created,
            updated = report.updated,
            "event listing synchronized"
        );
        Ok(report)
    }
}
