mod common;

use std::sync::{Arc, Mutex};

use chrono::Utc;

use common::FixedForms;
use usher_server::forms::FormListing;
use usher_server::service::EventSync;
use usher_server::store::{MemoryStore, Store};

fn listing(id: &str, title: &str) -> FormListing {
    FormListing {
        external_id: id.to_string(),
        title: title.to_string(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn sync_seeds_events_from_the_active_listing() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(FixedForms {
        forms: Mutex::new(vec![
            listing("230451", "Winter Rally"),
            listing("230452", "Spring Camp"),
        ]),
    });
    let sync = EventSync::new(source, store.clone());

    let report = sync.run().await.unwrap();
    assert_eq!(report.fetched, 2);
    assert_eq!(report.created, 2);
    assert_eq!(report.updated, 0);

    let event = store
        .find_event_by_form_id("230451")
        .await
        .unwrap()
        .expect("event should exist after sync");
    assert_eq!(event.title, "Winter Rally");
}

#[tokio::test]
async fn resync_refreshes_titles_and_keeps_ids() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(FixedForms {
        forms: Mutex::new(vec![listing("230451", "Winter Rally")]),
    });
    let sync = EventSync::new(source.clone(), store.clone());

    sync.run().await.unwrap();
    let before = store
        .find_event_by_form_id("230451")
        .await
        .unwrap()
        .unwrap();

    *source.forms.lock().unwrap() = vec![listing("230451", "Winter Rally 2026")];
    let report = sync.run().await.unwrap();
    assert_eq!(report.created, 0);
    assert_eq!(report.updated, 1);

    let after = store
        .find_event_by_form_id("230451")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.title, "Winter Rally 2026");
}
