//! Integration tests for event storage: codes, overrides, deactivation.

use assert_matches::assert_matches;
use memora_core::error::CoreError;
use memora_core::session::NewMemory;
use memora_core::settings::EventOverrides;
use memora_core::stores::{EventPatch, EventStore, MemoryStore, NewEvent, StoreError};
use memora_db::stores::{PgEventStore, PgMemoryStore};
use serde_json::json;
use sqlx::PgPool;

fn new_event(name: &str, code: Option<&str>) -> NewEvent {
    NewEvent {
        name: name.to_string(),
        code: code.map(str::to_string),
        overrides: EventOverrides::default(),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_generates_code(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let event = store.create(&new_event("Summer wedding", None)).await.unwrap();

    assert_eq!(event.code.len(), 6);
    assert!(event.is_active);
    assert_eq!(event.memory_count, 0);

    let found = store.get_by_code(&event.code.to_lowercase()).await.unwrap();
    assert_eq!(found.map(|e| e.id), Some(event.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_code_conflicts(pool: PgPool) {
    let store = PgEventStore::new(pool);
    store.create(&new_event("First", Some("party24"))).await.unwrap();
    let err = store
        .create(&new_event("Second", Some("PARTY24")))
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Core(CoreError::Conflict(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_blank_name_is_rejected(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let err = store.create(&new_event("   ", None)).await.unwrap_err();
    assert_matches!(err, StoreError::Core(CoreError::Validation(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_only_touches_given_fields(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let event = store
        .create(&NewEvent {
            name: "Gala".into(),
            code: None,
            overrides: EventOverrides {
                couple_names: Some("Jo & Sam".into()),
                ..Default::default()
            },
        })
        .await
        .unwrap();

    let updated = store
        .update(
            event.id,
            &EventPatch {
                name: None,
                overrides: EventOverrides {
                    tone_page_enabled: Some(false),
                    tone_questions: Some(json!({"wise": ["W1"]})),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Gala");
    assert_eq!(updated.overrides.couple_names.as_deref(), Some("Jo & Sam"));
    assert_eq!(updated.overrides.tone_page_enabled, Some(false));
    assert_eq!(updated.overrides.tone_questions, Some(json!({"wise": ["W1"]})));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_missing_event_is_not_found(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let err = store.update(9999, &EventPatch::default()).await.unwrap_err();
    assert_matches!(err, StoreError::NotFound { entity: "Event", .. });
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deactivate_hides_code_but_keeps_memories(pool: PgPool) {
    let events = PgEventStore::new(pool.clone());
    let memories = PgMemoryStore::new(pool);
    let event = events.create(&new_event("Reunion", None)).await.unwrap();

    let memory = NewMemory::new("Jamie", None, "Great night", None, Some(event.event_ref())).unwrap();
    memories.create(&memory).await.unwrap();

    events.deactivate(event.id).await.unwrap();

    assert!(events.get_by_code(&event.code).await.unwrap().is_none());
    let listed = events.list().await.unwrap();
    let stored = listed.iter().find(|e| e.id == event.id).unwrap();
    assert!(!stored.is_active);
    assert_eq!(stored.memory_count, 1);
    assert_eq!(memories.list(Some(event.id)).await.unwrap().len(), 1);

    // Second deactivation finds nothing active.
    assert_matches!(
        events.deactivate(event.id).await,
        Err(StoreError::NotFound { .. })
    );
}
