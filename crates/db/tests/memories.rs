//! Integration tests for guest memory storage.

use assert_matches::assert_matches;
use memora_core::session::{NewMemory, Photo};
use memora_core::settings::EventOverrides;
use memora_core::stores::{EventStore, MemoryStore, NewEvent, StoreError};
use memora_core::tone::Tone;
use memora_db::repositories::MemoryRepo;
use memora_db::stores::{PgEventStore, PgMemoryStore};
use sqlx::PgPool;

fn memory(name: &str, message: &str) -> NewMemory {
    NewMemory::new(name, None, message, None, None).unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_and_list_newest_first(pool: PgPool) {
    let store = PgMemoryStore::new(pool);
    let first = store.create(&memory("Ana", "First")).await.unwrap();
    let second = store
        .create(&NewMemory {
            tone: Some(Tone::Funny),
            photo: Some(Photo::new("data:image/jpeg;base64,/9j/").unwrap()),
            ..memory("Ben", "Second")
        })
        .await
        .unwrap();

    let listed = store.list(None).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![second, first]);
    assert_eq!(listed[0].tone, Some(Tone::Funny));
    assert!(listed[0].photo.is_some());
    assert!(listed[1].event_code.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_by_event(pool: PgPool) {
    let events = PgEventStore::new(pool.clone());
    let store = PgMemoryStore::new(pool.clone());
    let event = events
        .create(&NewEvent {
            name: "Wedding".into(),
            code: Some("WED24".into()),
            overrides: EventOverrides::default(),
        })
        .await
        .unwrap();

    store.create(&memory("Global", "No event")).await.unwrap();
    store
        .create(&NewMemory {
            event: Some(event.event_ref()),
            ..memory("Guest", "At the wedding")
        })
        .await
        .unwrap();

    let scoped = store.list(Some(event.id)).await.unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].event_code.as_deref(), Some("WED24"));
    assert_eq!(store.list(None).await.unwrap().len(), 2);

    let export = MemoryRepo::list_for_export(&pool, None).await.unwrap();
    assert_eq!(export[0].guest_name, "Global");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_message_length_is_enforced_by_schema(pool: PgPool) {
    let result = sqlx::query(
        "INSERT INTO memories (guest_name, message) VALUES ('X', repeat('a', 201))",
    )
    .execute(&pool)
    .await;
    assert!(result.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete(pool: PgPool) {
    let store = PgMemoryStore::new(pool);
    let id = store.create(&memory("Ana", "Bye")).await.unwrap();
    store.delete(id).await.unwrap();
    assert!(store.list(None).await.unwrap().is_empty());
    assert_matches!(store.delete(id).await, Err(StoreError::NotFound { .. }));
}
