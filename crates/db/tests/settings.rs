//! Integration tests for the settings singleton.

use memora_core::settings::{SettingsPatch, DEFAULT_COUPLE_NAMES};
use memora_core::stores::SettingsStore;
use memora_core::tone::{Tone, ToneQuestions};
use memora_db::repositories::SettingsRepo;
use memora_db::stores::PgSettingsStore;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_seeded_defaults(pool: PgPool) {
    memora_db::health_check(&pool).await.unwrap();

    let settings = PgSettingsStore::new(pool).get().await.unwrap();
    assert_eq!(settings.couple_names, DEFAULT_COUPLE_NAMES);
    assert!(settings.tone_page_enabled);
    assert_eq!(settings.tone_questions, ToneQuestions::defaults());
    assert!(settings.background_image.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_partial_update_keeps_other_fields(pool: PgPool) {
    let store = PgSettingsStore::new(pool);
    let patch = SettingsPatch {
        welcome_text: Some("Write something for".into()),
        tone_questions: Some(json!({"funny": "Only one?"})),
        ..Default::default()
    };
    let updated = store.put(&patch).await.unwrap();

    assert_eq!(updated.couple_names, DEFAULT_COUPLE_NAMES);
    assert_eq!(updated.welcome_text, "Write something for");
    assert_eq!(updated.tone_questions.bank(Tone::Funny).candidates(), vec!["Only one?"]);
    // The submitted mapping replaces the whole set of banks.
    assert!(updated.tone_questions.bank(Tone::Wise).is_blank());

    let reloaded = store.get().await.unwrap();
    assert_eq!(reloaded, updated);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_patch_is_rejected(pool: PgPool) {
    let store = PgSettingsStore::new(pool);
    let patch = SettingsPatch {
        couple_names: Some("x".repeat(500)),
        ..Default::default()
    };
    assert!(store.put(&patch).await.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ensure_defaults_merges_missing_tones(pool: PgPool) {
    sqlx::query("UPDATE settings SET tone_questions = '{\"wise\": [\"Keep me\"]}'::jsonb")
        .execute(&pool)
        .await
        .unwrap();

    let row = SettingsRepo::ensure_defaults(&pool).await.unwrap();
    let settings = row.into_settings();
    assert_eq!(settings.tone_questions.bank(Tone::Wise).candidates(), vec!["Keep me"]);
    assert_eq!(
        settings.tone_questions.bank(Tone::Funny),
        ToneQuestions::defaults().bank(Tone::Funny)
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_password_hash_roundtrip(pool: PgPool) {
    assert_eq!(SettingsRepo::get_password_hash(&pool).await.unwrap(), None);
    assert!(SettingsRepo::set_password_hash(&pool, "$argon2id$fake").await.unwrap());
    assert_eq!(
        SettingsRepo::get_password_hash(&pool).await.unwrap().as_deref(),
        Some("$argon2id$fake")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_singleton_rejects_second_row(pool: PgPool) {
    let result = sqlx::query("INSERT INTO settings (id) VALUES (2)")
        .execute(&pool)
        .await;
    assert!(result.is_err());
}
