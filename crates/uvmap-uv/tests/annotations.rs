//! Annotation manager behaviour against in-memory fakes.

mod common;

use common::{RecordingStore, StubProvider, T0};
use std::sync::Arc;
use uvmap_uv::{
    AnnotationManager, Coordinates, FetchOrchestrator, ProviderError, ReadingRecord, Session,
    SubmitOutcome,
};

fn here() -> Coordinates {
    Coordinates::new(-27.376139, -70.323444)
}

struct Harness {
    store: Arc<RecordingStore>,
    provider: Arc<StubProvider>,
    orchestrator: Arc<FetchOrchestrator>,
    manager: AnnotationManager,
}

fn harness(provider: StubProvider) -> Harness {
    harness_with(RecordingStore::new(), provider)
}

fn harness_with(store: RecordingStore, provider: StubProvider) -> Harness {
    let store = Arc::new(store);
    let provider = Arc::new(provider);
    let orchestrator = Arc::new(FetchOrchestrator::new(store.clone(), provider.clone()));
    let manager = AnnotationManager::new(orchestrator.clone());
    Harness {
        store,
        provider,
        orchestrator,
        manager,
    }
}

#[tokio::test]
async fn test_submit_creates_reading_then_attaches_note() {
    let h = harness(StubProvider::returning(7.5));
    let session = Session::new();
    session.set_draft("  Mucho sol en la playa  ");

    let outcome = h
        .manager
        .submit(&session, &session.draft(), None, here(), T0)
        .await;

    let key = h.orchestrator.key_for(here(), T0);
    assert_eq!(outcome, SubmitOutcome::Saved { id: key.clone() });
    assert_eq!(h.provider.calls(), 1);

    let stored = h.store.stored(&key).await.unwrap();
    assert_eq!(stored.uv, 7.5);
    assert_eq!(stored.comment.as_deref(), Some("Mucho sol en la playa"));

    assert_eq!(session.draft(), "");
    let listing = session.annotations();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].id, key);
    assert_eq!(listing[0].comment, "Mucho sol en la playa");
}

#[tokio::test]
async fn test_submit_reuses_cached_reading() {
    let h = harness(StubProvider::returning(1.0));
    let key = h.orchestrator.key_for(here(), T0);
    h.store.seed(&key, ReadingRecord::new(6.2, here(), T0)).await;
    let session = Session::new();

    let outcome = h.manager.submit(&session, "nublado", Some(9.9), here(), T0 + 1_000).await;

    assert!(matches!(outcome, SubmitOutcome::Saved { .. }));
    assert_eq!(h.provider.calls(), 0);
    let stored = h.store.stored(&key).await.unwrap();
    // The reading is kept as it was; only the note is added
    assert_eq!(stored.uv, 6.2);
    assert_eq!(stored.captured_at_ms, T0);
    assert_eq!(stored.comment.as_deref(), Some("nublado"));
    assert_eq!(h.store.puts().len(), 1);
}

#[tokio::test]
async fn test_empty_text_is_dropped() {
    let h = harness(StubProvider::returning(1.0));
    let session = Session::new();
    session.set_draft("   ");

    let outcome = h.manager.submit(&session, "   ", None, here(), T0).await;

    assert_eq!(outcome, SubmitOutcome::Empty);
    assert_eq!(h.provider.calls(), 0);
    assert!(h.store.puts().is_empty());
    assert!(!session.is_submitting());
}

#[tokio::test]
async fn test_duplicate_note_is_not_rewritten() {
    let h = harness(StubProvider::returning(3.0));
    let session = Session::new();

    let first = h.manager.submit(&session, "hola", None, here(), T0).await;
    let puts_after_first = h.store.puts().len();
    let second = h.manager.submit(&session, " hola ", None, here(), T0 + 5).await;

    assert!(matches!(first, SubmitOutcome::Saved { .. }));
    assert!(matches!(second, SubmitOutcome::Duplicate { .. }));
    assert_eq!(h.store.puts().len(), puts_after_first);
}

#[tokio::test]
async fn test_new_note_replaces_stored_note_and_keeps_reading() {
    let h = harness(StubProvider::returning(1.0));
    let key = h.orchestrator.key_for(here(), T0);
    h.store
        .seed(&key, ReadingRecord::new(6.2, here(), T0).with_comment("nublado"))
        .await;
    let session = Session::new();

    let outcome = h.manager.submit(&session, "despejado", None, here(), T0 + 60_000).await;

    assert_eq!(outcome, SubmitOutcome::Saved { id: key.clone() });
    assert_eq!(h.provider.calls(), 0);
    let stored = h.store.stored(&key).await.unwrap();
    assert_eq!(stored.comment.as_deref(), Some("despejado"));
    assert_eq!(stored.uv, 6.2);
    assert_eq!(stored.captured_at_ms, T0);
    assert_eq!(session.annotations().len(), 1);
    assert_eq!(session.annotations()[0].comment, "despejado");
}

#[tokio::test]
async fn test_concurrent_submissions_write_once() {
    let h = harness(StubProvider::returning(5.0));
    let session = Session::new();

    let (a, b) = tokio::join!(
        h.manager.submit(&session, "primera", None, here(), T0),
        h.manager.submit(&session, "segunda", None, here(), T0),
    );

    let outcomes = [a, b];
    assert_eq!(
        outcomes.iter().filter(|o| matches!(o, SubmitOutcome::Saved { .. })).count(),
        1
    );
    assert!(outcomes.contains(&SubmitOutcome::InFlight));
    assert_eq!(h.store.comment_puts(), 1);
    assert_eq!(h.provider.calls(), 1);
    assert!(!session.is_submitting());
}

#[tokio::test]
async fn test_provider_failure_uses_displayed_uv() {
    let h = harness(StubProvider::answering(Err(ProviderError::RateLimited)));
    let session = Session::new();

    let outcome = h.manager.submit(&session, "calor", Some(8.1), here(), T0).await;

    let key = h.orchestrator.key_for(here(), T0);
    assert_eq!(outcome, SubmitOutcome::Saved { id: key.clone() });
    let stored = h.store.stored(&key).await.unwrap();
    assert_eq!(stored.uv, 8.1);
    assert_eq!(stored.comment.as_deref(), Some("calor"));
}

#[tokio::test]
async fn test_provider_failure_without_reading_keeps_draft() {
    let h = harness(StubProvider::answering(Err(ProviderError::Transport("down".into()))));
    let session = Session::new();
    session.set_draft("calor");

    let outcome = h.manager.submit(&session, "calor", None, here(), T0).await;

    assert_eq!(outcome, SubmitOutcome::Unavailable);
    assert!(h.store.puts().is_empty());
    assert_eq!(session.draft(), "calor");
    assert!(!session.is_submitting());
}

#[tokio::test]
async fn test_standalone_note_uses_timestamp_id() {
    let h = harness(StubProvider::returning(1.0));
    let session = Session::new();

    let outcome = h.manager.save_standalone(&session, "nota", 4.4, here(), T0 + 42).await;

    let id = (T0 + 42).to_string();
    assert_eq!(outcome, SubmitOutcome::Saved { id: id.clone() });
    assert_eq!(h.provider.calls(), 0);
    let stored = h.store.stored(&id).await.unwrap();
    assert_eq!(stored.uv, 4.4);
    assert_eq!(stored.comment.as_deref(), Some("nota"));
}

#[tokio::test]
async fn test_list_only_contains_annotated_records() {
    let h = harness(StubProvider::returning(1.0));
    let session = Session::new();
    h.store.seed("plain", ReadingRecord::new(2.0, here(), T0)).await;
    h.store
        .seed("noted", ReadingRecord::new(3.0, here(), T0).with_comment("nota"))
        .await;

    let listing = h.manager.list(&session).await;

    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].id, "noted");
    assert_eq!(listing[0].uv, 3.0);
    assert_eq!(session.annotations(), listing);
}

#[tokio::test]
async fn test_delete_then_list_excludes_id() {
    let h = harness(StubProvider::returning(1.0));
    let session = Session::new();
    h.store
        .seed("x", ReadingRecord::new(3.0, here(), T0).with_comment("borrar"))
        .await;
    h.store
        .seed("y", ReadingRecord::new(4.0, here(), T0).with_comment("mantener"))
        .await;

    assert!(h.manager.delete(&session, "x").await);
    let listing = h.manager.list(&session).await;

    assert!(listing.iter().all(|a| a.id != "x"));
    assert!(listing.iter().any(|a| a.id == "y"));
    assert!(h.store.stored("x").await.is_none());
}

#[tokio::test]
async fn test_list_failure_keeps_previous_listing() {
    let h = harness_with(RecordingStore::new().with_reads_offline(), StubProvider::returning(1.0));
    let session = Session::new();

    let listing = h.manager.list(&session).await;

    assert!(listing.is_empty());
    assert!(session.annotations().is_empty());
}
