use markdrive::cache::{EditCacheEntry, EditCacheStore, SledEditCache};
use markdrive::conflict::{Notice, PromptKind, ScriptedPrompt, UserDecision};
use markdrive::remote::MemoryRemoteStore;
use markdrive::{ApiError, Session};
use std::sync::Arc;

struct Harness {
    remote: Arc<MemoryRemoteStore>,
    cache: Arc<SledEditCache>,
    session: Session,
}

fn harness(cache_dir: &std::path::Path) -> Harness {
    let remote = Arc::new(MemoryRemoteStore::new().with_file("Notes/a.md", "server v1"));
    let cache = Arc::new(SledEditCache::open(cache_dir).unwrap());
    let session = Session::new(remote.clone(), cache.clone());
    Harness {
        remote,
        cache,
        session,
    }
}

#[tokio::test]
async fn interrupted_save_is_recovered_on_next_open() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path());
    h.session.load_tree().await.unwrap();

    h.remote.set_fail_writes(true);
    let err = h
        .session
        .save_file("Notes/a.md", "my unsaved paragraph")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::RemoteWrite(_)));
    assert_eq!(h.remote.content_of("Notes/a.md").unwrap(), "server v1");
    assert_eq!(h.session.pending_edits().unwrap().len(), 1);

    h.remote.set_fail_writes(false);
    let prompt = ScriptedPrompt::new([UserDecision::Restore]);
    let opened = h.session.open_file("Notes/a.md", &prompt).await.unwrap();

    assert!(opened.restored);
    assert_eq!(opened.content, "my unsaved paragraph");
    assert_eq!(
        h.remote.content_of("Notes/a.md").unwrap(),
        "my unsaved paragraph"
    );
    assert!(h.cache.get("Notes/a.md").unwrap().is_none());
    assert_eq!(h.session.selection().selected_file(), Some("Notes/a.md"));
}

#[tokio::test]
async fn repeated_discard_cancel_never_loses_the_edit() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path());
    let staged = EditCacheEntry::stage("Notes/a.md", "draft");
    h.cache.put(&staged).unwrap();

    let mut script = Vec::new();
    for _ in 0..10 {
        script.push(UserDecision::Discard);
        script.push(UserDecision::Cancel);
    }
    let prompt = ScriptedPrompt::new(script);

    // The script runs dry while the protocol is still waiting for an answer.
    let err = h
        .session
        .open_file("Notes/a.md", &prompt)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::PromptError(_)));
    assert_eq!(h.cache.get("Notes/a.md").unwrap(), Some(staged));
    assert_eq!(h.remote.write_calls(), 0);
    assert_eq!(
        prompt
            .asked()
            .iter()
            .filter(|k| **k == PromptKind::ConfirmDiscard)
            .count(),
        10
    );
}

#[tokio::test]
async fn failed_restore_reprompts_and_keeps_entry() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path());
    let staged = EditCacheEntry::stage("Notes/a.md", "draft");
    h.cache.put(&staged).unwrap();
    h.remote.set_fail_writes(true);

    let prompt = ScriptedPrompt::new([UserDecision::Restore, UserDecision::Dismiss]);
    let result = h.session.open_file("Notes/a.md", &prompt).await;

    assert!(result.is_err());
    assert_eq!(h.cache.get("Notes/a.md").unwrap(), Some(staged));
    assert_eq!(
        prompt.asked(),
        vec![
            PromptKind::RestoreOrDiscard,
            PromptKind::RestoreOrDiscard,
            PromptKind::RestoreOrDiscard
        ]
    );
    assert!(matches!(
        prompt.notices().first(),
        Some(Notice::RestoreFailed { .. })
    ));
}

#[tokio::test]
async fn confirmed_discard_opens_server_content() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path());
    h.cache
        .put(&EditCacheEntry::stage("Notes/a.md", "draft"))
        .unwrap();

    let prompt = ScriptedPrompt::new([UserDecision::Discard, UserDecision::ConfirmDiscard]);
    let opened = h.session.open_file("Notes/a.md", &prompt).await.unwrap();

    assert!(!opened.restored);
    assert_eq!(opened.content, "server v1");
    assert!(h.session.pending_edits().unwrap().is_empty());
}
