use markdrive::cache::SledEditCache;
use markdrive::conflict::ScriptedPrompt;
use markdrive::remote::{MemoryRemoteStore, WriteOutcome};
use markdrive::{ApiError, DeleteOutcome, Session};
use std::sync::Arc;

fn session(remote: MemoryRemoteStore) -> (Arc<MemoryRemoteStore>, Session) {
    let remote = Arc::new(remote);
    let cache = Arc::new(SledEditCache::temporary().unwrap());
    let session = Session::new(remote.clone(), cache);
    (remote, session)
}

#[tokio::test]
async fn create_edit_rename_and_recycle() {
    let (remote, session) = session(MemoryRemoteStore::new());
    session.load_tree().await.unwrap();

    let folder = session.create_folder("Journal", true).await.unwrap();
    session.select_folder(Some(folder.as_str())).unwrap();
    let file = session.create_file("day1.md").await.unwrap();
    assert_eq!(file, "Journal/day1.md");

    let outcome = session.save_file(&file, "# Day 1\n").await.unwrap();
    assert!(matches!(outcome, WriteOutcome::Written { .. }));
    assert!(matches!(
        session.save_file(&file, "# Day 1\n").await.unwrap(),
        WriteOutcome::NoChange
    ));

    session.select_file(Some(file.as_str())).unwrap();
    let renamed = session.rename_file(&file, "monday.md").await.unwrap();
    assert_eq!(renamed, "Journal/monday.md");
    assert_eq!(session.selection().selected_file(), Some("Journal/monday.md"));
    assert_eq!(remote.content_of(&renamed).unwrap(), "# Day 1\n");

    let outcome = session.delete(&folder, true).await.unwrap();
    let DeleteOutcome::Recycled { new_path } = outcome else {
        panic!("folder should be recycled");
    };
    assert!(new_path.starts_with("Recycle/Journal_"));
    let selection = session.selection();
    assert_eq!(selection.selected_folder(), None);
    assert_eq!(selection.selected_file(), None);

    let snapshot = session.tree();
    let recycle = snapshot
        .nav_tree()
        .iter()
        .find(|n| n.name == "Recycle")
        .unwrap();
    assert_eq!(recycle.markdown_file_count, 1);
}

#[tokio::test]
async fn rename_to_non_markdown_is_rejected_before_network() {
    let (remote, session) = session(MemoryRemoteStore::new().with_file("a.md", "x"));
    session.load_tree().await.unwrap();
    let writes = remote.write_calls();
    assert!(matches!(
        session.rename_file("a.md", "a.txt").await,
        Err(ApiError::Validation(_))
    ));
    assert_eq!(remote.write_calls(), writes);
}

#[tokio::test]
async fn failed_mutation_keeps_tree() {
    let (remote, session) = session(MemoryRemoteStore::new().with_file("Notes/a.md", "x"));
    let before = session.load_tree().await.unwrap();
    remote.set_fail_writes(true);
    assert!(matches!(
        session.create_folder("New", true).await,
        Err(ApiError::RemoteWrite(_))
    ));
    assert_eq!(session.tree().generation(), before.generation());
}

#[tokio::test]
async fn stale_selection_is_dropped_after_external_change() {
    let (remote, session) = session(MemoryRemoteStore::new().with_file("Notes/a.md", "x"));
    session.load_tree().await.unwrap();
    session
        .open_file("Notes/a.md", &ScriptedPrompt::default())
        .await
        .unwrap();

    use markdrive::remote::RemoteStore;
    remote.delete_directory("Notes").await.unwrap();
    session.load_tree().await.unwrap();

    let selection = session.selection();
    assert_eq!(selection.selected_folder(), None);
    assert_eq!(selection.selected_file(), None);
    assert!(selection.files_in_folder().is_empty());
}

#[tokio::test]
async fn history_and_revert() {
    let (remote, session) = session(MemoryRemoteStore::new().with_dir("Notes"));
    for body in ["one", "two", "three"] {
        session.save_file("Notes/a.md", body).await.unwrap();
    }
    let history = session.file_history("Notes/a.md").await.unwrap();
    let first = history.last().unwrap().id;
    assert_eq!(session.file_version("Notes/a.md", first).await.unwrap(), "one");

    let content = session
        .apply_version("Notes/a.md", first, Some("back to one"))
        .await
        .unwrap();
    assert_eq!(content, "one");
    assert_eq!(remote.content_of("Notes/a.md").unwrap(), "one");
    let history = session.file_history("Notes/a.md").await.unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].comment, "back to one");
}

#[tokio::test]
async fn search_and_attachments() {
    let (_remote, session) = session(
        MemoryRemoteStore::new()
            .with_file("Notes/a.md", "apples and pears")
            .with_file("Notes/b.md", "only pears")
            .with_attachment("Notes/a.md", "pic.png", 120),
    );

    let hits = session.search("apples", false).await.unwrap();
    let paths: Vec<&str> = hits.iter().map(|h| h.path.as_str()).collect();
    assert_eq!(paths, vec!["Notes/a.md"]);

    let attachments = session.list_attachments("Notes/a.md").await.unwrap();
    assert_eq!(attachments.len(), 1);
    let attach_path = attachments[0].attach_path.clone();
    session
        .delete_attachment("Notes/a.md", &attach_path)
        .await
        .unwrap();
    assert!(session.list_attachments("Notes/a.md").await.unwrap().is_empty());
}
