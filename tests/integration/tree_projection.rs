use markdrive::remote::MemoryRemoteStore;
use markdrive::cache::SledEditCache;
use markdrive::tree::node::DirectoryNavNode;
use markdrive::Session;
use std::sync::Arc;

fn session(remote: MemoryRemoteStore) -> (Arc<MemoryRemoteStore>, Session) {
    let remote = Arc::new(remote);
    let cache = Arc::new(SledEditCache::temporary().unwrap());
    let session = Session::new(remote.clone(), cache);
    (remote, session)
}

fn nav<'a>(nodes: &'a [DirectoryNavNode], name: &str) -> &'a DirectoryNavNode {
    nodes
        .iter()
        .find(|n| n.name == name)
        .unwrap_or_else(|| panic!("no folder named {}", name))
}

#[tokio::test]
async fn rename_into_subfolder_keeps_recursive_counts() {
    let (_remote, session) = session(
        MemoryRemoteStore::new()
            .with_file("Notes/a.md", "a")
            .with_file("Notes/Sub/b.md", "b"),
    );

    let before = session.load_tree().await.unwrap();
    let notes = nav(before.nav_tree(), "Notes");
    assert_eq!(notes.markdown_file_count, 2);
    assert_eq!(nav(&notes.children, "Sub").markdown_file_count, 1);

    session
        .move_file("Notes/a.md", "Notes/Sub/a.md")
        .await
        .unwrap();

    let after = session.tree();
    let notes = nav(after.nav_tree(), "Notes");
    assert_eq!(notes.markdown_file_count, 2);
    assert_eq!(nav(&notes.children, "Sub").markdown_file_count, 2);

    let direct: Vec<String> = after
        .markdown_files_in("Notes")
        .unwrap()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert!(direct.is_empty());
    assert!(after.file_exists("Notes/Sub/a.md"));
}

#[tokio::test]
async fn recycle_sorts_last_and_directories_first() {
    let (_remote, session) = session(
        MemoryRemoteStore::new()
            .with_file("zeta.md", "z")
            .with_file("alpha/a.md", "a")
            .with_file("Beta/b.md", "b")
            .with_file("apple.md", "x"),
    );
    let snapshot = session.load_tree().await.unwrap();
    let names: Vec<&str> = snapshot
        .full_tree()
        .iter()
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(names, vec!["alpha", "Beta", "apple.md", "zeta.md", "Recycle"]);

    let folders: Vec<&str> = snapshot
        .nav_tree()
        .iter()
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(folders, vec!["alpha", "Beta", "Recycle"]);
}

#[tokio::test]
async fn non_markdown_files_do_not_count() {
    let (_remote, session) = session(
        MemoryRemoteStore::new()
            .with_file("Docs/readme.MD", "r")
            .with_dir("Docs/img"),
    );
    let snapshot = session.load_tree().await.unwrap();
    let docs = nav(snapshot.nav_tree(), "Docs");
    assert_eq!(docs.markdown_file_count, 1);
    assert_eq!(nav(&docs.children, "img").markdown_file_count, 0);
    assert_eq!(snapshot.markdown_files(), 1);
}

#[tokio::test]
async fn failed_reload_leaves_both_views_untouched() {
    let (remote, session) = session(MemoryRemoteStore::new().with_file("Notes/a.md", "a"));
    let loaded = session.load_tree().await.unwrap();

    remote.set_fail_listing(true);
    assert!(session.load_tree().await.is_err());

    let current = session.tree();
    assert!(Arc::ptr_eq(&loaded, &current));
    assert_eq!(current.nav_tree().len(), current.full_tree().len());
}
