use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use preiter::nonblocking::{BoxCursor, Cursor, HeteroStack, Recursable, Sequence};
use preiter::{Direction, Interner, Node, Step, Term};
use test_support::TempTree;

use super::*;

fn interner() -> Arc<Interner<PathBuf>> {
    Arc::new(Interner::new())
}

async fn nested(builder: WalkBuilder, interner: &Arc<Interner<PathBuf>>) -> Recursable<Entry> {
    match builder.build(interner).await.expect("build") {
        Node::Nested(tree) => tree,
        Node::Leaf(entry) => panic!("expected a directory, got {entry:?}"),
    }
}

async fn drain(cursor: &mut BoxCursor<Entry>, direction: Direction) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    while let Step::Value(entry) = cursor.get(direction).await.expect("step") {
        paths.push(entry.relative_path().to_path_buf());
    }
    paths
}

async fn relative_paths(tree: Recursable<Entry>) -> Vec<PathBuf> {
    let stack = HeteroStack::flatten(tree);
    drain(&mut stack.cursor(), Direction::Forward).await
}

fn paths(expected: &[&str]) -> Vec<PathBuf> {
    expected.iter().map(PathBuf::from).collect()
}

#[tokio::test]
async fn missing_root_is_reported() {
    let error = WalkBuilder::new("/nonexistent/path/for/walker")
        .build(&interner())
        .await
        .expect_err("missing root should fail");
    assert!(matches!(error.kind(), WalkErrorKind::RootMetadata { .. }));
    assert_eq!(error.path(), Path::new("/nonexistent/path/for/walker"));
    assert!(error.is_not_found());
}

#[tokio::test]
async fn file_root_is_a_single_leaf() {
    let tree = TempTree::with(&["file.txt"]).expect("tree");
    let root = WalkBuilder::new(tree.join("file.txt"))
        .build(&interner())
        .await
        .expect("build");
    let entry = root.into_leaf().expect("leaf");
    assert_eq!(entry.full_path(), tree.join("file.txt"));
    assert_eq!(entry.relative_path(), Path::new("file.txt"));
    assert_eq!(entry.depth(), 0);
    assert_eq!(entry.len(), "file.txt".len() as u64);
}

#[tokio::test]
async fn directory_yields_deterministic_order() {
    let tree = TempTree::with(&["root/c.txt", "root/a/inner.txt", "root/b/", "root/B.txt"]).expect("tree");
    let root = nested(WalkBuilder::new(tree.join("root")), &interner()).await;
    assert_eq!(
        relative_paths(root).await,
        paths(&["root/B.txt", "root/a/inner.txt", "root/c.txt"])
    );
}

#[tokio::test]
async fn backward_walk_mirrors_forward() {
    let tree = TempTree::with(&["r/1", "r/2/3", "r/2/4/5", "r/6"]).expect("tree");
    let root = nested(WalkBuilder::new(tree.join("r")), &interner()).await;
    let stack = HeteroStack::flatten(root);
    let mut cursor = stack.cursor();

    let forward = drain(&mut cursor, Direction::Forward).await;
    assert_eq!(forward, paths(&["r/1", "r/2/3", "r/2/4/5", "r/6"]));
    let mut backward = drain(&mut cursor, Direction::Backward).await;
    backward.reverse();
    assert_eq!(backward, forward);
}

#[tokio::test]
async fn entries_report_depth_and_name() {
    let tree = TempTree::with(&["root/nested/file.txt"]).expect("tree");
    let root = nested(WalkBuilder::new(tree.join("root")), &interner()).await;
    let stack = HeteroStack::flatten(root);
    let mut cursor = stack.cursor();
    let entry = cursor.next().await.expect("next").value().expect("entry");
    assert_eq!(entry.file_name(), Some(OsStr::new("file.txt")));
    assert_eq!(entry.depth(), 2);
    assert_eq!(entry.full_path(), tree.join("root/nested/file.txt"));
}

#[tokio::test]
async fn same_directory_gets_same_identity() {
    let tree = TempTree::with(&["root/x.txt"]).expect("tree");
    let interner = interner();
    let first = nested(WalkBuilder::new(tree.join("root")), &interner).await;
    let second = nested(WalkBuilder::new(tree.join("root")), &interner).await;
    assert_eq!(first.identity(), second.identity());
    assert_eq!(interner.len(), 1);
}

#[tokio::test]
async fn each_cursor_relists_the_directory() {
    let tree = TempTree::with(&["root/a.txt"]).expect("tree");
    let root = nested(WalkBuilder::new(tree.join("root")), &interner()).await;
    let stack = HeteroStack::flatten(root);
    assert_eq!(drain(&mut stack.cursor(), Direction::Forward).await, paths(&["root/a.txt"]));

    tree.file("root/b.txt", b"new").expect("write");
    assert_eq!(
        drain(&mut stack.cursor(), Direction::Forward).await,
        paths(&["root/a.txt", "root/b.txt"])
    );
}

#[tokio::test]
async fn empty_directory_is_empty() {
    let tree = TempTree::with(&["root/empty/"]).expect("tree");
    let root = nested(WalkBuilder::new(tree.join("root")), &interner()).await;
    let stack = HeteroStack::flatten(root);
    let mut cursor = stack.cursor();
    assert_eq!(cursor.next().await.expect("next").term(), Some(Term::EndOfData));
    assert_eq!(cursor.previous().await.expect("previous").term(), Some(Term::StartOfData));
}

#[tokio::test]
async fn collection_skips_missing_paths() {
    let tree = TempTree::with(&["one/a.txt", "two.txt"]).expect("tree");
    let collection = collection(
        [tree.join("one"), tree.join("missing"), tree.join("two.txt")],
        WalkOptions::default(),
        &interner(),
    )
    .await
    .expect("collection");
    assert_eq!(relative_paths(collection).await, paths(&["one/a.txt", "two.txt"]));
}

#[cfg(unix)]
#[tokio::test]
async fn symlinks_are_skipped_by_default() {
    let tree = TempTree::with(&["root/", "target/inner.txt"]).expect("tree");
    tree.symlink("target", "root/link").expect("symlink");
    let root = nested(WalkBuilder::new(tree.join("root")), &interner()).await;
    assert!(relative_paths(root).await.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn symlinks_are_followed_when_enabled() {
    let tree = TempTree::with(&["root/", "target/inner.txt"]).expect("tree");
    tree.symlink("target", "root/link").expect("symlink");
    tree.symlink("target/inner.txt", "root/file-link").expect("symlink");
    let root = nested(WalkBuilder::new(tree.join("root")).follow_symlinks(true), &interner()).await;
    assert_eq!(
        relative_paths(root).await,
        paths(&["root/file-link", "root/link/inner.txt"])
    );
}

#[cfg(unix)]
#[tokio::test]
async fn symlink_cycles_terminate() {
    let tree = TempTree::with(&["root/a.txt"]).expect("tree");
    tree.symlink("root", "root/self").expect("symlink");
    let root = nested(WalkBuilder::new(tree.join("root")).follow_symlinks(true), &interner()).await;
    assert_eq!(relative_paths(root).await, paths(&["root/a.txt"]));
}

#[cfg(unix)]
#[tokio::test]
async fn root_symlink_needs_following() {
    let tree = TempTree::with(&["target/file.txt"]).expect("tree");
    let link = tree.symlink("target", "link").expect("symlink");

    let error = WalkBuilder::new(&link)
        .build(&interner())
        .await
        .expect_err("unfollowed symlink root");
    assert!(matches!(error.kind(), WalkErrorKind::UnsupportedRoot { .. }));

    let root = nested(WalkBuilder::new(&link).follow_symlinks(true), &interner()).await;
    let stack = HeteroStack::flatten(root);
    let entry = stack.cursor().next().await.expect("next").value().expect("entry");
    assert_eq!(entry.relative_path(), Path::new("link/file.txt"));
    assert_eq!(entry.full_path(), link.join("file.txt"));
}
