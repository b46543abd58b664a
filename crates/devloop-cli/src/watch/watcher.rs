//! File system watcher that delivers debounced batches.
//!
//! Watches a directory recursively with `notify`, drops paths that should never
//! trigger anything (`.git`, `node_modules`, `.gitignore` matches), and groups
//! what is left into batches. A batch is flushed once no new event has arrived
//! for the debounce window, or once it has been open for ten windows.

use crate::error::{CliError, Result};
use crate::watch::{ChangeEvent, ChangeOp};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Path components that are never reported.
const ALWAYS_IGNORED: &[&str] = &[".git", "node_modules"];

/// A batch is flushed at the latest this many debounce windows after its
/// first event.
const MAX_BATCH_AGE_FACTOR: u32 = 10;

/// Capacity of the batch channel handed to the dispatcher.
const BATCH_CHANNEL_CAPACITY: usize = 16;

/// Handle to a running watcher. Dropping it stops watching.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    batcher: JoinHandle<()>,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching `root` recursively.
    ///
    /// Must be called from within a tokio runtime. Returns the handle and the
    /// receiver of change batches; the receiver yields `None` once the handle
    /// is dropped.
    ///
    /// # Errors
    ///
    /// Returns error if the directory doesn't exist or the OS watcher cannot
    /// be created.
    pub fn start(
        root: impl Into<PathBuf>,
        debounce: Duration,
    ) -> Result<(Self, mpsc::Receiver<Vec<ChangeEvent>>)> {
        let root = root.into();
        if !root.is_dir() {
            return Err(CliError::FileNotFound(root));
        }
        let root = std::fs::canonicalize(&root)?;
        let gitignore = build_gitignore_matcher(&root);

        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<ChangeEvent>();
        let (batch_tx, batch_rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);

        let callback_root = root.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    let Some(op) = classify_kind(&event.kind) else {
                        return;
                    };
                    for path in &event.paths {
                        if let Some(change) = to_change_event(op, path, &callback_root, &gitignore)
                        {
                            // Receiver gone means the watcher is shutting down.
                            let _ = raw_tx.send(change);
                        }
                    }
                }
                Err(err) => tracing::warn!(%err, "file watcher error"),
            }
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        let batcher = tokio::spawn(batch_events(raw_rx, batch_tx, debounce));
        tracing::debug!(root = %root.display(), ?debounce, "watching for changes");

        Ok((
            Self {
                _watcher: watcher,
                batcher,
                root,
            },
            batch_rx,
        ))
    }

    /// Get the (canonical) root directory being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.batcher.abort();
    }
}

/// Build a matcher from the root `.gitignore`, or an empty one.
fn build_gitignore_matcher(root: &Path) -> Gitignore {
    let mut builder = GitignoreBuilder::new(root);
    let gitignore_path = root.join(".gitignore");
    if gitignore_path.exists() {
        if let Some(err) = builder.add(&gitignore_path) {
            tracing::warn!(%err, "ignoring unreadable .gitignore");
        }
    }
    builder.build().unwrap_or_else(|_| Gitignore::empty())
}

fn classify_kind(kind: &EventKind) -> Option<ChangeOp> {
    match kind {
        EventKind::Access(_) => None,
        EventKind::Create(_) => Some(ChangeOp::Create),
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeOp::Rename),
        EventKind::Modify(_) => Some(ChangeOp::Modify),
        EventKind::Remove(_) => Some(ChangeOp::Remove),
        EventKind::Any | EventKind::Other => Some(ChangeOp::Other),
    }
}

/// Turn an absolute event path into a root-relative change, or `None` when the
/// path is outside the root or ignored.
fn to_change_event(
    op: ChangeOp,
    path: &Path,
    root: &Path,
    gitignore: &Gitignore,
) -> Option<ChangeEvent> {
    let rel = path.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }

    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(name) => {
                let name = name.to_string_lossy();
                if ALWAYS_IGNORED.contains(&name.as_ref()) {
                    return None;
                }
                parts.push(name.into_owned());
            }
            _ => return None,
        }
    }

    if gitignore
        .matched_path_or_any_parents(rel, path.is_dir())
        .is_ignore()
    {
        return None;
    }

    Some(ChangeEvent::new(op, parts.join("/")))
}

/// Collect raw events into batches separated by `debounce` of quiet.
///
/// A batch is also flushed once it is [`MAX_BATCH_AGE_FACTOR`] debounce
/// windows old, so a steady trickle of events (a child appending to a log)
/// cannot hold it open forever. Duplicate `(op, path)` pairs inside one batch
/// are collapsed, keeping the first occurrence's position.
async fn batch_events(
    mut raw_rx: mpsc::UnboundedReceiver<ChangeEvent>,
    batch_tx: mpsc::Sender<Vec<ChangeEvent>>,
    debounce: Duration,
) {
    let max_age = debounce * MAX_BATCH_AGE_FACTOR;

    while let Some(first) = raw_rx.recv().await {
        let deadline = Instant::now() + max_age;
        let mut seen = HashSet::from([first.clone()]);
        let mut batch = vec![first];
        let mut closed = false;

        loop {
            let now = Instant::now();
            if now >= deadline {
                tracing::debug!(events = batch.len(), "change batch reached its maximum age");
                break;
            }
            match tokio::time::timeout_at((now + debounce).min(deadline), raw_rx.recv()).await {
                Ok(Some(event)) => {
                    if seen.insert(event.clone()) {
                        batch.push(event);
                    }
                }
                Ok(None) => {
                    closed = true;
                    break;
                }
                Err(_) => break,
            }
        }

        tracing::debug!(events = batch.len(), "flushing change batch");
        if batch_tx.send(batch).await.is_err() || closed {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind, RenameMode};
    use tempfile::TempDir;

    #[test]
    fn test_classify_kind() {
        assert_eq!(
            classify_kind(&EventKind::Create(CreateKind::File)),
            Some(ChangeOp::Create)
        );
        assert_eq!(
            classify_kind(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(ChangeOp::Modify)
        );
        assert_eq!(
            classify_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::Both))),
            Some(ChangeOp::Rename)
        );
        assert_eq!(
            classify_kind(&EventKind::Remove(RemoveKind::File)),
            Some(ChangeOp::Remove)
        );
        assert_eq!(classify_kind(&EventKind::Access(AccessKind::Any)), None);
        assert_eq!(classify_kind(&EventKind::Any), Some(ChangeOp::Other));
    }

    #[test]
    fn test_to_change_event_relative_path() {
        let root = PathBuf::from("/project");
        let gitignore = Gitignore::empty();

        let change =
            to_change_event(ChangeOp::Modify, Path::new("/project/src/main.rs"), &root, &gitignore)
                .unwrap();
        assert_eq!(change.path, "src/main.rs");
        assert_eq!(change.op, ChangeOp::Modify);
    }

    #[test]
    fn test_to_change_event_skips_outside_root_and_root_itself() {
        let root = PathBuf::from("/project");
        let gitignore = Gitignore::empty();

        assert!(to_change_event(ChangeOp::Modify, Path::new("/other/x"), &root, &gitignore).is_none());
        assert!(to_change_event(ChangeOp::Modify, Path::new("/project"), &root, &gitignore).is_none());
    }

    #[test]
    fn test_to_change_event_skips_always_ignored() {
        let root = PathBuf::from("/project");
        let gitignore = Gitignore::empty();

        for path in ["/project/.git/index", "/project/web/node_modules/x/index.js"] {
            assert!(
                to_change_event(ChangeOp::Modify, Path::new(path), &root, &gitignore).is_none(),
                "{path}"
            );
        }
    }

    #[test]
    fn test_to_change_event_respects_gitignore() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".gitignore"), "target/\n*.log\n").unwrap();
        let gitignore = build_gitignore_matcher(temp.path());

        let ignored = temp.path().join("target/debug/app");
        let logged = temp.path().join("server.log");
        let kept = temp.path().join("src/lib.rs");

        assert!(to_change_event(ChangeOp::Create, &ignored, temp.path(), &gitignore).is_none());
        assert!(to_change_event(ChangeOp::Create, &logged, temp.path(), &gitignore).is_none());
        assert!(to_change_event(ChangeOp::Create, &kept, temp.path(), &gitignore).is_some());
    }

    #[tokio::test]
    async fn test_batch_events_groups_and_dedupes() {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (batch_tx, mut batch_rx) = mpsc::channel(4);
        tokio::spawn(batch_events(raw_rx, batch_tx, Duration::from_millis(50)));

        raw_tx.send(ChangeEvent::new(ChangeOp::Modify, "a.txt")).unwrap();
        raw_tx.send(ChangeEvent::new(ChangeOp::Modify, "a.txt")).unwrap();
        raw_tx.send(ChangeEvent::new(ChangeOp::Create, "b.txt")).unwrap();

        let batch = batch_rx.recv().await.unwrap();
        assert_eq!(
            batch,
            vec![
                ChangeEvent::new(ChangeOp::Modify, "a.txt"),
                ChangeEvent::new(ChangeOp::Create, "b.txt"),
            ]
        );

        raw_tx.send(ChangeEvent::new(ChangeOp::Remove, "b.txt")).unwrap();
        let batch = batch_rx.recv().await.unwrap();
        assert_eq!(batch, vec![ChangeEvent::new(ChangeOp::Remove, "b.txt")]);

        drop(raw_tx);
        assert!(batch_rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_steady_events_still_flush() {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (batch_tx, mut batch_rx) = mpsc::channel(4);
        tokio::spawn(batch_events(raw_rx, batch_tx, Duration::from_millis(50)));

        let producer = tokio::spawn(async move {
            for i in 0..100 {
                let path = format!("app.log.{}", i % 3);
                if raw_tx.send(ChangeEvent::new(ChangeOp::Modify, path)).is_err() {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        });

        let started = Instant::now();
        let batch = tokio::time::timeout(Duration::from_millis(1500), batch_rx.recv())
            .await
            .expect("batch flushed while events keep arriving")
            .unwrap();
        assert!(started.elapsed() <= Duration::from_millis(600));
        assert_eq!(batch.len(), 3, "{batch:?}");

        let second = tokio::time::timeout(Duration::from_millis(1500), batch_rx.recv())
            .await
            .expect("second batch flushed")
            .unwrap();
        assert!(!second.is_empty());
        producer.abort();
    }

    #[tokio::test]
    async fn test_start_rejects_missing_directory() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let err = FileWatcher::start(&missing, Duration::from_millis(10))
            .err()
            .unwrap();
        assert!(matches!(err, CliError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_start_reports_written_file() {
        let temp = TempDir::new().unwrap();
        let (_watcher, mut rx) = FileWatcher::start(temp.path(), Duration::from_millis(50)).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        std::fs::write(temp.path().join("hello.txt"), "hi").unwrap();

        let batch = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("batch within timeout")
            .expect("channel open");
        assert!(batch.iter().any(|e| e.path == "hello.txt"), "{batch:?}");
    }
}
