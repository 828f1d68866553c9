use crate::ignore_rules::IgnoreMatcher;
use crate::semantic::SemanticIndex;
use crate::{IndexStats, IndexerConfig, IndexerError, ProjectIndexer, Result};
use log::{debug, error, info, warn};
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use scaffold_store::GraphStore;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task;
use tokio::time::{self, Instant};

const DEFAULT_REASON: &str = "fs_event";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FsEventKind {
    Created,
    Deleted,
    Modified,
    /// The path is the source of a move or rename
    Moved,
}

/// One file-system observation, independent of the notify backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub path: PathBuf,
    pub is_dir: bool,
}

impl FsEvent {
    pub fn new(kind: FsEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::new(FsEventKind::Created, path)
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::new(FsEventKind::Deleted, path)
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(FsEventKind::Modified, path)
    }

    pub fn moved(path: impl Into<PathBuf>) -> Self {
        Self::new(FsEventKind::Moved, path)
    }

    #[must_use]
    pub fn directory(mut self) -> Self {
        self.is_dir = true;
        self
    }

    /// Translate a notify event; access and unclassified events yield nothing.
    ///
    /// A rename destination counts as a creation, its source as a move.
    pub fn from_notify(event: &Event) -> Vec<Self> {
        let mut out = Vec::with_capacity(event.paths.len());
        match event.kind {
            EventKind::Create(kind) => {
                for path in &event.paths {
                    let is_dir = matches!(kind, CreateKind::Folder) || path.is_dir();
                    out.push(Self::created(path).with_dir(is_dir));
                }
            }
            EventKind::Remove(kind) => {
                for path in &event.paths {
                    out.push(Self::deleted(path).with_dir(matches!(kind, RemoveKind::Folder)));
                }
            }
            EventKind::Modify(ModifyKind::Name(mode)) => match mode {
                RenameMode::From => {
                    out.extend(event.paths.iter().map(|path| Self::moved(path)));
                }
                RenameMode::To => {
                    for path in &event.paths {
                        out.push(Self::created(path).with_dir(path.is_dir()));
                    }
                }
                RenameMode::Both => {
                    if let [from, to, ..] = event.paths.as_slice() {
                        out.push(Self::moved(from));
                        out.push(Self::created(to).with_dir(to.is_dir()));
                    }
                }
                RenameMode::Any | RenameMode::Other => {
                    // Only one side is reported; whether the path still exists tells which.
                    for path in &event.paths {
                        if path.exists() {
                            out.push(Self::created(path).with_dir(path.is_dir()));
                        } else {
                            out.push(Self::moved(path));
                        }
                    }
                }
            },
            EventKind::Modify(_) => {
                for path in &event.paths {
                    out.push(Self::modified(path).with_dir(path.is_dir()));
                }
            }
            EventKind::Access(_) | EventKind::Any | EventKind::Other => {}
        }
        out
    }

    fn with_dir(mut self, is_dir: bool) -> Self {
        self.is_dir = is_dir;
        self
    }
}

/// Deduplicated paths of one processing cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub created: BTreeSet<PathBuf>,
    pub deleted: BTreeSet<PathBuf>,
    pub modified: BTreeSet<PathBuf>,
}

impl ChangeSet {
    /// Classify a drained queue. Directory events and paths ending with
    /// `backup_suffix` are dropped; a moved path counts as deleted.
    pub fn from_events(events: &[FsEvent], backup_suffix: &str) -> Self {
        let mut changes = Self::default();
        for event in events {
            if event.is_dir {
                continue;
            }
            if !backup_suffix.is_empty() && event.path.to_string_lossy().ends_with(backup_suffix) {
                continue;
            }
            let path = event.path.clone();
            match event.kind {
                FsEventKind::Created => changes.created.insert(path),
                FsEventKind::Deleted | FsEventKind::Moved => changes.deleted.insert(path),
                FsEventKind::Modified => changes.modified.insert(path),
            };
        }
        changes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.deleted.is_empty() && self.modified.is_empty()
    }

    /// Created or modified paths, each once
    pub fn changed(&self) -> impl Iterator<Item = &PathBuf> {
        self.created.union(&self.modified)
    }
}

/// One finished processing cycle
#[derive(Debug, Clone, Serialize)]
pub struct IndexUpdate {
    pub completed_at: SystemTime,
    pub duration_ms: u64,
    pub stats: Option<IndexStats>,
    pub success: bool,
    pub reason: String,
    pub created: usize,
    pub deleted: usize,
    pub modified: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexerHealth {
    pub last_success: Option<SystemTime>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub last_duration_ms: Option<u64>,
    pub pending_events: usize,
    pub indexing: bool,
    pub cycles: u64,
}

impl IndexerHealth {
    const fn initial() -> Self {
        Self {
            last_success: None,
            last_error: None,
            consecutive_failures: 0,
            last_duration_ms: None,
            pending_events: 0,
            indexing: false,
            cycles: 0,
        }
    }
}

/// Keeps the stored graph in step with the project tree.
///
/// File-system events are debounced on the trailing edge: every relevant
/// event restarts the window, and only a quiet window drains the queue into
/// one processing cycle. Cycles run inline in the watch task, so a new cycle
/// never starts while one is in progress.
#[derive(Clone)]
pub struct StreamingIndexer {
    inner: Arc<StreamingIndexerInner>,
}

struct StreamingIndexerInner {
    command_tx: mpsc::Sender<WatcherCommand>,
    update_tx: broadcast::Sender<IndexUpdate>,
    health_tx: watch::Sender<IndexerHealth>,
    _watcher: Option<RecommendedWatcher>,
}

enum WatcherCommand {
    Trigger { reason: String },
    Shutdown,
}

impl StreamingIndexer {
    /// Watch the indexer's root with the platform notify backend
    pub fn start<S>(indexer: Arc<ProjectIndexer<S>>, semantic: Arc<dyn SemanticIndex>) -> Result<Self>
    where
        S: GraphStore + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel(1024);
        let watcher = create_fs_watcher(
            indexer.root(),
            event_tx,
            indexer.config().poll_interval(),
        )?;
        info!("Watching {}", indexer.root().display());
        Ok(Self::spawn(indexer, semantic, event_rx, Some(watcher)))
    }

    /// Drive the watcher from an external event channel instead of notify
    pub fn attach<S>(
        indexer: Arc<ProjectIndexer<S>>,
        semantic: Arc<dyn SemanticIndex>,
        events: mpsc::Receiver<FsEvent>,
    ) -> Self
    where
        S: GraphStore + 'static,
    {
        Self::spawn(indexer, semantic, events, None)
    }

    fn spawn<S>(
        indexer: Arc<ProjectIndexer<S>>,
        semantic: Arc<dyn SemanticIndex>,
        event_rx: mpsc::Receiver<FsEvent>,
        watcher: Option<RecommendedWatcher>,
    ) -> Self
    where
        S: GraphStore + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (health_tx, _) = watch::channel(IndexerHealth::initial());
        let (update_tx, _) = broadcast::channel(32);

        spawn_watch_loop(
            indexer,
            semantic,
            event_rx,
            command_rx,
            update_tx.clone(),
            health_tx.clone(),
        );

        Self {
            inner: Arc::new(StreamingIndexerInner {
                command_tx,
                update_tx,
                health_tx,
                _watcher: watcher,
            }),
        }
    }

    /// Run a cycle now, without waiting for the debounce window
    pub async fn trigger(&self, reason: impl Into<String>) -> Result<()> {
        self.inner
            .command_tx
            .send(WatcherCommand::Trigger {
                reason: reason.into(),
            })
            .await
            .map_err(|e| IndexerError::Other(format!("failed to send trigger: {e}")))?;
        Ok(())
    }

    /// Stop the watch task; a cycle already in progress finishes first
    pub async fn shutdown(&self) -> Result<()> {
        self.inner
            .command_tx
            .send(WatcherCommand::Shutdown)
            .await
            .map_err(|e| IndexerError::Other(format!("failed to send shutdown: {e}")))?;
        Ok(())
    }

    #[must_use]
    pub fn subscribe_updates(&self) -> broadcast::Receiver<IndexUpdate> {
        self.inner.update_tx.subscribe()
    }

    #[must_use]
    pub fn health_snapshot(&self) -> IndexerHealth {
        self.inner.health_tx.borrow().clone()
    }
}

impl Drop for StreamingIndexer {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.command_tx.try_send(WatcherCommand::Shutdown);
        }
    }
}

fn create_fs_watcher(
    root: &Path,
    sender: mpsc::Sender<FsEvent>,
    poll_interval: Duration,
) -> Result<RecommendedWatcher> {
    let root = root.to_path_buf();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for fs_event in FsEvent::from_notify(&event) {
                    if sender.blocking_send(fs_event).is_err() {
                        return;
                    }
                }
            }
            Err(err) => warn!("Watcher error: {err}"),
        },
        NotifyConfig::default().with_poll_interval(poll_interval),
    )?;
    watcher.watch(&root, RecursiveMode::Recursive)?;
    Ok(watcher)
}

fn spawn_watch_loop<S>(
    indexer: Arc<ProjectIndexer<S>>,
    semantic: Arc<dyn SemanticIndex>,
    mut event_rx: mpsc::Receiver<FsEvent>,
    mut command_rx: mpsc::Receiver<WatcherCommand>,
    update_tx: broadcast::Sender<IndexUpdate>,
    health_tx: watch::Sender<IndexerHealth>,
) where
    S: GraphStore + 'static,
{
    tokio::spawn(async move {
        let config = indexer.config().clone();
        let relevance = Arc::new(Relevance::new(indexer.root(), &config));
        let mut state = DebounceState::new(config.debounce());
        let mut health = IndexerHealth::initial();

        loop {
            let next_deadline = state.next_deadline();

            tokio::select! {
                Some(event) = event_rx.recv() => {
                    // Ignore-rule lookups read the file system.
                    let filter = Arc::clone(&relevance);
                    let accepted =
                        task::spawn_blocking(move || filter.accepts(&event).then_some(event)).await;
                    let event = match accepted {
                        Ok(event) => event,
                        Err(e) => {
                            warn!("Relevance check failed: {e}");
                            None
                        }
                    };
                    if let Some(event) = event {
                        state.record_event(event);
                        debug!(
                            "Debouncing {} events, next cycle in {} ms",
                            state.pending(),
                            config.debounce_ms
                        );
                        health.pending_events = state.pending();
                        health_tx.send_replace(health.clone());
                    }
                }
                Some(cmd) = command_rx.recv() => {
                    match cmd {
                        WatcherCommand::Trigger { reason } => {
                            state.force_run(reason);
                            health.pending_events = state.pending();
                            health_tx.send_replace(health.clone());
                        }
                        WatcherCommand::Shutdown => break,
                    }
                }
                () = async {
                    if let Some(deadline) = next_deadline {
                        time::sleep_until(deadline).await;
                    }
                }, if next_deadline.is_some() => {
                    let batch = state.drain();
                    let changes = ChangeSet::from_events(&batch.events, &config.backup_suffix);
                    health.pending_events = 0;
                    if changes.is_empty() && !batch.forced {
                        debug!("Nothing to process in {} drained events", batch.events.len());
                        health_tx.send_replace(health.clone());
                        continue;
                    }

                    health.indexing = true;
                    health_tx.send_replace(health.clone());

                    let update = run_cycle(&indexer, semantic.as_ref(), &changes, batch.reason).await;

                    health.indexing = false;
                    health.cycles += 1;
                    health.last_duration_ms = Some(update.duration_ms);
                    if update.success {
                        health.last_success = Some(update.completed_at);
                        health.last_error = None;
                        health.consecutive_failures = 0;
                    } else {
                        health.last_error.clone_from(&update.error);
                        health.consecutive_failures += 1;
                    }
                    health_tx.send_replace(health.clone());
                    let _ = update_tx.send(update);
                }
            }
        }
        debug!("Watch loop for {} stopped", indexer.root().display());
    });
}

/// Notify the semantic index, then rebuild the whole graph once
async fn run_cycle<S: GraphStore>(
    indexer: &ProjectIndexer<S>,
    semantic: &dyn SemanticIndex,
    changes: &ChangeSet,
    reason: String,
) -> IndexUpdate {
    let started = Instant::now();
    info!(
        "Processing changes ({reason}): {} created, {} deleted, {} modified",
        changes.created.len(),
        changes.deleted.len(),
        changes.modified.len()
    );

    for path in &changes.deleted {
        if let Err(e) = semantic.remove_path(path).await {
            warn!("Semantic index failed to drop {}: {e}", path.display());
        }
    }
    for path in changes.changed() {
        if let Err(e) = semantic.remove_path(path).await {
            warn!("Semantic index failed to drop {}: {e}", path.display());
        }
        if let Err(e) = semantic.add_file(path).await {
            warn!("Semantic index failed to add {}: {e}", path.display());
        }
    }

    let result = indexer.index_with_clear().await;
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let (stats, error) = match result {
        Ok(stats) => {
            info!("File change processing finished in {duration_ms} ms");
            (Some(stats), None)
        }
        Err(e) => {
            error!("Reindex after file changes failed: {e}");
            (None, Some(e.to_string()))
        }
    };

    IndexUpdate {
        completed_at: SystemTime::now(),
        duration_ms,
        success: error.is_none(),
        stats,
        reason,
        created: changes.created.len(),
        deleted: changes.deleted.len(),
        modified: changes.modified.len(),
        error,
    }
}

/// Filters events for paths the pipeline never looks at
struct Relevance {
    root: PathBuf,
    state_dir: PathBuf,
    matcher: IgnoreMatcher,
}

impl Relevance {
    fn new(root: &Path, config: &IndexerConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            state_dir: config.state_path(root),
            matcher: IgnoreMatcher::new(root, config.ignore_file.clone()),
        }
    }

    fn accepts(&self, event: &FsEvent) -> bool {
        let path = if event.path.is_absolute() {
            event.path.clone()
        } else {
            self.root.join(&event.path)
        };
        if path.starts_with(&self.state_dir) {
            return false;
        }
        if self.matcher.is_rule_file(&path) {
            self.matcher.invalidate();
            return true;
        }
        !self.matcher.is_ignored_with_hint(&path, Some(event.is_dir))
    }
}

struct Batch {
    events: Vec<FsEvent>,
    reason: String,
    forced: bool,
}

struct DebounceState {
    debounce: Duration,
    events: Vec<FsEvent>,
    last_event: Option<Instant>,
    reason: Option<String>,
    force_immediate: bool,
}

impl DebounceState {
    const fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            events: Vec::new(),
            last_event: None,
            reason: None,
            force_immediate: false,
        }
    }

    fn record_event(&mut self, event: FsEvent) {
        self.events.push(event);
        self.last_event = Some(Instant::now());
        self.reason.get_or_insert_with(|| DEFAULT_REASON.to_string());
    }

    fn force_run(&mut self, reason: String) {
        self.reason = Some(reason);
        self.force_immediate = true;
    }

    fn pending(&self) -> usize {
        self.events.len()
    }

    fn should_run(&self) -> bool {
        self.force_immediate || !self.events.is_empty()
    }

    fn next_deadline(&self) -> Option<Instant> {
        if !self.should_run() {
            return None;
        }
        if self.force_immediate {
            return Some(Instant::now());
        }
        self.last_event.map(|last| last + self.debounce)
    }

    fn drain(&mut self) -> Batch {
        let batch = Batch {
            events: std::mem::take(&mut self.events),
            reason: self
                .reason
                .take()
                .unwrap_or_else(|| DEFAULT_REASON.to_string()),
            forced: self.force_immediate,
        };
        self.last_event = None;
        self.force_immediate = false;
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paths(items: &[&str]) -> BTreeSet<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[tokio::test]
    async fn ignore_file_event_reloads_rules_off_the_runtime() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let relevance = Arc::new(Relevance::new(&root, &IndexerConfig::default()));
        let check = |event: FsEvent| {
            let relevance = Arc::clone(&relevance);
            task::spawn_blocking(move || relevance.accepts(&event))
        };

        assert!(check(FsEvent::created(root.join("build/out.py"))).await.unwrap());
        assert!(!check(FsEvent::modified(root.join(".scaffold/graph.json"))).await.unwrap());

        std::fs::write(root.join(".scaffoldignore"), "build/\n").unwrap();
        assert!(check(FsEvent::modified(root.join(".scaffoldignore"))).await.unwrap());
        assert!(!check(FsEvent::created(root.join("build/out.py"))).await.unwrap());
        assert!(check(FsEvent::created(root.join("src/main.py"))).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn every_event_pushes_the_deadline_back() {
        let mut state = DebounceState::new(Duration::from_secs(2));
        assert!(state.next_deadline().is_none());

        let start = Instant::now();
        state.record_event(FsEvent::modified("/p/a.py"));
        assert_eq!(state.next_deadline(), Some(start + Duration::from_secs(2)));

        time::advance(Duration::from_millis(1500)).await;
        state.record_event(FsEvent::modified("/p/b.py"));
        assert_eq!(
            state.next_deadline(),
            Some(start + Duration::from_millis(3500))
        );
        assert_eq!(state.pending(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn force_run_sets_immediate_deadline() {
        let mut state = DebounceState::new(Duration::from_secs(5));
        state.force_run("manual".to_string());
        assert!(state.should_run());
        assert_eq!(state.next_deadline(), Some(Instant::now()));

        let batch = state.drain();
        assert!(batch.forced);
        assert_eq!(batch.reason, "manual");
        assert!(!state.should_run());
    }

    #[test]
    fn change_set_deduplicates_and_classifies() {
        let events = vec![
            FsEvent::created("/p/new.py"),
            FsEvent::modified("/p/a.py"),
            FsEvent::modified("/p/a.py"),
            FsEvent::deleted("/p/old.py"),
            FsEvent::moved("/p/renamed_from.py"),
            FsEvent::modified("/p/a.py~"),
            FsEvent::created("/p/pkg").directory(),
        ];
        let changes = ChangeSet::from_events(&events, "~");
        assert_eq!(changes.created, paths(&["/p/new.py"]));
        assert_eq!(changes.modified, paths(&["/p/a.py"]));
        assert_eq!(changes.deleted, paths(&["/p/old.py", "/p/renamed_from.py"]));
        assert_eq!(
            changes.changed().cloned().collect::<Vec<_>>(),
            vec![PathBuf::from("/p/a.py"), PathBuf::from("/p/new.py")]
        );
    }

    #[test]
    fn notify_renames_split_into_move_and_create() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/nonexistent/a.py"))
            .add_path(PathBuf::from("/nonexistent/b.py"));
        assert_eq!(
            FsEvent::from_notify(&event),
            vec![
                FsEvent::moved("/nonexistent/a.py"),
                FsEvent::created("/nonexistent/b.py"),
            ]
        );

        let access = Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/nonexistent/a.py"));
        assert!(FsEvent::from_notify(&access).is_empty());
    }

    #[test]
    fn notify_folder_removal_is_a_directory_event() {
        let event = Event::new(EventKind::Remove(RemoveKind::Folder))
            .add_path(PathBuf::from("/nonexistent/pkg"));
        let events = FsEvent::from_notify(&event);
        assert!(events[0].is_dir);
        assert!(ChangeSet::from_events(&events, "~").is_empty());
    }
}
