//! Watch mode: keep an export artifact fresh.
//!
//! One regeneration runs immediately, then again on a fixed interval. A
//! best-effort file watch on the registry arms a debounce window, so a burst
//! of edits produces a single extra regeneration. Every trigger is serviced
//! by the same task, so regenerations never overlap. A change-triggered
//! regeneration invalidates the source cache first, so an edit made inside
//! the cache window is not written out as the previous snapshot.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::export::{format_graph, ExportFormat, HtmlOptions};
use crate::source::{GraphSource, Source};

/// Something watch mode can rebuild. Returns the entity count written.
#[async_trait::async_trait]
pub trait Regenerate: Send + 'static {
    async fn regenerate(&mut self) -> Result<usize>;

    /// Called before a regeneration caused by a file change.
    fn invalidate(&mut self) {}
}

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub interval: Duration,
    pub debounce: Duration,
    /// File whose changes trigger a debounced regeneration.
    pub watch_path: Option<PathBuf>,
}

impl WatchConfig {
    pub fn new(interval: Duration, debounce: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_secs(1)),
            debounce,
            watch_path: None,
        }
    }

    pub fn watching(mut self, path: impl Into<PathBuf>) -> Self {
        self.watch_path = Some(path.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Starting,
    Running,
    Stopped,
}

/// A running watch loop. Dropping it stops the timers without the
/// `[watch] stopped` line; call [`WatchSession::cleanup`] for an orderly stop.
pub struct WatchSession {
    state: WatchState,
    task: Option<JoinHandle<()>>,
    watcher: Option<RecommendedWatcher>,
    changes: UnboundedSender<()>,
}

impl WatchSession {
    /// Run the first regeneration, then hand the generator to the loop task.
    /// Must be called inside a tokio runtime.
    pub async fn start<R: Regenerate>(mut regen: R, config: WatchConfig) -> Self {
        let (tx, rx) = unbounded_channel();
        let mut session = Self {
            state: WatchState::Starting,
            task: None,
            watcher: None,
            changes: tx,
        };

        run_once(&mut regen).await;

        if let Some(path) = &config.watch_path {
            match attach_watcher(path, session.changes.clone()) {
                Ok(watcher) => session.watcher = Some(watcher),
                Err(e) => warn!(
                    path = %path.display(),
                    error = %e,
                    "file watch unavailable, using interval only"
                ),
            }
        }

        info!(
            interval_secs = config.interval.as_secs(),
            file_watch = session.watcher.is_some(),
            "watch mode started"
        );
        session.task = Some(tokio::spawn(run_loop(regen, config, rx)));
        session.state = WatchState::Running;
        session
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Report a change to the watched file, as the file watch itself does.
    pub fn notify_file_change(&self) {
        let _ = self.changes.send(());
    }

    /// Cancel the interval, any pending debounce, and the file watch.
    pub fn cleanup(&mut self) {
        if self.state == WatchState::Stopped {
            return;
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.watcher = None;
        self.state = WatchState::Stopped;
        println!("[watch] stopped");
        info!("watch mode stopped");
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn attach_watcher(path: &Path, changes: UnboundedSender<()>) -> Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| match res {
            Ok(event) if is_content_change(&event.kind) => {
                let _ = changes.send(());
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "file watch error"),
        },
        notify::Config::default(),
    )?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;
    debug!(path = %path.display(), "watching registry file");
    Ok(watcher)
}

/// Access and open events fire on our own reads; only content changes count.
fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

async fn run_once<R: Regenerate>(regen: &mut R) {
    if let Err(e) = regen.regenerate().await {
        eprintln!("[watch] regeneration failed: {}", e);
        error!(error = %e, "watch regeneration failed");
    }
}

async fn run_loop<R: Regenerate>(
    mut regen: R,
    config: WatchConfig,
    mut changes: UnboundedReceiver<()>,
) {
    let mut ticker = interval_at(Instant::now() + config.interval, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut debounce_until: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            Some(()) = changes.recv() => {
                debounce_until = Some(Instant::now() + config.debounce);
                continue;
            }
            _ = sleep_until(debounce_until.unwrap_or_else(Instant::now)), if debounce_until.is_some() => {
                debounce_until = None;
                debug!("registry changed, regenerating");
                regen.invalidate();
            }
        }
        run_once(&mut regen).await;
    }
}

/// Regenerates one export artifact from a graph source.
pub struct ArtifactWriter {
    source: GraphSource,
    format: ExportFormat,
    html: HtmlOptions,
    path: PathBuf,
}

impl ArtifactWriter {
    /// `format` is narrowed to a watch-capable one; the artifact lands in
    /// `output_dir` under that format's fixed name.
    pub fn new(source: GraphSource, format: ExportFormat, html: HtmlOptions, output_dir: &Path) -> Self {
        let format = format.for_watch();
        Self {
            source,
            format,
            html,
            path: output_dir.join(format.artifact_name()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl Regenerate for ArtifactWriter {
    async fn regenerate(&mut self) -> Result<usize> {
        let data = self.source.get_data().await;
        let text = format_graph(&data, self.format, &self.html)?;
        tokio::fs::write(&self.path, text).await?;
        println!(
            "[watch] {} updated ({} entities)",
            self.format.artifact_name(),
            data.nodes.len()
        );
        Ok(data.nodes.len())
    }

    fn invalidate(&mut self) {
        self.source.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counter(Arc<AtomicUsize>);

    #[async_trait::async_trait]
    impl Regenerate for Counter {
        async fn regenerate(&mut self) -> Result<usize> {
            Ok(self.0.fetch_add(1, Ordering::SeqCst) + 1)
        }
    }

    struct Failing(Arc<AtomicUsize>);

    #[async_trait::async_trait]
    impl Regenerate for Failing {
        async fn regenerate(&mut self) -> Result<usize> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(GraphError::Provider("boom".to_string()))
        }
    }

    /// Counts regenerations and the invalidations that precede them.
    struct Tracking {
        runs: Arc<AtomicUsize>,
        invalidations: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Regenerate for Tracking {
        async fn regenerate(&mut self) -> Result<usize> {
            Ok(self.runs.fetch_add(1, Ordering::SeqCst) + 1)
        }

        fn invalidate(&mut self) {
            self.invalidations.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config(interval_secs: u64) -> WatchConfig {
        WatchConfig::new(Duration::from_secs(interval_secs), Duration::from_millis(300))
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_fires_then_cleanup_stops_it() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut session = WatchSession::start(Counter(count.clone()), config(5)).await;
        assert_eq!(session.state(), WatchState::Running);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        session.cleanup();
        assert_eq!(session.state(), WatchState::Stopped);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        session.cleanup();
        assert_eq!(session.state(), WatchState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_burst_coalesces_into_one_regeneration() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut session = WatchSession::start(Counter(count.clone()), config(60)).await;

        for _ in 0..3 {
            session.notify_file_change();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        session.cleanup();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_cancels_pending_debounce() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut session = WatchSession::start(Counter(count.clone()), config(5)).await;

        session.notify_file_change();
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.cleanup();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_change_triggered_runs_invalidate() {
        let runs = Arc::new(AtomicUsize::new(0));
        let invalidations = Arc::new(AtomicUsize::new(0));
        let regen = Tracking {
            runs: runs.clone(),
            invalidations: invalidations.clone(),
        };
        let mut session = WatchSession::start(regen, config(1)).await;

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(invalidations.load(Ordering::SeqCst), 0);

        session.notify_file_change();
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert_eq!(invalidations.load(Ordering::SeqCst), 1);
        session.cleanup();
    }

    #[test]
    fn test_only_content_events_count_as_changes() {
        use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

        assert!(is_content_change(&EventKind::Modify(ModifyKind::Any)));
        assert!(is_content_change(&EventKind::Create(CreateKind::File)));
        assert!(is_content_change(&EventKind::Remove(RemoveKind::File)));
        assert!(!is_content_change(&EventKind::Access(AccessKind::Any)));
        assert!(!is_content_change(&EventKind::Any));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_the_loop() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut session = WatchSession::start(Failing(count.clone()), config(1)).await;

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);
        session.cleanup();
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        assert_eq!(config(0).interval, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_artifact_writer_writes_watch_format() {
        use crate::clock::ManualClock;
        use crate::graph::Registry;
        use crate::source::OfflineProvider;

        let dir = tempfile::tempdir().unwrap();
        let source = GraphSource::new(
            Arc::new(OfflineProvider),
            Arc::new(Registry::default()),
            dir.path(),
            Arc::new(ManualClock::new(1_000)),
            Duration::from_secs(5),
        );
        let mut writer =
            ArtifactWriter::new(source, ExportFormat::Json, HtmlOptions::default(), dir.path());
        assert_eq!(writer.path(), dir.path().join("graph.dot"));

        assert_eq!(writer.regenerate().await.unwrap(), 0);
        let text = std::fs::read_to_string(writer.path()).unwrap();
        assert!(text.starts_with("digraph G {"));
    }

    #[tokio::test]
    async fn test_invalidate_picks_up_registry_edit_inside_ttl() {
        use crate::clock::ManualClock;
        use crate::graph::YamlRegistryLoader;
        use crate::source::OfflineProvider;

        let dir = tempfile::tempdir().unwrap();
        let registry = dir.path().join("entity-registry.yaml");
        std::fs::write(&registry, "entities:\n  tasks:\n    a: {}\n").unwrap();

        let source = GraphSource::new(
            Arc::new(OfflineProvider),
            Arc::new(YamlRegistryLoader::new(&registry)),
            dir.path(),
            Arc::new(ManualClock::new(1_000)),
            Duration::from_secs(5),
        );
        let mut writer =
            ArtifactWriter::new(source, ExportFormat::Mermaid, HtmlOptions::default(), dir.path());
        assert_eq!(writer.regenerate().await.unwrap(), 1);

        std::fs::write(&registry, "entities:\n  tasks:\n    a: {}\n    b: {}\n").unwrap();
        assert_eq!(writer.regenerate().await.unwrap(), 1);

        writer.invalidate();
        assert_eq!(writer.regenerate().await.unwrap(), 2);
    }
}
