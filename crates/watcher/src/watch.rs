//! Long-lived directory watcher and its receive loop
//!
//! One OS-level watch is registered on the wallet directory (non-recursive:
//! only direct entries matter). The notify callback fans raw notifications
//! into two one-directional channels, a change-event channel and an error
//! channel, and a single background task selects over them for the lifetime
//! of the subsystem. Notifications are delivered in platform order; no
//! batching, no deduplication.

use crate::event::ChangeEvent;
use crate::sink::{ErrorReporter, KeyMaterial, NotificationSink, WALLET_KEYS_TOPIC};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use wallet_core::{WalletPaths, WalletRole};

/// Failure to establish the OS-level watch
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("failed to establish filesystem watch: {0}")]
    Init(#[from] notify::Error),
}

/// Background watcher for the wallet directory
pub struct DirectoryWatcher {
    paths: Arc<WalletPaths>,
    keys: KeyMaterial,
    sink: Arc<dyn NotificationSink>,
    reporter: Arc<dyn ErrorReporter>,
}

/// Handle to a running watcher
///
/// Keeps the OS watch alive; dropping the handle (or calling [`shutdown`])
/// releases the watch and ends the background task.
///
/// [`shutdown`]: WatcherHandle::shutdown
pub struct WatcherHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    /// Keep alive: dropping the watcher closes both inbound channels.
    os_watch: RecommendedWatcher,
}

impl WatcherHandle {
    /// Stop the watcher deterministically: cancel the loop, release the OS
    /// watch, and wait for the background task to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        drop(self.os_watch);
        if let Err(e) = self.task.await {
            error!("watcher task did not stop cleanly: {e}");
        }
    }
}

impl DirectoryWatcher {
    pub fn new(
        paths: Arc<WalletPaths>,
        keys: KeyMaterial,
        sink: Arc<dyn NotificationSink>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            paths,
            keys,
            sink,
            reporter,
        }
    }

    /// Register the OS watch and spawn the receive loop
    ///
    /// Must be called from within a tokio runtime. Registration failure is
    /// fatal to this subsystem only: it is reported through the
    /// [`ErrorReporter`] and returned to the caller, which should degrade to
    /// "no live sync" rather than abort the application.
    pub fn start(self) -> Result<WatcherHandle, WatcherError> {
        info!("starting watcher on {}", self.paths.watched_dir().display());

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();

        let mut os_watch =
            RecommendedWatcher::new(
                move |res: notify::Result<notify::Event>| match res {
                    Ok(raw) => {
                        for ev in ChangeEvent::from_notify(&raw) {
                            let _ = events_tx.send(ev);
                        }
                    }
                    Err(err) => {
                        let _ = errors_tx.send(err);
                    }
                },
                notify::Config::default(),
            )?;

        if let Err(err) = os_watch.watch(self.paths.watched_dir(), RecursiveMode::NonRecursive) {
            self.reporter
                .report("Failed to start watcher. Reason: ", &err);
            return Err(err.into());
        }

        let cancel = CancellationToken::new();
        let ctx = WatchContext {
            paths: self.paths,
            keys: self.keys,
            sink: self.sink,
            reporter: self.reporter,
        };
        let task = tokio::spawn(run_loop(ctx, events_rx, errors_rx, cancel.clone()));

        Ok(WatcherHandle {
            cancel,
            task,
            os_watch,
        })
    }
}

/// Everything the receive loop needs; read-only after start
struct WatchContext {
    paths: Arc<WalletPaths>,
    keys: KeyMaterial,
    sink: Arc<dyn NotificationSink>,
    reporter: Arc<dyn ErrorReporter>,
}

impl WatchContext {
    /// Filter one event and dispatch its classified notification, if any
    fn handle_event(&self, ev: &ChangeEvent) {
        if !ev.qualifies() {
            return;
        }

        info!("modified file: {}", ev.path.display());

        match self.paths.role_for(&ev.path) {
            Some(WalletRole::LastTxFile) => {
                debug!("last TX file has been modified");
            }
            Some(WalletRole::KeyFile) => {
                debug!("key file has been modified");
                self.sink.emit(WALLET_KEYS_TOPIC, self.keys.payload());
            }
            Some(WalletRole::ChartDataFile) => {
                info!("chart data file modified");
            }
            // Unmatched paths inside the watched directory are not an error
            None => {}
        }
    }
}

/// The long-lived receive loop
///
/// Blocks on a select over the two inbound channels and the cancellation
/// token; never polls. Individual errors are reported and the loop keeps
/// running; it exits when cancelled or when either channel closes.
async fn run_loop(
    ctx: WatchContext,
    mut events_rx: mpsc::UnboundedReceiver<ChangeEvent>,
    mut errors_rx: mpsc::UnboundedReceiver<notify::Error>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("watcher received shutdown signal");
                break;
            }
            maybe_event = events_rx.recv() => match maybe_event {
                Some(ev) => ctx.handle_event(&ev),
                None => break,
            },
            maybe_err = errors_rx.recv() => match maybe_err {
                Some(err) => {
                    error!("watch error: {err}");
                    ctx.reporter.report("watcher error: ", &err);
                }
                None => break,
            },
        }
    }

    info!("directory watcher stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Op;
    use crate::sink::LogReporter;
    use anyhow::Result;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::timeout;

    #[derive(Default)]
    struct RecordingSink {
        emitted: Mutex<Vec<(String, Vec<Value>)>>,
    }

    impl NotificationSink for RecordingSink {
        fn emit(&self, topic: &str, payload: Vec<Value>) {
            self.emitted
                .lock()
                .unwrap()
                .push((topic.to_string(), payload));
        }
    }

    impl RecordingSink {
        fn emitted(&self) -> Vec<(String, Vec<Value>)> {
            self.emitted.lock().unwrap().clone()
        }
    }

    #[derive(Default)]
    struct CountingReporter {
        reports: AtomicUsize,
    }

    impl ErrorReporter for CountingReporter {
        fn report(&self, _context: &str, _err: &(dyn std::error::Error + 'static)) {
            self.reports.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct LoopFixture {
        paths: Arc<WalletPaths>,
        sink: Arc<RecordingSink>,
        reporter: Arc<CountingReporter>,
        events_tx: mpsc::UnboundedSender<ChangeEvent>,
        errors_tx: mpsc::UnboundedSender<notify::Error>,
        cancel: CancellationToken,
        task: JoinHandle<()>,
    }

    fn spawn_loop() -> LoopFixture {
        let paths = Arc::new(WalletPaths::resolve_from(std::path::Path::new(
            "/home/alice",
        )));
        let sink = Arc::new(RecordingSink::default());
        let reporter = Arc::new(CountingReporter::default());

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let ctx = WatchContext {
            paths: Arc::clone(&paths),
            keys: KeyMaterial::new("priv-pem", "pub-pem"),
            sink: sink.clone() as Arc<dyn NotificationSink>,
            reporter: reporter.clone() as Arc<dyn ErrorReporter>,
        };
        let task = tokio::spawn(run_loop(ctx, events_rx, errors_rx, cancel.clone()));

        LoopFixture {
            paths,
            sink,
            reporter,
            events_tx,
            errors_tx,
            cancel,
            task,
        }
    }

    impl LoopFixture {
        /// Close both channels and wait for the loop to exit
        async fn drain(self) -> Result<(Arc<RecordingSink>, Arc<CountingReporter>)> {
            drop(self.events_tx);
            drop(self.errors_tx);
            timeout(Duration::from_secs(5), self.task).await??;
            Ok((self.sink, self.reporter))
        }
    }

    #[tokio::test]
    async fn qualifying_key_event_emits_key_payload_once() -> Result<()> {
        let fixture = spawn_loop();
        let key_file = fixture.paths.key_file.clone();

        fixture
            .events_tx
            .send(ChangeEvent::new(key_file, Op::WRITE | Op::CREATE))?;

        let (sink, reporter) = fixture.drain().await?;
        assert_eq!(
            sink.emitted(),
            vec![(
                WALLET_KEYS_TOPIC.to_string(),
                vec![json!("priv-pem"), json!("pub-pem")]
            )]
        );
        assert_eq!(reporter.reports.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn write_only_event_for_key_path_is_suppressed() -> Result<()> {
        let fixture = spawn_loop();
        let key_file = fixture.paths.key_file.clone();

        fixture
            .events_tx
            .send(ChangeEvent::new(key_file, Op::WRITE))?;

        let (sink, _) = fixture.drain().await?;
        assert!(sink.emitted().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unrelated_path_in_watched_dir_produces_nothing() -> Result<()> {
        let fixture = spawn_loop();
        let stray = fixture.paths.dag_dir.join("stray.json");

        fixture
            .events_tx
            .send(ChangeEvent::new(stray, Op::WRITE | Op::CREATE))?;

        let (sink, reporter) = fixture.drain().await?;
        assert!(sink.emitted().is_empty());
        assert_eq!(reporter.reports.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn payloadless_roles_are_logged_not_emitted() -> Result<()> {
        let fixture = spawn_loop();
        let last_tx = fixture.paths.last_tx_file.clone();

        fixture
            .events_tx
            .send(ChangeEvent::new(last_tx, Op::WRITE | Op::CREATE))?;
        fixture.events_tx.send(ChangeEvent::new(
            "JSONdata/chart_data.json",
            Op::WRITE | Op::CREATE,
        ))?;

        let (sink, _) = fixture.drain().await?;
        assert!(sink.emitted().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_events_are_not_deduplicated() -> Result<()> {
        let fixture = spawn_loop();
        let key_file = fixture.paths.key_file.clone();

        for _ in 0..2 {
            fixture
                .events_tx
                .send(ChangeEvent::new(key_file.clone(), Op::WRITE | Op::CREATE))?;
        }

        let (sink, _) = fixture.drain().await?;
        assert_eq!(sink.emitted().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn loop_survives_consecutive_errors() -> Result<()> {
        let fixture = spawn_loop();
        let key_file = fixture.paths.key_file.clone();

        for i in 0..3 {
            fixture
                .errors_tx
                .send(notify::Error::generic(&format!("transient error {i}")))?;
        }
        fixture
            .events_tx
            .send(ChangeEvent::new(key_file, Op::WRITE | Op::CREATE))?;

        let (sink, reporter) = fixture.drain().await?;
        assert_eq!(reporter.reports.load(Ordering::SeqCst), 3);
        assert_eq!(sink.emitted().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn cancellation_stops_loop_with_channels_still_open() -> Result<()> {
        let fixture = spawn_loop();

        // Both senders stay alive; the loop must exit on the token alone
        fixture.cancel.cancel();
        timeout(Duration::from_secs(5), fixture.task).await??;

        // The loop's receivers are gone now, so late sends bounce
        assert!(fixture
            .events_tx
            .send(ChangeEvent::new("/tmp/late", Op::WRITE))
            .is_err());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn own_writes_do_not_loop_back() -> Result<()> {
        let home = TempDir::new()?;
        let paths = Arc::new(WalletPaths::resolve_from(home.path()));
        wallet_core::bootstrap::bootstrap(&paths)?;

        let sink = Arc::new(RecordingSink::default());
        let handle = DirectoryWatcher::new(
            Arc::clone(&paths),
            KeyMaterial::new("priv-pem", "pub-pem"),
            sink.clone(),
            Arc::new(LogReporter),
        )
        .start()?;

        // A writer going through the atomic remove-then-create path
        wallet_core::write_json(&paths.last_tx_file, &json!({"last_tx": "abc123"}))?;
        wallet_core::write_json(&paths.tx_history_file, &json!({}))?;

        tokio::time::sleep(Duration::from_millis(400)).await;
        handle.shutdown().await;

        // No notification carried the combined write+create signal
        assert!(sink.emitted().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn start_fails_cleanly_when_directory_is_missing() -> Result<()> {
        let home = TempDir::new()?;
        let missing = home.path().join("does-not-exist");
        let paths = Arc::new(WalletPaths::resolve_from(&missing));

        let sink = Arc::new(RecordingSink::default());
        let reporter = Arc::new(CountingReporter::default());
        let result = DirectoryWatcher::new(
            Arc::clone(&paths),
            KeyMaterial::new("priv-pem", "pub-pem"),
            sink.clone(),
            reporter.clone(),
        )
        .start();

        assert!(matches!(result, Err(WatcherError::Init(_))));
        assert_eq!(reporter.reports.load(Ordering::SeqCst), 1);
        assert!(sink.emitted().is_empty());
        Ok(())
    }
}
