use notify::{recommended_watcher, RecursiveMode, Result as NotifyResult, Watcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{self, Config};

/// Quiet period after the last write before a reload is emitted
const DEBOUNCE: Duration = Duration::from_millis(500);

/// How often the watch loop checks for shutdown
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Event emitted when config needs to be reloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigReloadEvent {
    Reload,
}

/// Watches the config file for changes and emits reload events
pub struct ConfigWatcher {
    config_path: PathBuf,
    tx: Option<Sender<ConfigReloadEvent>>,
    shutdown: Arc<AtomicBool>,
    watcher_thread: Option<thread::JoinHandle<()>>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher for `config_path`
    ///
    /// Returns a tuple of (watcher, receiver) where receiver will emit ConfigReloadEvent
    /// when the config file changes.
    pub fn new(config_path: impl Into<PathBuf>) -> (Self, Receiver<ConfigReloadEvent>) {
        let (tx, rx) = channel();
        let watcher = ConfigWatcher {
            config_path: config_path.into(),
            tx: Some(tx),
            shutdown: Arc::new(AtomicBool::new(false)),
            watcher_thread: None,
        };
        (watcher, rx)
    }

    /// Start watching the config file for changes
    ///
    /// This spawns a background thread that watches the config directory and sends
    /// reload events through the receiver when changes are detected.
    pub fn start(&mut self) -> NotifyResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| std::io::Error::other("watcher already started"))?;

        let config_path = self.config_path.clone();
        let shutdown = self.shutdown.clone();

        let thread_handle = thread::Builder::new()
            .name("kiwa-config-watcher".to_string())
            .spawn(move || {
                if let Err(e) = Self::watch_loop(&config_path, tx, &shutdown) {
                    warn!(error = %e, watcher = "config", "Config watcher error");
                }
            })?;

        self.watcher_thread = Some(thread_handle);
        Ok(())
    }

    /// Internal watch loop running in background thread
    fn watch_loop(
        config_path: &Path,
        tx: Sender<ConfigReloadEvent>,
        shutdown: &AtomicBool,
    ) -> NotifyResult<()> {
        let watch_path = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = config_path.file_name().map(|n| n.to_os_string());

        // notify needs the directory to exist
        std::fs::create_dir_all(watch_path)?;

        let (watch_tx, watch_rx) = channel();
        let mut watcher = recommended_watcher(move |res: notify::Result<notify::Event>| {
            let _ = watch_tx.send(res);
        })?;
        watcher.watch(watch_path, RecursiveMode::NonRecursive)?;

        info!(
            path = %watch_path.display(),
            target = ?file_name,
            "Config watcher started"
        );

        // Deadline of the pending reload, if any
        let mut pending: Option<std::time::Instant> = None;

        while !shutdown.load(Ordering::SeqCst) {
            let timeout = match pending {
                Some(deadline) => deadline
                    .saturating_duration_since(std::time::Instant::now())
                    .min(POLL_INTERVAL),
                None => POLL_INTERVAL,
            };

            match watch_rx.recv_timeout(timeout) {
                Ok(Ok(event)) => {
                    let is_config_change = event
                        .paths
                        .iter()
                        .any(|path| path.file_name().map(|n| n.to_os_string()) == file_name);

                    let is_relevant_event = matches!(
                        event.kind,
                        notify::EventKind::Create(_)
                            | notify::EventKind::Modify(_)
                            | notify::EventKind::Remove(_)
                    );

                    if is_config_change && is_relevant_event && pending.is_none() {
                        pending = Some(std::time::Instant::now() + DEBOUNCE);
                    }
                }
                Ok(Err(e)) => {
                    warn!(error = %e, watcher = "config", "File watcher error");
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if pending.is_some_and(|deadline| std::time::Instant::now() >= deadline) {
                pending = None;
                info!(file = ?file_name, "Config file changed, emitting reload event");
                if tx.send(ConfigReloadEvent::Reload).is_err() {
                    // Receiver gone
                    break;
                }
            }
        }

        info!(watcher = "config", "Config watcher shutting down");
        Ok(())
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.watcher_thread.take() {
            let _ = handle.join();
        }
    }
}

/// Turn reload notifications into parsed configs on a background thread.
///
/// A file that is missing or fails to parse is skipped so the running
/// configuration stays in effect. `forward` must only enqueue; returning
/// `false` stops the thread.
pub fn spawn_reload_bridge<F>(
    config_path: PathBuf,
    reloads: Receiver<ConfigReloadEvent>,
    forward: F,
) -> std::io::Result<thread::JoinHandle<()>>
where
    F: Fn(Config) -> bool + Send + 'static,
{
    thread::Builder::new()
        .name("kiwa-config-reload".to_string())
        .spawn(move || {
            while let Ok(ConfigReloadEvent::Reload) = reloads.recv() {
                let Some(config) = config::reload_config(&config_path) else {
                    continue;
                };
                if !forward(config) {
                    break;
                }
            }
            info!(watcher = "config", "Config reload bridge exiting");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_watcher_creation() {
        let (_watcher, _rx) = ConfigWatcher::new("/tmp/kiwa-test/config.json");
    }

    #[test]
    fn test_start_twice_fails() {
        let dir = TempDir::new().unwrap();
        let (mut watcher, _rx) = ConfigWatcher::new(dir.path().join("config.json"));
        watcher.start().unwrap();
        assert!(watcher.start().is_err());
    }

    #[test]
    fn test_write_emits_debounced_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let (mut watcher, rx) = ConfigWatcher::new(&path);
        watcher.start().unwrap();

        // Give the backend time to install the watch
        thread::sleep(Duration::from_millis(300));
        std::fs::write(&path, "{}").unwrap();
        std::fs::write(&path, r#"{"panelWidth": 300}"#).unwrap();

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event, ConfigReloadEvent::Reload);
    }

    #[test]
    fn test_unrelated_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let (mut watcher, rx) = ConfigWatcher::new(dir.path().join("config.json"));
        watcher.start().unwrap();

        thread::sleep(Duration::from_millis(300));
        std::fs::write(dir.path().join("other.json"), "{}").unwrap();

        assert!(rx.recv_timeout(Duration::from_millis(1200)).is_err());
    }

    fn recording_bridge(
        path: PathBuf,
    ) -> (
        Sender<ConfigReloadEvent>,
        std::sync::mpsc::Receiver<Config>,
        thread::JoinHandle<()>,
    ) {
        let (reload_tx, reload_rx) = channel();
        let (config_tx, config_rx) = channel();
        let handle = spawn_reload_bridge(path, reload_rx, move |config| {
            config_tx.send(config).is_ok()
        })
        .unwrap();
        (reload_tx, config_rx, handle)
    }

    #[test]
    fn test_bridge_skips_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let (reload_tx, configs, handle) = recording_bridge(path.clone());

        std::fs::write(&path, r#"{ "symbols": [ "#).unwrap();
        reload_tx.send(ConfigReloadEvent::Reload).unwrap();
        std::fs::write(&path, r#"{"panelWidth": 300}"#).unwrap();
        reload_tx.send(ConfigReloadEvent::Reload).unwrap();

        // Only the valid file comes through
        let config = configs.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(config.panel_width, 300.0);
        drop(reload_tx);
        handle.join().unwrap();
        assert!(configs.try_recv().is_err());
    }

    #[test]
    fn test_bridge_skips_deleted_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let (reload_tx, configs, handle) = recording_bridge(path);

        reload_tx.send(ConfigReloadEvent::Reload).unwrap();
        drop(reload_tx);
        handle.join().unwrap();
        assert!(configs.try_recv().is_err());
    }

    #[test]
    fn test_bridge_stops_when_forward_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{}").unwrap();

        let (reload_tx, reload_rx) = channel();
        let handle = spawn_reload_bridge(path, reload_rx, |_| false).unwrap();
        reload_tx.send(ConfigReloadEvent::Reload).unwrap();
        handle.join().unwrap();
    }
}
