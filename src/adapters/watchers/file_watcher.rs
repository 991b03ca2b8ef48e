// SPDX-License-Identifier: MIT OR Apache-2.0

//! File system watcher that turns edits of one file into reload callbacks.
//!
//! The parent directory is watched rather than the file itself, because editors often replace
//! files by rename, which drops a watch placed on the old inode. Bursts of events are debounced:
//! the callback runs once the file has been quiet for the debounce delay.

use crate::domain::{ConfigKey, OptionsError, Result};
use crate::ports::{ChangeCallback, ConfigWatcher};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Watches a single configuration file.
///
/// # Examples
///
/// ```rust,no_run
/// use hexopts::adapters::{Configuration, FileWatcher, YamlFileSource};
///
/// # fn main() -> hexopts::domain::Result<()> {
/// let configuration = Configuration::builder()
///     .with_source(Box::new(YamlFileSource::from_file("/etc/app/config.yaml")?))
///     .build();
///
/// // Every edit of the file reloads the configuration and fires its change token.
/// configuration.attach_watcher(Box::new(FileWatcher::new("/etc/app/config.yaml", None)?))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FileWatcher {
    file_path: PathBuf,
    file_name: OsString,
    debounce_delay: Duration,
    watcher: Option<RecommendedWatcher>,
    worker: Option<JoinHandle<()>>,
    stop_tx: Option<Sender<()>>,
}

impl FileWatcher {
    /// Creates a watcher for `path`, which must exist. The debounce delay defaults to 500ms.
    pub fn new(path: impl AsRef<Path>, debounce_delay: Option<Duration>) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();
        if !file_path.is_file() {
            return Err(OptionsError::WatcherError {
                message: format!("Not a file: {}", file_path.display()),
                source: None,
            });
        }
        let file_name = file_path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| OptionsError::WatcherError {
                message: format!("Path has no file name: {}", file_path.display()),
                source: None,
            })?;

        Ok(Self {
            file_path,
            file_name,
            debounce_delay: debounce_delay.unwrap_or(DEFAULT_DEBOUNCE),
            watcher: None,
            worker: None,
            stop_tx: None,
        })
    }

    /// The watched file.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Whether [`watch`](ConfigWatcher::watch) is active.
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    fn directory(&self) -> PathBuf {
        match self.file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

fn run_debounce_loop(
    events: Receiver<notify::Result<Event>>,
    stop: Receiver<()>,
    file_name: OsString,
    key: ConfigKey,
    debounce: Duration,
    callback: ChangeCallback,
) {
    let mut pending_since: Option<Instant> = None;
    loop {
        if stop.try_recv().is_ok() {
            break;
        }
        match events.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(event)) => {
                let touches_file = event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(file_name.as_os_str()));
                if touches_file {
                    pending_since = Some(Instant::now());
                }
            }
            Ok(Err(e)) => tracing::warn!("File watcher error for {}: {}", key, e),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if let Some(since) = pending_since {
            if since.elapsed() >= debounce {
                pending_since = None;
                tracing::debug!("Configuration file changed: {}", key);
                callback(key.clone());
            }
        }
    }
}

impl ConfigWatcher for FileWatcher {
    fn watch(&mut self, callback: ChangeCallback) -> Result<()> {
        if self.watcher.is_some() {
            return Err(OptionsError::WatcherError {
                message: "Watcher is already running".to_string(),
                source: None,
            });
        }

        let (event_tx, event_rx) = channel();
        let (stop_tx, stop_rx) = channel::<()>();

        let mut watcher = RecommendedWatcher::new(event_tx, notify::Config::default()).map_err(
            |e| OptionsError::WatcherError {
                message: format!("Failed to create file watcher: {}", e),
                source: Some(Box::new(e)),
            },
        )?;
        watcher
            .watch(&self.directory(), RecursiveMode::NonRecursive)
            .map_err(|e| OptionsError::WatcherError {
                message: format!("Failed to start watching: {}", e),
                source: Some(Box::new(e)),
            })?;

        let file_name = self.file_name.clone();
        let key = ConfigKey::from(self.file_path.to_string_lossy().as_ref());
        let debounce = self.debounce_delay;
        let worker = thread::Builder::new()
            .name("hexopts-file-watcher".to_string())
            .spawn(move || run_debounce_loop(event_rx, stop_rx, file_name, key, debounce, callback))
            .map_err(|e| OptionsError::WatcherError {
                message: "Failed to spawn watcher thread".to_string(),
                source: Some(Box::new(e)),
            })?;

        self.watcher = Some(watcher);
        self.stop_tx = Some(stop_tx);
        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        self.watcher = None;
        if let Some(worker) = self.worker.take() {
            // Dropped from inside its own callback; the loop exits on the stop signal.
            if worker.thread().id() == thread::current().id() {
                return Ok(());
            }
            worker.join().map_err(|_| OptionsError::WatcherError {
                message: "Failed to join watcher thread".to_string(),
                source: None,
            })?;
        }
        Ok(())
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
