//! # Configuration Hot Reload
//!
//! Watches configuration files for changes, reloads the matching
//! [`FileStore`] and clears the resolver cache so the next read sees the new
//! values.

use crate::file::{ConfigFileError, FileStore};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use resolver::Resolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Configuration reload event.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigReloadEvent {
    Ready,

    /// Configuration file changed
    Changed(PathBuf),

    /// Configuration file was removed
    Removed(PathBuf),

    /// Configuration file was created
    Created(PathBuf),

    /// Configuration reload error
    Error {
        path: PathBuf,
        error: String,
    },
}

/// Watch a configuration file for changes and emit reload events.
///
/// ## Usage
/// ```rust,no_run
/// use resolver::ResolverBuilder;
/// use std::sync::Arc;
/// use stores::{spawn_reloader, watch_config, FileStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let file = Arc::new(FileStore::open("config.toml")?);
///     let resolver = Arc::new(ResolverBuilder::new().store(Arc::clone(&file)).build());
///
///     let (_tx, rx) = watch_config(file.path()).await?;
///     let reloader = spawn_reloader(file, resolver, rx);
///     reloader.await?;
///     Ok(())
/// }
/// ```
///
/// The returned sender can inject events, e.g. a manual `Changed` to force a
/// reload. The watcher stops once every receiver is dropped.
pub async fn watch_config(
    config_path: &Path,
) -> Result<
    (
        mpsc::Sender<ConfigReloadEvent>,
        mpsc::Receiver<ConfigReloadEvent>,
    ),
    ConfigFileError,
> {
    let config_path = config_path.to_path_buf();

    if !config_path.exists() {
        return Err(ConfigFileError::FileNotFound(
            config_path.display().to_string(),
        ));
    }

    let (tx, rx) = mpsc::channel(100);
    let tx_task = tx.clone();
    let path_task = config_path.clone();

    tokio::spawn(async move {
        let (event_tx, mut event_rx) = mpsc::channel(100);
        let watcher = RecommendedWatcher::new(
            move |res| {
                let _ = event_tx.blocking_send(res);
            },
            notify::Config::default(),
        )
        .and_then(|mut watcher| {
            watcher.watch(&config_path, RecursiveMode::NonRecursive)?;
            Ok(watcher)
        });

        // Must outlive the event loop.
        let _watcher = match watcher {
            Ok(watcher) => watcher,
            Err(e) => {
                error!(path = ?path_task, error = %e, "Cannot watch config file");
                let _ = tx_task
                    .send(ConfigReloadEvent::Error {
                        path: path_task,
                        error: e.to_string(),
                    })
                    .await;
                return;
            }
        };

        info!(path = ?config_path, "Watching config file");
        let _ = tx_task.send(ConfigReloadEvent::Ready).await;

        loop {
            tokio::select! {
                _ = tx_task.closed() => {
                    debug!(path = ?config_path, "Receiver dropped, stopping watcher");
                    break;
                }
                event_result = event_rx.recv() => {
                    match event_result {
                        None => break,
                        Some(Err(e)) => warn!(error = %e, "Watch error"),
                        Some(Ok(event)) => {
                            let Some(path) = event.paths.first().cloned() else {
                                continue;
                            };
                            let Some(forwarded) = reload_event(event.kind, path) else {
                                debug!(kind = ?event.kind, "Ignoring watch event");
                                continue;
                            };

                            if tx_task.send(forwarded).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        }
    });

    Ok((tx, rx))
}

fn reload_event(kind: EventKind, path: PathBuf) -> Option<ConfigReloadEvent> {
    match kind {
        EventKind::Create(_) => Some(ConfigReloadEvent::Created(path)),
        EventKind::Modify(_) => Some(ConfigReloadEvent::Changed(path)),
        EventKind::Remove(_) => Some(ConfigReloadEvent::Removed(path)),
        _ => None,
    }
}

/// Apply reload events: re-read `store`, then clear the cache of `resolver`.
///
/// Runs until the event channel closes. A failed reload keeps the previous
/// snapshot and leaves the cache alone.
pub fn spawn_reloader(
    store: Arc<FileStore>,
    resolver: Arc<Resolver>,
    mut events: mpsc::Receiver<ConfigReloadEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ConfigReloadEvent::Changed(path) | ConfigReloadEvent::Created(path) => {
                    match store.reload() {
                        Ok(count) => {
                            resolver.invalidate_all().await;
                            info!("Applied {} options from {:?}", count, path);
                        }
                        Err(e) => warn!("Config reload of {:?} failed: {}", path, e),
                    }
                }
                ConfigReloadEvent::Removed(path) => {
                    warn!("Config file removed, keeping last values: {:?}", path);
                }
                ConfigReloadEvent::Error { path, error } => {
                    error!("Config watcher for {:?} failed: {}", path, error);
                }
                ConfigReloadEvent::Ready => debug!("Config watcher ready for {:?}", store.path()),
            }
        }
        debug!("Reload events closed for {:?}", store.path());
    })
}
