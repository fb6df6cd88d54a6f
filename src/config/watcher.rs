//! Configuration file watcher for hot reload.

use std::path::Path;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ProxyConfig;

/// Watch a config file and emit every successfully reloaded configuration.
///
/// Returns the watcher (keep it alive for as long as reloads should be
/// observed) and the receiving end of the reload channel. A file change
/// that fails to load or validate is logged and dropped; the running
/// configuration stays in effect.
pub fn watch_config(
    path: &Path,
) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<ProxyConfig>), notify::Error> {
    let (tx, rx) = mpsc::unbounded_channel();
    let watched = path.to_path_buf();

    let mut watcher = RecommendedWatcher::new(
        move |result: notify::Result<Event>| match result {
            Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                match load_config(&watched) {
                    Ok(config) => {
                        tracing::info!(path = ?watched, "Config file reloaded");
                        let _ = tx.send(config);
                    }
                    Err(e) => {
                        tracing::error!(
                            path = ?watched,
                            error = %e,
                            "Config reload failed, keeping current configuration"
                        );
                    }
                }
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = ?e, "Config watch error"),
        },
        Config::default().with_poll_interval(Duration::from_secs(2)),
    )?;

    watcher.watch(path, RecursiveMode::NonRecursive)?;
    tracing::info!(path = ?path, "Config watcher started");

    Ok((watcher, rx))
}
