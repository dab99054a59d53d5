//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ProxyConfig;

/// A watcher that monitors the configuration file for changes.
///
/// Every change that loads and validates is sent as a complete
/// [`ProxyConfig`]; invalid files are logged and skipped, so the receiver only
/// ever sees configurations that are safe to reconcile.
pub struct ConfigWatcher {
    path: PathBuf,
    poll_interval: Duration,
    update_tx: mpsc::UnboundedSender<ProxyConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path, poll_interval: Duration) -> (Self, mpsc::UnboundedReceiver<ProxyConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (Self::with_sender(path, poll_interval, update_tx), update_rx)
    }

    /// Create a watcher that sends updates into an existing channel.
    pub fn with_sender(
        path: &Path,
        poll_interval: Duration,
        update_tx: mpsc::UnboundedSender<ProxyConfig>,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            poll_interval,
            update_tx,
        }
    }

    /// Start watching. The returned handle must be kept alive.
    ///
    /// The parent directory is watched rather than the file itself so that
    /// editors replacing the file through a rename are still observed.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        let file_name = self.path.file_name().map(|n| n.to_os_string());
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if !touches_config {
                        return;
                    }

                    tracing::info!(path = ?path, "Config file change detected, reloading...");
                    match load_config(&path) {
                        Ok(new_config) => {
                            let _ = tx.send(new_config);
                        }
                        Err(e) => {
                            tracing::error!(
                                "Failed to reload config: {}. Keeping current configuration.",
                                e
                            );
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const INITIAL: &str = r#"
[clusters.web.destinations.d1]
address = "http://10.0.0.1"
"#;

    const UPDATED: &str = r#"
[clusters.web.destinations.d1]
address = "http://10.0.0.1"

[clusters.web.destinations.d2]
address = "http://10.0.0.2"
"#;

    #[tokio::test]
    async fn test_watcher_delivers_valid_reloads() {
        let dir = std::env::temp_dir().join(format!("proxy-reconcile-watch-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("proxy.toml");
        fs::write(&path, INITIAL).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path, Duration::from_millis(100));
        let _handle = watcher.run().unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        fs::write(&path, UPDATED).unwrap();

        let config = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let config = updates.recv().await.expect("watcher channel closed");
                // Editors and filesystems may emit several events per write.
                if config.clusters.get("web").map(|c| c.destinations.len()) == Some(2) {
                    return config;
                }
            }
        })
        .await
        .expect("no reload observed");

        assert!(config.clusters.get("web").unwrap().destinations.contains("d2"));
        fs::remove_dir_all(&dir).unwrap_or_default();
    }
}
