//! Configuration file watcher for hot reload of the route table.

use std::path::{Path, PathBuf};
use std::time::Duration;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use crate::config::loader::{parse_config, ConfigError};
use crate::config::schema::GatewayConfig;

/// Monitors the gateway configuration file and emits every valid revision.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_content_change(&event.kind) => match reload(&path) {
                    Ok(Some(config)) => {
                        tracing::info!(routes = config.routes.len(), "Reloaded configuration");
                        let _ = tx.send(config);
                    }
                    Ok(None) => tracing::debug!(path = ?path, "Config file empty, waiting for content"),
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected config change, keeping current route table");
                    }
                },
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Load the changed file. An empty file is a save in progress, not a config.
fn reload(path: &Path) -> Result<Option<GatewayConfig>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    parse_config(&content).map(Some)
}

fn is_content_change(kind: &EventKind) -> bool {
    kind.is_modify() || kind.is_create()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tokio::time::timeout;

    fn routes_toml(url: &str) -> String {
        format!(
            r#"
            [[routes]]
            url = "{url}"
            method = "GET"
            service = "helloworld.Greeter.SayHello"
            rpc = {{ ip = "127.0.0.1", port = 50051 }}
            "#
        )
    }

    /// Wait for a revision whose first route is `url`, skipping earlier ones.
    async fn expect_route(rx: &mut mpsc::UnboundedReceiver<GatewayConfig>, url: &str) {
        let found = timeout(Duration::from_secs(5), async {
            while let Some(config) = rx.recv().await {
                if config.routes.first().is_some_and(|r| r.url == url) {
                    return true;
                }
            }
            false
        })
        .await;
        assert_eq!(found, Ok(true), "no config with route {url} received");
    }

    #[tokio::test]
    async fn test_emits_valid_revisions_only() {
        let path = std::env::temp_dir().join(format!("rpc-gateway-watch-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, routes_toml("/first")).unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&path);
        let _handle = watcher.run().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(&path, routes_toml("/second")).unwrap();
        expect_route(&mut rx, "/second").await;

        // Let duplicate events for the same write drain.
        tokio::time::sleep(Duration::from_millis(300)).await;
        while rx.try_recv().is_ok() {}

        fs::write(&path, routes_toml("no-leading-slash")).unwrap();
        let next = timeout(Duration::from_millis(1000), rx.recv()).await;
        assert!(next.is_err(), "invalid config was published");

        fs::write(&path, routes_toml("/third")).unwrap();
        expect_route(&mut rx, "/third").await;

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_empty_file_is_not_a_revision() {
        let path = std::env::temp_dir().join(format!("rpc-gateway-empty-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "  \n").unwrap();
        assert!(reload(&path).unwrap().is_none());
        fs::remove_file(&path).unwrap_or_default();
    }
}
