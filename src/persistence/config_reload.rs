use super::{AppConfig, MappingStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Polls the config file and pushes edited mappings into `store`
///
/// A file that fails to parse or validate is reported and skipped; the
/// previously applied table stays in effect until the next good edit.
pub fn start_reload_task(
    path: PathBuf,
    store: Arc<MappingStore>,
    interval_seconds: u64,
    token: CancellationToken,
) -> JoinHandle<()> {
    info!(
        "Watching {} for mapping changes every {}s",
        path.display(),
        interval_seconds
    );

    // Baseline taken before returning, so edits made right after start count
    let mut last_seen = std::fs::metadata(&path)
        .and_then(|meta| meta.modified())
        .ok();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {}
            }

            let modified = modified_at(&path).await;
            if modified.is_none() || modified == last_seen {
                continue;
            }
            last_seen = modified;

            match AppConfig::load(&path).await {
                Ok(config) => match config.key_map() {
                    Ok(map) => store.replace(map),
                    Err(e) => error!("Rejected mapping update, keeping current mapping: {}", e),
                },
                Err(e) => warn!("Keeping current mapping: {}", e),
            }
        }

        debug!("Config reload task stopped");
    })
}

async fn modified_at(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path)
        .await
        .and_then(|meta| meta.modified())
        .ok()
}
