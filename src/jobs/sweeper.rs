// Recycle-bin retention sweeper
//
// Runs on its own thread for the app lifetime. Each cycle it reads the active
// catalog path, opens a short-lived connection and purges expired rows.
// No catalog open: skip the cycle. Failures are logged and never reach the host.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Active catalog path shared between the foreground and the sweeper.
pub type SharedCatalogPath = Arc<Mutex<Option<PathBuf>>>;

/// One sweep against `catalog_path`. Returns the number of rows purged
/// (0 when the sweep failed; the failure is logged).
pub fn run_sweep(catalog_path: &Path, retention_days: i64) -> usize {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| -> crate::error::Result<usize> {
        let conn = crate::db::open_db(catalog_path)?;
        let now = chrono::Local::now().naive_local();
        crate::db::schema::purge_expired(&conn, retention_days, now)
    }));

    match result {
        Ok(Ok(0)) => 0,
        Ok(Ok(count)) => {
            log::info!("Sweeper: purged {} expired replays from {}", count, catalog_path.display());
            count
        }
        Ok(Err(e)) => {
            log::error!("Sweeper: sweep of {} failed: {}", catalog_path.display(), e);
            0
        }
        Err(_) => {
            log::error!("Sweeper: sweep of {} panicked (recovered)", catalog_path.display());
            0
        }
    }
}

/// Handle to the background sweeper. Dropping it leaves the thread running;
/// call `stop` to end it.
pub struct SweeperHandle {
    stop_tx: Sender<()>,
    thread: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the thread and wait for it to exit.
    pub fn stop(self) {
        let _ = self.stop_tx.send(());
        if self.thread.join().is_err() {
            log::error!("Sweeper: thread panicked");
        }
    }
}

fn current_catalog(shared: &SharedCatalogPath) -> Option<PathBuf> {
    match shared.lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Spawn the sweeper thread. Call once during app setup.
pub fn spawn_sweeper(
    catalog: SharedCatalogPath,
    interval: Duration,
    retention_days: i64,
) -> std::io::Result<SweeperHandle> {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    let thread = std::thread::Builder::new()
        .name("recycle-sweeper".into())
        .spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    log::info!("Sweeper: stopping");
                    return;
                }
            }

            let Some(path) = current_catalog(&catalog) else {
                continue;
            };
            run_sweep(&path, retention_days);
        })?;

    log::info!("Sweeper: started (every {}s, {} day retention)", interval.as_secs(), retention_days);
    Ok(SweeperHandle { stop_tx, thread })
}
