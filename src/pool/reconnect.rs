use std::sync::Arc;

use tracing::{info, warn};

use super::PoolInner;
use crate::{
    driver::ClusterDriver,
    error::{Error, Result},
    runtime,
};

impl<D: ClusterDriver> PoolInner<D> {
    /// Schedule the background reconnection worker. Idempotent: a trigger that
    /// finds a cycle already in flight returns the benign in-progress status
    /// without touching anything else.
    pub(super) async fn trigger_reconnect(self: Arc<Self>) -> Result<()> {
        let mut state = self.conn.lock().await;
        {
            let mut info = self.info.lock().unwrap();
            if info.is_shutdown || info.is_shutting_down {
                return Err(Error::shutdown());
            }
            if info.is_reconnection_in_progress {
                return Err(Error::reconnect_in_progress());
            }
            info.is_reconnection_in_progress = true;
        }

        // Drop the descriptor of the previous, already-finished worker.
        state.reconnect_worker.take();

        let pool = self.clone();
        state.reconnect_worker = Some(runtime::spawn(async move {
            pool.run_reconnect().await;
        }));
        drop(state);

        info!("scheduled cluster reconnection");
        Ok(())
    }

    /// Body of the reconnection worker: a non-terminal teardown followed by a
    /// fresh connect. `is_reconnection_in_progress` is cleared on every exit
    /// path. Failures are only logged; the next check-out that observes a
    /// disconnected pool re-arms the cycle.
    async fn run_reconnect(self: Arc<Self>) {
        info!("cluster reconnection started");
        let result = async {
            self.shutdown_internal(false).await?;
            self.establish().await
        }
        .await;

        {
            let mut info = self.info.lock().unwrap();
            info.is_reconnection_in_progress = false;
        }

        match result {
            Ok(()) => info!("cluster reconnection complete"),
            Err(error) => warn!(%error, "cluster reconnection failed"),
        }
    }
}
