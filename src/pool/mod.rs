
mod handle;
mod reconnect;
mod stats;

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex as SyncMutex},
    time::Duration,
};

use derive_where::derive_where;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    driver::{ClusterConnection, ClusterDriver, ClusterHandle, DriverError},
    error::{Error, Result},
    options::PoolOptions,
    runtime::{self, AsyncJoinHandle},
};

pub use handle::PooledHandle;
pub use stats::{ConnectionState, PoolStats};

/// Deadline for the whole cluster to report ready after a connect.
const CLUSTER_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-node readiness allowance passed through to the driver.
const NODE_READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval between probes of the drain loop during shutdown.
const DRAIN_PROBE_INTERVAL: Duration = Duration::from_millis(500);

/// Upper bound on the time shutdown waits for outstanding handles to be
/// returned before proceeding with teardown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(120);

/// An elastic pool of driver handles bound to a single long-lived cluster
/// connection.
///
/// The pool starts disconnected; [`connect`](Pool::connect) establishes the
/// cluster link. Handles are created lazily on [`check_out`](Pool::check_out)
/// and reused FIFO after [`check_in`](Pool::check_in). When a request outcome
/// reports that the link was lost, the pool schedules a background
/// reconnection cycle that drains outstanding handles, tears the connection
/// down, and builds a fresh one.
///
/// All state is kept internally in an `Arc`, and internal state that is
/// mutable is additionally wrapped by a lock, so the pool can be cloned
/// cheaply and shared across request tasks.
#[derive_where(Debug, Clone)]
pub struct Pool<D: ClusterDriver> {
    inner: Arc<PoolInner<D>>,
}

#[derive_where(Debug)]
pub(crate) struct PoolInner<D: ClusterDriver> {
    #[derive_where(skip)]
    driver: D,

    options: PoolOptions,

    /// Guards the connection, the handle queues, and the reconnect worker
    /// descriptor. Locked before `info` wherever both are held.
    conn: Mutex<ConnState<D>>,

    /// Guards the stats record. Never held across an await point.
    info: SyncMutex<PoolStats>,
}

#[derive_where(Debug)]
struct ConnState<D: ClusterDriver> {
    #[derive_where(skip)]
    connection: Option<D::Connection>,

    /// Handles checked in and free for checkout, oldest first.
    #[derive_where(skip)]
    available: VecDeque<PooledHandle<D>>,

    /// Ids of every handle issued against the current connection and not yet
    /// destroyed; a superset of the ids in `available`.
    issued_handles: Vec<u32>,

    next_handle_id: u32,

    /// Teardown epoch. Bumped on every full teardown; a handle checked in
    /// with an older generation is destroyed instead of pooled.
    generation: u32,

    /// Descriptor of the most recent reconnect worker, if any.
    reconnect_worker: Option<AsyncJoinHandle<()>>,
}

impl<D: ClusterDriver> ConnState<D> {
    fn new() -> Self {
        Self {
            connection: None,
            available: VecDeque::new(),
            issued_handles: Vec::new(),
            next_handle_id: 1,
            generation: 0,
            reconnect_worker: None,
        }
    }
}

impl<D: ClusterDriver> Pool<D> {
    /// Create a new, disconnected pool over the given driver.
    pub fn new(driver: D, options: PoolOptions) -> Self {
        debug!(
            connection_string = %options.connection_string,
            node_id = options.node_id,
            "created cluster pool"
        );
        Self {
            inner: Arc::new(PoolInner {
                driver,
                options,
                conn: Mutex::new(ConnState::new()),
                info: SyncMutex::new(PoolStats::default()),
            }),
        }
    }

    /// Establish the cluster connection using the configured retry
    /// parameters, then wait until the cluster reports ready.
    ///
    /// On failure the pool remains disconnected and the error carries the
    /// driver's return code and latest error message.
    ///
    /// # Panics
    ///
    /// Panics if called while the pool already holds a live connection;
    /// connect is only legal on a disconnected pool.
    pub async fn connect(&self) -> Result<()> {
        self.inner.establish().await
    }

    /// Check a handle out of the pool, creating one bound to the current
    /// connection if none is available.
    ///
    /// Never blocks waiting for a handle or for a reconnection: if the pool is
    /// disconnected this fails immediately with a not-connected error after
    /// arming a background reconnect.
    pub async fn check_out(&self) -> Result<PooledHandle<D>> {
        self.inner.clone().check_out().await
    }

    /// Return a handle to the pool, along with the driver-reported outcome of
    /// the request it served, if any.
    ///
    /// Check-in never fails. If the outcome indicates the cluster link was
    /// lost, a background reconnection cycle is scheduled after the handle has
    /// been returned.
    pub async fn check_in(&self, handle: PooledHandle<D>, outcome: Option<&DriverError>) {
        self.inner.clone().check_in(handle, outcome).await
    }

    /// Schedule a background reconnection cycle: a non-terminal teardown
    /// followed by a fresh connect.
    ///
    /// Idempotent under concurrent triggers; if a cycle is already in flight
    /// the benign [`ReconnectInProgress`](crate::error::ErrorKind) status is
    /// returned and nothing else happens. Reconnection is normally driven
    /// internally by check-out and check-in; this method is public chiefly for
    /// testing and operator tooling.
    pub async fn reconnect(&self) -> Result<()> {
        self.inner.clone().trigger_reconnect().await
    }

    /// Tear the pool down without ending it: drain outstanding handles,
    /// destroy them and the connection, and leave the pool disconnected but
    /// ready for a follow-up [`connect`](Pool::connect).
    pub async fn disconnect(&self) -> Result<()> {
        self.inner.shutdown_internal(false).await
    }

    /// Terminally shut the pool down.
    ///
    /// New check-outs are rejected immediately; outstanding handles are given
    /// a bounded time to come back before teardown proceeds without them.
    /// Returns `Ok` even if that drain timed out. All subsequent operations
    /// on the pool are rejected.
    pub async fn shutdown(&self) -> Result<()> {
        self.inner.shutdown_internal(true).await
    }

    /// A snapshot of the pool's counters and lifecycle flags.
    pub async fn stats(&self) -> PoolStats {
        self.inner.stats().await
    }
}

impl<D: ClusterDriver> PoolInner<D> {
    async fn establish(&self) -> Result<()> {
        {
            let info = self.info.lock().unwrap();
            if info.is_shutdown || info.is_shutting_down {
                return Err(Error::shutdown());
            }
        }

        let mut state = self.conn.lock().await;
        assert!(
            state.connection.is_none(),
            "connect called while a cluster connection is already open"
        );

        let mut connection = self
            .driver
            .cluster_connection(&self.options.connection_string, self.options.node_id)
            .map_err(|e| Error::connect_failed(e.code, e.message))?;

        let rc = connection
            .connect(self.options.connect_retries, self.options.connect_retry_delay)
            .await;
        if rc != 0 {
            let message = connection.latest_error_msg();
            warn!(code = rc, %message, "cluster connect failed");
            return Err(Error::connect_failed(rc, message));
        }

        let rc = connection
            .wait_until_ready(CLUSTER_READY_TIMEOUT, NODE_READY_TIMEOUT)
            .await;
        if rc != 0 {
            let code = connection.latest_error();
            let message = connection.latest_error_msg();
            warn!(code, %message, "cluster did not become ready");
            return Err(Error::not_ready(code, message));
        }

        state.connection = Some(connection);
        drop(state);

        let mut info = self.info.lock().unwrap();
        info.connection_state = ConnectionState::Connected;
        drop(info);

        info!(node_id = self.options.node_id, "connected to cluster");
        Ok(())
    }

    async fn check_out(self: Arc<Self>) -> Result<PooledHandle<D>> {
        let (closing, reconnecting, connection_state) = {
            let info = self.info.lock().unwrap();
            (
                info.is_shutting_down || info.is_shutdown,
                info.is_reconnection_in_progress,
                info.connection_state,
            )
        };

        if closing {
            return Err(Error::shutdown());
        }
        if connection_state != ConnectionState::Connected {
            if !reconnecting {
                // Fire and forget; the caller is told to retry, not to wait.
                let _ = self.trigger_reconnect().await;
            }
            return Err(Error::not_connected());
        }

        let mut state = self.conn.lock().await;
        if let Some(handle) = state.available.pop_front() {
            return Ok(handle);
        }

        // Grow the pool by one handle bound to the live connection.
        let Some(ref connection) = state.connection else {
            // The link was torn down between the snapshot and now.
            return Err(Error::not_connected());
        };
        let mut handle = connection.handle();
        let rc = handle.init();
        if rc != 0 {
            warn!(code = rc, "handle initialization failed");
            // `handle` is dropped here; the counters were never touched.
            return Err(Error::handle_init_failed(rc));
        }

        let id = state.next_handle_id;
        state.next_handle_id += 1;
        state.issued_handles.push(id);
        let generation = state.generation;

        let mut info = self.info.lock().unwrap();
        info.handles_created += 1;
        info.handles_count = state.issued_handles.len() as u64;
        drop(info);
        drop(state);

        Ok(PooledHandle::new(handle, id, generation))
    }

    async fn check_in(self: Arc<Self>, handle: PooledHandle<D>, outcome: Option<&DriverError>) {
        let link_lost = outcome
            .map(|e| e.classification.indicates_link_loss())
            .unwrap_or(false);

        let mut state = self.conn.lock().await;
        if handle.generation() == state.generation {
            state.available.push_back(handle);
        } else {
            // Accounting for this handle went with a previous teardown.
            debug!(id = handle.id(), "destroying handle from a previous connection");
            drop(handle);
        }
        drop(state);

        if link_lost {
            // No locks are held here; the trigger takes them itself.
            if let Err(error) = self.trigger_reconnect().await {
                debug!(%error, "link loss observed while a reconnection was already in flight");
            }
        }
    }

    async fn shutdown_internal(&self, terminal: bool) -> Result<()> {
        {
            let mut info = self.info.lock().unwrap();
            if info.is_shutdown {
                return Err(Error::shutdown());
            }
            if terminal {
                info.is_shutting_down = true;
            }
        }

        self.drain().await;

        {
            let mut info = self.info.lock().unwrap();
            info.connection_state = ConnectionState::Disconnected;
        }

        let mut state = self.conn.lock().await;
        {
            let mut info = self.info.lock().unwrap();
            debug_assert_eq!(state.issued_handles.len() as u64, info.handles_count);
            state.available.clear();
            state.issued_handles.clear();
            state.generation += 1;
            info.handles_available = 0;
            info.handles_count = 0;
            info.handles_created = 0;
            info.handles_deleted = 0;
        }

        if let Some(connection) = state.connection.take() {
            debug!("closing cluster connection");
            drop(connection);
        }

        if terminal {
            state.reconnect_worker.take();
            drop(state);

            let mut info = self.info.lock().unwrap();
            info.is_shutdown = true;
            info.is_shutting_down = false;
            drop(info);

            info!("pool shut down");
        }

        Ok(())
    }

    /// Wait for every outstanding handle to be checked back in, probing every
    /// [`DRAIN_PROBE_INTERVAL`] up to [`DRAIN_TIMEOUT`]. On timeout the
    /// outstanding handles are orphaned and teardown proceeds without them.
    async fn drain(&self) {
        let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
        loop {
            let (available, created) = {
                let state = self.conn.lock().await;
                let info = self.info.lock().unwrap();
                (state.available.len() as u64, info.handles_created)
            };
            if available == created {
                return;
            }
            if tokio::time::Instant::now() >= deadline {
                error!(
                    outstanding = created - available,
                    "timed out waiting for handles to be returned; abandoning them"
                );
                return;
            }
            runtime::delay_for(DRAIN_PROBE_INTERVAL).await;
        }
    }

    async fn stats(&self) -> PoolStats {
        let state = self.conn.lock().await;
        let mut info = self.info.lock().unwrap();
        info.handles_available = state.available.len() as u64;
        info.clone()
    }
}
