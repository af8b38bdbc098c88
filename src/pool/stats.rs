use serde::Serialize;

/// State of the pool's cluster link.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    /// No live cluster connection; check-outs fail until a (re)connect
    /// completes.
    Disconnected,
    /// The cluster connection is established and handles can be issued.
    Connected,
}

/// A point-in-time snapshot of the pool's counters and lifecycle flags.
///
/// Returned by [`Pool::stats`](crate::Pool::stats). `handles_created` and
/// `handles_deleted` count since the last full teardown; a successful
/// reconnect cycle resets them along with `handles_count`.
#[derive(Clone, Debug, Serialize)]
#[non_exhaustive]
pub struct PoolStats {
    /// Whether the pool currently holds a live cluster connection.
    pub connection_state: ConnectionState,

    /// Whether a background reconnection cycle is in flight.
    pub is_reconnection_in_progress: bool,

    /// Whether a terminal shutdown has started and is draining handles.
    pub is_shutting_down: bool,

    /// Whether the pool has been terminally shut down.
    pub is_shutdown: bool,

    /// Handles currently checked in and free for checkout.
    pub handles_available: u64,

    /// Handles issued against the current connection and not yet destroyed,
    /// including those checked out.
    pub handles_count: u64,

    /// Handles created against the current connection.
    pub handles_created: u64,

    /// Handles destroyed since the current connection was established.
    pub handles_deleted: u64,
}

impl Default for PoolStats {
    fn default() -> Self {
        Self {
            connection_state: ConnectionState::Disconnected,
            is_reconnection_in_progress: false,
            is_shutting_down: false,
            is_shutdown: false,
            handles_available: 0,
            handles_count: 0,
            handles_created: 0,
            handles_deleted: 0,
        }
    }
}
