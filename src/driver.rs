//! Abstractions over the native cluster driver.
//!
//! The pool is agnostic to the driver it fronts. Implementors of the
//! [`ClusterDriver`] trait family provide the driver-specific logic for
//! building the long-lived cluster connection and the short-lived per-request
//! handles bound to it. Driver calls report success as a zero return code,
//! mirroring the native API; richer error detail is fetched through
//! [`ClusterConnection::latest_error`] and friends.

use std::time::Duration;

use async_trait::async_trait;

/// Entry point into the native driver: constructs cluster connections.
pub trait ClusterDriver: Send + Sync + 'static {
    /// The long-lived cluster connection type.
    type Connection: ClusterConnection;

    /// Construct a cluster connection for the given bootstrap address list and
    /// client node id. Construction does not connect; that is a separate,
    /// potentially slow step driven by the pool.
    fn cluster_connection(
        &self,
        connection_string: &str,
        node_id: u32,
    ) -> std::result::Result<Self::Connection, DriverError>;
}

/// The long-lived link from this process to the cluster's management nodes.
///
/// Dropping a connection releases its driver resources.
#[async_trait]
pub trait ClusterConnection: Send + Sync + 'static {
    /// The per-request handle type bound to this connection.
    type Handle: ClusterHandle;

    /// Connect to the cluster, retrying up to `retries` times with
    /// `retry_delay` between attempts. Returns the driver return code; zero is
    /// success.
    async fn connect(&mut self, retries: u32, retry_delay: Duration) -> i32;

    /// Wait until the cluster reports itself ready to serve requests, bounded
    /// by `cluster_timeout` overall and `node_timeout` per data node. Returns
    /// the driver return code; zero is success.
    async fn wait_until_ready(&mut self, cluster_timeout: Duration, node_timeout: Duration) -> i32;

    /// The code of the most recent error observed on this connection.
    fn latest_error(&self) -> i32;

    /// The message of the most recent error observed on this connection.
    fn latest_error_msg(&self) -> String;

    /// Construct a new handle bound to this connection. The handle is not
    /// usable until [`ClusterHandle::init`] succeeds.
    fn handle(&self) -> Self::Handle;
}

/// A per-request object bound to a specific cluster connection, used to
/// execute one logical operation at a time.
///
/// Dropping a handle releases its driver resources.
pub trait ClusterHandle: Send + 'static {
    /// Per-handle initialization. Returns the driver return code; zero is
    /// success.
    fn init(&mut self) -> i32;
}

/// Classification the driver attaches to request errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorClassification {
    /// The request itself was malformed or violated application constraints.
    ApplicationError,
    /// A schema object was missing or incompatible.
    SchemaError,
    /// The request exceeded a driver-level time limit.
    TimeoutExpired,
    /// A data node is recovering; the request may be retried.
    NodeRecoveryError,
    /// The cluster shed load; the request may be retried.
    OverloadError,
    /// The outcome of the request is indeterminate, most likely because the
    /// cluster link was lost.
    UnknownResultError,
    /// A failure inside the driver or the cluster itself.
    InternalError,
}

impl ErrorClassification {
    /// Whether this classification signals that the cluster link itself is
    /// likely lost, as opposed to a per-request failure.
    pub fn indicates_link_loss(&self) -> bool {
        matches!(self, ErrorClassification::UnknownResultError)
    }
}

/// A driver-level error: the native error code, its classification, and the
/// driver's message.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct DriverError {
    /// The native driver error code.
    pub code: i32,
    /// The driver's classification of the failure.
    pub classification: ErrorClassification,
    /// Human-readable detail supplied by the driver.
    pub message: String,
}

impl DriverError {
    /// Create a driver error from its parts.
    pub fn new(code: i32, classification: ErrorClassification, message: impl Into<String>) -> Self {
        Self {
            code,
            classification,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "driver error {} ({:?}): {}",
            self.code, self.classification, self.message
        )
    }
}
