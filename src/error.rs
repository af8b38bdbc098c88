//! Contains the `Error` and `Result` types that `cluster-pool` uses.

use thiserror::Error;

/// Numeric codes reported alongside pool errors. These are stable across
/// releases so that upper layers can map them into their own catalogs.
const CODE_CONNECT_FAILED: i32 = 2;
const CODE_NOT_READY: i32 = 3;
const CODE_HANDLE_INIT_FAILED: i32 = 4;
const CODE_NOT_CONNECTED: i32 = 33;
const CODE_SHUTDOWN: i32 = 34;
const CODE_RECONNECT_IN_PROGRESS: i32 = 36;
const CODE_INTERNAL: i32 = 1;

/// The result type for all methods that can return an error in the
/// `cluster-pool` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in the `cluster-pool` crate. The inner
/// [`ErrorKind`] is boxed to keep the type cheap to move and clone.
#[derive(Clone, Debug, Error)]
#[error("{kind}")]
#[non_exhaustive]
pub struct Error {
    /// The type of error that occurred.
    pub kind: Box<ErrorKind>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
        }
    }

    pub(crate) fn shutdown() -> Self {
        Self::new(ErrorKind::Shutdown)
    }

    pub(crate) fn not_connected() -> Self {
        Self::new(ErrorKind::NotConnected)
    }

    pub(crate) fn connect_failed(code: i32, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectFailed {
            code,
            message: message.into(),
        })
    }

    pub(crate) fn not_ready(code: i32, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotReady {
            code,
            message: message.into(),
        })
    }

    pub(crate) fn handle_init_failed(code: i32) -> Self {
        Self::new(ErrorKind::HandleInitFailed { code })
    }

    pub(crate) fn reconnect_in_progress() -> Self {
        Self::new(ErrorKind::ReconnectInProgress)
    }

    #[allow(unused)]
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal {
            message: message.into(),
        })
    }

    /// The stable numeric code for this error.
    pub fn code(&self) -> i32 {
        match self.kind.as_ref() {
            ErrorKind::ConnectFailed { .. } => CODE_CONNECT_FAILED,
            ErrorKind::NotReady { .. } => CODE_NOT_READY,
            ErrorKind::HandleInitFailed { .. } => CODE_HANDLE_INIT_FAILED,
            ErrorKind::NotConnected => CODE_NOT_CONNECTED,
            ErrorKind::Shutdown => CODE_SHUTDOWN,
            ErrorKind::ReconnectInProgress => CODE_RECONNECT_IN_PROGRESS,
            ErrorKind::Internal { .. } => CODE_INTERNAL,
        }
    }

    /// Whether the pool rejected the operation because it was terminally shut
    /// down.
    pub fn is_shutdown(&self) -> bool {
        matches!(self.kind.as_ref(), ErrorKind::Shutdown)
    }

    /// Whether the pool had no live cluster connection. Callers should retry
    /// once the background reconnect completes.
    pub fn is_not_connected(&self) -> bool {
        matches!(self.kind.as_ref(), ErrorKind::NotConnected)
    }

    /// Whether this is the benign status returned by a reconnect trigger that
    /// found a cycle already in flight.
    pub fn is_reconnect_in_progress(&self) -> bool {
        matches!(self.kind.as_ref(), ErrorKind::ReconnectInProgress)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// The types of errors that can occur.
#[allow(missing_docs)]
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The driver's connect routine returned a non-zero code.
    #[error("failed to connect to the cluster: driver returned {code}: {message}")]
    #[non_exhaustive]
    ConnectFailed { code: i32, message: String },

    /// The cluster did not report ready within the deadline.
    #[error("cluster did not become ready: driver error {code}: {message}")]
    #[non_exhaustive]
    NotReady { code: i32, message: String },

    /// Per-handle initialization failed.
    #[error("handle initialization failed: driver returned {code}")]
    #[non_exhaustive]
    HandleInitFailed { code: i32 },

    /// The pool has no live cluster connection; a reconnect has been armed.
    #[error("not connected to the cluster; retry once reconnection completes")]
    NotConnected,

    /// A method was called on a pool that was terminally shut down.
    #[error("pool has been shut down")]
    Shutdown,

    /// A reconnect was requested while a previous cycle was still running.
    #[error("a reconnection is already in progress")]
    ReconnectInProgress,

    #[error("internal error: {message}")]
    #[non_exhaustive]
    Internal { message: String },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(Error::connect_failed(1, "x").code(), 2);
        assert_eq!(Error::not_ready(4009, "x").code(), 3);
        assert_eq!(Error::handle_init_failed(4000).code(), 4);
        assert_eq!(Error::not_connected().code(), 33);
        assert_eq!(Error::shutdown().code(), 34);
        assert_eq!(Error::reconnect_in_progress().code(), 36);
    }

    #[test]
    fn predicates_match_kinds() {
        assert!(Error::shutdown().is_shutdown());
        assert!(Error::not_connected().is_not_connected());
        assert!(Error::reconnect_in_progress().is_reconnect_in_progress());
        assert!(!Error::shutdown().is_not_connected());
    }
}
