//! Options used to configure a [`Pool`](crate::Pool).

use std::time::Duration;

use typed_builder::TypedBuilder;

pub(crate) const DEFAULT_CONNECT_RETRIES: u32 = 12;
pub(crate) const DEFAULT_CONNECT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Immutable configuration for a [`Pool`](crate::Pool).
///
/// ```
/// # use cluster_pool::PoolOptions;
/// let options = PoolOptions::builder()
///     .connection_string("mgmd-1:1186,mgmd-2:1186")
///     .node_id(101)
///     .build();
/// ```
#[derive(Clone, Debug, TypedBuilder)]
#[non_exhaustive]
pub struct PoolOptions {
    /// Bootstrap address list for the cluster's management nodes.
    #[builder(setter(into))]
    pub connection_string: String,

    /// The cluster-assigned node id identifying this client.
    pub node_id: u32,

    /// How many times the driver retries the initial connect before giving
    /// up.
    #[builder(default = DEFAULT_CONNECT_RETRIES)]
    pub connect_retries: u32,

    /// Delay between driver connect retries.
    #[builder(default = DEFAULT_CONNECT_RETRY_DELAY)]
    pub connect_retry_delay: Duration,
}
