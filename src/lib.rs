#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::cast_possible_truncation)]
#![warn(clippy::cast_possible_wrap)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod driver;
pub mod error;
mod options;
mod pool;
pub(crate) mod runtime;

pub use crate::{
    options::PoolOptions,
    pool::{ConnectionState, Pool, PoolStats, PooledHandle},
};
