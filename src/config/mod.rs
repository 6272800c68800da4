//! Pool configuration entities.
//!
//! These are consumed by configuration-writing tooling layered on top of
//! this crate; discovery and telemetry never touch them.

pub mod pools;

pub use pools::{Pool, PoolGroup};
