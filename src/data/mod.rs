//! Canonical telemetry types.
//!
//! The most important type is [`MinerData`][`miner::MinerData`]: the
//! validated record every scan and fetch produces, regardless of which
//! vendor's device answered.

pub mod board;
pub(crate) mod deserialize;
pub mod device;
pub mod fan;
pub mod hashrate;
pub mod message;
pub mod miner;
pub mod pool;
pub(crate) mod serialize;
