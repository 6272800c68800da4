//! asic-scout discovers ASIC miners on a network and normalizes whatever
//! telemetry they report into one validated data model, so fleet tooling
//! never has to care which vendor's firmware answered.
//!
//! # Getting Started
//!
//! ### Getting a miner
//! If you know the IP address of your miner, probe it directly. The
//! [`MinerFactory`] identifies the device and hands back a live handle.
//! ```no_run
//! use asic_scout::MinerFactory;
//! use std::net::IpAddr;
//! use std::str::FromStr;
//!
//! #[tokio::main]
//! async fn main() {
//!     let factory = MinerFactory::new();
//!     let ip = IpAddr::from_str("192.168.1.10").unwrap();
//!     if let Some(mut miner) = factory.get_miner(ip).await.unwrap() {
//!         println!("{:?}", miner.get_data().await);
//!     }
//! }
//! ```
//!
//! ### Miner discovery
//! If you don't know the specific IP, scan for it.
//! ```no_run
//! use asic_scout::MinerFactory;
//!
//! #[tokio::main]
//! async fn main() {
//!     let factory = MinerFactory::from_subnet("192.168.1.0/24").unwrap();
//!     let miners = factory.scan().await.unwrap();
//! }
//! ```
//!
//! There are other ways to define a discovery range to be scanned:
//!
//! - Octets, with values, ranges, or `*` wildcards
//! ```no_run
//! # use asic_scout::MinerFactory;
//! let factory = MinerFactory::from_octets("192", "168", "1", "1-255").unwrap();
//! ```
//! - Range string
//! ```no_run
//! # use asic_scout::MinerFactory;
//! let factory = MinerFactory::from_range("192.168.1.1-255").unwrap();
//! ```
//!
//! Results arrive either collected ([`MinerFactory::scan`]) or as a live
//! stream in completion order ([`MinerFactory::scan_stream`],
//! [`MinerFactory::scan_stream_with_ip`]); per-device failures never abort
//! a scan.

pub mod config;
pub mod data;
pub mod error;
pub mod miners;

pub use data::miner::MinerData;
pub use error::{Error, Result};
pub use miners::address::AddressSpec;
pub use miners::client::{DeviceClient, MinerHandle, RawSession};
pub use miners::factory::MinerFactory;

use std::net::IpAddr;

/// Probe a single address with a default-configured [`MinerFactory`].
pub async fn get_miner(ip: IpAddr) -> Result<Option<MinerHandle>> {
    MinerFactory::new().get_miner(ip).await
}
