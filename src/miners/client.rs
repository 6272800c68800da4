use crate::data::miner::MinerData;
use crate::error::Result;
use crate::miners::normalize;
use crate::miners::snapshot::RawSnapshot;
use async_trait::async_trait;
use std::net::IpAddr;

/// Lower-level device access used by the scan engine.
///
/// Implementations own identification and transport; the engine only cares
/// whether an address answered and what raw telemetry it produced.
#[async_trait]
pub trait DeviceClient: Send + Sync {
    /// Probe an address and open a session if an understood device answers.
    ///
    /// `Ok(None)` means nothing identifiable lives there; that is an
    /// expected outcome, not a fault. `Err` is reserved for hard transport
    /// problems and only surfaces from single-target probes.
    async fn connect(&self, ip: IpAddr) -> Result<Option<Box<dyn RawSession>>>;
}

/// An open connection to one identified device.
///
/// The session owns its transport and releases it when dropped, on every
/// exit path.
#[async_trait]
pub trait RawSession: Send {
    /// Fetch a raw telemetry snapshot from the device.
    async fn fetch_raw(&mut self) -> Result<RawSnapshot>;
}

/// A successfully identified miner, ready for data gathering.
///
/// Transient: this is a live session wrapper, not part of the data model.
pub struct MinerHandle {
    ip: IpAddr,
    session: Box<dyn RawSession>,
}

impl MinerHandle {
    pub(crate) fn new(ip: IpAddr, session: Box<dyn RawSession>) -> Self {
        Self { ip, session }
    }

    /// The address this handle is connected to.
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Fetch a fresh snapshot and normalize it into [`MinerData`].
    pub async fn get_data(&mut self) -> Result<MinerData> {
        let raw = self.session.fetch_raw().await?;
        normalize::normalize(&raw)
    }
}
