//! Discovery orchestration: the [`MinerFactory`] builder and its scan
//! engine.
//!
//! The engine fans a target enumeration out over a bounded pool of
//! concurrent probe+fetch+normalize pipelines. Every per-address failure
//! (refused connection, timeout, protocol mismatch, validation failure)
//! is absorbed at that address and logged; a scan never aborts because
//! one device misbehaved.

use futures::stream::{self, Stream, StreamExt};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use crate::data::miner::MinerData;
use crate::error::{Error, Result};
use crate::miners::address::AddressSpec;
use crate::miners::backends::web::WebDeviceClient;
use crate::miners::client::{DeviceClient, MinerHandle};
use crate::miners::normalize;

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Concurrency bound scaled to the size of the target set, used when the
/// caller does not pin one explicitly.
fn optimal_concurrency(ip_count: usize) -> usize {
    match ip_count {
        0..=100 => 25,
        101..=1000 => 50,
        1001..=5000 => 100,
        5001..=10000 => 150,
        _ => 200,
    }
}

/// One full pipeline for one address. Failures of any kind end here: the
/// address is logged and dropped, never propagated.
async fn probe(
    client: Arc<dyn DeviceClient>,
    ip: IpAddr,
    deadline: Duration,
) -> Option<MinerData> {
    let attempt = async {
        match client.connect(ip).await? {
            None => Ok(None),
            Some(mut session) => {
                let raw = session.fetch_raw().await?;
                normalize::normalize(&raw).map(Some)
            }
        }
    };

    match timeout(deadline, attempt).await {
        Ok(Ok(found)) => found,
        Ok(Err(e)) => {
            debug!(%ip, error = %e, "probe dropped");
            None
        }
        Err(_) => {
            debug!(%ip, "probe timed out");
            None
        }
    }
}

/// Configures a scan target set and discovers the miners living there.
///
/// Builder methods consume and return the factory, so configurations
/// chain without hidden shared state:
///
/// ```no_run
/// # use asic_scout::MinerFactory;
/// # #[tokio::main]
/// # async fn main() -> asic_scout::Result<()> {
/// let miners = MinerFactory::new()
///     .with_subnet("192.168.1.0/24")?
///     .with_concurrency_limit(64)
///     .scan()
///     .await?;
/// # Ok(()) }
/// ```
#[derive(Clone)]
pub struct MinerFactory {
    spec: Option<AddressSpec>,
    client: Arc<dyn DeviceClient>,
    max_concurrent: usize,
    probe_timeout: Duration,
}

impl Default for MinerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MinerFactory {
    pub fn new() -> Self {
        Self {
            spec: None,
            client: Arc::new(WebDeviceClient::default()),
            max_concurrent: 0, // adaptive until pinned
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Construct a factory scanning a CIDR subnet.
    pub fn from_subnet(subnet: &str) -> Result<Self> {
        Self::new().with_subnet(subnet)
    }

    /// Construct a factory scanning per-octet values, ranges, or `*` wildcards.
    pub fn from_octets(octet1: &str, octet2: &str, octet3: &str, octet4: &str) -> Result<Self> {
        Self::new().with_octets(octet1, octet2, octet3, octet4)
    }

    /// Construct a factory scanning an IP range string, either
    /// `"10.0.0.1-10.0.1.50"` or the per-octet form `"10.1-199.0.1-199"`.
    pub fn from_range(range: &str) -> Result<Self> {
        Self::new().with_range(range)
    }

    pub fn with_single(mut self, ip: std::net::Ipv4Addr) -> Self {
        self.spec = Some(AddressSpec::single(ip));
        self
    }

    pub fn with_subnet(mut self, subnet: &str) -> Result<Self> {
        self.spec = Some(AddressSpec::subnet(subnet)?);
        Ok(self)
    }

    pub fn with_octets(
        mut self,
        octet1: &str,
        octet2: &str,
        octet3: &str,
        octet4: &str,
    ) -> Result<Self> {
        self.spec = Some(AddressSpec::octets(octet1, octet2, octet3, octet4)?);
        Ok(self)
    }

    pub fn with_range(mut self, range: &str) -> Result<Self> {
        self.spec = Some(AddressSpec::parse_range(range)?);
        Ok(self)
    }

    pub fn with_spec(mut self, spec: AddressSpec) -> Self {
        self.spec = Some(spec);
        self
    }

    /// Pin the number of simultaneous in-flight probes. Without this the
    /// bound adapts to the size of the target set.
    pub fn with_concurrency_limit(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Deadline for each address's whole probe+fetch pipeline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.probe_timeout = Duration::from_secs(timeout_secs);
        self
    }

    /// Swap the device access layer. Defaults to the stock web client.
    pub fn with_client(mut self, client: Arc<dyn DeviceClient>) -> Self {
        self.client = client;
        self
    }

    /// Number of addresses the configured target set enumerates.
    pub fn ip_count(&self) -> usize {
        self.spec.as_ref().map(AddressSpec::len).unwrap_or(0)
    }

    fn targets(&self) -> Result<&AddressSpec> {
        self.spec.as_ref().ok_or_else(|| {
            Error::invalid_spec(
                "no scan targets configured; use with_subnet, with_octets, or with_range",
            )
        })
    }

    fn concurrency(&self, ip_count: usize) -> usize {
        if self.max_concurrent == 0 {
            optimal_concurrency(ip_count)
        } else {
            self.max_concurrent
        }
    }

    /// Probe a single address.
    ///
    /// An empty result means nothing identifiable answered, which includes
    /// a timed-out probe. Hard transport errors are surfaced; they are
    /// distinct from "no miner here".
    pub async fn get_miner(&self, ip: IpAddr) -> Result<Option<MinerHandle>> {
        match timeout(self.probe_timeout, self.client.connect(ip)).await {
            Ok(Ok(Some(session))) => Ok(Some(MinerHandle::new(ip, session))),
            Ok(Ok(None)) => Ok(None),
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(None),
        }
    }

    /// Probe every target address and collect the miners that answered.
    ///
    /// Returns only once every address has reached a terminal state; use
    /// [`MinerFactory::scan_stream`] when early results matter.
    pub async fn scan(&self) -> Result<Vec<MinerData>> {
        Ok(self.scan_stream()?.collect().await)
    }

    /// Lazily yield miners in completion order, as each concurrent probe
    /// finishes.
    ///
    /// The stream closes once every address has been attempted. Dropping
    /// it cancels in-flight probes and schedules no further ones.
    pub fn scan_stream(&self) -> Result<impl Stream<Item = MinerData> + Send + 'static> {
        Ok(self.scan_stream_with_ip()?.map(|(_ip, data)| data))
    }

    /// Like [`MinerFactory::scan_stream`], but pairs each result with the
    /// probed address. Useful when devices misreport their own IP.
    pub fn scan_stream_with_ip(
        &self,
    ) -> Result<impl Stream<Item = (IpAddr, MinerData)> + Send + 'static> {
        let spec = self.targets()?.clone();
        let limit = self.concurrency(spec.len());
        let client = Arc::clone(&self.client);
        let deadline = self.probe_timeout;

        let stream = stream::iter(spec.iter().map(IpAddr::V4))
            .map(move |ip| {
                let client = Arc::clone(&client);
                async move { (ip, probe(client, ip, deadline).await) }
            })
            .buffer_unordered(limit)
            .filter_map(|(ip, found)| async move { found.map(|data| (ip, data)) });

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miners::client::RawSession;
    use crate::miners::snapshot::{DataField, RawSnapshot};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashSet;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Instrumented in-memory device fleet: a set of addresses that host
    /// "miners", with counters for concurrency and session accounting.
    struct FakeFleet {
        miners: HashSet<IpAddr>,
        connect_delay: Duration,
        fetch_delay: Duration,
        concurrent: AtomicUsize,
        max_concurrent: AtomicUsize,
        open_sessions: Arc<AtomicUsize>,
    }

    impl FakeFleet {
        fn new(miners: impl IntoIterator<Item = [u8; 4]>) -> Self {
            Self {
                miners: miners
                    .into_iter()
                    .map(|octets| IpAddr::V4(Ipv4Addr::from(octets)))
                    .collect(),
                connect_delay: Duration::from_millis(5),
                fetch_delay: Duration::ZERO,
                concurrent: AtomicUsize::new(0),
                max_concurrent: AtomicUsize::new(0),
                open_sessions: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn with_fetch_delay(mut self, delay: Duration) -> Self {
            self.fetch_delay = delay;
            self
        }
    }

    fn sample_raw(ip: IpAddr) -> RawSnapshot {
        let mut raw = RawSnapshot::new();
        raw.insert(DataField::SchemaVersion, env!("CARGO_PKG_VERSION"));
        raw.insert(DataField::Timestamp, 1_700_000_000u64);
        raw.insert(DataField::Ip, ip.to_string());
        raw.insert(DataField::Mac, "AA:BB:CC:00:11:22");
        raw.insert(
            DataField::DeviceInfo,
            json!({"make": "BitAxe", "model": "Gamma", "firmware": "Stock", "algo": "SHA256"}),
        );
        raw.insert(DataField::IsMining, true);
        raw
    }

    #[async_trait]
    impl DeviceClient for FakeFleet {
        async fn connect(&self, ip: IpAddr) -> Result<Option<Box<dyn RawSession>>> {
            let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_concurrent.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.connect_delay).await;
            self.concurrent.fetch_sub(1, Ordering::SeqCst);

            if !self.miners.contains(&ip) {
                return Ok(None);
            }
            self.open_sessions.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Box::new(FakeSession {
                ip,
                fetch_delay: self.fetch_delay,
                open_sessions: Arc::clone(&self.open_sessions),
            })))
        }
    }

    struct FakeSession {
        ip: IpAddr,
        fetch_delay: Duration,
        open_sessions: Arc<AtomicUsize>,
    }

    impl Drop for FakeSession {
        fn drop(&mut self) {
            self.open_sessions.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl RawSession for FakeSession {
        async fn fetch_raw(&mut self) -> Result<RawSnapshot> {
            tokio::time::sleep(self.fetch_delay).await;
            Ok(sample_raw(self.ip))
        }
    }

    /// A client whose transport is broken, not merely empty.
    struct BrokenClient;

    #[async_trait]
    impl DeviceClient for BrokenClient {
        async fn connect(&self, _ip: IpAddr) -> Result<Option<Box<dyn RawSession>>> {
            Err(Error::Unreachable("route lookup failed".into()))
        }
    }

    fn factory(fleet: Arc<FakeFleet>) -> MinerFactory {
        MinerFactory::new().with_client(fleet)
    }

    #[tokio::test]
    async fn scan_yields_exactly_the_responding_miners() {
        let fleet = Arc::new(FakeFleet::new([
            [10, 0, 0, 3],
            [10, 0, 0, 17],
            [10, 0, 0, 200],
        ]));
        let miners = factory(Arc::clone(&fleet))
            .with_octets("10", "0", "0", "*")
            .unwrap()
            .scan()
            .await
            .unwrap();

        assert_eq!(miners.len(), 3);
        let ips: HashSet<_> = miners.iter().map(|m| m.ip).collect();
        assert!(ips.contains(&IpAddr::V4(Ipv4Addr::new(10, 0, 0, 17))));
        // every session was released
        assert_eq!(fleet.open_sessions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scan_stream_closes_after_all_addresses_attempted() {
        let fleet = Arc::new(FakeFleet::new([[10, 0, 0, 2], [10, 0, 0, 9]]));
        let stream = factory(Arc::clone(&fleet))
            .with_range("10.0.0.1-10.0.0.32")
            .unwrap()
            .scan_stream()
            .unwrap();

        let collected: Vec<_> = stream.collect().await;
        assert_eq!(collected.len(), 2);
        assert_eq!(fleet.open_sessions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scan_stream_with_ip_pairs_results_with_probed_address() {
        let fleet = Arc::new(FakeFleet::new([[192, 168, 1, 42]]));
        let stream = factory(fleet)
            .with_subnet("192.168.1.0/24")
            .unwrap()
            .scan_stream_with_ip()
            .unwrap();

        let collected: Vec<_> = stream.collect().await;
        assert_eq!(collected.len(), 1);
        let (ip, data) = &collected[0];
        assert_eq!(*ip, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 42)));
        assert_eq!(data.ip, *ip);
    }

    #[tokio::test]
    async fn concurrency_bound_is_respected() {
        let fleet = Arc::new(FakeFleet::new([]));
        let miners = factory(Arc::clone(&fleet))
            .with_range("10.0.0.1-10.0.0.64")
            .unwrap()
            .with_concurrency_limit(4)
            .scan()
            .await
            .unwrap();

        assert!(miners.is_empty());
        assert!(fleet.max_concurrent.load(Ordering::SeqCst) <= 4);
        assert!(fleet.max_concurrent.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test]
    async fn cancelling_the_stream_leaks_no_sessions() {
        let fleet = Arc::new(
            FakeFleet::new([[10, 0, 0, 1], [10, 0, 0, 2], [10, 0, 0, 3], [10, 0, 0, 4]])
                .with_fetch_delay(Duration::from_secs(60)),
        );
        let stream = factory(Arc::clone(&fleet))
            .with_range("10.0.0.1-10.0.0.8")
            .unwrap()
            .with_concurrency_limit(4)
            .scan_stream()
            .unwrap();

        // Give the engine time to open sessions, then walk away mid-scan.
        let mut stream = Box::pin(stream);
        let first = timeout(Duration::from_millis(100), stream.next()).await;
        assert!(first.is_err(), "fetches hang, nothing should arrive");
        drop(stream);

        assert_eq!(fleet.open_sessions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn per_address_timeout_is_treated_as_not_found() {
        let fleet = Arc::new(
            FakeFleet::new([[10, 0, 0, 1]]).with_fetch_delay(Duration::from_secs(60)),
        );
        let miners = factory(Arc::clone(&fleet))
            .with_single(Ipv4Addr::new(10, 0, 0, 1))
            .with_timeout(Duration::from_millis(50))
            .scan()
            .await
            .unwrap();

        assert!(miners.is_empty());
        assert_eq!(fleet.open_sessions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn get_miner_distinguishes_found_and_not_found() {
        let fleet = Arc::new(FakeFleet::new([[10, 0, 0, 5]]));
        let factory = factory(fleet);

        let mut handle = factory
            .get_miner(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)))
            .await
            .unwrap()
            .expect("miner lives here");
        let data = handle.get_data().await.unwrap();
        assert_eq!(data.ip, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)));

        let missing = factory
            .get_miner(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 6)))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn get_miner_surfaces_hard_transport_errors() {
        let factory = MinerFactory::new().with_client(Arc::new(BrokenClient));
        let result = factory
            .get_miner(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)))
            .await;
        assert!(matches!(result, Err(Error::Unreachable(_))));
    }

    #[tokio::test]
    async fn scan_without_targets_is_a_configuration_error() {
        let factory = MinerFactory::new();
        assert!(matches!(
            factory.scan().await,
            Err(Error::InvalidAddressSpec(_))
        ));
    }

    #[test]
    fn ip_count_reports_enumeration_size() {
        let factory = MinerFactory::new().with_subnet("10.0.0.0/30").unwrap();
        assert_eq!(factory.ip_count(), 2);
        assert_eq!(MinerFactory::new().ip_count(), 0);
    }
}
