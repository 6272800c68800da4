//! Stock device client for web-managed miners.
//!
//! Covers AxeOS/ESPMiner-style control boards: a plain HTTP JSON API,
//! identified by probing `system/info`. Everything vendor-specific stays
//! here; the snapshot leaves this module shaped for the normalizer.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::net::IpAddr;
use std::time::Duration;

use crate::data::hashrate::HashRateUnit;
use crate::error::{Error, Result};
use crate::miners::api::web::WebApiClient;
use crate::miners::client::{DeviceClient, RawSession};
use crate::miners::snapshot::{
    DataCollector, DataExtractor, DataField, DataLocation, FieldLocations, RawSnapshot, get_by_key,
};

const SYSTEM_INFO_CMD: &str = "system/info";
const ASIC_INFO_CMD: &str = "system/asic";

/// [`DeviceClient`] for stock web miners.
pub struct WebDeviceClient {
    port: u16,
    timeout: Duration,
    retries: u32,
}

impl Default for WebDeviceClient {
    fn default() -> Self {
        Self {
            port: 80,
            timeout: Duration::from_secs(5),
            retries: 1,
        }
    }
}

impl WebDeviceClient {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

/// An answering device counts only if its system info carries the ASIC
/// model marker; plain web servers on port 80 are not miners.
fn identify(info: &Value) -> Option<String> {
    info.get("ASICModel")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl DeviceClient for WebDeviceClient {
    async fn connect(&self, ip: IpAddr) -> Result<Option<Box<dyn RawSession>>> {
        let api = WebApiClient::new(ip.to_string(), self.port)
            .with_timeout(self.timeout)
            .with_retries(self.retries);
        match api.system_info().await {
            Ok(info) => match identify(&info) {
                Some(model) => Ok(Some(Box::new(WebSession { ip, model, api }))),
                None => Ok(None),
            },
            // Nothing answering, or answering in a shape we don't know,
            // is an expected miss at this layer.
            Err(Error::Unreachable(_)) | Err(Error::Timeout) | Err(Error::Protocol(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

struct WebSession {
    ip: IpAddr,
    model: String,
    api: WebApiClient,
}

impl FieldLocations for WebSession {
    fn locations(&self, data_field: DataField) -> &'static [DataLocation] {
        match data_field {
            DataField::Mac => &[(
                SYSTEM_INFO_CMD,
                DataExtractor {
                    func: get_by_key,
                    key: Some("macAddr"),
                },
            )],
            DataField::Hostname => &[(
                SYSTEM_INFO_CMD,
                DataExtractor {
                    func: get_by_key,
                    key: Some("hostname"),
                },
            )],
            DataField::FirmwareVersion => &[(
                SYSTEM_INFO_CMD,
                DataExtractor {
                    func: get_by_key,
                    key: Some("version"),
                },
            )],
            DataField::ControlBoardVersion => &[(
                SYSTEM_INFO_CMD,
                DataExtractor {
                    func: get_by_key,
                    key: Some("boardVersion"),
                },
            )],
            DataField::ExpectedHashboards => &[(
                SYSTEM_INFO_CMD,
                DataExtractor {
                    func: get_by_key,
                    key: Some("asicCount"),
                },
            )],
            DataField::Hashrate => &[(
                SYSTEM_INFO_CMD,
                DataExtractor {
                    func: get_by_key,
                    key: Some("hashRate"),
                },
            )],
            DataField::TotalChips => &[
                (
                    SYSTEM_INFO_CMD,
                    DataExtractor {
                        func: get_by_key,
                        key: Some("smallCoreCount"),
                    },
                ),
                (
                    ASIC_INFO_CMD,
                    DataExtractor {
                        func: get_by_key,
                        key: Some("smallCoreCount"),
                    },
                ),
            ],
            DataField::Fans => &[(
                SYSTEM_INFO_CMD,
                DataExtractor {
                    func: get_by_key,
                    key: Some("fanrpm"),
                },
            )],
            DataField::AverageTemperature => &[(
                SYSTEM_INFO_CMD,
                DataExtractor {
                    func: get_by_key,
                    key: Some("temp"),
                },
            )],
            DataField::Wattage => &[(
                SYSTEM_INFO_CMD,
                DataExtractor {
                    func: get_by_key,
                    key: Some("power"),
                },
            )],
            DataField::Uptime => &[(
                SYSTEM_INFO_CMD,
                DataExtractor {
                    func: get_by_key,
                    key: Some("uptimeSeconds"),
                },
            )],
            _ => &[],
        }
    }
}

#[async_trait]
impl RawSession for WebSession {
    async fn fetch_raw(&mut self) -> Result<RawSnapshot> {
        let session: &WebSession = self;
        let mut collector = DataCollector::new(session, &session.api);
        let mut raw = collector.collect_all().await;

        if raw.is_empty() {
            return Err(Error::Protocol("device returned no usable fields".into()));
        }

        // Shape vendor quirks into normalizer conventions: these boards
        // report hashrate as a bare MH/s number and a single fan rpm.
        if let Some(rate) = raw.get(DataField::Hashrate).and_then(Value::as_f64) {
            raw.insert(
                DataField::Hashrate,
                json!({
                    "value": rate,
                    "unit": HashRateUnit::MegaHash.code(),
                    "algo": "SHA256",
                }),
            );
            raw.insert(DataField::IsMining, rate > 0.0);
        } else {
            raw.insert(DataField::IsMining, false);
        }

        if let Some(rpm) = raw.get(DataField::Fans).cloned().filter(Value::is_number) {
            raw.insert(DataField::Fans, Value::Array(vec![rpm]));
        }
        raw.insert(DataField::ExpectedFans, 1);

        let boards = raw.get(DataField::ExpectedHashboards).cloned();
        raw.insert(
            DataField::DeviceInfo,
            json!({
                "make": "BitAxe",
                "model": self.model,
                "hardware": {
                    "chips": 1,
                    "fans": 1,
                    "boards": boards,
                },
                "firmware": "Stock",
                "algo": "SHA256",
            }),
        );

        raw.stamp(self.ip);
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifies_only_asic_devices() {
        let info = json!({"ASICModel": "BM1370", "hashRate": 1032.5});
        assert_eq!(identify(&info).as_deref(), Some("BM1370"));

        let not_a_miner = json!({"server": "nginx"});
        assert_eq!(identify(&not_a_miner), None);
    }
}
