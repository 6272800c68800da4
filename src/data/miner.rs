use std::{net::IpAddr, time::Duration};

use macaddr::MacAddr;
use measurements::{Power, Temperature};
use serde::{Deserialize, Serialize};

use super::deserialize::{
    deserialize_duration_secs, deserialize_mac, deserialize_power, deserialize_temperature,
};
use super::serialize::{
    serialize_duration_secs, serialize_mac, serialize_power, serialize_temperature,
};
use super::{
    board::BoardData, device::DeviceInfo, fan::FanData, hashrate::HashRate, message::MinerMessage,
    pool::PoolData,
};

/// Canonical, validated telemetry record for one miner at one point in time.
///
/// Constructed fresh on every successful fetch+normalize cycle and immutable
/// afterwards. Serializes to a JSON object with `ip` as a dotted-quad string,
/// `mac` as a colon-separated string, temperatures in celsius, power in
/// watts and `uptime` as a floating-point count of seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinerData {
    /// The schema version of this MinerData object, for use in external APIs
    pub schema_version: String,
    /// The time this data was gathered and constructed, epoch seconds
    pub timestamp: u64,
    /// The IP address of the miner this data is for
    pub ip: IpAddr,
    /// The MAC address of the miner this data is for
    #[serde(serialize_with = "serialize_mac", deserialize_with = "deserialize_mac")]
    pub mac: MacAddr,
    /// Hardware information about this miner
    pub device_info: DeviceInfo,
    /// The serial number of the miner, also known as the control board serial
    pub serial_number: Option<String>,
    /// The network hostname of the miner
    pub hostname: Option<String>,
    /// The API version of the miner
    pub api_version: Option<String>,
    /// The firmware version of the miner
    pub firmware_version: Option<String>,
    /// The type of control board on the miner
    pub control_board_version: Option<String>,
    /// The expected number of boards in the miner.
    pub expected_hashboards: Option<u8>,
    /// Per-hashboard data for this miner
    pub hashboards: Vec<BoardData>,
    /// The current hashrate of the miner
    pub hashrate: Option<HashRate>,
    /// The expected or factory hashrate of the miner
    pub expected_hashrate: Option<HashRate>,
    /// The total expected number of chips across all boards on this miner
    pub expected_chips: Option<u16>,
    /// The total number of working chips across all boards on this miner
    pub total_chips: Option<u16>,
    /// The expected number of fans on the miner
    pub expected_fans: Option<u8>,
    /// The current fan information for the miner
    pub fans: Vec<FanData>,
    /// The current PSU fan information for the miner
    pub psu_fans: Vec<FanData>,
    /// The average temperature across all chips in the miner
    #[serde(
        serialize_with = "serialize_temperature",
        deserialize_with = "deserialize_temperature"
    )]
    pub average_temperature: Option<Temperature>,
    /// The environment temperature of the miner, such as air temperature or immersion fluid temperature
    #[serde(
        serialize_with = "serialize_temperature",
        deserialize_with = "deserialize_temperature"
    )]
    pub fluid_temperature: Option<Temperature>,
    /// The current power consumption of the miner
    #[serde(
        serialize_with = "serialize_power",
        deserialize_with = "deserialize_power"
    )]
    pub wattage: Option<Power>,
    /// The current power limit or power target of the miner
    #[serde(
        serialize_with = "serialize_power",
        deserialize_with = "deserialize_power"
    )]
    pub wattage_limit: Option<Power>,
    /// The current efficiency in W/TH/s (J/TH) of the miner
    pub efficiency: Option<f64>,
    /// The state of the fault/alert light on the miner
    pub light_flashing: Option<bool>,
    /// Any message on the miner, including errors
    pub messages: Vec<MinerMessage>,
    /// The total uptime of the miner's system
    #[serde(
        serialize_with = "serialize_duration_secs",
        deserialize_with = "deserialize_duration_secs"
    )]
    pub uptime: Option<Duration>,
    /// Whether the hashing process is currently running
    pub is_mining: bool,
    /// The current pools configured on the miner
    pub pools: Vec<PoolData>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::device::{HashAlgorithm, MinerFirmware, MinerHardware, MinerMake};
    use std::str::FromStr;

    pub(crate) fn sample() -> MinerData {
        MinerData {
            schema_version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: 1_700_000_000,
            ip: IpAddr::from_str("10.0.0.7").unwrap(),
            mac: MacAddr::from_str("AA:BB:CC:00:11:22").unwrap(),
            device_info: DeviceInfo::new(
                MinerMake::BitAxe,
                "Gamma",
                MinerHardware::default(),
                MinerFirmware::Stock,
                HashAlgorithm::SHA256,
            ),
            serial_number: None,
            hostname: Some("bitaxe".to_string()),
            api_version: None,
            firmware_version: Some("2.9.0".to_string()),
            control_board_version: None,
            expected_hashboards: Some(1),
            hashboards: vec![],
            hashrate: None,
            expected_hashrate: None,
            expected_chips: Some(1),
            total_chips: Some(1),
            expected_fans: Some(1),
            fans: vec![],
            psu_fans: vec![],
            average_temperature: Some(Temperature::from_celsius(55.0)),
            fluid_temperature: None,
            wattage: None,
            wattage_limit: None,
            efficiency: None,
            light_flashing: None,
            messages: vec![],
            uptime: Some(Duration::from_secs(3661)),
            is_mining: true,
            pools: vec![],
        }
    }

    #[test]
    fn serializes_to_language_neutral_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["ip"], "10.0.0.7");
        assert_eq!(value["mac"], "AA:BB:CC:00:11:22");
        assert_eq!(value["average_temperature"], 55.0);
        assert_eq!(value["uptime"], 3661.0);
        // unreported, not zero
        assert_eq!(value["wattage"], serde_json::Value::Null);
        assert_eq!(value["serial_number"], serde_json::Value::Null);
    }

    #[test]
    fn round_trips_through_json() {
        let data = sample();
        let value = serde_json::to_value(&data).unwrap();
        let back: MinerData = serde_json::from_value(value).unwrap();
        assert_eq!(back, data);
    }
}
