use crate::miners::api::ApiClient;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::time::{SystemTime, UNIX_EPOCH};
use strum::{EnumIter, IntoEnumIterator};

/// Represents the individual pieces of data that can be queried from a miner device.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Copy, EnumIter)]
pub enum DataField {
    /// Schema version of the miner data.
    SchemaVersion,
    /// Timestamp of when the data was collected.
    Timestamp,
    /// IP address of the miner.
    Ip,
    /// MAC address of the miner.
    Mac,
    /// Information about the miner's device.
    DeviceInfo,
    /// Serial number of the miner.
    SerialNumber,
    /// Hostname assigned to the miner.
    Hostname,
    /// Version of the miner's API.
    ApiVersion,
    /// Firmware version of the miner.
    FirmwareVersion,
    /// Control board version of the miner.
    ControlBoardVersion,
    /// Expected number of hashboards.
    ExpectedHashboards,
    /// Details about the hashboards (e.g., temperatures, chips, etc.).
    Hashboards,
    /// Current hashrate reported by the miner.
    Hashrate,
    /// Expected or factory hashrate of the miner.
    ExpectedHashrate,
    /// Expected number of chips across all hashboards.
    ExpectedChips,
    /// Total number of chips detected.
    TotalChips,
    /// Expected number of fans.
    ExpectedFans,
    /// Fan speed or fan configuration.
    Fans,
    /// PSU fan speed or configuration.
    PsuFans,
    /// Average temperature reported by the miner.
    AverageTemperature,
    /// Fluid temperature reported by the miner.
    FluidTemperature,
    /// Current power consumption in watts.
    Wattage,
    /// Configured power limit in watts.
    WattageLimit,
    /// Efficiency of the miner (e.g., J/TH).
    Efficiency,
    /// Whether the fault or alert light is flashing.
    LightFlashing,
    /// Messages reported by the miner (e.g., errors or warnings).
    Messages,
    /// Uptime in seconds.
    Uptime,
    /// Whether the miner is currently hashing.
    IsMining,
    /// Pool configuration (addresses, statuses, etc.).
    Pools,
}

impl DataField {
    /// Dotted path of this field in the canonical record, used in
    /// validation error messages.
    pub fn path(&self) -> &'static str {
        match self {
            DataField::SchemaVersion => "schema_version",
            DataField::Timestamp => "timestamp",
            DataField::Ip => "ip",
            DataField::Mac => "mac",
            DataField::DeviceInfo => "device_info",
            DataField::SerialNumber => "serial_number",
            DataField::Hostname => "hostname",
            DataField::ApiVersion => "api_version",
            DataField::FirmwareVersion => "firmware_version",
            DataField::ControlBoardVersion => "control_board_version",
            DataField::ExpectedHashboards => "expected_hashboards",
            DataField::Hashboards => "hashboards",
            DataField::Hashrate => "hashrate",
            DataField::ExpectedHashrate => "expected_hashrate",
            DataField::ExpectedChips => "expected_chips",
            DataField::TotalChips => "total_chips",
            DataField::ExpectedFans => "expected_fans",
            DataField::Fans => "fans",
            DataField::PsuFans => "psu_fans",
            DataField::AverageTemperature => "average_temperature",
            DataField::FluidTemperature => "fluid_temperature",
            DataField::Wattage => "wattage",
            DataField::WattageLimit => "wattage_limit",
            DataField::Efficiency => "efficiency",
            DataField::LightFlashing => "light_flashing",
            DataField::Messages => "messages",
            DataField::Uptime => "uptime",
            DataField::IsMining => "is_mining",
            DataField::Pools => "pools",
        }
    }
}

/// A loosely-typed telemetry snapshot: raw values as extracted from a
/// device, keyed by the field they claim to describe.
///
/// This is what a device client hands to the normalizer. Values are
/// whatever JSON the device produced; nothing is validated yet.
#[derive(Debug, Clone, Default)]
pub struct RawSnapshot {
    fields: HashMap<DataField, Value>,
}

impl RawSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: DataField, value: impl Into<Value>) {
        self.fields.insert(field, value.into());
    }

    pub fn get(&self, field: DataField) -> Option<&Value> {
        self.fields.get(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Record collection metadata: schema version, collection time and the
    /// address the device was reached at. Called by device clients right
    /// after a successful fetch.
    pub fn stamp(&mut self, ip: IpAddr) {
        self.insert(DataField::SchemaVersion, env!("CARGO_PKG_VERSION"));
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.insert(DataField::Timestamp, now);
        self.insert(DataField::Ip, ip.to_string());
    }
}

/// A function pointer type that takes a JSON `Value` and an optional key,
/// returning the extracted value if found.
type ExtractorFn = for<'a> fn(&'a Value, Option<&'static str>) -> Option<&'a Value>;

/// Describes how to extract a specific value from a command's response.
///
/// Created by a backend and used to locate a field within a JSON structure.
#[derive(Clone, Copy)]
pub struct DataExtractor {
    /// Function used to extract data from a JSON response.
    pub func: ExtractorFn,
    /// Optional key or pointer within the response to extract.
    pub key: Option<&'static str>,
}

/// Alias for a tuple describing the API command and the extractor used to parse its result.
pub type DataLocation = (&'static str, DataExtractor);

/// Extracts a value from a JSON object using a key (flat lookup).
///
/// Returns `None` if the key is `None` or not found in the object.
pub fn get_by_key<'a>(data: &'a Value, key: Option<&str>) -> Option<&'a Value> {
    data.get(key?)
}

/// Extracts a value from a JSON object using a JSON pointer path.
///
/// Returns `None` if the pointer is `None` or the path doesn't exist.
pub fn get_by_pointer<'a>(data: &'a Value, pointer: Option<&str>) -> Option<&'a Value> {
    data.pointer(pointer?)
}

/// Maps each [`DataField`] to the API commands and extractors that can
/// produce it for a particular backend.
pub trait FieldLocations: Send + Sync {
    fn locations(&self, data_field: DataField) -> &'static [DataLocation];
}

/// A utility for collecting a [`RawSnapshot`] from an API backend.
pub struct DataCollector<'a> {
    /// Backend-specific field location mappings.
    locations: &'a dyn FieldLocations,
    /// API client used to send commands to the miner.
    api_client: &'a dyn ApiClient,
    /// Cache of command responses keyed by command string.
    cache: HashMap<String, Value>,
}

impl<'a> DataCollector<'a> {
    /// Constructs a new `DataCollector` with the given location table and API client.
    pub fn new(locations: &'a dyn FieldLocations, api_client: &'a dyn ApiClient) -> Self {
        Self {
            locations,
            api_client,
            cache: HashMap::new(),
        }
    }

    /// Collects **all** available fields from the miner.
    pub async fn collect_all(&mut self) -> RawSnapshot {
        self.collect(DataField::iter().collect::<Vec<_>>().as_slice())
            .await
    }

    /// Collects only the specified fields from the miner.
    ///
    /// This method sends only the minimum required set of API commands.
    pub async fn collect(&mut self, fields: &[DataField]) -> RawSnapshot {
        let required_commands = self.get_required_commands(fields);

        for command in required_commands {
            if let Ok(response) = self.api_client.send_command(command).await {
                self.cache.insert(command.to_string(), response);
            }
        }

        // Extract the data for each field using the cached responses.
        let mut snapshot = RawSnapshot::new();
        for &field in fields {
            if let Some(value) = self.extract_field(field) {
                snapshot.insert(field, value.clone());
            }
        }

        snapshot
    }

    /// Determines the unique set of API commands needed for the requested fields.
    fn get_required_commands(&self, fields: &[DataField]) -> HashSet<&'static str> {
        fields
            .iter()
            .flat_map(|&field| self.locations.locations(field))
            .map(|(command, _)| *command)
            .collect()
    }

    /// Attempts to extract the value for a specific field from the cached command responses.
    ///
    /// Uses the extractor function and key associated with the field for parsing.
    fn extract_field(&self, field: DataField) -> Option<&Value> {
        for (command, extractor) in self.locations.locations(field) {
            if let Some(response_data) = self.cache.get(*command) {
                if let Some(value) = (extractor.func)(response_data, extractor.key) {
                    return Some(value); // Return the first successful extraction.
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extractors_look_up_keys_and_pointers() {
        let data = json!({"power": 12.5, "nested": {"deep": true}});
        assert_eq!(get_by_key(&data, Some("power")), Some(&json!(12.5)));
        assert_eq!(get_by_key(&data, Some("missing")), None);
        assert_eq!(get_by_key(&data, None), None);
        assert_eq!(
            get_by_pointer(&data, Some("/nested/deep")),
            Some(&json!(true))
        );
    }

    #[test]
    fn stamp_records_collection_metadata() {
        let mut snapshot = RawSnapshot::new();
        snapshot.stamp("10.0.0.1".parse().unwrap());
        assert_eq!(
            snapshot.get(DataField::Ip),
            Some(&Value::from("10.0.0.1"))
        );
        assert!(snapshot.get(DataField::SchemaVersion).is_some());
        assert!(snapshot.get(DataField::Timestamp).is_some());
    }
}
