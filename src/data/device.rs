use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum MinerMake {
    AntMiner,
    WhatsMiner,
    AvalonMiner,
    EPic,
    Braiins,
    BitAxe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum MinerFirmware {
    Stock,
    BraiinsOS,
    VNish,
    EPic,
    HiveOn,
    LuxOS,
    Marathon,
    MSKMiner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum HashAlgorithm {
    SHA256,
    Scrypt,
    X11,
    Blake2S256,
    Kadena,
    Unknown,
}

/// Physical component counts as the vendor declares them.
///
/// Every count is optional; plenty of firmwares report none of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MinerHardware {
    pub chips: Option<u16>,
    pub fans: Option<u8>,
    pub boards: Option<u8>,
}

/// Identity of the device: who made it, what it is, what it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub make: MinerMake,
    pub model: String,
    pub hardware: MinerHardware,
    pub firmware: MinerFirmware,
    pub algo: HashAlgorithm,
}

impl DeviceInfo {
    pub fn new(
        make: MinerMake,
        model: &str,
        hardware: MinerHardware,
        firmware: MinerFirmware,
        algo: HashAlgorithm,
    ) -> Self {
        DeviceInfo {
            make,
            model: model.to_string(),
            hardware,
            firmware,
            algo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_makes_case_insensitively() {
        assert_eq!(MinerMake::from_str("bitaxe").unwrap(), MinerMake::BitAxe);
        assert_eq!(
            MinerMake::from_str("WhatsMiner").unwrap(),
            MinerMake::WhatsMiner
        );
        assert!(MinerMake::from_str("toaster").is_err());
    }

    #[test]
    fn serializes_as_variant_names() {
        let info = DeviceInfo::new(
            MinerMake::BitAxe,
            "Gamma",
            MinerHardware::default(),
            MinerFirmware::Stock,
            HashAlgorithm::SHA256,
        );
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["make"], "BitAxe");
        assert_eq!(value["firmware"], "Stock");
        assert_eq!(value["algo"], "SHA256");
        assert_eq!(value["hardware"]["chips"], serde_json::Value::Null);
    }
}
