use measurements::Power;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::ops::Div;

/// Scale of a hashrate value, indexed by its power-of-1000 exponent.
///
/// Serializes as the integer exponent index (`Hash` = 0, `TeraHash` = 4, ...)
/// so external consumers never have to parse unit symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashRateUnit {
    Hash,
    KiloHash,
    MegaHash,
    GigaHash,
    TeraHash,
    PetaHash,
    ExaHash,
    ZettaHash,
    YottaHash,
}

impl HashRateUnit {
    pub fn code(&self) -> u8 {
        match self {
            HashRateUnit::Hash => 0,
            HashRateUnit::KiloHash => 1,
            HashRateUnit::MegaHash => 2,
            HashRateUnit::GigaHash => 3,
            HashRateUnit::TeraHash => 4,
            HashRateUnit::PetaHash => 5,
            HashRateUnit::ExaHash => 6,
            HashRateUnit::ZettaHash => 7,
            HashRateUnit::YottaHash => 8,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(HashRateUnit::Hash),
            1 => Some(HashRateUnit::KiloHash),
            2 => Some(HashRateUnit::MegaHash),
            3 => Some(HashRateUnit::GigaHash),
            4 => Some(HashRateUnit::TeraHash),
            5 => Some(HashRateUnit::PetaHash),
            6 => Some(HashRateUnit::ExaHash),
            7 => Some(HashRateUnit::ZettaHash),
            8 => Some(HashRateUnit::YottaHash),
            _ => None,
        }
    }

    /// Parse a unit symbol as devices report it, e.g. `"TH/s"`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.trim().to_ascii_uppercase().as_str() {
            "H/S" => Some(HashRateUnit::Hash),
            "KH/S" => Some(HashRateUnit::KiloHash),
            "MH/S" => Some(HashRateUnit::MegaHash),
            "GH/S" => Some(HashRateUnit::GigaHash),
            "TH/S" => Some(HashRateUnit::TeraHash),
            "PH/S" => Some(HashRateUnit::PetaHash),
            "EH/S" => Some(HashRateUnit::ExaHash),
            "ZH/S" => Some(HashRateUnit::ZettaHash),
            "YH/S" => Some(HashRateUnit::YottaHash),
            _ => None,
        }
    }

    fn to_multiplier(self) -> f64 {
        10f64.powi(3 * self.code() as i32)
    }
}

impl Display for HashRateUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HashRateUnit::Hash => write!(f, "H/s"),
            HashRateUnit::KiloHash => write!(f, "KH/s"),
            HashRateUnit::MegaHash => write!(f, "MH/s"),
            HashRateUnit::GigaHash => write!(f, "GH/s"),
            HashRateUnit::TeraHash => write!(f, "TH/s"),
            HashRateUnit::PetaHash => write!(f, "PH/s"),
            HashRateUnit::ExaHash => write!(f, "EH/s"),
            HashRateUnit::ZettaHash => write!(f, "ZH/s"),
            HashRateUnit::YottaHash => write!(f, "YH/s"),
        }
    }
}

impl Serialize for HashRateUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for HashRateUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        HashRateUnit::from_code(code)
            .ok_or_else(|| de::Error::custom(format!("unknown hashrate unit code {code}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashRate {
    /// The current amount of hashes being computed
    pub value: f64,
    /// The unit of the hashes in value
    pub unit: HashRateUnit,
    /// The algorithm of the computed hashes
    pub algo: String,
}

impl HashRate {
    /// Rescale this hashrate to a different unit.
    ///
    /// Comparisons across hashrates are only meaningful after rescaling both
    /// sides to the same unit; nothing normalizes them implicitly.
    pub fn as_unit(self, unit: HashRateUnit) -> Self {
        let base = self.value * self.unit.to_multiplier();

        Self {
            value: base / unit.to_multiplier(),
            unit,
            algo: self.algo,
        }
    }
}

impl Display for HashRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Numeric view of the hashrate, in its own unit's scale.
impl From<HashRate> for f64 {
    fn from(hash_rate: HashRate) -> f64 {
        hash_rate.value
    }
}

/// Efficiency in W/TH/s (J/TH), independent of the hashrate's unit.
impl Div<HashRate> for Power {
    type Output = f64;

    fn div(self, hash_rate: HashRate) -> Self::Output {
        self.as_watts() / hash_rate.as_unit(HashRateUnit::TeraHash).value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unit_codes_are_exponent_indexed() {
        assert_eq!(HashRateUnit::Hash.code(), 0);
        assert_eq!(HashRateUnit::TeraHash.code(), 4);
        assert_eq!(HashRateUnit::from_code(4), Some(HashRateUnit::TeraHash));
        assert_eq!(HashRateUnit::from_code(9), None);
    }

    #[test]
    fn serializes_unit_as_integer_code() {
        let hashrate = HashRate {
            value: 1.5,
            unit: HashRateUnit::TeraHash,
            algo: "SHA256".to_string(),
        };
        let serialized = serde_json::to_value(&hashrate).unwrap();
        assert_eq!(
            serialized,
            json!({"value": 1.5, "unit": 4, "algo": "SHA256"})
        );

        let roundtrip: HashRate = serde_json::from_value(serialized).unwrap();
        assert_eq!(roundtrip, hashrate);
    }

    #[test]
    fn rescales_between_units() {
        let hashrate = HashRate {
            value: 1.5,
            unit: HashRateUnit::TeraHash,
            algo: "SHA256".to_string(),
        };
        let in_giga = hashrate.as_unit(HashRateUnit::GigaHash);
        assert_eq!(in_giga.value, 1500.0);
        assert_eq!(in_giga.unit, HashRateUnit::GigaHash);
    }

    #[test]
    fn efficiency_is_unit_independent() {
        let th = HashRate {
            value: 100.0,
            unit: HashRateUnit::TeraHash,
            algo: "SHA256".to_string(),
        };
        let gh = th.clone().as_unit(HashRateUnit::GigaHash);
        let power = Power::from_watts(3400.0);
        assert_eq!(power / th, 34.0);
        assert_eq!(power / gh, 34.0);
    }

    #[test]
    fn parses_unit_symbols() {
        assert_eq!(
            HashRateUnit::from_symbol("TH/s"),
            Some(HashRateUnit::TeraHash)
        );
        assert_eq!(
            HashRateUnit::from_symbol("mh/s"),
            Some(HashRateUnit::MegaHash)
        );
        assert_eq!(HashRateUnit::from_symbol("hashes"), None);
    }
}
