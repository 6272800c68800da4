//! Serde deserializers mirroring the helpers in [`super::serialize`].

use macaddr::MacAddr;
use measurements::{AngularVelocity, Frequency, Power, Temperature, Voltage};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// MAC addresses arrive over the wire as a colon-separated string.
pub(crate) fn deserialize_mac<'de, D>(deserializer: D) -> Result<MacAddr, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    MacAddr::from_str(&s).map_err(serde::de::Error::custom)
}

pub(crate) fn deserialize_angular_velocity<'de, D>(
    deserializer: D,
) -> Result<Option<AngularVelocity>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let rpm = Option::<f64>::deserialize(deserializer)?;
    Ok(rpm.map(AngularVelocity::from_rpm))
}

pub(crate) fn deserialize_temperature<'de, D>(
    deserializer: D,
) -> Result<Option<Temperature>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let celsius = Option::<f64>::deserialize(deserializer)?;
    Ok(celsius.map(Temperature::from_celsius))
}

pub(crate) fn deserialize_power<'de, D>(deserializer: D) -> Result<Option<Power>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let watts = Option::<f64>::deserialize(deserializer)?;
    Ok(watts.map(Power::from_watts))
}

pub(crate) fn deserialize_frequency<'de, D>(deserializer: D) -> Result<Option<Frequency>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let megahertz = Option::<f64>::deserialize(deserializer)?;
    Ok(megahertz.map(Frequency::from_megahertz))
}

pub(crate) fn deserialize_voltage<'de, D>(deserializer: D) -> Result<Option<Voltage>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let volts = Option::<f64>::deserialize(deserializer)?;
    Ok(volts.map(Voltage::from_volts))
}

pub(crate) fn deserialize_duration_secs<'de, D>(
    deserializer: D,
) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs = Option::<f64>::deserialize(deserializer)?;
    match secs {
        Some(s) if s.is_finite() && s >= 0.0 => Ok(Some(Duration::from_secs_f64(s))),
        Some(s) => Err(serde::de::Error::custom(format!(
            "uptime must be a non-negative number of seconds, got {s}"
        ))),
        None => Ok(None),
    }
}
