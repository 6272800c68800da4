//! Serde serializers for unit-bearing fields.
//!
//! Unreported values serialize as JSON null, never as a zero sentinel, so
//! consumers can tell "measured zero" apart from "not reported".

use macaddr::MacAddr;
use measurements::{AngularVelocity, Frequency, Power, Temperature, Voltage};
use std::time::Duration;

/// MAC addresses go over the wire as a colon-separated string.
pub(crate) fn serialize_mac<S>(mac: &MacAddr, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&mac.to_string())
}

pub(crate) fn serialize_angular_velocity<S>(
    v: &Option<AngularVelocity>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match v {
        Some(v) => serializer.serialize_f64(v.as_rpm()),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn serialize_temperature<S>(
    t: &Option<Temperature>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match t {
        Some(t) => serializer.serialize_f64(t.as_celsius()),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn serialize_power<S>(p: &Option<Power>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match p {
        Some(p) => serializer.serialize_f64(p.as_watts()),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn serialize_frequency<S>(
    f: &Option<Frequency>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match f {
        Some(f) => serializer.serialize_f64(f.as_megahertz()),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn serialize_voltage<S>(v: &Option<Voltage>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match v {
        Some(v) => serializer.serialize_f64(v.as_volts()),
        None => serializer.serialize_none(),
    }
}

/// Uptime goes over the wire as a floating-point count of seconds.
pub(crate) fn serialize_duration_secs<S>(
    d: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match d {
        Some(d) => serializer.serialize_f64(d.as_secs_f64()),
        None => serializer.serialize_none(),
    }
}
