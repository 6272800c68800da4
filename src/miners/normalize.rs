//! Normalization of raw device snapshots into validated [`MinerData`].
//!
//! Devices disagree about types as much as they disagree about protocols:
//! the same field arrives as a string from one vendor and a number from
//! another. The rules here are deliberately forgiving about representation
//! and strict about meaning:
//!
//! - string-typed fields accept anything with an obvious string form
//! - a value that is absent, JSON null, or uncoercible maps to "unknown",
//!   never to a zero or empty sentinel
//! - a malformed entry in a nested list (board, chip, fan, pool, message)
//!   is dropped with a warning; the record survives
//! - a missing or malformed required field fails the whole record with
//!   [`Error::Validation`] naming the offending field path

use crate::data::board::{BoardData, ChipData};
use crate::data::device::{DeviceInfo, HashAlgorithm, MinerFirmware, MinerHardware, MinerMake};
use crate::data::fan::FanData;
use crate::data::hashrate::{HashRate, HashRateUnit};
use crate::data::message::{MessageSeverity, MinerMessage};
use crate::data::miner::MinerData;
use crate::data::pool::{PoolData, PoolURL};
use crate::error::{Error, Result};
use crate::miners::snapshot::{DataField, RawSnapshot};
use macaddr::MacAddr;
use measurements::{AngularVelocity, Frequency, Power, Temperature, Voltage};
use serde_json::Value;
use std::collections::HashSet;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Validate a raw snapshot into the canonical record.
pub fn normalize(raw: &RawSnapshot) -> Result<MinerData> {
    let schema_version = required_string(raw, DataField::SchemaVersion)?;
    let timestamp = coerce_u64(required(raw, DataField::Timestamp)?)
        .ok_or_else(|| Error::validation("timestamp", "expected epoch seconds"))?;
    let ip_text = required_string(raw, DataField::Ip)?;
    let ip = IpAddr::from_str(ip_text.trim())
        .map_err(|_| Error::validation("ip", format!("`{ip_text}` is not an IP address")))?;
    let mac_text = required_string(raw, DataField::Mac)?;
    let mac = MacAddr::from_str(mac_text.trim())
        .map_err(|_| Error::validation("mac", format!("`{mac_text}` is not a MAC address")))?;
    let device_info = device_info(required(raw, DataField::DeviceInfo)?)?;
    let is_mining = coerce_bool(required(raw, DataField::IsMining)?)
        .ok_or_else(|| Error::validation("is_mining", "expected a boolean"))?;

    let hashrate = opt_parsed(raw, DataField::Hashrate, hash_rate);
    let expected_hashrate = opt_parsed(raw, DataField::ExpectedHashrate, hash_rate);
    let wattage = opt_parsed(raw, DataField::Wattage, |v| coerce_f64(v).map(Power::from_watts));
    let wattage_limit = opt_parsed(raw, DataField::WattageLimit, |v| {
        coerce_f64(v).map(Power::from_watts)
    });

    // Prefer the device's own efficiency figure; derive it only when the
    // device reports power and hashrate but not the quotient.
    let efficiency = opt_parsed(raw, DataField::Efficiency, coerce_f64).or_else(|| {
        match (&hashrate, &wattage) {
            (Some(hr), Some(w)) if hr.value > 0.0 => Some(*w / hr.clone()),
            _ => None,
        }
    });

    Ok(MinerData {
        schema_version,
        timestamp,
        ip,
        mac,
        device_info,
        serial_number: opt_parsed(raw, DataField::SerialNumber, coerce_string),
        hostname: opt_parsed(raw, DataField::Hostname, coerce_string),
        api_version: opt_parsed(raw, DataField::ApiVersion, coerce_string),
        firmware_version: opt_parsed(raw, DataField::FirmwareVersion, coerce_string),
        control_board_version: opt_parsed(raw, DataField::ControlBoardVersion, coerce_string),
        expected_hashboards: opt_parsed(raw, DataField::ExpectedHashboards, coerce_u8),
        hashboards: opt_parsed(raw, DataField::Hashboards, boards).unwrap_or_default(),
        hashrate,
        expected_hashrate,
        expected_chips: opt_parsed(raw, DataField::ExpectedChips, coerce_u16),
        total_chips: opt_parsed(raw, DataField::TotalChips, coerce_u16),
        expected_fans: opt_parsed(raw, DataField::ExpectedFans, coerce_u8),
        fans: opt_parsed(raw, DataField::Fans, fans).unwrap_or_default(),
        psu_fans: opt_parsed(raw, DataField::PsuFans, fans).unwrap_or_default(),
        average_temperature: opt_parsed(raw, DataField::AverageTemperature, |v| {
            coerce_f64(v).map(Temperature::from_celsius)
        }),
        fluid_temperature: opt_parsed(raw, DataField::FluidTemperature, |v| {
            coerce_f64(v).map(Temperature::from_celsius)
        }),
        wattage,
        wattage_limit,
        efficiency,
        light_flashing: opt_parsed(raw, DataField::LightFlashing, coerce_bool),
        messages: opt_parsed(raw, DataField::Messages, messages).unwrap_or_default(),
        uptime: opt_parsed(raw, DataField::Uptime, uptime),
        is_mining,
        pools: opt_parsed(raw, DataField::Pools, pools).unwrap_or_default(),
    })
}

fn present(raw: &RawSnapshot, field: DataField) -> Option<&Value> {
    raw.get(field).filter(|v| !v.is_null())
}

fn required(raw: &RawSnapshot, field: DataField) -> Result<&Value> {
    present(raw, field).ok_or_else(|| Error::validation(field.path(), "missing required field"))
}

fn required_string(raw: &RawSnapshot, field: DataField) -> Result<String> {
    coerce_string(required(raw, field)?)
        .ok_or_else(|| Error::validation(field.path(), "expected a string-like value"))
}

/// An optional field that is present but unusable is treated as unreported.
fn opt_parsed<T>(
    raw: &RawSnapshot,
    field: DataField,
    parse: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = present(raw, field)?;
    let parsed = parse(value);
    if parsed.is_none() {
        warn!(field = field.path(), %value, "unusable value dropped from snapshot");
    }
    parsed
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_u16(value: &Value) -> Option<u16> {
    coerce_u64(value).and_then(|n| u16::try_from(n).ok())
}

fn coerce_u8(value: &Value) -> Option<u8> {
    coerce_u64(value).and_then(|n| u8::try_from(n).ok())
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn device_info(value: &Value) -> Result<DeviceInfo> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::validation("device_info", "expected an object"))?;

    let entry = |key: &str| obj.get(key).filter(|v| !v.is_null());

    let make_text = entry("make")
        .and_then(coerce_string)
        .ok_or_else(|| Error::validation("device_info.make", "missing required field"))?;
    let make = MinerMake::from_str(make_text.trim())
        .map_err(|_| Error::validation("device_info.make", format!("unknown make `{make_text}`")))?;

    let model = entry("model")
        .and_then(coerce_string)
        .ok_or_else(|| Error::validation("device_info.model", "missing required field"))?;

    let firmware_text = entry("firmware")
        .and_then(coerce_string)
        .ok_or_else(|| Error::validation("device_info.firmware", "missing required field"))?;
    let firmware = MinerFirmware::from_str(firmware_text.trim()).map_err(|_| {
        Error::validation(
            "device_info.firmware",
            format!("unknown firmware `{firmware_text}`"),
        )
    })?;

    // Unknown algorithm strings map to HashAlgorithm::Unknown.
    let algo = entry("algo")
        .and_then(coerce_string)
        .map(|text| HashAlgorithm::from_str(text.trim()).unwrap_or(HashAlgorithm::Unknown))
        .ok_or_else(|| Error::validation("device_info.algo", "missing required field"))?;

    let hardware = match entry("hardware") {
        Some(hw) => {
            let hw = hw
                .as_object()
                .ok_or_else(|| Error::validation("device_info.hardware", "expected an object"))?;
            let field = |key: &str| hw.get(key).filter(|v| !v.is_null());
            MinerHardware {
                chips: field("chips").and_then(coerce_u16),
                fans: field("fans").and_then(coerce_u8),
                boards: field("boards").and_then(coerce_u8),
            }
        }
        None => MinerHardware::default(),
    };

    Ok(DeviceInfo {
        make,
        model,
        hardware,
        firmware,
        algo,
    })
}

fn hash_rate(value: &Value) -> Option<HashRate> {
    let obj = value.as_object()?;
    let entry = |key: &str| obj.get(key).filter(|v| !v.is_null());

    let rate = entry("value").and_then(coerce_f64).filter(|v| *v >= 0.0)?;
    let unit = match entry("unit")? {
        Value::Number(n) => n
            .as_u64()
            .and_then(|code| u8::try_from(code).ok())
            .and_then(HashRateUnit::from_code)?,
        Value::String(s) => HashRateUnit::from_symbol(s)?,
        _ => return None,
    };
    let algo = entry("algo")
        .and_then(coerce_string)
        .unwrap_or_else(|| "SHA256".to_string());

    Some(HashRate {
        value: rate,
        unit,
        algo,
    })
}

fn chip(value: &Value) -> Option<ChipData> {
    let obj = value.as_object()?;
    let entry = |key: &str| obj.get(key).filter(|v| !v.is_null());

    Some(ChipData {
        position: entry("position").and_then(coerce_u16)?,
        hashrate: entry("hashrate").and_then(hash_rate),
        temperature: entry("temperature")
            .and_then(coerce_f64)
            .map(Temperature::from_celsius),
        voltage: entry("voltage").and_then(coerce_f64).map(Voltage::from_volts),
        frequency: entry("frequency")
            .and_then(coerce_f64)
            .map(Frequency::from_megahertz),
        tuned: entry("tuned").and_then(coerce_bool),
        working: entry("working").and_then(coerce_bool),
    })
}

fn board(value: &Value) -> Option<BoardData> {
    let obj = value.as_object()?;
    let entry = |key: &str| obj.get(key).filter(|v| !v.is_null());

    let chips = match entry("chips") {
        Some(Value::Array(entries)) => {
            let mut seen = HashSet::new();
            let mut chips = Vec::with_capacity(entries.len());
            for value in entries {
                match chip(value) {
                    Some(chip) if seen.insert(chip.position) => chips.push(chip),
                    Some(chip) => {
                        warn!(position = chip.position, "duplicate chip position dropped")
                    }
                    None => warn!(%value, "malformed chip entry dropped"),
                }
            }
            chips
        }
        _ => Vec::new(),
    };

    Some(BoardData {
        position: entry("position").and_then(coerce_u8)?,
        hashrate: entry("hashrate").and_then(hash_rate),
        expected_hashrate: entry("expected_hashrate").and_then(hash_rate),
        board_temperature: entry("board_temperature")
            .and_then(coerce_f64)
            .map(Temperature::from_celsius),
        intake_temperature: entry("intake_temperature")
            .and_then(coerce_f64)
            .map(Temperature::from_celsius),
        outlet_temperature: entry("outlet_temperature")
            .and_then(coerce_f64)
            .map(Temperature::from_celsius),
        expected_chips: entry("expected_chips").and_then(coerce_u16),
        working_chips: entry("working_chips").and_then(coerce_u16),
        serial_number: entry("serial_number").and_then(coerce_string),
        chips,
        voltage: entry("voltage").and_then(coerce_f64).map(Voltage::from_volts),
        frequency: entry("frequency")
            .and_then(coerce_f64)
            .map(Frequency::from_megahertz),
        tuned: entry("tuned").and_then(coerce_bool),
        active: entry("active").and_then(coerce_bool),
    })
}

fn boards(value: &Value) -> Option<Vec<BoardData>> {
    let entries = value.as_array()?;
    let mut seen = HashSet::new();
    let mut boards = Vec::with_capacity(entries.len());
    for value in entries {
        match board(value) {
            Some(board) if seen.insert(board.position) => boards.push(board),
            Some(board) => warn!(position = board.position, "duplicate board position dropped"),
            None => warn!(%value, "malformed board entry dropped"),
        }
    }
    Some(boards)
}

/// Fans arrive either as objects or, on single-fan devices, as a bare
/// rpm number per slot.
fn fans(value: &Value) -> Option<Vec<FanData>> {
    let entries = value.as_array()?;
    let mut seen = HashSet::new();
    let mut fans = Vec::with_capacity(entries.len());
    for (index, value) in entries.iter().enumerate() {
        let parsed = match value {
            Value::Object(obj) => {
                let entry = |key: &str| obj.get(key).filter(|v| !v.is_null());
                let position = match entry("position") {
                    Some(p) => coerce_f64(p).map(|p| p as i16),
                    None => Some(index as i16),
                };
                position.map(|position| FanData {
                    position,
                    rpm: entry("rpm").and_then(coerce_f64).map(AngularVelocity::from_rpm),
                })
            }
            _ => coerce_f64(value).map(|rpm| FanData {
                position: index as i16,
                rpm: Some(AngularVelocity::from_rpm(rpm)),
            }),
        };
        match parsed {
            Some(fan) if seen.insert(fan.position) => fans.push(fan),
            Some(fan) => warn!(position = fan.position, "duplicate fan position dropped"),
            None => warn!(%value, "malformed fan entry dropped"),
        }
    }
    Some(fans)
}

fn pool(value: &Value) -> Option<PoolData> {
    let obj = value.as_object()?;
    let entry = |key: &str| obj.get(key).filter(|v| !v.is_null());

    // An absent URL maps to None; a present but unparseable one fails
    // the entry.
    let url = match entry("url") {
        Some(value) => Some(PoolURL::from_str(coerce_string(value)?.trim()).ok()?),
        None => None,
    };

    Some(PoolData {
        position: entry("position").and_then(coerce_u16),
        url,
        accepted_shares: entry("accepted_shares").and_then(coerce_u64),
        rejected_shares: entry("rejected_shares").and_then(coerce_u64),
        active: entry("active").and_then(coerce_bool),
        alive: entry("alive").and_then(coerce_bool),
        user: entry("user").and_then(coerce_string),
    })
}

fn pools(value: &Value) -> Option<Vec<PoolData>> {
    let entries = value.as_array()?;
    let mut pools = Vec::with_capacity(entries.len());
    for value in entries {
        match pool(value) {
            Some(pool) => pools.push(pool),
            None => warn!(%value, "malformed pool entry dropped"),
        }
    }
    Some(pools)
}

fn message(value: &Value) -> Option<MinerMessage> {
    let obj = value.as_object()?;
    let entry = |key: &str| obj.get(key).filter(|v| !v.is_null());

    let timestamp = entry("timestamp")
        .and_then(coerce_u64)
        .and_then(|t| u32::try_from(t).ok())?;
    let text = entry("message").and_then(coerce_string)?;
    let code = entry("code").and_then(coerce_u64).unwrap_or(0);
    let severity = match entry("severity") {
        Some(value) => MessageSeverity::from_str(coerce_string(value)?.trim()).ok()?,
        None => MessageSeverity::Info,
    };

    Some(MinerMessage::new(timestamp, code, text, severity))
}

fn messages(value: &Value) -> Option<Vec<MinerMessage>> {
    let entries = value.as_array()?;
    let mut messages = Vec::with_capacity(entries.len());
    for value in entries {
        match message(value) {
            Some(message) => messages.push(message),
            None => warn!(%value, "malformed message entry dropped"),
        }
    }
    Some(messages)
}

fn uptime(value: &Value) -> Option<Duration> {
    coerce_f64(value)
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}
