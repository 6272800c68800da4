use crate::error::Error;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::Display;
use std::str::FromStr;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolScheme {
    StratumV1,
    StratumV1SSL,
    StratumV2,
}

impl FromStr for PoolScheme {
    type Err = Error;

    fn from_str(scheme: &str) -> Result<Self, Self::Err> {
        match scheme {
            "stratum+tcp" => Ok(PoolScheme::StratumV1),
            "stratum+ssl" => Ok(PoolScheme::StratumV1SSL),
            "stratum2+tcp" => Ok(PoolScheme::StratumV2),
            other => Err(Error::Protocol(format!("unknown pool scheme `{other}`"))),
        }
    }
}

impl Display for PoolScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolScheme::StratumV1 => write!(f, "stratum+tcp"),
            PoolScheme::StratumV1SSL => write!(f, "stratum+ssl"),
            PoolScheme::StratumV2 => write!(f, "stratum2+tcp"),
        }
    }
}

/// A stratum endpoint as configured on the device.
///
/// Serializes as its URL string. Bare `host:port` strings parse as
/// stratum+tcp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolURL {
    /// The scheme being used to connect to this pool
    pub scheme: PoolScheme,
    /// The public host of the pool
    pub host: String,
    /// The port being used to connect to the pool
    pub port: u16,
    /// The public key for this pool
    /// Only used for Stratum V2 pools
    pub pubkey: Option<String>,
}

impl FromStr for PoolURL {
    type Err = Error;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let stratum_url = if url.starts_with("stratum") {
            url.to_string()
        } else {
            format!("stratum+tcp://{url}")
        };
        let parsed = Url::parse(&stratum_url)
            .map_err(|e| Error::Protocol(format!("invalid pool url `{url}`: {e}")))?;
        let scheme = PoolScheme::from_str(parsed.scheme())?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::Protocol(format!("pool url `{url}` has no host")))?
            .to_string();
        let port = parsed.port().unwrap_or(80);
        let pubkey = match parsed.path() {
            "" | "/" => None,
            path => Some(path[1..].to_string()),
        };
        Ok(PoolURL {
            scheme,
            host,
            port,
            pubkey,
        })
    }
}

impl Display for PoolURL {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)?;
        if let Some(pubkey) = &self.pubkey {
            write!(f, "/{}", pubkey)?;
        }
        Ok(())
    }
}

impl Serialize for PoolURL {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PoolURL {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let url = String::deserialize(deserializer)?;
        PoolURL::from_str(&url).map_err(de::Error::custom)
    }
}

/// Pool status as the device reports it. Devices are unreliable about
/// this, so every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolData {
    pub position: Option<u16>,
    pub url: Option<PoolURL>,
    pub accepted_shares: Option<u64>,
    pub rejected_shares: Option<u64>,
    pub active: Option<bool>,
    pub alive: Option<bool>,
    pub user: Option<String>,
}
