use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for discovery and normalization.
///
/// Only [`Error::InvalidAddressSpec`] and hard transport errors from a
/// single-target probe ever reach callers; everything else is absorbed at
/// the per-address boundary during a scan.
#[derive(Debug, Error)]
pub enum Error {
    /// The scan target description could not be parsed. Raised when the
    /// factory is configured, never during enumeration.
    #[error("invalid address spec: {0}")]
    InvalidAddressSpec(String),
    /// The device could not be reached at the transport level.
    #[error("device unreachable: {0}")]
    Unreachable(String),
    /// The device answered, but not in a shape we understand.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// A raw snapshot failed normalization into [`MinerData`].
    ///
    /// [`MinerData`]: crate::data::miner::MinerData
    #[error("validation failed at `{field}`: {reason}")]
    Validation { field: String, reason: String },
    /// The per-address probe deadline expired.
    #[error("request timed out")]
    Timeout,
}

impl Error {
    pub(crate) fn invalid_spec(msg: impl Into<String>) -> Self {
        Error::InvalidAddressSpec(msg.into())
    }

    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// The field path a validation error points at, if this is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}
