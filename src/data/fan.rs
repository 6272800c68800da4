use super::deserialize::deserialize_angular_velocity;
use super::serialize::serialize_angular_velocity;
use measurements::AngularVelocity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanData {
    /// The position or index of the fan as seen by the device
    /// Usually dependent on where the fan is connected to the control board
    pub position: i16,
    /// The RPM of the fan, unreported on some devices
    #[serde(
        serialize_with = "serialize_angular_velocity",
        deserialize_with = "deserialize_angular_velocity"
    )]
    pub rpm: Option<AngularVelocity>,
}
