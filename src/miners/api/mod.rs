use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub mod web;

/// Transport-agnostic command channel to a device API.
///
/// A command is a backend-defined route or RPC name; the response is the
/// raw JSON the device produced.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn send_command(&self, command: &'static str) -> Result<Value>;
}
