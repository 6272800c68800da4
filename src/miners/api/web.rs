use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::miners::api::ApiClient;

/// HTTP JSON API client for web-managed miners (AxeOS/ESPMiner-style
/// control boards).
pub struct WebApiClient {
    client: Client,
    pub ip: String,
    port: u16,
    timeout: Duration,
    retries: u32,
}

impl WebApiClient {
    pub fn new(ip: String, port: u16) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            ip,
            port,
            timeout: Duration::from_secs(5),
            retries: 1,
        }
    }

    /// Set the timeout for API requests
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of retries for failed requests
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Send a command to the miner, retrying transient failures.
    pub async fn send_command<T: DeserializeOwned>(
        &self,
        command: &str,
        parameters: Option<Value>,
        method: Method,
    ) -> Result<T> {
        let url = format!("http://{}:{}/api/{}", self.ip, self.port, command);

        let mut last_error = Error::Unreachable(format!("no response from {url}"));
        for _attempt in 0..=self.retries {
            match self.execute_request(&url, &method, parameters.clone()).await {
                Ok(response) if response.status().is_success() => {
                    match response.json::<T>().await {
                        Ok(json_data) => return Ok(json_data),
                        Err(e) => last_error = Error::Protocol(format!("bad JSON body: {e}")),
                    }
                }
                Ok(response) => {
                    last_error =
                        Error::Protocol(format!("HTTP {} from {url}", response.status().as_u16()));
                }
                Err(e) => last_error = e,
            }
        }

        Err(last_error)
    }

    /// Execute the actual HTTP request
    async fn execute_request(
        &self,
        url: &str,
        method: &Method,
        parameters: Option<Value>,
    ) -> Result<Response> {
        let request_builder = if *method == Method::GET {
            self.client.get(url)
        } else if *method == Method::POST {
            let mut builder = self.client.post(url);
            if let Some(params) = parameters {
                builder = builder.json(&params);
            }
            builder
        } else if *method == Method::PATCH {
            let mut builder = self.client.patch(url);
            if let Some(params) = parameters {
                builder = builder.json(&params);
            }
            builder
        } else {
            return Err(Error::Protocol(format!(
                "unsupported method {method} for {url}"
            )));
        };

        let request = request_builder
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::Protocol(format!("request build failed: {e}")))?;

        let response = timeout(self.timeout, self.client.execute(request))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(|e| Error::Unreachable(e.to_string()))?;

        Ok(response)
    }

    /// Get system information
    pub async fn system_info(&self) -> Result<Value> {
        self.send_command("system/info", None, Method::GET).await
    }

    /// Get ASIC information
    pub async fn asic_info(&self) -> Result<Value> {
        self.send_command("system/asic", None, Method::GET).await
    }

    /// Restart the system
    pub async fn restart(&self) -> Result<Value> {
        self.send_command("system/restart", None, Method::POST)
            .await
    }

    /// Update system settings
    pub async fn update_settings(&self, config: Value) -> Result<Value> {
        self.send_command("system", Some(config), Method::PATCH)
            .await
    }
}

#[async_trait]
impl ApiClient for WebApiClient {
    async fn send_command(&self, command: &'static str) -> Result<Value> {
        WebApiClient::send_command(self, command, None, Method::GET).await
    }
}
