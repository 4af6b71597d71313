//! Central directory client
//!
//! The central bank publishes the list of member banks at `GET {url}/banks`.
//! [`CentralDirectory`] is the seam the refresher calls through; which
//! implementation is used is decided by `central_bank.mode`.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use super::types::RemoteBank;
use crate::config::{CentralBankConfig, DirectoryMode};

/// Errors talking to the central directory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Directory request failed: {0}")]
    Transport(String),

    #[error("Directory responded with HTTP {0}")]
    Status(u16),

    #[error("Directory response could not be decoded: {0}")]
    Decode(String),
}

/// Source of remote bank entries
///
/// Entries are returned raw; validation happens when the snapshot is built so
/// one bad entry never fails the whole fetch.
#[async_trait]
pub trait CentralDirectory: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_banks(&self) -> Result<Vec<serde_json::Value>, DirectoryError>;
}

/// HTTP client for the real central bank
pub struct HttpCentralDirectory {
    client: reqwest::Client,
    banks_url: String,
    api_key: String,
}

impl HttpCentralDirectory {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| DirectoryError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            banks_url: format!("{}/banks", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl CentralDirectory for HttpCentralDirectory {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_banks(&self) -> Result<Vec<serde_json::Value>, DirectoryError> {
        debug!(url = %self.banks_url, "Fetching bank list from central directory");

        let response = self
            .client
            .get(&self.banks_url)
            .header("api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status(status.as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DirectoryError::Decode(e.to_string()))?;

        match body {
            serde_json::Value::Array(entries) => Ok(entries),
            other => Err(DirectoryError::Decode(format!(
                "expected a JSON array, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Fixed bank list from configuration (development and offline demos)
pub struct FixtureDirectory {
    banks: Vec<RemoteBank>,
}

impl FixtureDirectory {
    pub fn new(banks: Vec<RemoteBank>) -> Self {
        Self { banks }
    }
}

#[async_trait]
impl CentralDirectory for FixtureDirectory {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn fetch_banks(&self) -> Result<Vec<serde_json::Value>, DirectoryError> {
        self.banks
            .iter()
            .map(|bank| serde_json::to_value(bank).map_err(|e| DirectoryError::Decode(e.to_string())))
            .collect()
    }
}

/// Build the directory client selected by `central_bank.mode`
pub fn from_config(config: &CentralBankConfig) -> Result<Arc<dyn CentralDirectory>, DirectoryError> {
    let directory: Arc<dyn CentralDirectory> = match config.mode {
        DirectoryMode::Http => Arc::new(HttpCentralDirectory::new(&config.url, &config.api_key)?),
        DirectoryMode::Fixture => Arc::new(FixtureDirectory::new(config.fixture_banks.clone())),
    };
    info!(mode = directory.name(), "Central directory client configured");
    Ok(directory)
}
