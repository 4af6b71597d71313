use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::account::Account;
use crate::account::validation::is_valid_bank_prefix;
use crate::registry::RemoteBank;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    pub bank: BankConfig,
    pub central_bank: CentralBankConfig,
    /// PostgreSQL connection URL; in-memory stores are used when absent
    #[serde(default)]
    pub postgres_url: Option<String>,
    /// HS256 secret shared with the identity service that issues tokens
    pub jwt_secret: String,
    /// Accounts opened in the in-memory ledger at startup (ignored with PostgreSQL)
    #[serde(default)]
    pub seed_accounts: Vec<Account>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Identity of the bank this process operates
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BankConfig {
    /// Three-character prefix carried by every local account number
    pub prefix: String,
    pub name: String,
}

/// How the central directory is reached
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryMode {
    #[default]
    Http,
    /// Serve `fixture_banks` instead of calling out (local development, demos)
    Fixture,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CentralBankConfig {
    #[serde(default)]
    pub mode: DirectoryMode,
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_directory_timeout_ms")]
    pub timeout_ms: u64,
    /// Background refresh period; 0 disables the worker (refresh on miss only)
    #[serde(default)]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub fixture_banks: Vec<RemoteBank>,
}

fn default_directory_timeout_ms() -> u64 {
    10_000
}

impl CentralBankConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config file: {}", config_path))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(content).context("Failed to parse config yaml")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !is_valid_bank_prefix(&self.bank.prefix) {
            bail!(
                "bank.prefix must be 3 alphanumeric characters, got '{}'",
                self.bank.prefix
            );
        }
        if self.central_bank.timeout_ms == 0 {
            bail!("central_bank.timeout_ms must be greater than zero");
        }
        if self.central_bank.mode == DirectoryMode::Http && self.central_bank.url.is_empty() {
            bail!("central_bank.url is required in http mode");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
log_level: "info"
log_dir: "./logs"
log_file: "pank.log"
use_json: false
rotation: "daily"
gateway:
  host: "0.0.0.0"
  port: 9001
bank:
  prefix: "111"
  name: "Local Pank"
central_bank:
  url: "http://central.example"
  api_key: "secret"
jwt_secret: "dev-secret"
"#;

    #[test]
    fn test_config_deserialize_with_defaults() {
        let config = AppConfig::from_yaml(YAML).unwrap();

        assert_eq!(config.bank.prefix, "111");
        assert_eq!(config.gateway.port, 9001);
        assert_eq!(config.central_bank.mode, DirectoryMode::Http);
        assert_eq!(config.central_bank.timeout(), Duration::from_secs(10));
        assert!(config.central_bank.refresh_interval().is_none());
        assert!(config.postgres_url.is_none());
        assert!(config.seed_accounts.is_empty());
    }

    #[test]
    fn test_fixture_mode_with_banks() {
        let yaml = YAML.replace(
            "  api_key: \"secret\"\n",
            r#"  api_key: "secret"
  mode: "fixture"
  refresh_interval_secs: 300
  fixture_banks:
    - name: "fooBank"
      transactionUrl: "http://foobank.example/transactions/b2b"
      apiKey: "94d21b14"
      bankPrefix: "755"
      owners: "Henno"
      jwksUrl: "http://foobank.example/jwks.json"
"#,
        );
        let config = AppConfig::from_yaml(&yaml).unwrap();

        assert_eq!(config.central_bank.mode, DirectoryMode::Fixture);
        assert_eq!(config.central_bank.fixture_banks.len(), 1);
        assert_eq!(config.central_bank.fixture_banks[0].bank_prefix, "755");
        assert_eq!(
            config.central_bank.refresh_interval(),
            Some(Duration::from_secs(300))
        );
    }

    #[test]
    fn test_rejects_bad_bank_prefix() {
        let yaml = YAML.replace("prefix: \"111\"", "prefix: \"11\"");
        let err = AppConfig::from_yaml(&yaml).unwrap_err();
        assert!(format!("{:#}", err).contains("bank.prefix"));
    }
}
