use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hunt: HuntConfig,
    #[serde(default)]
    pub targets: TargetsConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuntConfig {
    /// Fixed period between iterations (ms)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Resident memory threshold for the reclamation hint (MB). 0 disables.
    #[serde(default = "default_memory_limit_mb")]
    pub memory_limit_mb: u64,

    /// Iterations between stats log lines
    #[serde(default = "default_stats_every")]
    pub stats_every: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetsConfig {
    /// Target address list, one address per line
    #[serde(default = "default_targets_file")]
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Balance endpoint; `{}` is replaced with the address
    #[serde(default = "default_url_template")]
    pub url_template: String,

    /// Hard timeout on a single balance lookup (s)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Every generated address/key pair
    #[serde(default = "default_addresses_file")]
    pub addresses_file: String,

    /// Addresses observed with a nonzero balance
    #[serde(default = "default_balance_file")]
    pub balance_file: String,

    /// Terminal success record on a target match
    #[serde(default = "default_success_file")]
    pub success_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Webhook URL for alerts (can be set via WEBHOOK_URL env var for security)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    /// Alert on target match
    #[serde(default = "default_alert_on_find")]
    pub alert_on_find: bool,
}

fn default_interval_ms() -> u64 {
    500
}

fn default_memory_limit_mb() -> u64 {
    500
}

fn default_stats_every() -> u64 {
    50
}

fn default_targets_file() -> String {
    "riches.txt".to_string()
}

fn default_url_template() -> String {
    "https://blockchain.info/address/{}?format=json".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_addresses_file() -> String {
    "list-addresses.txt".to_string()
}

fn default_balance_file() -> String {
    "addresses-with-balance.txt".to_string()
}

fn default_success_file() -> String {
    "Success.txt".to_string()
}

fn default_alert_on_find() -> bool {
    true
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    ///
    /// A missing file is not an error; defaults apply. A present but
    /// malformed file is fatal.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let content = fs::read_to_string(path)
                .context(format!("Failed to read config file: {}", path))?;

            toml::from_str(&content).context("Failed to parse TOML config")?
        } else {
            info!("Config file {} not found, using defaults", path);
            Config::default()
        };

        // Override sensitive values from environment variables (more secure)
        config.load_from_env();

        config.validate()?;

        Ok(config)
    }

    /// Load sensitive config from environment variables (overrides file config)
    fn load_from_env(&mut self) {
        // Webhook URL from environment variable (prevents credential leak in git)
        if let Ok(webhook) = std::env::var("WEBHOOK_URL") {
            if !webhook.is_empty() {
                self.notifications.webhook_url = Some(webhook);
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.hunt.interval_ms == 0 {
            anyhow::bail!("hunt.interval_ms must be >= 1");
        }
        if self.hunt.interval_ms > 3_600_000 {
            anyhow::bail!("hunt.interval_ms is too high (>{}ms)", 3_600_000);
        }
        if self.hunt.stats_every == 0 {
            anyhow::bail!("hunt.stats_every must be >= 1");
        }

        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be >= 1");
        }
        if self.api.timeout_secs > 300 {
            anyhow::bail!("api.timeout_secs is too high (>{}s)", 300);
        }
        if !self.api.url_template.contains("{}") {
            anyhow::bail!("api.url_template must contain the {{}} address placeholder");
        }

        if self.targets.file.is_empty() {
            anyhow::bail!("targets.file must not be empty");
        }

        for (name, path) in [
            ("output.addresses_file", &self.output.addresses_file),
            ("output.balance_file", &self.output.balance_file),
            ("output.success_file", &self.output.success_file),
        ] {
            if path.is_empty() {
                anyhow::bail!("{} must not be empty", name);
            }
        }

        Ok(())
    }

    /// Create default configuration
    pub fn default_toml() -> String {
        r#"
[hunt]
interval_ms = 500
memory_limit_mb = 500
stats_every = 50

[targets]
file = "riches.txt"

[api]
url_template = "https://blockchain.info/address/{}?format=json"
timeout_secs = 10

[output]
addresses_file = "list-addresses.txt"
balance_file = "addresses-with-balance.txt"
success_file = "Success.txt"

[notifications]
alert_on_find = true
"#
        .to_string()
    }

    /// Save default config to file
    pub fn save_default(path: &str) -> Result<()> {
        fs::write(path, Self::default_toml()).context("Failed to write default config")?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hunt: HuntConfig::default(),
            targets: TargetsConfig::default(),
            api: ApiConfig::default(),
            output: OutputConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl Default for HuntConfig {
    fn default() -> Self {
        HuntConfig {
            interval_ms: default_interval_ms(),
            memory_limit_mb: default_memory_limit_mb(),
            stats_every: default_stats_every(),
        }
    }
}

impl Default for TargetsConfig {
    fn default() -> Self {
        TargetsConfig {
            file: default_targets_file(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            url_template: default_url_template(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            addresses_file: default_addresses_file(),
            balance_file: default_balance_file(),
            success_file: default_success_file(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            webhook_url: None,
            alert_on_find: default_alert_on_find(),
        }
    }
}
