use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;

pub const SATOSHIS_PER_BTC: f64 = 100_000_000.0;

/// Total-received and current-balance figures for one address, in satoshis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceRecord {
    pub total_received: u64,
    pub final_balance: u64,
}

impl BalanceRecord {
    pub const ZERO: BalanceRecord = BalanceRecord {
        total_received: 0,
        final_balance: 0,
    };

    pub fn has_balance(&self) -> bool {
        self.final_balance > 0
    }

    pub fn total_received_btc(&self) -> f64 {
        self.total_received as f64 / SATOSHIS_PER_BTC
    }

    pub fn final_balance_btc(&self) -> f64 {
        self.final_balance as f64 / SATOSHIS_PER_BTC
    }
}

/// Balance lookup against a templated HTTP endpoint.
///
/// A single lookup is bounded by the configured timeout and fails open: any
/// failure degrades to `BalanceRecord::ZERO` so a flaky endpoint can never
/// wedge the generation loop.
pub struct BalanceOracle {
    client: Client,
    url_template: String,
}

impl BalanceOracle {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .user_agent(concat!("btc-collider/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url_template: config.api.url_template.clone(),
        })
    }

    /// Fetch the balance figures for one address.
    ///
    /// Never propagates an error. Timeouts, non-2xx statuses, and malformed
    /// payloads are logged and classified as "no balance found"; the next
    /// iteration retries-by-replacement with a fresh address.
    pub async fn fetch(&self, address: &str) -> BalanceRecord {
        match self.try_fetch(address).await {
            Ok(record) => {
                debug!(
                    "Balance for {}: received {} sat, final {} sat",
                    address, record.total_received, record.final_balance
                );
                record
            }
            Err(e) => {
                warn!("Balance lookup failed for {}: {:#}", address, e);
                BalanceRecord::ZERO
            }
        }
    }

    async fn try_fetch(&self, address: &str) -> Result<BalanceRecord> {
        #[derive(Deserialize)]
        struct AddressInfo {
            total_received: u64,
            final_balance: u64,
        }

        let url = self.url_template.replace("{}", address);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Balance request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Balance endpoint returned {}", response.status());
        }

        let info: AddressInfo = response
            .json()
            .await
            .context("Malformed balance payload")?;

        Ok(BalanceRecord {
            total_received: info.total_received,
            final_balance: info.final_balance,
        })
    }
}
