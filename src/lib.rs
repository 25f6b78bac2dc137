// lib.rs - Bitcoin Collider Library

pub mod balance;
pub mod config;
pub mod control;
pub mod hunt;
pub mod memory;
pub mod notifications;
pub mod output;
pub mod stats;
pub mod targets;
pub mod wallet;

// Re-exports for convenience
pub use balance::{BalanceOracle, BalanceRecord};
pub use config::Config;
pub use control::{RunState, StateCell};
pub use hunt::{HuntOutcome, Hunter, StepOutcome};
pub use notifications::Notifier;
pub use output::ResultSink;
pub use stats::Statistics;
pub use targets::TargetSet;
pub use wallet::{KeyGenerator, KeyPair};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum ColliderError {
        #[error("Configuration error: {0}")]
        Config(String),

        #[error("Target list error: {0}")]
        Targets(String),

        #[error("Key generation error: {0}")]
        Wallet(String),

        #[error("Balance lookup error: {0}")]
        Balance(String),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("JSON error: {0}")]
        Json(#[from] serde_json::Error),

        #[error("Network error: {0}")]
        Network(#[from] reqwest::Error),
    }

    pub type Result<T> = std::result::Result<T, ColliderError>;
}

/// Utilities module
pub mod utils {
    use crate::balance::SATOSHIS_PER_BTC;

    /// Render a satoshi amount as a decimal BTC string.
    ///
    /// Shortest decimal form: 250_000_000 sats prints as "2.5",
    /// not "2.50000000".
    pub fn format_btc(satoshis: u64) -> String {
        format!("{}", satoshis as f64 / SATOSHIS_PER_BTC)
    }

    /// Format number with thousands separator
    pub fn format_number(n: u64) -> String {
        let s = n.to_string();
        let mut result = String::new();
        for (i, c) in s.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                result.push(',');
            }
            result.push(c);
        }
        result.chars().rev().collect()
    }
}
