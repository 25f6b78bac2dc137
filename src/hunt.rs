use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::balance::BalanceOracle;
use crate::config::Config;
use crate::control::{RunState, StateCell};
use crate::memory;
use crate::notifications::Notifier;
use crate::output::ResultSink;
use crate::stats::Statistics;
use crate::targets::TargetSet;
use crate::utils::{format_btc, format_number};
use crate::wallet::{KeyGenerator, KeyPair};

/// What one iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The generated address is in the target set. Terminal.
    Found {
        address: String,
        private_wif: String,
    },
    /// Generated, logged, balance-checked. The loop goes on.
    Checked { balance_sat: u64 },
}

/// How the whole hunt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuntOutcome {
    Found { address: String },
    Quit,
}

/// The generate-check-record loop.
///
/// One iteration per fixed period, strictly sequential; the only other
/// timeline is the control-input task, shared through the state cell.
pub struct Hunter {
    config: Config,
    generator: KeyGenerator,
    targets: TargetSet,
    oracle: BalanceOracle,
    sink: ResultSink,
    notifier: Notifier,
    stats: Arc<Statistics>,
    state: Arc<StateCell>,
}

impl Hunter {
    pub fn new(config: Config, targets: TargetSet, state: Arc<StateCell>) -> Result<Self> {
        let oracle = BalanceOracle::new(&config)?;
        let sink = ResultSink::new(&config.output);
        let notifier = Notifier::new(config.notifications.clone());

        Ok(Self {
            generator: KeyGenerator::new(),
            targets,
            oracle,
            sink,
            notifier,
            stats: Arc::new(Statistics::new()),
            state,
            config,
        })
    }

    pub fn stats(&self) -> Arc<Statistics> {
        self.stats.clone()
    }

    /// Run until a target match or a quit command.
    ///
    /// The period is measured from iteration end, so the cadence drifts by
    /// the balance lookup's latency. Pausing skips the work but keeps the
    /// same rhythm.
    pub async fn run(&self) -> Result<HuntOutcome> {
        let period = Duration::from_millis(self.config.hunt.interval_ms);

        while self.state.get() != RunState::Stopped {
            if self.state.get() == RunState::Paused {
                sleep(period).await;
                continue;
            }

            match self.step().await? {
                StepOutcome::Found {
                    address,
                    private_wif,
                } => {
                    ring_bell();
                    info!(">> Success: {}", address);
                    self.notifier.notify_match(&address, &private_wif).await;
                    return Ok(HuntOutcome::Found { address });
                }
                StepOutcome::Checked { .. } => {}
            }

            let generated = self.stats.generated();
            if generated % self.config.hunt.stats_every == 0 {
                info!(
                    "Generated: {} | Rate: {:.2} keys/s | Balance hits: {}",
                    format_number(generated),
                    self.stats.rate(),
                    self.stats.balance_hits()
                );
            }

            self.check_memory();

            sleep(period).await;
        }

        Ok(HuntOutcome::Quit)
    }

    /// One generation/check unit.
    pub async fn step(&self) -> Result<StepOutcome> {
        let pair = self.generator.generate()?;
        Ok(self.process(pair).await)
    }

    /// Check-and-record for one key pair.
    ///
    /// A target match short-circuits before the balance lookup; the success
    /// record is the terminal side effect.
    pub async fn process(&self, pair: KeyPair) -> StepOutcome {
        let KeyPair {
            address,
            private_wif,
        } = pair;

        self.sink.record_generated(&address, &private_wif);
        self.stats.increment_generated();

        if self.targets.contains(&address) {
            if let Err(e) = self.sink.record_success(&address, &private_wif) {
                // The pair is already in the generated-address log; keep the
                // payoff visible even if the success file could not land.
                error!(
                    "Failed to persist success record for {} (key {}): {:#}",
                    address, private_wif, e
                );
            }
            return StepOutcome::Found {
                address,
                private_wif,
            };
        }

        let record = self.oracle.fetch(&address).await;
        if record.has_balance() {
            self.stats.increment_balance_hits();
            info!(
                "Balance found: {} holds {} BTC",
                address,
                format_btc(record.final_balance)
            );
            self.sink.record_balance(&address, record.final_balance);
        }

        StepOutcome::Checked {
            balance_sat: record.final_balance,
        }
    }

    fn check_memory(&self) {
        let limit = self.config.hunt.memory_limit_mb;
        if limit == 0 {
            return;
        }

        let resident = memory::resident_mb();
        if resident > limit as f64 {
            warn!(
                "Resident memory {:.0} MB above {} MB threshold, requesting reclaim",
                resident, limit
            );
            memory::reclaim();
        }
    }
}

fn ring_bell() {
    print!("\x07");
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputConfig;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // Seed of all 0x01 bytes; its derived address doubles as the planted
    // target in the match scenario.
    const SEED_HEX: &str = "0101010101010101010101010101010101010101010101010101010101010101";

    fn config_in(dir: &TempDir, url_template: String) -> Config {
        let mut config = Config::default();
        config.api.url_template = url_template;
        config.api.timeout_secs = 2;
        config.output = OutputConfig {
            addresses_file: dir.path().join("list-addresses.txt").display().to_string(),
            balance_file: dir
                .path()
                .join("addresses-with-balance.txt")
                .display()
                .to_string(),
            success_file: dir.path().join("Success.txt").display().to_string(),
        };
        config
    }

    fn targets_with(addresses: &[&str]) -> TargetSet {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for address in addresses {
            writeln!(file, "{}", address).unwrap();
        }
        TargetSet::load(file.path()).unwrap()
    }

    async fn refused_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/address/{{}}?format=json", addr)
    }

    async fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        format!("http://{}/address/{{}}?format=json", addr)
    }

    fn hunter_with(config: Config, targets: TargetSet) -> Hunter {
        Hunter::new(config, targets, StateCell::new()).unwrap()
    }

    fn derived_address() -> KeyPair {
        KeyGenerator::new().derive_from_hex(SEED_HEX).unwrap()
    }

    #[tokio::test]
    async fn test_step_match_writes_success_and_skips_balance_query() {
        let dir = TempDir::new().unwrap();
        // Unreachable oracle: a match must return before any lookup, so the
        // refused endpoint is never contacted.
        let config = config_in(&dir, refused_url().await);
        let pair = derived_address();
        let hunter = hunter_with(config, targets_with(&[&pair.address]));

        let outcome = hunter.process(pair.clone()).await;

        assert_eq!(
            outcome,
            StepOutcome::Found {
                address: pair.address.clone(),
                private_wif: pair.private_wif.clone(),
            }
        );

        let success = std::fs::read_to_string(dir.path().join("Success.txt")).unwrap();
        assert_eq!(
            success,
            format!("Wallet: {}\n\nSeed: {}", pair.address, pair.private_wif)
        );
        // No balance query happened, so no balance log either.
        assert!(!dir.path().join("addresses-with-balance.txt").exists());
    }

    #[tokio::test]
    async fn test_step_records_positive_balance_and_continues() {
        let dir = TempDir::new().unwrap();
        let url = serve_once(r#"{"total_received": 500000000, "final_balance": 250000000}"#).await;
        let config = config_in(&dir, url);
        let hunter = hunter_with(config, targets_with(&["1SomeOtherTarget"]));

        let outcome = hunter.step().await.unwrap();

        assert_eq!(
            outcome,
            StepOutcome::Checked {
                balance_sat: 250_000_000
            }
        );

        let balances =
            std::fs::read_to_string(dir.path().join("addresses-with-balance.txt")).unwrap();
        assert!(balances.contains("\t Balance: 2.5 BTC\n"), "got: {}", balances);

        // The generated-address log gained the corresponding entry.
        let generated = std::fs::read_to_string(dir.path().join("list-addresses.txt")).unwrap();
        assert_eq!(generated.lines().count(), 1);
        assert!(generated.contains(" : "));
        assert_eq!(hunter.stats.balance_hits(), 1);
    }

    #[tokio::test]
    async fn test_step_classifies_unreachable_oracle_as_zero() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, refused_url().await);
        let hunter = hunter_with(config, targets_with(&["1SomeOtherTarget"]));

        let outcome = hunter.step().await.unwrap();

        assert_eq!(outcome, StepOutcome::Checked { balance_sat: 0 });
        assert!(!dir.path().join("addresses-with-balance.txt").exists());
        // The pair was still recorded; the next iteration proceeds.
        assert!(dir.path().join("list-addresses.txt").exists());
        assert_eq!(hunter.stats.balance_hits(), 0);
    }

    #[tokio::test]
    async fn test_run_observes_quit() {
        let dir = TempDir::new().unwrap();
        let url = serve_once(r#"{"total_received": 0, "final_balance": 0}"#).await;
        let mut config = config_in(&dir, url);
        config.hunt.interval_ms = 10;

        let state = StateCell::new();
        let hunter = Hunter::new(config, targets_with(&["1SomeOtherTarget"]), state.clone()).unwrap();

        // Pause, resume, then quit while the loop runs.
        let controller = tokio::spawn({
            let state = state.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                state.apply('p');
                tokio::time::sleep(Duration::from_millis(30)).await;
                state.apply('r');
                tokio::time::sleep(Duration::from_millis(30)).await;
                state.apply('q');
            }
        });

        let outcome = hunter.run().await.unwrap();
        controller.await.unwrap();

        assert_eq!(outcome, HuntOutcome::Quit);
        assert_eq!(state.get(), RunState::Stopped);
    }

    #[tokio::test]
    async fn test_run_pauses_generation() {
        let dir = TempDir::new().unwrap();
        let config = {
            let mut c = config_in(&dir, refused_url().await);
            c.hunt.interval_ms = 10;
            c
        };

        let state = StateCell::new();
        state.apply('p');

        let hunter = Hunter::new(config, targets_with(&["1SomeOtherTarget"]), state.clone()).unwrap();
        let stats = hunter.stats();

        let run = tokio::spawn(async move { hunter.run().await });

        // Paused from the start: several periods pass with no generation.
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(stats.generated(), 0);

        state.apply('q');
        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome, HuntOutcome::Quit);
    }
}
