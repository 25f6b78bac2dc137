use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::OutputConfig;
use crate::utils::format_btc;

const SUCCESS_WRITE_ATTEMPTS: u32 = 3;

/// Append-only result logs.
///
/// Append failures are logged and swallowed; the loop's liveness is worth
/// more than any single record. The success record is the one exception and
/// gets a bounded retry.
pub struct ResultSink {
    addresses_path: PathBuf,
    balance_path: PathBuf,
    success_path: PathBuf,
}

impl ResultSink {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            addresses_path: PathBuf::from(&config.addresses_file),
            balance_path: PathBuf::from(&config.balance_file),
            success_path: PathBuf::from(&config.success_file),
        }
    }

    /// Append one generated pair to the full-address log.
    pub fn record_generated(&self, address: &str, private_wif: &str) {
        let line = format!("{} : {}\n", address, private_wif);
        if let Err(e) = append_line(&self.addresses_path, &line) {
            warn!(
                "Failed to record generated address {} in {}: {:#}",
                address,
                self.addresses_path.display(),
                e
            );
        }
    }

    /// Append one positive-balance hit to the balance log.
    pub fn record_balance(&self, address: &str, final_balance_sat: u64) {
        let line = format!(
            "Bitcoin Address: {}\t Balance: {} BTC\n",
            address,
            format_btc(final_balance_sat)
        );
        if let Err(e) = append_line(&self.balance_path, &line) {
            warn!(
                "Failed to record balance for {} in {}: {:#}",
                address,
                self.balance_path.display(),
                e
            );
        }
    }

    /// Write the terminal success record, atomically.
    ///
    /// Retried a few times; this file is the program's one true payoff and
    /// its presence is the success signal to surrounding automation.
    pub fn record_success(&self, address: &str, private_wif: &str) -> Result<()> {
        let contents = format!("Wallet: {}\n\nSeed: {}", address, private_wif);

        let mut last_err = None;
        for attempt in 1..=SUCCESS_WRITE_ATTEMPTS {
            match write_atomic(&self.success_path, &contents) {
                Ok(()) => {
                    info!("Success record written to {}", self.success_path.display());
                    return Ok(());
                }
                Err(e) => {
                    error!(
                        "Attempt {}/{} to write success record failed: {:#}",
                        attempt, SUCCESS_WRITE_ATTEMPTS, e
                    );
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.expect("at least one attempt"))
    }
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    file.write_all(line.as_bytes())
        .with_context(|| format!("Failed to append to {}", path.display()))?;

    Ok(())
}

/// Atomic write: temp file with an exclusive lock, then rename into place.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let temp_path = path.with_extension(format!("tmp.{}", std::process::id()));

    let mut file = File::create(&temp_path)
        .with_context(|| format!("Failed to create temp file {}", temp_path.display()))?;

    file.lock_exclusive()
        .context("Failed to acquire exclusive lock on temp file")?;

    file.write_all(contents.as_bytes())
        .context("Failed to write success record")?;
    file.sync_all().context("Failed to sync success record")?;

    drop(file);

    match std::fs::rename(&temp_path, path) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = std::fs::remove_file(&temp_path);
            Err(e).with_context(|| format!("Failed to rename into {}", path.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sink_in(dir: &TempDir) -> ResultSink {
        let config = OutputConfig {
            addresses_file: dir.path().join("list-addresses.txt").display().to_string(),
            balance_file: dir
                .path()
                .join("addresses-with-balance.txt")
                .display()
                .to_string(),
            success_file: dir.path().join("Success.txt").display().to_string(),
        };
        ResultSink::new(&config)
    }

    #[test]
    fn test_record_generated_appends_lines() {
        let dir = TempDir::new().unwrap();
        let sink = sink_in(&dir);

        sink.record_generated("1ABCxyz", "5Jabc");
        sink.record_generated("1DEFuvw", "5Jdef");

        let contents = std::fs::read_to_string(dir.path().join("list-addresses.txt")).unwrap();
        assert_eq!(contents, "1ABCxyz : 5Jabc\n1DEFuvw : 5Jdef\n");
    }

    #[test]
    fn test_record_balance_line_format() {
        let dir = TempDir::new().unwrap();
        let sink = sink_in(&dir);

        sink.record_balance("1ABCxyz", 250_000_000);

        let contents =
            std::fs::read_to_string(dir.path().join("addresses-with-balance.txt")).unwrap();
        assert_eq!(contents, "Bitcoin Address: 1ABCxyz\t Balance: 2.5 BTC\n");
    }

    #[test]
    fn test_record_success_contents() {
        let dir = TempDir::new().unwrap();
        let sink = sink_in(&dir);

        sink.record_success("1ABCxyz", "5Jabc").unwrap();

        let contents = std::fs::read_to_string(dir.path().join("Success.txt")).unwrap();
        assert_eq!(contents, "Wallet: 1ABCxyz\n\nSeed: 5Jabc");
    }

    #[test]
    fn test_record_success_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let sink = sink_in(&dir);

        sink.record_success("1ABCxyz", "5Jabc").unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_append_failures_do_not_panic() {
        // Point the sink at an unwritable path; the append errors are
        // logged, not propagated.
        let config = OutputConfig {
            addresses_file: "/nonexistent/dir/a.txt".to_string(),
            balance_file: "/nonexistent/dir/b.txt".to_string(),
            success_file: "/nonexistent/dir/c.txt".to_string(),
        };
        let sink = ResultSink::new(&config);

        sink.record_generated("1ABCxyz", "5Jabc");
        sink.record_balance("1ABCxyz", 1);

        assert!(sink.record_success("1ABCxyz", "5Jabc").is_err());
    }
}
