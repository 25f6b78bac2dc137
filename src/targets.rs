use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// The fixed set of addresses the collider is searching for.
///
/// Loaded once at startup, read-only afterwards. Membership is O(1).
pub struct TargetSet {
    addresses: HashSet<String>,
}

impl TargetSet {
    /// Load a plain-text target list, one address per line.
    ///
    /// Lines are trimmed; blank lines and duplicates are tolerated. An
    /// unreadable file is fatal at startup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open target list: {}", path.display()))?;

        let mut addresses = HashSet::new();
        for line in BufReader::new(file).lines() {
            let line = line
                .with_context(|| format!("Failed to read target list: {}", path.display()))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            addresses.insert(trimmed.to_string());
        }

        info!(
            "Loaded {} target addresses from {}",
            addresses.len(),
            path.display()
        );

        Ok(Self { addresses })
    }

    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}
