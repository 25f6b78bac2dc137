use anyhow::{Context, Result};
use bitcoin::secp256k1::{All, Secp256k1, SecretKey};
use bitcoin::{Address, Network, PrivateKey};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::ColliderError;

/// A derived public address plus its exportable private key.
///
/// Owned by one loop iteration; written to the sink and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub address: String,
    pub private_wif: String,
}

/// Generates fresh random seeds and derives uncompressed mainnet key pairs.
pub struct KeyGenerator {
    secp: Secp256k1<All>,
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
        }
    }

    /// Generate a key pair from a fresh 32-byte random seed.
    ///
    /// Draws again on the (~2^-128) chance the seed is not a valid scalar.
    /// Fails only if the OS entropy source fails.
    pub fn generate(&self) -> Result<KeyPair> {
        loop {
            let mut seed = [0u8; 32];
            OsRng
                .try_fill_bytes(&mut seed)
                .context("System entropy source failed")?;

            if let Ok(pair) = self.derive(&seed) {
                return Ok(pair);
            }
        }
    }

    /// Deterministic derivation: same seed, same address and WIF.
    pub fn derive(&self, seed: &[u8; 32]) -> Result<KeyPair> {
        let secret = SecretKey::from_slice(seed)
            .map_err(|e| ColliderError::Wallet(format!("Seed is not a valid scalar: {}", e)))?;

        let private_key = PrivateKey::new_uncompressed(secret, Network::Bitcoin);
        let public_key = private_key.public_key(&self.secp);
        let address = Address::p2pkh(&public_key, Network::Bitcoin);

        Ok(KeyPair {
            address: address.to_string(),
            private_wif: private_key.to_wif(),
        })
    }

    /// Derivation from a 64-character hex seed, for reproducing a recorded run.
    pub fn derive_from_hex(&self, seed_hex: &str) -> Result<KeyPair> {
        let bytes = hex::decode(seed_hex).context("Invalid hex seed")?;
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ColliderError::Wallet(format!("Seed must be 32 bytes, got {}", bytes.len())))?;
        self.derive(&seed)
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}
