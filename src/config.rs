//! Issuer key configuration loaded from the environment.
//!
//! Up to [`MAX_KEY_SLOTS`] key pairs are read from `PRIVATE_KEY{i}`,
//! `PUBLIC_KEY{i}` (base64 of `BE32(key_id) || key`) and `EXPIRY{i}`
//! (epoch milliseconds). When slot 1 is empty a fresh key pair with id 1
//! is generated so a development issuer can start without configuration.

use std::time::{SystemTime, UNIX_EPOCH};

use rand_core::{CryptoRng, RngCore};
use tracing::{info, instrument, warn};

use crate::{
    errors::PstError,
    key_material::KeyedMaterial,
    key_store::{generate_keyed_pair, KeyEntry, KeyStore},
    types::KeyId,
    voprf::VoprfSuite,
};

pub const MAX_KEY_SLOTS: usize = 6;
/// Expiry advertised for keys without `EXPIRY{i}`: 90 days.
pub const DEFAULT_EXPIRY_MS: u64 = 90 * 24 * 60 * 60 * 1000;

#[derive(Clone, Debug)]
pub enum SlotKeys {
    /// `(private, public)` as supplied.
    Supplied(KeyedMaterial, KeyedMaterial),
    /// Generate a key pair with this id when the store is built.
    Generate(KeyId),
}

#[derive(Clone, Debug)]
pub struct KeySlot {
    pub slot: usize,
    pub keys: SlotKeys,
    pub expiry: u64,
}

#[derive(Clone, Debug, Default)]
pub struct IssuerConfig {
    pub slots: Vec<KeySlot>,
}

fn epoch_ms() -> u64 {
    let ms = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    u64::try_from(ms).unwrap_or(u64::MAX)
}

impl IssuerConfig {
    /// # Errors
    /// See [`IssuerConfig::from_lookup_at`].
    pub fn from_env() -> Result<Self, PstError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// # Errors
    /// See [`IssuerConfig::from_lookup_at`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PstError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup_at(lookup, epoch_ms())
    }

    /// Read the slots through `lookup`, defaulting expiries relative to `now_ms`.
    ///
    /// A slot with only one of `PRIVATE_KEY{n}` / `PUBLIC_KEY{n}` set is rejected in every
    /// slot. Slot 1 does not fall back to a generated key and slots 2 to 6 are not skipped,
    /// so environments that relied on either must set both halves or neither.
    ///
    /// # Errors
    /// `PstError::Config` if only one half of a pair is set or an expiry is not a number,
    /// `PstError::InvalidEncoding` / `PstError::MalformedKey` for unreadable key material.
    pub fn from_lookup_at<F>(lookup: F, now_ms: u64) -> Result<Self, PstError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut slots = Vec::new();
        for slot in 1..=MAX_KEY_SLOTS {
            let private = lookup(&format!("PRIVATE_KEY{slot}")).filter(|v| !v.trim().is_empty());
            let public = lookup(&format!("PUBLIC_KEY{slot}")).filter(|v| !v.trim().is_empty());
            let keys = match (private, public) {
                (Some(private), Some(public)) => {
                    SlotKeys::Supplied(KeyedMaterial::from_base64(&private)?, KeyedMaterial::from_base64(&public)?)
                }
                (None, None) if slot == 1 => SlotKeys::Generate(KeyId(1)),
                (None, None) => continue,
                _ => {
                    return Err(PstError::Config(format!(
                        "PRIVATE_KEY{slot} and PUBLIC_KEY{slot} must be set together"
                    )))
                }
            };
            let expiry = match lookup(&format!("EXPIRY{slot}")) {
                Some(v) => v
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| PstError::Config(format!("EXPIRY{slot}: {e}")))?,
                None => now_ms.saturating_add(DEFAULT_EXPIRY_MS),
            };
            info!(slot, expiry, generated = matches!(keys, SlotKeys::Generate(_)), "loaded key slot");
            slots.push(KeySlot { slot, keys, expiry });
        }
        Ok(Self { slots })
    }

    /// Materialize the configured slots into a read-only key store.
    ///
    /// # Errors
    /// `KeyIdMismatch` / `DuplicateKeyId` for inconsistent material, `IssuanceEvaluation`
    /// if key generation fails.
    #[instrument(level = "debug", skip_all)]
    pub fn build_key_store<S: VoprfSuite, R: RngCore + CryptoRng>(
        &self,
        suite: &S,
        rng: &mut R,
    ) -> Result<KeyStore, PstError> {
        let mut entries = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            let (private, public) = match &slot.keys {
                SlotKeys::Supplied(private, public) => (private.clone(), public.clone()),
                SlotKeys::Generate(key_id) => {
                    warn!(slot = slot.slot, %key_id, "no key configured, generating an ephemeral key pair");
                    generate_keyed_pair(suite, *key_id, rng)?
                }
            };
            entries.push(KeyEntry::new(public, private, slot.expiry)?);
        }
        KeyStore::from_entries(entries)
    }
}
