//! Rotating issuer keys.
//!
//! The store is built once at startup and read-only afterwards, so it can
//! be shared behind an `Arc` without locking.

use std::collections::BTreeMap;

use rand_core::{CryptoRng, RngCore};
use serde::{ser::SerializeMap, Serialize, Serializer};
use tracing::{debug, info};

use crate::{
    errors::PstError,
    key_material::{embed_key_id, KeyedMaterial},
    types::{KeyId, ISSUE_BATCH_SIZE, PROTOCOL_VERSION},
    voprf::VoprfSuite,
};

/// Unprefixed key pair plus its advertised expiry (epoch ms).
#[derive(Clone)]
pub struct RawKeyEntry {
    pub private_key: Vec<u8>,
    pub public_key: Vec<u8>,
    pub expiry: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEntry {
    key_id: KeyId,
    public_key: KeyedMaterial,
    private_key: KeyedMaterial,
    expiry: u64,
}

impl KeyEntry {
    /// # Errors
    /// `PstError::KeyIdMismatch` when the two halves embed different ids.
    pub fn new(public_key: KeyedMaterial, private_key: KeyedMaterial, expiry: u64) -> Result<Self, PstError> {
        if public_key.key_id() != private_key.key_id() {
            return Err(PstError::KeyIdMismatch { public: public_key.key_id(), private: private_key.key_id() });
        }
        Ok(Self { key_id: private_key.key_id(), public_key, private_key, expiry })
    }

    #[must_use]
    pub const fn key_id(&self) -> KeyId {
        self.key_id
    }

    #[must_use]
    pub const fn public_key(&self) -> &KeyedMaterial {
        &self.public_key
    }

    #[must_use]
    pub const fn private_key(&self) -> &KeyedMaterial {
        &self.private_key
    }

    /// Advertised only; expiry is not enforced here.
    #[must_use]
    pub const fn expiry(&self) -> u64 {
        self.expiry
    }
}

/// Generate a fresh key pair and embed `key_id` into both halves.
/// Returns `(private, public)`.
///
/// # Errors
/// Returns `PstError::IssuanceEvaluation` if the provider cannot derive the public key.
pub fn generate_keyed_pair<S: VoprfSuite, R: RngCore + CryptoRng>(
    suite: &S,
    key_id: KeyId,
    rng: &mut R,
) -> Result<(KeyedMaterial, KeyedMaterial), PstError> {
    let kp = suite.generate_key_pair(rng).map_err(PstError::IssuanceEvaluation)?;
    Ok((embed_key_id(key_id, &kp.private_key)?, embed_key_id(key_id, &kp.public_key)?))
}

#[derive(Clone, Debug, Default)]
pub struct KeyStore {
    entries: Vec<KeyEntry>,
    index: BTreeMap<KeyId, usize>,
}

impl KeyStore {
    /// Assign ids `1..=n` in input order and wrap each raw key.
    ///
    /// # Errors
    /// `PstError::Config` if more than `u32::MAX` keys are supplied.
    pub fn register<I>(entries: I) -> Result<Self, PstError>
    where
        I: IntoIterator<Item = RawKeyEntry>,
    {
        let mut keyed = Vec::new();
        for (i, raw) in entries.into_iter().enumerate() {
            let id = u32::try_from(i + 1).map_err(|_| PstError::Config("too many keys".into()))?;
            let id = KeyId(id);
            keyed.push(KeyEntry::new(
                embed_key_id(id, &raw.public_key)?,
                embed_key_id(id, &raw.private_key)?,
                raw.expiry,
            )?);
        }
        Self::from_entries(keyed)
    }

    /// Build from entries whose ids were assigned externally.
    ///
    /// # Errors
    /// `PstError::DuplicateKeyId` if two entries claim the same id.
    pub fn from_entries(entries: Vec<KeyEntry>) -> Result<Self, PstError> {
        let mut index = BTreeMap::new();
        for (pos, entry) in entries.iter().enumerate() {
            if index.insert(entry.key_id(), pos).is_some() {
                return Err(PstError::DuplicateKeyId(entry.key_id()));
            }
            debug!(key_id = %entry.key_id(), expiry = entry.expiry(), "registered issuer key");
        }
        info!(keys = entries.len(), "key store ready");
        Ok(Self { entries, index })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registration order.
    #[must_use]
    pub fn entries(&self) -> &[KeyEntry] {
        &self.entries
    }

    pub fn key_ids(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.entries.iter().map(KeyEntry::key_id)
    }

    #[must_use]
    pub fn get(&self, key_id: KeyId) -> Option<&KeyEntry> {
        self.index.get(&key_id).map(|&pos| &self.entries[pos])
    }

    /// Raw private key bytes for `key_id`.
    ///
    /// # Errors
    /// `PstError::UnknownKeyId` if no entry carries that id.
    pub fn resolve_signing_key(&self, key_id: KeyId) -> Result<&[u8], PstError> {
        self.get(key_id)
            .map(|e| e.private_key().raw_key())
            .ok_or(PstError::UnknownKeyId(key_id))
    }

    /// Uniformly random choice among all registered ids.
    ///
    /// # Errors
    /// `PstError::EmptyKeyStore` when nothing is registered.
    pub fn select_active_key_id<R: RngCore + ?Sized>(&self, rng: &mut R) -> Result<KeyId, PstError> {
        if self.entries.is_empty() {
            return Err(PstError::EmptyKeyStore);
        }
        Ok(self.entries[uniform_index(rng, self.entries.len())].key_id())
    }

    #[must_use]
    pub fn publish_commitment(&self) -> CommitmentDocument {
        let keys = self
            .entries
            .iter()
            .map(|e| {
                (e.key_id(), KeyCommitment { y: e.public_key().to_base64(), expiry: e.expiry().to_string() })
            })
            .collect();
        CommitmentDocument {
            commitment: ProtocolCommitment {
                protocol_version: PROTOCOL_VERSION,
                id: 1,
                batchsize: ISSUE_BATCH_SIZE,
                keys: KeyCommitments(keys),
            },
        }
    }
}

// Rejection sampling keeps the choice unbiased for any `n`.
#[allow(clippy::cast_possible_truncation)]
fn uniform_index<R: RngCore + ?Sized>(rng: &mut R, n: usize) -> usize {
    let n = n as u64;
    let zone = u64::MAX - (u64::MAX % n);
    loop {
        let v = rng.next_u64();
        if v < zone {
            return (v % n) as usize;
        }
    }
}

/// Key commitment published at `/.well-known/trust-token/key-commitment`.
#[derive(Clone, Debug, Serialize)]
pub struct CommitmentDocument {
    #[serde(rename = "PrivateStateTokenV1VOPRF")]
    pub commitment: ProtocolCommitment,
}

impl CommitmentDocument {
    /// # Errors
    /// Propagates `serde_json` serialization failures.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ProtocolCommitment {
    pub protocol_version: &'static str,
    pub id: u32,
    pub batchsize: u16,
    pub keys: KeyCommitments,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyCommitment {
    #[serde(rename = "Y")]
    pub y: String,
    pub expiry: String,
}

/// Keys keyed by the decimal key id, serialized in registration order.
#[derive(Clone, Debug, Default)]
pub struct KeyCommitments(pub Vec<(KeyId, KeyCommitment)>);

impl Serialize for KeyCommitments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, key) in &self.0 {
            map.serialize_entry(&id.to_string(), key)?;
        }
        map.end()
    }
}
