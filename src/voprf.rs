//! Boundary to the VOPRF primitive provider.
//!
//! The codec and key store only ever talk to a [`VoprfSuite`]; group
//! arithmetic, hash-to-group and DLEQ proofs live behind it.

use core::fmt;
use rand_core::{CryptoRng, RngCore};

use crate::types::SuiteParams;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VoprfError {
    BadPrivateKey,
    BadElementEncoding,
    IdentityElement,
    HashToGroupFailed,
    ProofFailed,
}

impl fmt::Display for VoprfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadPrivateKey => f.write_str("malformed or zero private key scalar"),
            Self::BadElementEncoding => f.write_str("malformed group element encoding"),
            Self::IdentityElement => f.write_str("group element is the identity"),
            Self::HashToGroupFailed => f.write_str("hash to group failed"),
            Self::ProofFailed => f.write_str("DLEQ proof generation or verification failed"),
        }
    }
}

impl std::error::Error for VoprfError {}

/// A deserialized group element.
pub trait GroupElement {
    fn serialize(&self, compressed: bool) -> Vec<u8>;
    fn is_identity(&self) -> bool;
}

/// Raw (unprefixed) key pair as produced by the provider.
#[derive(Clone)]
pub struct RawKeyPair {
    pub private_key: Vec<u8>,
    pub public_key: Vec<u8>,
}

/// Serialized DLEQ proof `c || s`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DleqProof(pub Vec<u8>);

/// Outcome of a blind evaluation. The proof is optional because a
/// provider running in base (non-verifiable) mode returns none.
#[derive(Clone, Debug)]
pub struct BlindEvaluation<E> {
    pub evaluated: Vec<E>,
    pub proof: Option<DleqProof>,
}

/// VOPRF primitive provider (one ciphersuite).
pub trait VoprfSuite: Send + Sync {
    type Element: GroupElement;

    /// Group sizes of the suite.
    fn params(&self) -> SuiteParams;

    /// # Errors
    /// Returns `VoprfError` if the provider cannot derive a key.
    fn generate_key_pair<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<RawKeyPair, VoprfError> {
        let private_key = self.random_private_key(rng);
        let public_key = self.derive_public_key(&private_key)?;
        Ok(RawKeyPair { private_key, public_key })
    }

    fn random_private_key<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Vec<u8>;

    /// # Errors
    /// `VoprfError::BadPrivateKey` for an invalid scalar encoding.
    fn derive_public_key(&self, private_key: &[u8]) -> Result<Vec<u8>, VoprfError>;

    /// # Errors
    /// `VoprfError::BadElementEncoding` or `VoprfError::IdentityElement`.
    fn deserialize_element(&self, bytes: &[u8]) -> Result<Self::Element, VoprfError>;

    /// Evaluate blinded elements under `private_key` and prove it.
    ///
    /// # Errors
    /// Returns `VoprfError` if the key is invalid or proof generation fails.
    fn blind_evaluate<R: RngCore + CryptoRng>(
        &self,
        private_key: &[u8],
        blinded: &[Self::Element],
        rng: &mut R,
    ) -> Result<BlindEvaluation<Self::Element>, VoprfError>;

    /// Non-blind evaluation of `input`, serialized as a compressed element.
    ///
    /// # Errors
    /// Returns `VoprfError` if the key is invalid or `input` hashes to the identity.
    fn deterministic_evaluate(&self, private_key: &[u8], input: &[u8]) -> Result<Vec<u8>, VoprfError>;
}
