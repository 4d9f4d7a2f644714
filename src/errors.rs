use thiserror::Error;

use crate::types::KeyId;
use crate::voprf::VoprfError;

#[derive(Debug, Error)]
pub enum PstError {
    #[error("malformed key material: {len} bytes is too short to carry a key id")]
    MalformedKey { len: usize },

    #[error("invalid request: {field} expected {expected} bytes, got {got}")]
    InvalidRequest { field: &'static str, expected: usize, got: usize },

    #[error("invalid response: {field} expected {expected} bytes, got {got}")]
    InvalidResponse { field: &'static str, expected: usize, got: usize },

    #[error("truncated buffer: {field} needs {needed} bytes, {got} remaining")]
    TruncatedBuffer { field: &'static str, needed: usize, got: usize },

    #[error("unknown key id {0}")]
    UnknownKeyId(KeyId),

    #[error("key id {0} registered twice")]
    DuplicateKeyId(KeyId),

    #[error("public key carries id {public}, private key carries id {private}")]
    KeyIdMismatch { public: KeyId, private: KeyId },

    #[error("key store is empty")]
    EmptyKeyStore,

    #[error("evaluation returned {got} elements, expected exactly 1")]
    EvaluationArity { got: usize },

    #[error("evaluation has no DLEQ proof")]
    MissingProof,

    #[error("issuance evaluation failed: {0}")]
    IssuanceEvaluation(#[source] VoprfError),

    #[error("redemption evaluation failed: {0}")]
    RedemptionEvaluation(#[source] VoprfError),

    #[error("token for key id {key_id} failed verification")]
    RedemptionRejected { key_id: KeyId },

    #[error("invalid encoding: {0}")]
    InvalidEncoding(&'static str),

    #[error("config error: {0}")]
    Config(String),
}
