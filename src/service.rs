//! Transport-facing operations: base64 `Sec-Private-State-Token` headers in
//! and out, plus the key commitment. HTTP routing itself is left to the host.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand_core::{CryptoRng, RngCore};
use tracing::{info, instrument, warn};

use crate::{
    errors::PstError,
    issuer::PstIssuer,
    key_store::{CommitmentDocument, KeyStore},
    messages::{IssueRequest, RedeemerRequest, RedeemerResponse},
    redeemer::PstRedeemer,
    types::KeyId,
    voprf::VoprfSuite,
};

/// What to do with a well-formed token that fails verification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RedemptionPolicy {
    /// Return the response with `validated = false`.
    #[default]
    Report,
    /// Fail with `PstError::RedemptionRejected`.
    Reject,
}

/// Decode a token header. Only the standard base64 alphabet is accepted.
///
/// # Errors
/// `PstError::InvalidEncoding` for empty, non-alphabet or undecodable input.
pub fn decode_header(header: &str) -> Result<Vec<u8>, PstError> {
    let header = header.trim();
    if header.is_empty() {
        return Err(PstError::InvalidEncoding("empty token header"));
    }
    if !header.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=')) {
        return Err(PstError::InvalidEncoding("token header is not base64"));
    }
    STANDARD
        .decode(header)
        .map_err(|_| PstError::InvalidEncoding("token header is not valid base64"))
}

/// Extract the value of `redemption-record="..."` from a `Sec-Redemption-Record` header.
#[must_use]
pub fn parse_redemption_record(header: &str) -> Option<&str> {
    const KEY: &str = "redemption-record=\"";
    let start = header.find(KEY)? + KEY.len();
    let len = header[start..].find('"')?;
    Some(&header[start..start + len]).filter(|v| !v.is_empty())
}

pub struct PstService<S: VoprfSuite + Clone> {
    store: Arc<KeyStore>,
    issuer: PstIssuer<S>,
    redeemer: PstRedeemer<S>,
    policy: RedemptionPolicy,
}

impl<S: VoprfSuite + Clone> PstService<S> {
    #[must_use]
    pub fn new(suite: S, store: KeyStore, policy: RedemptionPolicy) -> Self {
        let store = Arc::new(store);
        Self {
            issuer: PstIssuer::new(suite.clone(), Arc::clone(&store)),
            redeemer: PstRedeemer::new(suite),
            store,
            policy,
        }
    }

    #[must_use]
    pub fn key_store(&self) -> &KeyStore {
        &self.store
    }

    #[must_use]
    pub fn key_commitment(&self) -> CommitmentDocument {
        self.store.publish_commitment()
    }

    /// Issuance: base64 `IssueRequest` in, base64 `IssueResponse` out.
    ///
    /// # Errors
    /// Any decoding or issuance error; see [`PstIssuer::issue`].
    #[instrument(level = "debug", skip_all)]
    pub fn issue_header<R: RngCore + CryptoRng>(&self, header: &str, rng: &mut R) -> Result<String, PstError> {
        let request = decode_header(header)
            .and_then(|buf| IssueRequest::deserialize(&buf))
            .inspect_err(|e| warn!(error = %e, "rejecting malformed issuance request"))?;
        let response = self.issuer.issue(&request, rng)?;
        info!(key_id = %response.key_id(), "issued token");
        Ok(STANDARD.encode(response.serialize()))
    }

    /// Redemption: base64 `RedeemerRequest` in, base64 `RedeemerResponse` out.
    ///
    /// # Errors
    /// Any decoding or redemption error; `RedemptionRejected` for a mismatch under
    /// [`RedemptionPolicy::Reject`].
    #[instrument(level = "debug", skip_all)]
    pub fn redeem_header(&self, header: &str, now: Option<f64>) -> Result<String, PstError> {
        let response = self.redeem_bytes(header, now)?;
        Ok(STANDARD.encode(response.serialize()))
    }

    fn redeem_bytes(&self, header: &str, now: Option<f64>) -> Result<RedeemerResponse, PstError> {
        let request = decode_header(header)
            .and_then(|buf| RedeemerRequest::deserialize(&buf, self.redeemer.params()))
            .inspect_err(|e| warn!(error = %e, "rejecting malformed redemption request"))?;
        let response = self.redeemer.redeem(&request, &self.store, now)?;
        if !response.validated() && self.policy == RedemptionPolicy::Reject {
            return Err(PstError::RedemptionRejected { key_id: KeyId(u32::from(response.key_id())) });
        }
        Ok(response)
    }
}
