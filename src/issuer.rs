use std::sync::Arc;

use rand_core::{CryptoRng, RngCore};
use tracing::{debug, instrument};

use crate::{
    errors::PstError,
    key_store::KeyStore,
    messages::{IssueRequest, IssueResponse},
    types::{SuiteParams, ISSUE_BATCH_SIZE},
    voprf::{GroupElement, VoprfSuite},
};

/// Token issuer: signs blinded nonces with a randomly selected active key.
pub struct PstIssuer<S: VoprfSuite> {
    suite: S,
    store: Arc<KeyStore>,
    params: SuiteParams,
}

impl<S: VoprfSuite> PstIssuer<S> {
    /// Suite sizes are queried once here and fixed for the issuer's lifetime.
    #[must_use]
    pub fn new(suite: S, store: Arc<KeyStore>) -> Self {
        let params = suite.params();
        Self { suite, store, params }
    }

    #[must_use]
    pub fn key_store(&self) -> &KeyStore {
        &self.store
    }

    #[must_use]
    pub const fn params(&self) -> &SuiteParams {
        &self.params
    }

    /// Issue one signed nonce.
    /// Steps: select key → resolve private key → decode blinded element → blind-evaluate → package.
    ///
    /// # Errors
    /// `EmptyKeyStore`, `UnknownKeyId`, `IssuanceEvaluation` for provider failures,
    /// `EvaluationArity` / `MissingProof` for an unexpected evaluation shape.
    #[instrument(level = "debug", skip_all)]
    pub fn issue<R: RngCore + CryptoRng>(&self, request: &IssueRequest, rng: &mut R) -> Result<IssueResponse, PstError> {
        let key_id = self.store.select_active_key_id(rng)?;
        debug!(%key_id, keys = self.store.len(), "selected issuance key");
        let private_key = self.store.resolve_signing_key(key_id)?;

        let blinded = self
            .suite
            .deserialize_element(&request.blinded_msg().0)
            .map_err(PstError::IssuanceEvaluation)?;
        let evaluation = self
            .suite
            .blind_evaluate(private_key, &[blinded], rng)
            .map_err(PstError::IssuanceEvaluation)?;

        let [evaluated] = evaluation.evaluated.as_slice() else {
            return Err(PstError::EvaluationArity { got: evaluation.evaluated.len() });
        };
        let Some(proof) = evaluation.proof else {
            return Err(PstError::MissingProof);
        };

        IssueResponse::new(ISSUE_BATCH_SIZE, key_id, evaluated.serialize(true), proof.0, &self.params)
    }
}
