//! Client side of the P-384 token flow: blind a nonce, check the issuer's
//! DLEQ proof, unblind to the token point `W` and build a redemption request.
//!
//! Browsers implement this part natively; it is kept here for tests,
//! benchmarks and tooling.

use ::voprf::{EvaluationElement, Proof, VoprfClient};
use p384::elliptic_curve::ff::Field;
use p384::{NistP384, ProjectivePoint, Scalar};
use rand_core::{CryptoRng, RngCore};

use crate::{
    errors::PstError,
    key_material::KeyedMaterial,
    messages::{IssueRequest, IssueResponse, RedeemerRequest},
    p384_sha384::{decode_element, encode, P384Sha384},
    types::{KeyId, Nonce},
    voprf::{VoprfError, VoprfSuite},
};

/// Blinding state kept between issuance request and response.
pub struct BlindState {
    nonce: Nonce,
    client: VoprfClient<NistP384>,
}

impl BlindState {
    #[must_use]
    pub const fn nonce(&self) -> &Nonce {
        &self.nonce
    }
}

/// An unblinded token ready for redemption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub key_id: KeyId,
    pub nonce: Nonce,
    /// Uncompressed token point.
    pub w: Vec<u8>,
}

pub struct PstClient {
    key_id: KeyId,
    public_key: ProjectivePoint,
}

impl PstClient {
    /// Trust the key published under `Y` in the key commitment.
    ///
    /// # Errors
    /// `PstError::IssuanceEvaluation` if the material is not a valid point.
    pub fn from_commitment_key(public_key: &KeyedMaterial) -> Result<Self, PstError> {
        let point = decode_element(public_key.raw_key()).map_err(PstError::IssuanceEvaluation)?;
        Ok(Self { key_id: public_key.key_id(), public_key: point })
    }

    #[must_use]
    pub const fn key_id(&self) -> KeyId {
        self.key_id
    }

    /// # Errors
    /// `PstError::IssuanceEvaluation` if the nonce hashes to the identity.
    pub fn blind<R: RngCore + CryptoRng>(
        &self,
        nonce: Nonce,
        rng: &mut R,
    ) -> Result<(BlindState, IssueRequest), PstError> {
        let blinded = VoprfClient::<NistP384>::blind(&nonce.0, rng)
            .map_err(|_| PstError::IssuanceEvaluation(VoprfError::HashToGroupFailed))?;
        let point = decode_element(&blinded.message.serialize()).map_err(PstError::IssuanceEvaluation)?;
        let request = IssueRequest::new(&encode(&point, false))?;
        Ok((BlindState { nonce, client: blinded.state }, request))
    }

    /// Verify the issuer's proof and unblind.
    ///
    /// # Errors
    /// `PstError::UnknownKeyId` if the response names another key, `PstError::IssuanceEvaluation`
    /// if the evaluated element is malformed or the proof does not verify.
    pub fn finalize(&self, state: &BlindState, response: &IssueResponse) -> Result<Token, PstError> {
        if response.key_id() != self.key_id {
            return Err(PstError::UnknownKeyId(response.key_id()));
        }
        let evaluated = decode_element(response.signed_nonce()).map_err(PstError::IssuanceEvaluation)?;
        let message = EvaluationElement::<NistP384>::deserialize(response.signed_nonce())
            .map_err(|_| PstError::IssuanceEvaluation(VoprfError::BadElementEncoding))?;
        let proof = Proof::<NistP384>::deserialize(response.evaluate_proof())
            .map_err(|_| PstError::IssuanceEvaluation(VoprfError::ProofFailed))?;
        state
            .client
            .finalize(&state.nonce.0, &message, &proof, self.public_key)
            .map_err(|_| PstError::IssuanceEvaluation(VoprfError::ProofFailed))?;
        let inverse: Option<Scalar> = state.client.get_blind().invert().into();
        let inverse = inverse.ok_or(PstError::IssuanceEvaluation(VoprfError::BadPrivateKey))?;
        Ok(Token { key_id: self.key_id, nonce: state.nonce, w: encode(&(evaluated * inverse), false) })
    }
}

impl Token {
    /// # Errors
    /// `PstError::InvalidRequest` if `client_data` exceeds 65535 bytes.
    pub fn redemption_request(&self, client_data: &[u8]) -> Result<RedeemerRequest, PstError> {
        RedeemerRequest::new(self.key_id, self.nonce, self.w.clone(), client_data.to_vec(), &P384Sha384.params())
    }
}
