//! RFC 9497 VOPRF (mode 0x01) over P-384 with SHA-384.
//! This provides the OPRF(P-384, SHA-384) ciphersuite used by Private State Tokens.
//!
//! Blind evaluation and the DLEQ proof come from the `voprf` crate. The
//! redeemer's non-blind evaluation needs the raw point `k·H(x)`, which
//! `voprf` only exposes hashed, so that path uses p384 arithmetic directly
//! with the same hash-to-group.

use ::voprf::{BlindedElement, VoprfServer};
use p384::elliptic_curve::{
    ff::{Field, PrimeField},
    group::{Curve as _, Group as _},
    hash2curve::{ExpandMsgXmd, GroupDigest},
    sec1::{FromEncodedPoint, ToEncodedPoint},
};
use p384::{AffinePoint, EncodedPoint, FieldBytes, NistP384, NonZeroScalar, ProjectivePoint, Scalar};
use rand_core::{CryptoRng, RngCore};
use sha2::Sha384;

use crate::types::SuiteParams;
use crate::voprf::{BlindEvaluation, DleqProof, GroupElement, VoprfError, VoprfSuite};

pub const ELEMENT_LEN: usize = 49;               // compressed SEC1
pub const UNCOMPRESSED_ELEMENT_LEN: usize = 97;  // 0x04 || x || y
pub const SCALAR_LEN: usize = 48;

// contextString = "OPRFV1-" || I2OSP(0x01, 1) || "-P384-SHA384"
const HASH_TO_GROUP_DST: &[u8] = b"HashToGroup-OPRFV1-\x01-P384-SHA384";

/// P-384 group element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct P384Element(pub(crate) ProjectivePoint);

impl GroupElement for P384Element {
    fn serialize(&self, compressed: bool) -> Vec<u8> {
        encode(&self.0, compressed)
    }

    fn is_identity(&self) -> bool {
        self.0.is_identity().into()
    }
}

/// The P-384/SHA-384 VOPRF provider. Stateless; keys are passed per call.
#[derive(Clone, Copy, Debug, Default)]
pub struct P384Sha384;

fn server(private_key: &[u8]) -> Result<VoprfServer<NistP384>, VoprfError> {
    decode_private_key(private_key)?;
    VoprfServer::<NistP384>::new_with_key(private_key).map_err(|_| VoprfError::BadPrivateKey)
}

impl VoprfSuite for P384Sha384 {
    type Element = P384Element;

    fn params(&self) -> SuiteParams {
        SuiteParams {
            element_len: ELEMENT_LEN,
            uncompressed_element_len: UNCOMPRESSED_ELEMENT_LEN,
            scalar_len: SCALAR_LEN,
        }
    }

    fn random_private_key<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Vec<u8> {
        let k = NonZeroScalar::random(rng);
        k.to_repr().to_vec()
    }

    /// Public keys are uncompressed SEC1 points, the form PST clients expect in `Y`.
    fn derive_public_key(&self, private_key: &[u8]) -> Result<Vec<u8>, VoprfError> {
        Ok(encode(&server(private_key)?.get_public_key(), false))
    }

    fn deserialize_element(&self, bytes: &[u8]) -> Result<P384Element, VoprfError> {
        decode_element(bytes).map(P384Element)
    }

    fn blind_evaluate<R: RngCore + CryptoRng>(
        &self,
        private_key: &[u8],
        blinded: &[P384Element],
        rng: &mut R,
    ) -> Result<BlindEvaluation<P384Element>, VoprfError> {
        let server = server(private_key)?;
        // voprf reads elements in their compressed form
        let blinded = blinded
            .iter()
            .map(|e| {
                BlindedElement::<NistP384>::deserialize(&encode(&e.0, true))
                    .map_err(|_| VoprfError::BadElementEncoding)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let result = server
            .batch_blind_evaluate(rng, &blinded)
            .map_err(|_| VoprfError::ProofFailed)?;
        let evaluated = result
            .messages
            .iter()
            .map(|m| decode_element(&m.serialize()).map(P384Element))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BlindEvaluation {
            evaluated,
            proof: Some(DleqProof(result.proof.serialize().to_vec())),
        })
    }

    fn deterministic_evaluate(&self, private_key: &[u8], input: &[u8]) -> Result<Vec<u8>, VoprfError> {
        let k = decode_private_key(private_key)?;
        let p = hash_to_group(input)?;
        Ok(encode(&(p * k), true))
    }
}

pub(crate) fn encode(p: &ProjectivePoint, compressed: bool) -> Vec<u8> {
    p.to_affine().to_encoded_point(compressed).as_bytes().to_vec()
}

/// Accepts compressed or uncompressed SEC1; rejects the identity.
pub(crate) fn decode_element(bytes: &[u8]) -> Result<ProjectivePoint, VoprfError> {
    let encoded = EncodedPoint::from_bytes(bytes).map_err(|_| VoprfError::BadElementEncoding)?;
    let affine: Option<AffinePoint> = AffinePoint::from_encoded_point(&encoded).into();
    let p = ProjectivePoint::from(affine.ok_or(VoprfError::BadElementEncoding)?);
    if bool::from(p.is_identity()) {
        return Err(VoprfError::IdentityElement);
    }
    Ok(p)
}

pub(crate) fn decode_private_key(bytes: &[u8]) -> Result<Scalar, VoprfError> {
    if bytes.len() != SCALAR_LEN {
        return Err(VoprfError::BadPrivateKey);
    }
    let k: Option<Scalar> = Scalar::from_repr(FieldBytes::clone_from_slice(bytes)).into();
    k.filter(|k| !bool::from(k.is_zero())).ok_or(VoprfError::BadPrivateKey)
}

fn hash_to_group(input: &[u8]) -> Result<ProjectivePoint, VoprfError> {
    let p = NistP384::hash_from_bytes::<ExpandMsgXmd<Sha384>>(&[input], &[HASH_TO_GROUP_DST])
        .map_err(|_| VoprfError::HashToGroupFailed)?;
    if bool::from(p.is_identity()) {
        return Err(VoprfError::IdentityElement);
    }
    Ok(p)
}
