//! Issuer and redeemer behaviour against a scripted VOPRF provider.

use std::sync::Arc;

use pst_issuer::*;
use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRng, RngCore, SeedableRng};

#[derive(Clone, Debug)]
struct FakeElement(Vec<u8>);

impl GroupElement for FakeElement {
    fn serialize(&self, _compressed: bool) -> Vec<u8> {
        self.0.clone()
    }

    fn is_identity(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

#[derive(Clone, Copy)]
enum Script {
    Honest,
    TwoElements,
    NoElements,
    NoProof,
    Fails,
    /// Deterministic evaluation drops the leading sign byte.
    ShortEvaluation,
}

#[derive(Clone, Copy)]
struct ScriptedSuite(Script);

const PARAMS: SuiteParams = SuiteParams { element_len: 49, uncompressed_element_len: 97, scalar_len: 48 };

fn signed(blinded: &[u8], key: &[u8]) -> Vec<u8> {
    let mut out = vec![0x03];
    out.extend(blinded.iter().zip(key.iter().cycle()).take(48).map(|(a, b)| a ^ b));
    out
}

impl VoprfSuite for ScriptedSuite {
    type Element = FakeElement;

    fn params(&self) -> SuiteParams {
        PARAMS
    }

    fn random_private_key<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Vec<u8> {
        let mut k = vec![0u8; 48];
        rng.fill_bytes(&mut k);
        k
    }

    fn derive_public_key(&self, private_key: &[u8]) -> Result<Vec<u8>, VoprfError> {
        Ok(private_key.iter().map(|b| !b).collect())
    }

    fn deserialize_element(&self, bytes: &[u8]) -> Result<FakeElement, VoprfError> {
        if bytes.first() == Some(&0xff) {
            return Err(VoprfError::BadElementEncoding);
        }
        Ok(FakeElement(bytes.to_vec()))
    }

    fn blind_evaluate<R: RngCore + CryptoRng>(
        &self,
        private_key: &[u8],
        blinded: &[FakeElement],
        _rng: &mut R,
    ) -> Result<BlindEvaluation<FakeElement>, VoprfError> {
        let one = FakeElement(signed(&blinded[0].0, private_key));
        let proof = Some(DleqProof(vec![7u8; 96]));
        match self.0 {
            Script::TwoElements => Ok(BlindEvaluation { evaluated: vec![one.clone(), one], proof }),
            Script::NoElements => Ok(BlindEvaluation { evaluated: vec![], proof }),
            Script::NoProof => Ok(BlindEvaluation { evaluated: vec![one], proof: None }),
            Script::Fails => Err(VoprfError::ProofFailed),
            Script::Honest | Script::ShortEvaluation => Ok(BlindEvaluation { evaluated: vec![one], proof }),
        }
    }

    fn deterministic_evaluate(&self, private_key: &[u8], input: &[u8]) -> Result<Vec<u8>, VoprfError> {
        if matches!(self.0, Script::Fails) {
            return Err(VoprfError::HashToGroupFailed);
        }
        let full = signed(input, private_key);
        Ok(match self.0 {
            Script::ShortEvaluation => full[1..].to_vec(),
            _ => full,
        })
    }
}

fn store(n: usize) -> Arc<KeyStore> {
    let entries = (0..n).map(|i| RawKeyEntry {
        private_key: vec![u8::try_from(i + 1).unwrap(); 48],
        public_key: vec![0x04; 97],
        expiry: 0,
    });
    Arc::new(KeyStore::register(entries).unwrap())
}

fn request() -> IssueRequest {
    IssueRequest::new(&[0x42; 97]).unwrap()
}

#[test]
fn issuance_packages_the_single_evaluation() {
    let issuer = PstIssuer::new(ScriptedSuite(Script::Honest), store(2));
    let mut rng = ChaCha20Rng::seed_from_u64(1);
    let resp = issuer.issue(&request(), &mut rng).unwrap();
    assert_eq!(resp.issued(), 1);
    assert!(resp.key_id() == KeyId(1) || resp.key_id() == KeyId(2));
    let key = issuer.key_store().resolve_signing_key(resp.key_id()).unwrap();
    assert_eq!(resp.signed_nonce(), signed(&[0x42; 97], key).as_slice());
    assert_eq!(resp.evaluate_proof(), &[7u8; 96][..]);
}

#[test]
fn issuance_key_choice_follows_injected_rng() {
    let issuer = PstIssuer::new(ScriptedSuite(Script::Honest), store(4));
    let ids = |seed| {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        (0..16).map(|_| issuer.issue(&request(), &mut rng).unwrap().key_id()).collect::<Vec<_>>()
    };
    assert_eq!(ids(5), ids(5));
}

#[test]
fn issuance_rejects_wrong_arity() {
    let mut rng = ChaCha20Rng::seed_from_u64(2);
    let two = PstIssuer::new(ScriptedSuite(Script::TwoElements), store(1));
    assert!(matches!(two.issue(&request(), &mut rng), Err(PstError::EvaluationArity { got: 2 })));
    let none = PstIssuer::new(ScriptedSuite(Script::NoElements), store(1));
    assert!(matches!(none.issue(&request(), &mut rng), Err(PstError::EvaluationArity { got: 0 })));
}

#[test]
fn issuance_requires_a_proof() {
    let issuer = PstIssuer::new(ScriptedSuite(Script::NoProof), store(1));
    let mut rng = ChaCha20Rng::seed_from_u64(3);
    assert!(matches!(issuer.issue(&request(), &mut rng), Err(PstError::MissingProof)));
}

#[test]
fn issuance_propagates_provider_failures() {
    let mut rng = ChaCha20Rng::seed_from_u64(4);
    let failing = PstIssuer::new(ScriptedSuite(Script::Fails), store(1));
    assert!(matches!(
        failing.issue(&request(), &mut rng),
        Err(PstError::IssuanceEvaluation(VoprfError::ProofFailed))
    ));

    let honest = PstIssuer::new(ScriptedSuite(Script::Honest), store(1));
    let mut bad = [0x42; 97];
    bad[0] = 0xff;
    assert!(matches!(
        honest.issue(&IssueRequest::new(&bad).unwrap(), &mut rng),
        Err(PstError::IssuanceEvaluation(VoprfError::BadElementEncoding))
    ));

    let empty = PstIssuer::new(ScriptedSuite(Script::Honest), Arc::new(KeyStore::default()));
    assert!(matches!(empty.issue(&request(), &mut rng), Err(PstError::EmptyKeyStore)));
}

fn redemption(key_id: KeyId, key: &[u8], w_override: Option<Vec<u8>>) -> RedeemerRequest {
    let nonce = Nonce([0x24; 64]);
    let mut w = signed(&nonce.0, key);
    w.resize(97, 0);
    let w = w_override.unwrap_or(w);
    RedeemerRequest::new(key_id, nonce, w, b"cd".to_vec(), &PARAMS).unwrap()
}

/// The scripted provider "compresses" by keeping the first 49 bytes.
#[derive(Clone, Copy)]
struct TruncatingSuite(ScriptedSuite);

impl VoprfSuite for TruncatingSuite {
    type Element = FakeElement;

    fn params(&self) -> SuiteParams {
        PARAMS
    }

    fn random_private_key<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Vec<u8> {
        self.0.random_private_key(rng)
    }

    fn derive_public_key(&self, private_key: &[u8]) -> Result<Vec<u8>, VoprfError> {
        self.0.derive_public_key(private_key)
    }

    fn deserialize_element(&self, bytes: &[u8]) -> Result<FakeElement, VoprfError> {
        let e = self.0.deserialize_element(bytes)?;
        Ok(FakeElement(e.0.into_iter().take(49).collect()))
    }

    fn blind_evaluate<R: RngCore + CryptoRng>(
        &self,
        private_key: &[u8],
        blinded: &[FakeElement],
        rng: &mut R,
    ) -> Result<BlindEvaluation<FakeElement>, VoprfError> {
        self.0.blind_evaluate(private_key, blinded, rng)
    }

    fn deterministic_evaluate(&self, private_key: &[u8], input: &[u8]) -> Result<Vec<u8>, VoprfError> {
        self.0.deterministic_evaluate(private_key, input)
    }
}

#[test]
fn redemption_matches_and_mismatches() {
    let keys = store(2);
    let key2 = keys.resolve_signing_key(KeyId(2)).unwrap().to_vec();
    let suite = ScriptedSuite(Script::Honest);
    let redeemer = PstRedeemer::new(TruncatingSuite(suite));

    let ok = redemption(KeyId(2), &key2, None);
    let resp = redeemer.redeem(&ok, &keys, Some(10.0)).unwrap();
    assert!(resp.validated());
    assert_eq!(resp.key_id(), 2);
    assert_eq!(resp.evaluated(), b"cd");

    let mut tampered_w = ok.ec_point_w().to_vec();
    tampered_w[10] ^= 0x80;
    let bad = redemption(KeyId(2), &key2, Some(tampered_w));
    assert!(!redeemer.redeem(&bad, &keys, Some(10.0)).unwrap().validated());

    let mut undecodable = ok.ec_point_w().to_vec();
    undecodable[0] = 0xff;
    let bad = redemption(KeyId(2), &key2, Some(undecodable));
    assert!(!redeemer.redeem(&bad, &keys, Some(10.0)).unwrap().validated());
}

#[test]
fn redemption_restores_missing_sign_byte() {
    let keys = store(1);
    let key1 = keys.resolve_signing_key(KeyId(1)).unwrap().to_vec();
    let suite = ScriptedSuite(Script::ShortEvaluation);
    let redeemer = PstRedeemer::new(TruncatingSuite(suite));
    let req = redemption(KeyId(1), &key1, None);
    assert!(redeemer.redeem(&req, &keys, None).unwrap().validated());
}

#[test]
fn redemption_errors_are_not_mismatches() {
    let keys = store(1);
    let key1 = keys.resolve_signing_key(KeyId(1)).unwrap().to_vec();
    let failing = PstRedeemer::new(TruncatingSuite(ScriptedSuite(Script::Fails)));
    let req = redemption(KeyId(1), &key1, None);
    assert!(matches!(
        failing.redeem(&req, &keys, None),
        Err(PstError::RedemptionEvaluation(VoprfError::HashToGroupFailed))
    ));

    let redeemer = PstRedeemer::new(TruncatingSuite(ScriptedSuite(Script::Honest)));
    let unknown = redemption(KeyId(3), &key1, None);
    assert!(matches!(redeemer.redeem(&unknown, &keys, None), Err(PstError::UnknownKeyId(KeyId(3)))));
}

#[test]
fn redemption_key_id_must_fit_response_field() {
    let raw = [9u8; 48];
    let entry = KeyEntry::new(embed_key_id(KeyId(70_000), &[1; 97]).unwrap(), embed_key_id(KeyId(70_000), &raw).unwrap(), 0).unwrap();
    let keys = KeyStore::from_entries(vec![entry]).unwrap();
    let suite = ScriptedSuite(Script::Honest);
    let redeemer = PstRedeemer::new(TruncatingSuite(suite));
    let req = redemption(KeyId(70_000), &raw, None);
    assert!(matches!(
        redeemer.redeem(&req, &keys, None),
        Err(PstError::InvalidResponse { field: "key_id", .. })
    ));
}
