//! Wire formats of the four protocol messages.
//!
//! ```text
//! IssueRequest      = BE16(count) || blinded_msg[97]
//! IssueResponse     = BE16(issued) || BE32(key_id) || signed_nonce[Ne] || BE16(2·Ns) || proof[2·Ns]
//! RedeemerRequest   = BE16(token_size) || BE32(key_id) || nonce[64] || W || BE16(len) || client_data[len]
//! RedeemerResponse  = BE16(key_id) || evaluated || validated[1] || BE64(f64 redemption_date)
//! ```
//!
//! All values are validated on construction and immutable afterwards.

use tracing::debug;

use crate::{
    errors::PstError,
    ser::{be16, be32, join_all, Reader},
    types::{BlindedMsg, KeyId, Nonce, SuiteParams, ISSUE_BATCH_SIZE, NONCE_LEN},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueRequest {
    blinded_msg: BlindedMsg,
}

impl IssueRequest {
    /// # Errors
    /// `PstError::InvalidRequest` unless `blinded_msg` is exactly 97 bytes.
    pub fn new(blinded_msg: &[u8]) -> Result<Self, PstError> {
        Ok(Self { blinded_msg: BlindedMsg::try_from(blinded_msg)? })
    }

    #[must_use]
    pub const fn blinded_msg(&self) -> &BlindedMsg {
        &self.blinded_msg
    }

    /// The leading count is advisory; everything after it is the blinded element.
    ///
    /// # Errors
    /// `PstError::TruncatedBuffer` without a count, `PstError::InvalidRequest` for a wrong element size.
    pub fn deserialize(buf: &[u8]) -> Result<Self, PstError> {
        let mut r = Reader::new(buf);
        let count = r.read_u16("issue_count")?;
        debug!(count, "decoding issue request");
        Self::new(r.rest())
    }

    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        join_all(&[&be16(ISSUE_BATCH_SIZE), &self.blinded_msg.0])
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueResponse {
    issued: u16,
    key_id: KeyId,
    signed_nonce: Vec<u8>,
    evaluate_proof: Vec<u8>,
}

fn response_len_error(e: PstError) -> PstError {
    match e {
        PstError::TruncatedBuffer { field, needed, got } => PstError::InvalidResponse { field, expected: needed, got },
        other => other,
    }
}

impl IssueResponse {
    /// # Errors
    /// `PstError::InvalidResponse` if `signed_nonce` is not `Ne` bytes or the proof is not `2·Ns` bytes.
    pub fn new(
        issued: u16,
        key_id: KeyId,
        signed_nonce: Vec<u8>,
        evaluate_proof: Vec<u8>,
        params: &SuiteParams,
    ) -> Result<Self, PstError> {
        if signed_nonce.len() != params.element_len {
            return Err(PstError::InvalidResponse {
                field: "signed_nonce",
                expected: params.element_len,
                got: signed_nonce.len(),
            });
        }
        if evaluate_proof.len() != params.proof_len() {
            return Err(PstError::InvalidResponse {
                field: "evaluate_proof",
                expected: params.proof_len(),
                got: evaluate_proof.len(),
            });
        }
        Ok(Self { issued, key_id, signed_nonce, evaluate_proof })
    }

    #[must_use]
    pub const fn issued(&self) -> u16 {
        self.issued
    }

    #[must_use]
    pub const fn key_id(&self) -> KeyId {
        self.key_id
    }

    #[must_use]
    pub fn signed_nonce(&self) -> &[u8] {
        &self.signed_nonce
    }

    #[must_use]
    pub fn evaluate_proof(&self) -> &[u8] {
        &self.evaluate_proof
    }

    /// Accepts the proof both with and without its `BE16` length prefix.
    ///
    /// # Errors
    /// `PstError::InvalidResponse` on any length mismatch.
    pub fn deserialize(buf: &[u8], params: &SuiteParams) -> Result<Self, PstError> {
        let mut r = Reader::new(buf);
        let issued = r.read_u16("issued").map_err(response_len_error)?;
        let key_id = KeyId(r.read_u32("key_id").map_err(response_len_error)?);
        let signed_nonce = r.take("signed_nonce", params.element_len).map_err(response_len_error)?.to_vec();

        let proof_len = params.proof_len();
        let prefixed = r.remaining() == proof_len + 2
            && r.peek_u16().map(usize::from) == Some(proof_len);
        if prefixed {
            r.read_u16("evaluate_proof_len").map_err(response_len_error)?;
        }
        let evaluate_proof = r.rest().to_vec();
        Self::new(issued, key_id, signed_nonce, evaluate_proof, params)
    }

    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let proof_len = u16::try_from(self.evaluate_proof.len()).unwrap_or(u16::MAX);
        join_all(&[
            &be16(self.issued),
            &be32(self.key_id.get()),
            &self.signed_nonce,
            &be16(proof_len),
            &self.evaluate_proof,
        ])
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedeemerRequest {
    key_id: KeyId,
    nonce: Nonce,
    ec_point_w: Vec<u8>,
    client_data: Vec<u8>,
}

impl RedeemerRequest {
    /// # Errors
    /// `PstError::InvalidRequest` if `ec_point_w` is not an uncompressed element or
    /// `client_data` does not fit a `BE16` length.
    pub fn new(
        key_id: KeyId,
        nonce: Nonce,
        ec_point_w: Vec<u8>,
        client_data: Vec<u8>,
        params: &SuiteParams,
    ) -> Result<Self, PstError> {
        if ec_point_w.len() != params.uncompressed_element_len {
            return Err(PstError::InvalidRequest {
                field: "ec_point_w",
                expected: params.uncompressed_element_len,
                got: ec_point_w.len(),
            });
        }
        if client_data.len() > usize::from(u16::MAX) {
            return Err(PstError::InvalidRequest {
                field: "client_data",
                expected: usize::from(u16::MAX),
                got: client_data.len(),
            });
        }
        Ok(Self { key_id, nonce, ec_point_w, client_data })
    }

    #[must_use]
    pub const fn key_id(&self) -> KeyId {
        self.key_id
    }

    #[must_use]
    pub const fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    #[must_use]
    pub fn ec_point_w(&self) -> &[u8] {
        &self.ec_point_w
    }

    #[must_use]
    pub fn client_data(&self) -> &[u8] {
        &self.client_data
    }

    /// # Errors
    /// `PstError::TruncatedBuffer` if the buffer is shorter than its declared fields,
    /// `PstError::InvalidRequest` if the token size disagrees with the suite or bytes trail.
    pub fn deserialize(buf: &[u8], params: &SuiteParams) -> Result<Self, PstError> {
        let mut r = Reader::new(buf);
        let token_size = usize::from(r.read_u16("token_size")?);
        let key_id = KeyId(r.read_u32("key_id")?);
        let nonce = Nonce::try_from(r.take("nonce", NONCE_LEN)?)?;
        let ec_point_w = r.take("ec_point_w", params.uncompressed_element_len)?.to_vec();
        let client_data_size = usize::from(r.read_u16("client_data_size")?);
        let client_data = r.take("client_data", client_data_size)?.to_vec();

        if token_size != params.token_len() {
            return Err(PstError::InvalidRequest { field: "token_size", expected: params.token_len(), got: token_size });
        }
        if !r.is_empty() {
            return Err(PstError::InvalidRequest { field: "trailing_bytes", expected: 0, got: r.remaining() });
        }
        debug!(%key_id, client_data_size, "decoded redeemer request");
        Self::new(key_id, nonce, ec_point_w, client_data, params)
    }

    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let token_len = 4 + NONCE_LEN + self.ec_point_w.len();
        join_all(&[
            &be16(u16::try_from(token_len).unwrap_or(u16::MAX)),
            &be32(self.key_id.get()),
            &self.nonce.0,
            &self.ec_point_w,
            &be16(u16::try_from(self.client_data.len()).unwrap_or(u16::MAX)),
            &self.client_data,
        ])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RedeemerResponse {
    key_id: u16,
    evaluated: Vec<u8>,
    validated: bool,
    redemption_date: f64,
}

const RESPONSE_TRAILER_LEN: usize = 1 + 8;

impl RedeemerResponse {
    #[must_use]
    pub const fn new(key_id: u16, evaluated: Vec<u8>, validated: bool, redemption_date: f64) -> Self {
        Self { key_id, evaluated, validated, redemption_date }
    }

    #[must_use]
    pub const fn key_id(&self) -> u16 {
        self.key_id
    }

    #[must_use]
    pub fn evaluated(&self) -> &[u8] {
        &self.evaluated
    }

    #[must_use]
    pub const fn validated(&self) -> bool {
        self.validated
    }

    /// Unix epoch milliseconds.
    #[must_use]
    pub const fn redemption_date(&self) -> f64 {
        self.redemption_date
    }

    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        join_all(&[
            &be16(self.key_id),
            &self.evaluated,
            &[u8::from(self.validated)],
            &self.redemption_date.to_be_bytes(),
        ])
    }

    /// `evaluated` is unframed: it spans everything between the key id and the trailer.
    ///
    /// # Errors
    /// `PstError::TruncatedBuffer` for short input, `PstError::InvalidResponse` for a non-boolean flag.
    pub fn deserialize(buf: &[u8]) -> Result<Self, PstError> {
        let mut r = Reader::new(buf);
        let key_id = r.read_u16("key_id")?;
        let evaluated_len = r.remaining().checked_sub(RESPONSE_TRAILER_LEN).ok_or(PstError::TruncatedBuffer {
            field: "redeemer_response",
            needed: RESPONSE_TRAILER_LEN,
            got: r.remaining(),
        })?;
        let evaluated = r.take("evaluated", evaluated_len)?.to_vec();
        let validated = match r.take("validated", 1)?[0] {
            0 => false,
            1 => true,
            _ => return Err(PstError::InvalidResponse { field: "validated", expected: 1, got: 1 }),
        };
        let mut date = [0u8; 8];
        date.copy_from_slice(r.take("redemption_date", 8)?);
        Ok(Self::new(key_id, evaluated, validated, f64::from_be_bytes(date)))
    }
}
