use std::time::{SystemTime, UNIX_EPOCH};

use subtle::ConstantTimeEq;
use tracing::{debug, info, instrument};

use crate::{
    errors::PstError,
    key_store::KeyStore,
    messages::{RedeemerRequest, RedeemerResponse},
    types::{SuiteParams, COMPRESSED_SIGN_TAG},
    voprf::{GroupElement, VoprfSuite},
};

/// Token redeemer: recomputes the signed nonce and compares it with the client's `W`.
pub struct PstRedeemer<S: VoprfSuite> {
    suite: S,
    params: SuiteParams,
}

#[allow(clippy::cast_precision_loss)]
fn now_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as f64
}

/// Some providers emit the deterministic evaluation without its sign byte;
/// restore it so both sides compare as compressed points.
fn normalize_evaluation(mut expected: Vec<u8>, params: &SuiteParams) -> Vec<u8> {
    if expected.len() + 1 == params.element_len {
        expected.insert(0, COMPRESSED_SIGN_TAG);
    }
    expected
}

impl<S: VoprfSuite> PstRedeemer<S> {
    #[must_use]
    pub fn new(suite: S) -> Self {
        let params = suite.params();
        Self { suite, params }
    }

    #[must_use]
    pub const fn params(&self) -> &SuiteParams {
        &self.params
    }

    /// Verify a redemption token. A token that does not match is reported
    /// as `validated = false`, not as an error.
    ///
    /// `now` is the redemption date in epoch milliseconds; `None` uses the system clock.
    ///
    /// # Errors
    /// `UnknownKeyId` if the token names an unregistered key, `RedemptionEvaluation`
    /// if the issuer-side evaluation fails, `InvalidResponse` if the key id exceeds 16 bits.
    #[instrument(level = "debug", skip_all, fields(key_id = %request.key_id()))]
    pub fn redeem(&self, request: &RedeemerRequest, store: &KeyStore, now: Option<f64>) -> Result<RedeemerResponse, PstError> {
        let key_id = request.key_id();
        let private_key = store.resolve_signing_key(key_id)?;

        let expected = self
            .suite
            .deterministic_evaluate(private_key, &request.nonce().0)
            .map_err(PstError::RedemptionEvaluation)?;
        let expected = normalize_evaluation(expected, &self.params);

        // W is client-controlled: an undecodable point can never match.
        let presented = match self.suite.deserialize_element(request.ec_point_w()) {
            Ok(w) => Some(w.serialize(true)),
            Err(e) => {
                debug!(error = %e, "token point does not decode");
                None
            }
        };
        let validated = presented.is_some_and(|w| bool::from(w.as_slice().ct_eq(expected.as_slice())));
        if !validated {
            info!(%key_id, "token verification mismatch");
        }

        let response_key_id = u16::try_from(key_id.get())
            .map_err(|_| PstError::InvalidResponse { field: "key_id", expected: 2, got: 4 })?;
        Ok(RedeemerResponse::new(
            response_key_id,
            request.client_data().to_vec(),
            validated,
            now.unwrap_or_else(now_ms),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_evaluation_gets_sign_tag() {
        let params = SuiteParams { element_len: 49, uncompressed_element_len: 97, scalar_len: 48 };
        let fixed = normalize_evaluation(vec![7u8; 48], &params);
        assert_eq!(fixed.len(), 49);
        assert_eq!(fixed[0], 0x03);
        assert_eq!(&fixed[1..], &[7u8; 48][..]);

        let untouched = normalize_evaluation(vec![0x02; 49], &params);
        assert_eq!(untouched, vec![0x02; 49]);
    }
}
