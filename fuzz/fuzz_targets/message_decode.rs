#![no_main]

use libfuzzer_sys::fuzz_target;
use pst_issuer::{
    decode_header, extract_raw_key, IssueRequest, IssueResponse, P384Sha384, RedeemerRequest, RedeemerResponse,
    VoprfSuite,
};

fuzz_target!(|data: &[u8]| {
    let params = P384Sha384.params();
    let _ = IssueRequest::deserialize(data);
    let _ = IssueResponse::deserialize(data, &params);
    let _ = RedeemerResponse::deserialize(data);
    let _ = extract_raw_key(data);

    // Accepted requests must re-encode to the same bytes
    if let Ok(req) = RedeemerRequest::deserialize(data, &params) {
        assert_eq!(req.serialize(), data);
    }
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = decode_header(s);
    }
});
