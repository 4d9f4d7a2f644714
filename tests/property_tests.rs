//! Property-based tests for the wire codecs and key material.

use pst_issuer::*;
use proptest::prelude::*;

const P384: SuiteParams = SuiteParams { element_len: 49, uncompressed_element_len: 97, scalar_len: 48 };

// Property test: key id embedding is lossless for every id and key
proptest! {
    #[test]
    fn key_material_round_trip(
        id in any::<u32>(),
        raw in prop::collection::vec(any::<u8>(), 1..128)
    ) {
        let m = embed_key_id(KeyId(id), &raw).unwrap();
        prop_assert_eq!(m.as_bytes().len(), 4 + raw.len());
        prop_assert_eq!(extract_key_id(m.as_bytes()).unwrap(), KeyId(id));
        prop_assert_eq!(extract_raw_key(m.as_bytes()).unwrap(), raw.as_slice());
        prop_assert_eq!(KeyedMaterial::from_base64(&m.to_base64()).unwrap(), m);
    }
}

// Property test: message codecs round-trip field by field
proptest! {
    #[test]
    fn issue_request_round_trip(blinded in prop::collection::vec(any::<u8>(), 97..=97)) {
        let req = IssueRequest::new(&blinded).unwrap();
        let back = IssueRequest::deserialize(&req.serialize()).unwrap();
        prop_assert_eq!(back.blinded_msg().0.to_vec(), blinded);
    }

    #[test]
    fn issue_response_round_trip(
        issued in any::<u16>(),
        key_id in any::<u32>(),
        signed in prop::collection::vec(any::<u8>(), 49..=49),
        proof in prop::collection::vec(any::<u8>(), 96..=96)
    ) {
        let resp = IssueResponse::new(issued, KeyId(key_id), signed.clone(), proof.clone(), &P384).unwrap();
        let back = IssueResponse::deserialize(&resp.serialize(), &P384).unwrap();
        prop_assert_eq!(back.issued(), issued);
        prop_assert_eq!(back.key_id(), KeyId(key_id));
        prop_assert_eq!(back.signed_nonce(), signed.as_slice());
        prop_assert_eq!(back.evaluate_proof(), proof.as_slice());
    }

    #[test]
    fn redeemer_request_round_trip(
        key_id in any::<u32>(),
        nonce in prop::collection::vec(any::<u8>(), 64..=64),
        w in prop::collection::vec(any::<u8>(), 97..=97),
        client_data in prop::collection::vec(any::<u8>(), 0..512)
    ) {
        let nonce = Nonce::try_from(nonce.as_slice()).unwrap();
        let req = RedeemerRequest::new(KeyId(key_id), nonce, w, client_data, &P384).unwrap();
        prop_assert_eq!(RedeemerRequest::deserialize(&req.serialize(), &P384).unwrap(), req);
    }

    #[test]
    fn redeemer_response_round_trip(
        key_id in any::<u16>(),
        evaluated in prop::collection::vec(any::<u8>(), 0..256),
        validated in any::<bool>(),
        date in 0u64..=(1u64 << 53)
    ) {
        #[allow(clippy::cast_precision_loss)]
        let date = date as f64;
        let resp = RedeemerResponse::new(key_id, evaluated, validated, date);
        prop_assert_eq!(RedeemerResponse::deserialize(&resp.serialize()).unwrap(), resp);
    }
}

// Property test: length invariants
proptest! {
    #[test]
    fn blinded_message_length_is_exact(len in 0usize..300) {
        let buf = vec![4u8; len];
        let res = IssueRequest::new(&buf);
        if len == 97 {
            prop_assert!(res.is_ok());
        } else {
            let is_invalid = matches!(res, Err(PstError::InvalidRequest { .. }));
            prop_assert!(is_invalid);
        }
    }

    #[test]
    fn issue_response_field_lengths_are_exact(nonce_len in 0usize..120, proof_len in 0usize..200) {
        let res = IssueResponse::new(1, KeyId(1), vec![0; nonce_len], vec![0; proof_len], &P384);
        prop_assert_eq!(res.is_ok(), nonce_len == 49 && proof_len == 96);
    }

    #[test]
    fn decoders_never_panic(buf in prop::collection::vec(any::<u8>(), 0..400)) {
        let _ = IssueRequest::deserialize(&buf);
        let _ = IssueResponse::deserialize(&buf, &P384);
        let _ = RedeemerRequest::deserialize(&buf, &P384);
        let _ = RedeemerResponse::deserialize(&buf);
        let _ = extract_raw_key(&buf);
    }
}

// Property test: resolution succeeds exactly for the registered ids
proptest! {
    #[test]
    fn key_resolution_is_total_over_registered_ids(n in 1usize..8, lookup in 0u32..16) {
        let entries = (0..n).map(|i| RawKeyEntry {
            private_key: vec![u8::try_from(i + 1).unwrap(); 48],
            public_key: vec![0x04; 97],
            expiry: 0,
        });
        let store = KeyStore::register(entries).unwrap();
        let registered = (1..=u32::try_from(n).unwrap()).contains(&lookup);
        prop_assert_eq!(store.resolve_signing_key(KeyId(lookup)).is_ok(), registered);
        if !registered {
            let is_unknown = matches!(store.resolve_signing_key(KeyId(lookup)), Err(PstError::UnknownKeyId(id)) if id == KeyId(lookup));
            prop_assert!(is_unknown);
        }
    }
}
