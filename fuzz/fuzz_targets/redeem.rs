#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use pst_issuer::{generate_keyed_pair, KeyEntry, KeyId, KeyStore, Nonce, P384Sha384, PstRedeemer, RedeemerRequest, VoprfSuite};
use rand_core::OsRng;

fn store() -> &'static KeyStore {
    static STORE: OnceLock<KeyStore> = OnceLock::new();
    STORE.get_or_init(|| {
        let (private, public) = generate_keyed_pair(&P384Sha384, KeyId(1), &mut OsRng).unwrap();
        KeyStore::from_entries(vec![KeyEntry::new(public, private, 0).unwrap()]).unwrap()
    })
}

fuzz_target!(|data: &[u8]| {
    // Arbitrary nonce and W under a real key: never an error, never validated
    if data.len() < 64 + 97 {
        return;
    }
    let params = P384Sha384.params();
    let nonce = Nonce::try_from(&data[..64]).unwrap();
    let w = data[64..64 + 97].to_vec();
    let request = RedeemerRequest::new(KeyId(1), nonce, w, data[64 + 97..].iter().copied().take(1024).collect(), &params)
        .unwrap();
    let response = PstRedeemer::new(P384Sha384).redeem(&request, store(), Some(0.0)).unwrap();
    assert!(!response.validated());
});
