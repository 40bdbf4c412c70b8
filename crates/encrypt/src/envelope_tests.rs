// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::key_manager::LocalKeyManager;
use proptest::prelude::*;

fn encrypter() -> Encrypter {
    let (_, manager) = LocalKeyManager::generate();
    Encrypter::new(Arc::new(manager))
}

#[test]
fn round_trip() {
    let enc = encrypter();
    let sealed = enc.encrypt(b"the plans").unwrap();
    let opened = enc.decrypt(&sealed.ciphertext, &sealed.wrapped_data_key).unwrap();
    assert_eq!(opened, b"the plans");
}

#[test]
fn ciphertext_differs_from_plaintext_and_per_call() {
    let enc = encrypter();
    let a = enc.encrypt(b"same input").unwrap();
    let b = enc.encrypt(b"same input").unwrap();
    assert_ne!(a.ciphertext, b"same input".to_vec());
    // Fresh data key and nonce every call.
    assert_ne!(a.ciphertext, b.ciphertext);
    assert_ne!(a.wrapped_data_key, b.wrapped_data_key);
}

#[test]
fn multi_shares_one_wrapped_key() {
    let enc = encrypter();
    let sealed = enc.encrypt_multi(&[b"key".as_slice(), b"value".as_slice()]).unwrap();
    assert_eq!(sealed.len(), 2);
    assert_eq!(sealed[0].wrapped_data_key, sealed[1].wrapped_data_key);
    // Payload nonces still differ.
    assert_ne!(sealed[0].ciphertext, sealed[1].ciphertext);
    assert_eq!(enc.decrypt(&sealed[0].ciphertext, &sealed[0].wrapped_data_key).unwrap(), b"key");
    assert_eq!(
        enc.decrypt(&sealed[1].ciphertext, &sealed[1].wrapped_data_key).unwrap(),
        b"value"
    );
}

#[test]
fn wrong_master_key_fails_closed() {
    let enc_a = encrypter();
    let enc_b = encrypter();
    let sealed = enc_a.encrypt(b"secret").unwrap();
    assert!(enc_b.decrypt(&sealed.ciphertext, &sealed.wrapped_data_key).is_err());
}

#[test]
fn tampered_ciphertext_fails_closed() {
    let enc = encrypter();
    let mut sealed = enc.encrypt(b"secret").unwrap();
    let last = sealed.ciphertext.len() - 1;
    sealed.ciphertext[last] ^= 0x01;
    assert!(enc.decrypt(&sealed.ciphertext, &sealed.wrapped_data_key).is_err());
}

#[test]
fn truncated_inputs_fail_closed() {
    let enc = encrypter();
    assert!(enc.decrypt(b"short", b"also short").is_err());
}

proptest! {
    #[test]
    fn round_trips_arbitrary_payloads(payload in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let enc = encrypter();
        let sealed = enc.encrypt(&payload).unwrap();
        let opened = enc.decrypt(&sealed.ciphertext, &sealed.wrapped_data_key).unwrap();
        prop_assert_eq!(opened, payload);
    }
}
