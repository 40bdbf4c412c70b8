// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The envelope itself: data-key generation, AEAD seal, key wrap.

use crate::key_manager::{KeyManager, MASTER_KEY_LEN};
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use bb_core::{Error, ErrorCode};
use std::sync::Arc;

const NONCE_LEN: usize = 12;

/// One encrypted payload plus the wrapped key that opens it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub wrapped_data_key: Vec<u8>,
}

/// Envelope encrypter bound to a key manager.
#[derive(Clone)]
pub struct Encrypter {
    key_manager: Arc<dyn KeyManager>,
}

impl Encrypter {
    pub fn new(key_manager: Arc<dyn KeyManager>) -> Self {
        Self { key_manager }
    }

    /// Encrypt one plaintext under a fresh data key.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Sealed, Error> {
        let mut sealed = self.encrypt_multi(&[plaintext])?;
        // encrypt_multi returns exactly one entry per input.
        sealed.pop().ok_or_else(|| Error::internal("empty envelope"))
    }

    /// Encrypt several plaintexts under one shared data key, wrapped
    /// once. Used where the inputs live and die together (a secret's key
    /// and value); each payload still gets its own nonce.
    pub fn encrypt_multi(&self, plaintexts: &[&[u8]]) -> Result<Vec<Sealed>, Error> {
        let mut data_key = [0u8; MASTER_KEY_LEN];
        OsRng.fill_bytes(&mut data_key);
        let wrapped = self.key_manager.wrap(&data_key)?;
        let cipher = Aes256Gcm::new_from_slice(&data_key)
            .map_err(|_| Error::internal("building data-key cipher"))?;
        plaintexts
            .iter()
            .map(|plaintext| {
                let mut nonce_bytes = [0u8; NONCE_LEN];
                OsRng.fill_bytes(&mut nonce_bytes);
                let nonce = Nonce::from_slice(&nonce_bytes);
                let body = cipher
                    .encrypt(nonce, *plaintext)
                    .map_err(|_| Error::internal("sealing payload"))?;
                let mut ciphertext = Vec::with_capacity(NONCE_LEN + body.len());
                ciphertext.extend_from_slice(&nonce_bytes);
                ciphertext.extend_from_slice(&body);
                Ok(Sealed { ciphertext, wrapped_data_key: wrapped.clone() })
            })
            .collect()
    }

    /// Reverse of [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, ciphertext: &[u8], wrapped_data_key: &[u8]) -> Result<Vec<u8>, Error> {
        if ciphertext.len() < NONCE_LEN + 16 {
            return Err(Error::new(ErrorCode::Internal, "ciphertext too short"));
        }
        let data_key = self.key_manager.unwrap(wrapped_data_key)?;
        let cipher = Aes256Gcm::new_from_slice(&data_key)
            .map_err(|_| Error::internal("building data-key cipher"))?;
        let (nonce_bytes, body) = ciphertext.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        cipher
            .decrypt(nonce, body)
            .map_err(|_| Error::internal("opening payload"))
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
