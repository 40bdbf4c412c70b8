// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Master-key abstraction.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use bb_core::{Error, ErrorCode};

/// Size of the master key and of every data key (AES-256).
pub const MASTER_KEY_LEN: usize = 32;

/// Size of the AES-GCM nonce prepended to wrapped keys.
const NONCE_LEN: usize = 12;

/// Wraps and unwraps per-record data keys under a master key. The local
/// implementation holds the key in process memory; a KMS-backed variant
/// implements the same two calls against an external service.
pub trait KeyManager: Send + Sync + 'static {
    /// Seal a data key for storage.
    fn wrap(&self, data_key: &[u8]) -> Result<Vec<u8>, Error>;
    /// Recover a data key from its stored wrapped form.
    fn unwrap(&self, wrapped: &[u8]) -> Result<Vec<u8>, Error>;
}

/// In-memory master key, loaded once at startup wiring.
pub struct LocalKeyManager {
    cipher: Aes256Gcm,
}

impl LocalKeyManager {
    pub fn new(master_key: &[u8; MASTER_KEY_LEN]) -> Self {
        // 32-byte slice always fits the AES-256 key size.
        #[allow(clippy::expect_used)]
        let cipher = Aes256Gcm::new_from_slice(master_key).expect("fixed-size key");
        Self { cipher }
    }

    /// Generate a fresh random master key (first-start provisioning).
    pub fn generate() -> ([u8; MASTER_KEY_LEN], Self) {
        let mut key = [0u8; MASTER_KEY_LEN];
        OsRng.fill_bytes(&mut key);
        let manager = Self::new(&key);
        (key, manager)
    }
}

impl KeyManager for LocalKeyManager {
    fn wrap(&self, data_key: &[u8]) -> Result<Vec<u8>, Error> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let sealed = self
            .cipher
            .encrypt(nonce, data_key)
            .map_err(|_| Error::internal("wrapping data key"))?;
        // Layout: nonce || ciphertext.
        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn unwrap(&self, wrapped: &[u8]) -> Result<Vec<u8>, Error> {
        if wrapped.len() < NONCE_LEN + 16 {
            return Err(Error::new(ErrorCode::Internal, "wrapped data key too short"));
        }
        let (nonce_bytes, sealed) = wrapped.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        self.cipher
            .decrypt(nonce, sealed)
            .map_err(|_| Error::internal("unwrapping data key"))
    }
}
