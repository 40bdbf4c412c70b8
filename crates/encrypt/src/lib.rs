// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bb-encrypt: per-record envelope encryption.
//!
//! Every record gets its own 32-byte data key; the plaintext is sealed
//! under that key with AES-256-GCM, and the data key is stored wrapped
//! under the process-wide master key. Rotating the master key only
//! requires re-wrapping data keys, never re-encrypting payloads.

mod envelope;
mod key_manager;

pub use envelope::{Encrypter, Sealed};
pub use key_manager::{KeyManager, LocalKeyManager, MASTER_KEY_LEN};
