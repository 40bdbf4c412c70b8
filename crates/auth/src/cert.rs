// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-certificate handling.
//!
//! A certificate credential stores the leaf's ASN.1 DER and is looked up
//! by the hex SHA-256 of its DER SubjectPublicKeyInfo. Registration
//! requires the leaf to verify its own signature (self-signed, ed25519
//! or ECDSA P-256); CA-issued chains are a future extension.

use crate::asn1::{self, Element, TAG_BIT_STRING, TAG_CONTEXT_0, TAG_OID, TAG_SEQUENCE};
use bb_core::{Error, ErrorCode};
use ed25519_dalek::Verifier;
use p256::ecdsa::signature::Verifier as _;
use sha2::{Digest, Sha256};

/// DER-encoded OID 1.3.101.112 (Ed25519), value bytes only.
const OID_ED25519: &[u8] = &[0x2b, 0x65, 0x70];

/// DER-encoded OID 1.2.840.10045.4.3.2 (ecdsa-with-SHA256).
const OID_ECDSA_SHA256: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x04, 0x03, 0x02];

/// The pieces of an X.509 certificate the credential store needs.
#[derive(Debug, Clone)]
pub struct ParsedCertificate<'a> {
    /// Full TLV of tbsCertificate: the byte range the signature covers.
    pub tbs_raw: &'a [u8],
    /// Full TLV of the SubjectPublicKeyInfo.
    pub spki_raw: &'a [u8],
    /// Value bytes of the signature algorithm OID.
    pub signature_algorithm_oid: Vec<u8>,
    /// Raw signature bits.
    pub signature: &'a [u8],
    /// Raw subject public key bits.
    pub public_key: &'a [u8],
}

/// Walk `Certificate ::= SEQUENCE { tbsCertificate, signatureAlgorithm,
/// signatureValue }` and pull out the verification inputs.
pub fn parse_certificate(der: &[u8]) -> Result<ParsedCertificate<'_>, Error> {
    let (certificate, trailing) = asn1::expect(der, TAG_SEQUENCE, "certificate")?;
    if !trailing.is_empty() {
        return Err(Error::validation("trailing bytes after certificate"));
    }
    let (tbs, rest) = asn1::expect(certificate.value, TAG_SEQUENCE, "tbsCertificate")?;
    let (sig_alg, rest) = asn1::expect(rest, TAG_SEQUENCE, "signatureAlgorithm")?;
    let (sig_value, rest) = asn1::expect(rest, TAG_BIT_STRING, "signatureValue")?;
    if !rest.is_empty() {
        return Err(Error::validation("trailing bytes after signature"));
    }
    let (alg_oid, _) = asn1::expect(sig_alg.value, TAG_OID, "signature algorithm OID")?;
    let spki = spki_of(&tbs)?;
    let (_, spki_rest) = asn1::expect(spki.value, TAG_SEQUENCE, "spki algorithm")?;
    let (key_bits, _) = asn1::expect(spki_rest, TAG_BIT_STRING, "subjectPublicKey")?;
    Ok(ParsedCertificate {
        tbs_raw: tbs.raw,
        spki_raw: spki.raw,
        signature_algorithm_oid: alg_oid.value.to_vec(),
        signature: asn1::bit_string_bytes(&sig_value)?,
        public_key: asn1::bit_string_bytes(&key_bits)?,
    })
}

/// Locate the SubjectPublicKeyInfo inside tbsCertificate: it follows
/// the optional `[0] version`, serialNumber, signature, issuer,
/// validity, and subject fields.
fn spki_of<'a>(tbs: &Element<'a>) -> Result<Element<'a>, Error> {
    let mut rest = tbs.value;
    let (first, after_first) = asn1::read_element(rest)?;
    rest = if first.tag == TAG_CONTEXT_0 { after_first } else { rest };
    // serialNumber, signature, issuer, validity, subject.
    for _ in 0..5 {
        let (_, next) = asn1::read_element(rest)?;
        rest = next;
    }
    let (spki, _) = asn1::expect(rest, TAG_SEQUENCE, "subjectPublicKeyInfo")?;
    Ok(spki)
}

/// Hex SHA-256 over the DER SubjectPublicKeyInfo: the credential lookup
/// key. Stable for a key pair across re-issued certificates.
pub fn public_key_hash(der: &[u8]) -> Result<String, Error> {
    let parsed = parse_certificate(der)?;
    let digest = Sha256::digest(parsed.spki_raw);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

/// Verify the leaf signs itself. Ed25519 and ECDSA P-256 are the
/// accepted algorithms; anything else is rejected at registration so
/// the stored inventory stays verifiable.
pub fn verify_self_signed(der: &[u8]) -> Result<(), Error> {
    let parsed = parse_certificate(der)?;
    if parsed.signature_algorithm_oid == OID_ED25519 {
        verify_ed25519(&parsed)
    } else if parsed.signature_algorithm_oid == OID_ECDSA_SHA256 {
        verify_p256(&parsed)
    } else {
        Err(Error::new(
            ErrorCode::ValidationFailed,
            "unsupported certificate signature algorithm (ed25519 or ecdsa-p256 required)",
        ))
    }
}

fn verify_ed25519(parsed: &ParsedCertificate<'_>) -> Result<(), Error> {
    let key_bytes: [u8; 32] = parsed
        .public_key
        .try_into()
        .map_err(|_| Error::validation("ed25519 public key must be 32 bytes"))?;
    let key = ed25519_dalek::VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| Error::wrap(ErrorCode::ValidationFailed, "invalid ed25519 public key", e))?;
    let signature = ed25519_dalek::Signature::from_slice(parsed.signature)
        .map_err(|e| Error::wrap(ErrorCode::ValidationFailed, "invalid signature encoding", e))?;
    key.verify(parsed.tbs_raw, &signature)
        .map_err(|e| Error::wrap(ErrorCode::Unauthorized, "certificate is not self-signed", e))
}

fn verify_p256(parsed: &ParsedCertificate<'_>) -> Result<(), Error> {
    // SPKI carries the SEC1-encoded point; the signature is DER ECDSA.
    let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(parsed.public_key)
        .map_err(|e| Error::wrap(ErrorCode::ValidationFailed, "invalid p256 public key", e))?;
    let signature = p256::ecdsa::Signature::from_der(parsed.signature)
        .map_err(|e| Error::wrap(ErrorCode::ValidationFailed, "invalid signature encoding", e))?;
    key.verify(parsed.tbs_raw, &signature)
        .map_err(|e| Error::wrap(ErrorCode::Unauthorized, "certificate is not self-signed", e))
}

#[cfg(test)]
#[path = "cert_tests.rs"]
mod tests;
