// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    sha1 = { "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa" },
    sha256 = { "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa" },
)]
fn commit_sha_accepts(sha: &str) {
    assert!(commit_sha(sha).is_ok());
}

#[parameterized(
    short = { "abc123" },
    upper = { "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA" },
    non_hex = { "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz" },
    empty = { "" },
)]
fn commit_sha_rejects(sha: &str) {
    assert!(commit_sha(sha).is_err());
}

#[parameterized(
    branch = { "refs/heads/main" },
    tag = { "refs/tags/v1.0" },
)]
fn git_ref_accepts(r: &str) {
    assert!(git_ref(r).is_ok());
}

#[parameterized(
    empty = { "" },
    spaced = { "refs/heads/my branch" },
    dotdot = { "refs/../escape" },
)]
fn git_ref_rejects(r: &str) {
    assert!(git_ref(r).is_err());
}

#[test]
fn page_limit_caps_and_rejects() {
    assert_eq!(page_limit(10, 100).unwrap(), 10);
    assert_eq!(page_limit(500, 100).unwrap(), 100);
    let err = page_limit(0, 100).unwrap_err();
    assert_eq!(err.code, crate::error::ErrorCode::InvalidQueryParameter);
    assert!(page_limit(-3, 100).is_err());
}
