// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn masks_single_value() {
    let masker = Masker::new(vec!["hunter2".into()]);
    assert_eq!(masker.mask("password is hunter2!"), "password is ********!");
}

#[test]
fn masks_every_occurrence() {
    let masker = Masker::new(vec!["s3cret".into()]);
    assert_eq!(masker.mask("s3cret and again s3cret"), "******** and again ********");
}

#[test]
fn masks_longest_value_first() {
    let masker = Masker::new(vec!["abc".into(), "abcdef".into()]);
    // The longer value must not be half-masked by its prefix.
    assert_eq!(masker.mask("abcdef"), "********");
}

#[test]
fn ignores_empty_values() {
    let masker = Masker::new(vec![String::new()]);
    assert_eq!(masker.mask("unchanged"), "unchanged");
}

#[test]
fn plain_lines_pass_through() {
    let masker = Masker::new(vec!["hunter2".into()]);
    assert_eq!(masker.mask("nothing to hide"), "nothing to hide");
}
