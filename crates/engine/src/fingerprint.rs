// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job fingerprints.
//!
//! The fingerprint is a hash over a canonical serialisation of
//! everything that determines a job's outputs. The canonical form is
//! part of the on-disk contract (changing it silently invalidates all
//! historical re-use), so it is built by hand here, field by field,
//! with explicit separators rather than through a serialisation
//! library whose output could drift.

use bb_core::{EnvValue, JobDefinition, JobFingerprint};
use sha2::{Digest, Sha256};

/// Algorithm label stored alongside every fingerprint, so a future
/// migration can tell old rows from new.
pub const FINGERPRINT_HASH_TYPE: &str = "sha256";

/// Record separator. A byte that cannot appear in names or commands
/// keeps distinct field lists from colliding.
const SEP: &[u8] = &[0x1f];

fn feed(hasher: &mut Sha256, field: &str) {
    hasher.update(field.as_bytes());
    hasher.update(SEP);
}

/// Compute the fingerprint of a job definition.
pub fn fingerprint_for(job: &JobDefinition) -> JobFingerprint {
    let mut hasher = Sha256::new();
    feed(&mut hasher, job.workflow.as_str());
    feed(&mut hasher, job.name.as_str());
    feed(&mut hasher, &job.job_type.to_string());
    feed(&mut hasher, job.image.as_deref().unwrap_or(""));
    for step in &job.steps {
        feed(&mut hasher, step.name.as_str());
        for command in &step.commands {
            feed(&mut hasher, command);
        }
    }
    for (key, value) in &job.environment {
        feed(&mut hasher, key);
        match value {
            EnvValue::Literal(text) => feed(&mut hasher, text),
            // Secret values are not observable here; the reference is
            // the input, and rotating a secret's value intentionally
            // does not invalidate re-use.
            EnvValue::Secret(name) => feed(&mut hasher, &format!("secret:{name}")),
        }
    }
    for artifact in &job.artifacts {
        feed(&mut hasher, artifact.group_name.as_str());
        for path in &artifact.paths {
            feed(&mut hasher, path);
        }
    }
    for command in &job.fingerprint_commands {
        feed(&mut hasher, command);
    }
    let digest = hasher.finalize();
    JobFingerprint {
        value: digest.iter().map(|b| format!("{b:02x}")).collect(),
        hash_type: FINGERPRINT_HASH_TYPE.to_string(),
    }
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
mod tests;
