// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource-name grammar and fully-qualified-name parsing.
//!
//! A resource name is the human-readable handle for a resource within its
//! parent: lowercase ASCII letters, digits, and single interior dashes,
//! 1 to 100 characters. Fully-qualified names join segments with `/`, e.g.
//! `acme/website/builds/42/jobs/test/compile`.

use serde::{Deserialize, Serialize};

/// Maximum length of a single resource-name segment.
pub const NAME_MAX_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceNameError {
    #[error("resource name must not be empty")]
    Empty,
    #[error("resource name exceeds {NAME_MAX_LEN} characters: {0:?}")]
    TooLong(String),
    #[error("resource name contains illegal character {1:?}: {0:?}")]
    IllegalChar(String, char),
    #[error("resource name must not start or end with a dash: {0:?}")]
    EdgeDash(String),
    #[error("fully-qualified name has wrong segment count: {0:?}")]
    BadSegments(String),
}

/// A validated resource-name segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceName(String);

impl ResourceName {
    /// Validate and wrap a name. The grammar is `[a-z0-9]([a-z0-9-]*[a-z0-9])?`
    /// with a 100-character cap; consecutive dashes are allowed, edge dashes
    /// are not.
    pub fn parse(s: impl Into<String>) -> Result<Self, ResourceNameError> {
        let s = s.into();
        if s.is_empty() {
            return Err(ResourceNameError::Empty);
        }
        if s.len() > NAME_MAX_LEN {
            return Err(ResourceNameError::TooLong(s));
        }
        if s.starts_with('-') || s.ends_with('-') {
            return Err(ResourceNameError::EdgeDash(s));
        }
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(ResourceNameError::IllegalChar(s, c));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(any(test, feature = "test-support"))]
impl ResourceName {
    /// Test helper: parse a literal or panic.
    #[allow(clippy::panic)]
    pub fn must(s: &str) -> Self {
        match Self::parse(s) {
            Ok(n) => n,
            Err(e) => panic!("invalid test resource name {s:?}: {e}"),
        }
    }
}

impl TryFrom<String> for ResourceName {
    type Error = ResourceNameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<ResourceName> for String {
    fn from(n: ResourceName) -> Self {
        n.0
    }
}

impl std::fmt::Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ResourceName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ResourceName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Parsed fully-qualified name: alternating collection/name segments under
/// a legal-entity root, e.g. `acme/website/builds/42`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fqn {
    pub legal_entity: ResourceName,
    pub repo: Option<ResourceName>,
    /// Remaining (collection, name) pairs below the repo, in order.
    pub rest: Vec<(String, ResourceName)>,
}

/// Parse a fully-qualified name path.
///
/// Build numbers are plain digit runs and pass the name grammar unchanged,
/// so `acme/website/builds/42/jobs/test/compile` parses with
/// `rest = [("builds", "42"), ("jobs", "test")]`; the trailing odd segment
/// is the job name nested under its workflow and is folded into the last
/// pair's collection path by the caller.
pub fn parse_fqn(path: &str) -> Result<Fqn, ResourceNameError> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let legal_entity = match segments.next() {
        Some(s) => ResourceName::parse(s)?,
        None => return Err(ResourceNameError::Empty),
    };
    let repo = match segments.next() {
        Some(s) => Some(ResourceName::parse(s)?),
        None => None,
    };
    let mut rest = Vec::new();
    loop {
        let collection = match segments.next() {
            Some(s) => s.to_string(),
            None => break,
        };
        let name = match segments.next() {
            Some(s) => ResourceName::parse(s)?,
            None => return Err(ResourceNameError::BadSegments(path.to_string())),
        };
        rest.push((collection, name));
    }
    Ok(Fqn { legal_entity, repo, rest })
}

#[cfg(test)]
#[path = "name_tests.rs"]
mod tests;
