// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The error envelope every failing response carries.

use bb_core::{Error, ErrorCode};
use serde::{Deserialize, Serialize};

/// Stable wire form of a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: ErrorCode,
    pub http_status_code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&Error> for ErrorEnvelope {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code,
            http_status_code: err.code.http_status(),
            message: err.external_message().to_string(),
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_redacts_internal_messages() {
        let err = Error::new(ErrorCode::Timeout, "pool exhausted on shard 3");
        let envelope = ErrorEnvelope::from(&err);
        assert_eq!(envelope.http_status_code, 500);
        assert_eq!(envelope.message, "internal error");
    }

    #[test]
    fn envelope_passes_external_messages() {
        let err = Error::not_found("build bld-x");
        let envelope = ErrorEnvelope::from(&err);
        assert_eq!(envelope.code, ErrorCode::NotFound);
        assert_eq!(envelope.http_status_code, 404);
        assert_eq!(envelope.message, "build bld-x not found");
    }

    #[test]
    fn envelope_serde_shape() {
        let envelope = ErrorEnvelope {
            code: ErrorCode::OptimisticLockFailed,
            http_status_code: 412,
            message: "etag mismatch".into(),
            details: None,
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["code"], "optimistic_lock_failed");
        assert_eq!(json["http_status_code"], 412);
    }
}
