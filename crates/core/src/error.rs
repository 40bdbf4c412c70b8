// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Closed error taxonomy shared by every service.
//!
//! Callers classify failures by [`ErrorCode`], never by message text. The
//! code set is part of the external contract: each code maps to a stable
//! HTTP status and an internal/external disposition.

use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Error>;

/// Stable error codes. Adding a variant is a wire-contract change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    AlreadyExists,
    OptimisticLockFailed,
    ValidationFailed,
    InvalidQueryParameter,
    Unauthorized,
    AccountDisabled,
    RunnerDisabled,
    LogClosed,
    Timeout,
    ArtifactUploadFailed,
    Internal,
}

crate::simple_display! {
    ErrorCode {
        NotFound => "not_found",
        AlreadyExists => "already_exists",
        OptimisticLockFailed => "optimistic_lock_failed",
        ValidationFailed => "validation_failed",
        InvalidQueryParameter => "invalid_query_parameter",
        Unauthorized => "unauthorized",
        AccountDisabled => "account_disabled",
        RunnerDisabled => "runner_disabled",
        LogClosed => "log_closed",
        Timeout => "timeout",
        ArtifactUploadFailed => "artifact_upload_failed",
        Internal => "internal",
    }
}

impl ErrorCode {
    /// HTTP status the transport layer maps this code to.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::AlreadyExists => 400,
            ErrorCode::OptimisticLockFailed => 412,
            ErrorCode::ValidationFailed => 400,
            ErrorCode::InvalidQueryParameter => 400,
            ErrorCode::Unauthorized => 401,
            ErrorCode::AccountDisabled => 403,
            // A disabled runner is indistinguishable from a missing one.
            ErrorCode::RunnerDisabled => 404,
            ErrorCode::LogClosed => 410,
            ErrorCode::Timeout => 500,
            ErrorCode::ArtifactUploadFailed => 500,
            ErrorCode::Internal => 500,
        }
    }

    /// True when the full message may be shown to external callers.
    /// Internal codes surface a redacted message.
    pub fn is_external(self) -> bool {
        !matches!(
            self,
            ErrorCode::Timeout | ErrorCode::ArtifactUploadFailed
        )
    }
}

/// A classified error carrying an optional wrapped cause.
#[derive(Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), source: None }
    }

    pub fn wrap(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self { code, message: message.into(), source: Some(Box::new(source)) }
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::NotFound, format!("{what} not found"))
    }

    pub fn already_exists(what: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::AlreadyExists, format!("{what} already exists"))
    }

    pub fn optimistic_lock_failed(what: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::OptimisticLockFailed,
            format!("{what} was modified concurrently; re-read and retry"),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::NotFound
    }

    pub fn is_already_exists(&self) -> bool {
        self.code == ErrorCode::AlreadyExists
    }

    pub fn is_optimistic_lock_failed(&self) -> bool {
        self.code == ErrorCode::OptimisticLockFailed
    }

    /// Message safe to return to external callers.
    pub fn external_message(&self) -> &str {
        if self.code.is_external() {
            &self.message
        } else {
            "internal error"
        }
    }
}

/// Walk an error chain looking for a classified [`Error`]; defaults to
/// [`ErrorCode::Internal`] when none is found.
pub fn classify(err: &(dyn std::error::Error + 'static)) -> ErrorCode {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(classified) = e.downcast_ref::<Error>() {
            return classified.code;
        }
        current = e.source();
    }
    ErrorCode::Internal
}

/// Aggregates validation findings across a whole request so callers see
/// every problem at once instead of one per round-trip.
#[derive(Debug, Default)]
pub struct ValidationErrors {
    findings: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, finding: impl Into<String>) {
        self.findings.push(finding.into());
    }

    /// Record the failure side of a result, passing successes through.
    pub fn check<T, E: std::fmt::Display>(&mut self, result: std::result::Result<T, E>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.add(e.to_string());
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn findings(&self) -> &[String] {
        &self.findings
    }

    /// Collapse into a single `ValidationFailed` error, or `Ok(())`.
    pub fn into_result(self) -> Result<()> {
        if self.findings.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(self.findings.join("; ")))
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
