// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log streaming with secret masking.
//!
//! Every line a job produces passes through the masker before leaving
//! the process, so secret values resolved into the environment never
//! reach stored logs.

use crate::api::CoordinatorApi;
use bb_core::JobId;
use std::sync::Arc;

const MASK: &str = "********";

/// Replaces known secret values in log text.
#[derive(Clone, Default)]
pub struct Masker {
    values: Vec<String>,
}

impl Masker {
    pub fn new(mut values: Vec<String>) -> Self {
        // Longest first, so a value that contains another masks whole.
        values.sort_by_key(|v| std::cmp::Reverse(v.len()));
        values.retain(|v| !v.is_empty());
        Self { values }
    }

    pub fn mask(&self, line: &str) -> String {
        let mut out = line.to_string();
        for value in &self.values {
            if out.contains(value.as_str()) {
                out = out.replace(value.as_str(), MASK);
            }
        }
        out
    }
}

/// Masked log sink for one job.
#[derive(Clone)]
pub struct LogWriter {
    api: Arc<dyn CoordinatorApi>,
    job_id: JobId,
    masker: Masker,
}

impl LogWriter {
    pub fn new(api: Arc<dyn CoordinatorApi>, job_id: JobId, masker: Masker) -> Self {
        Self { api, job_id, masker }
    }

    /// Mask and forward one line. Log loss is not worth failing the
    /// job: errors are logged and swallowed.
    pub async fn append_line(&self, line: &str) {
        let masked = self.masker.mask(line);
        if let Err(err) = self.api.append_log(&self.job_id, &format!("{masked}\n")).await {
            tracing::warn!(job = %self.job_id, error = %err, "dropping log line");
        }
    }
}

#[cfg(test)]
#[path = "log_pipeline_tests.rs"]
mod tests;
