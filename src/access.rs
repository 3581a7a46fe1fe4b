//! Region admission and identifier hygiene.
//!
//! Validation is a gate: it answers yes/no and callers decide whether to
//! reject. Sanitization never rejects; it produces something safe to store or
//! log.

use tracing::{debug, warn};

use crate::error::{GridError, GridResult};

const SANITIZED_MAX_LEN: usize = 50;
const SANITIZED_FALLBACK: &str = "default";
const DANGEROUS_PATTERNS: [&str; 4] = ["<script", "javascript:", "eval(", "exec("];

pub fn default_allow_list() -> Vec<String> {
    [
        "us-west",
        "us-east",
        "us-central",
        "us-south",
        "europe",
        "asia",
        "default",
        "test-region",
        "pgae",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Trim and lowercase, the normal form used for every lookup.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone)]
pub struct AccessControl {
    allow_list: Vec<String>,
}

impl AccessControl {
    pub fn new<I, S>(allow_list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for entry in allow_list {
            let region = normalize(entry.as_ref());
            if !region.is_empty() && !normalized.contains(&region) {
                normalized.push(region);
            }
        }
        Self {
            allow_list: normalized,
        }
    }

    /// Allow-listed identifiers in configuration order.
    pub fn allowed(&self) -> &[String] {
        &self.allow_list
    }

    pub fn validate(&self, raw: &str) -> bool {
        let region = normalize(raw);
        if region.is_empty() {
            warn!("empty region identifier rejected");
            return false;
        }
        if self.allow_list.iter().any(|r| *r == region) {
            debug!(region = %region, "region access granted");
            true
        } else {
            warn!(region = %sanitize(&region), "region access denied");
            false
        }
    }

    /// Validate and return the normalized identifier.
    pub fn admit(&self, raw: &str) -> GridResult<String> {
        if self.validate(raw) {
            Ok(normalize(raw))
        } else {
            Err(GridError::InvalidRegion(sanitize(raw)))
        }
    }
}

impl Default for AccessControl {
    fn default() -> Self {
        Self::new(default_allow_list())
    }
}

pub fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_')
        .take(SANITIZED_MAX_LEN)
        .collect();
    if cleaned.is_empty() {
        SANITIZED_FALLBACK.to_string()
    } else {
        cleaned
    }
}

/// Screens free text from chat-style front-ends before it is routed.
pub fn validate_input(text: &str, max_len: usize) -> bool {
    if text.chars().count() > max_len {
        warn!(len = text.chars().count(), max_len, "input too long");
        return false;
    }
    let lower = text.to_lowercase();
    if let Some(pattern) = DANGEROUS_PATTERNS.iter().copied().find(|p| lower.contains(p)) {
        warn!(pattern, "dangerous pattern detected");
        return false;
    }
    true
}
