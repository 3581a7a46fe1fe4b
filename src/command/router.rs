use serde::Serialize;
use strum::Display;

use crate::access::AccessControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Intent {
    Optimize,
    Status,
    Analyze,
    Help,
    Unknown,
}

/// Keyword table, checked top to bottom.
///
/// The verb "optimize" outranks the status words, the noun "optimization"
/// does not: "show last optimization" asks for a status.
const KEYWORDS: &[(Intent, &[&str])] = &[
    (Intent::Optimize, &["optimize"]),
    (Intent::Status, &["status", "last", "recent"]),
    (Intent::Optimize, &["optimization"]),
    (Intent::Analyze, &["analyze", "analysis"]),
    (Intent::Help, &["help"]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutedCommand {
    pub intent: Intent,
    pub region: Option<String>,
}

/// Pure classifier from free text to an intent and an optional region.
#[derive(Debug, Clone)]
pub struct CommandRouter {
    regions: Vec<String>,
}

impl CommandRouter {
    pub fn new(access: &AccessControl) -> Self {
        Self {
            regions: access.allowed().to_vec(),
        }
    }

    pub fn route(&self, text: &str) -> RoutedCommand {
        let lower = text.to_lowercase();
        RoutedCommand {
            intent: classify(&lower),
            region: self.extract_region(&lower),
        }
    }

    fn extract_region(&self, lower: &str) -> Option<String> {
        if let Some(region) = self.regions.iter().find(|r| lower.contains(r.as_str())) {
            return Some(region.clone());
        }
        let mut tokens = lower.split_whitespace();
        while let Some(token) = tokens.next() {
            if token == "region" {
                let next = tokens
                    .next()?
                    .trim_end_matches(|c: char| c.is_ascii_punctuation());
                return (!next.is_empty()).then(|| next.to_string());
            }
        }
        None
    }
}

fn classify(lower: &str) -> Intent {
    KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Unknown)
}
