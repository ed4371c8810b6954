//! Summary of a registry synchronization run.

use serde::Serialize;

/// A record skipped during a fetch, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchIssue {
    /// `company` or `person`.
    pub kind: &'static str,
    /// External id or username of the skipped record.
    pub key: String,
    pub reason: String,
}

/// Counts and skipped records for one registry fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchReport {
    pub registry: String,
    pub companies: usize,
    pub persons: usize,
    /// Number of person-company links marked current by this fetch.
    pub links: usize,
    pub errors: Vec<FetchIssue>,
}

impl FetchReport {
    pub fn new(registry: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
            ..Self::default()
        }
    }

    pub fn skip(&mut self, kind: &'static str, key: impl Into<String>, reason: impl Into<String>) {
        self.errors.push(FetchIssue {
            kind,
            key: key.into(),
            reason: reason.into(),
        });
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable outcome shown to staff.
    pub fn message(&self) -> String {
        if self.is_success() {
            format!(
                "Registry fetched successfully: {} companies, {} persons",
                self.companies, self.persons
            )
        } else {
            let skipped: Vec<String> = self
                .errors
                .iter()
                .map(|e| format!("({}, {})", e.reason, e.key))
                .collect();
            format!("Registry fetched with errors: [{}]", skipped.join(", "))
        }
    }
}
