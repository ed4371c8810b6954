//! Lifecycle of a cycle email template.
//!
//! The numeric ids are persisted in `cycle_email_templates.status` and must
//! not be renumbered.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Status of a [cycle email template](crate::params).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    Draft,
    Processing,
    Sent,
}

impl TemplateStatus {
    /// Database representation.
    pub fn id(self) -> i16 {
        match self {
            Self::Draft => 0,
            Self::Processing => 1,
            Self::Sent => 2,
        }
    }

    /// Parse the database representation. Unknown values yield `None`.
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(Self::Draft),
            1 => Some(Self::Processing),
            2 => Some(Self::Sent),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Processing => "processing",
            Self::Sent => "sent",
        }
    }

    /// A triggered template can no longer be edited.
    pub fn is_triggered(self) -> bool {
        matches!(self, Self::Processing | Self::Sent)
    }
}

impl TryFrom<i16> for TemplateStatus {
    type Error = CoreError;

    fn try_from(id: i16) -> Result<Self, Self::Error> {
        Self::from_id(id)
            .ok_or_else(|| CoreError::Internal(format!("Unknown template status id {id}")))
    }
}

impl std::fmt::Display for TemplateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
