//! Asynchronous email job model.

use notifications_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// First send of a template.
pub const JOB_KIND_TRIGGER: &str = "trigger";
/// Repeat send of an already triggered template.
pub const JOB_KIND_RESEND: &str = "resend";

pub const JOB_STATUS_PENDING: &str = "pending";
pub const JOB_STATUS_RUNNING: &str = "running";
pub const JOB_STATUS_DONE: &str = "done";
pub const JOB_STATUS_FAILED: &str = "failed";

/// A row from the `email_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmailJob {
    pub id: DbId,
    pub emailtemplate_id: DbId,
    pub kind: String,
    /// Optional JSON array of company external IDs narrowing the recipients.
    pub external_ids: Option<serde_json::Value>,
    pub status: String,
    pub attempts: i32,
    pub error: Option<String>,
    pub created_at: Timestamp,
    pub claimed_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
}

impl EmailJob {
    /// Decode the stored external-ID filter, if any.
    ///
    /// A stored value that is not a list of strings is an error rather than
    /// "no filter", which would widen the send to the whole group.
    pub fn external_id_filter(&self) -> Result<Option<Vec<String>>, serde_json::Error> {
        self.external_ids
            .as_ref()
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
    }
}
