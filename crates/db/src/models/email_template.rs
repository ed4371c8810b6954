//! Cycle email template model and DTOs.

use chrono::NaiveDate;
use notifications_core::template_status::TemplateStatus;
use notifications_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `cycle_email_templates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CycleEmailTemplate {
    pub id: DbId,
    pub subject: String,
    pub body_html: String,
    pub stage_id: DbId,
    pub group_id: DbId,
    #[sqlx(try_from = "i16")]
    pub status: TemplateStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CycleEmailTemplate {
    pub fn is_triggered(&self) -> bool {
        self.status.is_triggered()
    }
}

/// A template joined with its stage, cycle and group.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TemplateDetail {
    pub id: DbId,
    pub subject: String,
    pub body_html: String,
    #[sqlx(try_from = "i16")]
    pub status: TemplateStatus,
    pub stage_id: DbId,
    pub stage_title: String,
    pub cycle_id: DbId,
    pub cycle_year: i16,
    pub closing_date: NaiveDate,
    pub group_id: DbId,
    pub group_code: String,
    pub group_title: String,
    pub updated_at: Timestamp,
}

impl TemplateDetail {
    pub fn is_triggered(&self) -> bool {
        self.status.is_triggered()
    }

    /// Display label, e.g. `2024 Reminder Cars`.
    pub fn label(&self) -> String {
        format!("{} {} {}", self.cycle_year, self.stage_title, self.group_title)
    }
}

/// DTO for editing a template's content.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCycleEmailTemplate {
    pub subject: Option<String>,
    pub body_html: Option<String>,
}
