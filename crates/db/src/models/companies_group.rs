//! Obligation group models.

use notifications_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `companies_groups` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CompaniesGroup {
    pub id: DbId,
    pub title: String,
    pub code: String,
    pub created_at: Timestamp,
}

/// A group together with the number of templates attached to it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CompaniesGroupSummary {
    pub id: DbId,
    pub title: String,
    pub code: String,
    pub count_emailtemplates: i64,
}
