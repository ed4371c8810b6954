//! Reporting cycle model and DTOs.

use chrono::NaiveDate;
use notifications_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `cycles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Cycle {
    pub id: DbId,
    pub year: i16,
    pub closing_date: NaiveDate,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCycle {
    pub year: i16,
    pub closing_date: NaiveDate,
}

/// DTO for editing a cycle. The year is fixed once created.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCycle {
    pub closing_date: Option<NaiveDate>,
}
