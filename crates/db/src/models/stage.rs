//! Cycle stage model and DTOs.

use notifications_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `stages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Stage {
    pub id: DbId,
    pub title: String,
    pub cycle_id: DbId,
    pub created_at: Timestamp,
}

/// DTO for adding a stage to a cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStage {
    pub title: String,
}
