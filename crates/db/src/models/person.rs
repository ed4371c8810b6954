//! Person (contact) model and DTOs.

use notifications_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `persons` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Person {
    pub id: DbId,
    pub username: String,
    pub name: String,
    pub email: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields written when upserting a person by username.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertPerson {
    pub username: String,
    pub name: String,
    pub email: String,
}

/// A row from the `person_companies` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PersonCompany {
    pub id: DbId,
    pub person_id: DbId,
    pub company_id: DbId,
    pub current: bool,
}

/// A company a person is currently linked to, with its group code.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PersonCompanyEntry {
    pub company_id: DbId,
    pub external_id: Option<String>,
    pub name: String,
    pub country: String,
    pub group_code: String,
}
