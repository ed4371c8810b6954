//! Company entity model and DTOs.

use notifications_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `companies` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Company {
    pub id: DbId,
    pub external_id: Option<String>,
    pub name: String,
    pub vat: Option<String>,
    pub country: String,
    pub group_id: DbId,
    pub status: String,
    pub representative_name: Option<String>,
    pub representative_vat: Option<String>,
    pub representative_country_name: Option<String>,
    pub check_passed: Option<bool>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields written when creating or upserting a company.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCompany {
    pub external_id: Option<String>,
    pub name: String,
    pub vat: Option<String>,
    pub country: String,
    pub group_id: DbId,
    #[serde(default)]
    pub status: String,
    pub representative_name: Option<String>,
    pub representative_vat: Option<String>,
    pub representative_country_name: Option<String>,
    pub check_passed: Option<bool>,
}
