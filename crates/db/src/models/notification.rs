//! Send-log models.

use notifications_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `cycle_notifications` table: one email sent to one person.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CycleNotification {
    pub id: DbId,
    pub subject: String,
    pub email: String,
    pub body_html: String,
    pub sent_date: Timestamp,
    pub emailtemplate_id: DbId,
    pub counter: i32,
    pub person_id: DbId,
    pub company_id: DbId,
}

/// Fields recorded for a sent email. The counter is assigned on insert.
#[derive(Debug, Clone)]
pub struct CreateCycleNotification {
    pub subject: String,
    pub email: String,
    pub body_html: String,
    pub emailtemplate_id: DbId,
    pub person_id: DbId,
    pub company_id: DbId,
}

/// A stage a person was notified for, used on the person detail view.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotifiedStage {
    pub stage_id: DbId,
    pub stage_title: String,
    pub cycle_year: i16,
    pub last_sent: Timestamp,
}
