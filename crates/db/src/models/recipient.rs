//! Recipient rows: one current person-company link in a template's group.

use chrono::NaiveDate;
use notifications_core::params::RecipientContext;
use notifications_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Recipient {
    pub person_id: DbId,
    pub person_name: String,
    pub email: String,
    pub company_id: DbId,
    pub external_id: Option<String>,
    pub company_name: String,
    pub country: String,
    pub vat: Option<String>,
    pub representative_name: Option<String>,
    pub representative_vat: Option<String>,
    pub representative_country_name: Option<String>,
}

impl Recipient {
    /// Parameter context for rendering this recipient's email.
    pub fn context(&self, closing_date: NaiveDate) -> RecipientContext {
        RecipientContext {
            external_id: self.external_id.clone(),
            company_name: self.company_name.clone(),
            country: self.country.clone(),
            vat: self.vat.clone(),
            representative_name: self.representative_name.clone(),
            representative_vat: self.representative_vat.clone(),
            representative_country_name: self.representative_country_name.clone(),
            contact_name: self.person_name.clone(),
            closing_date: Some(closing_date),
        }
    }
}
