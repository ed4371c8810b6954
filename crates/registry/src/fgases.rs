//! FGases (FCS) registry: F-gases undertakings, split EU / non-EU.

use async_trait::async_trait;
use notifications_core::groups::{fgases_group_for_country_type, FGASES_GROUP_CODES};
use serde::Deserialize;
use serde_json::Value;

use crate::client::{RegistryClient, RegistryError};
use crate::config::RegistryConfig;
use crate::ecr::{full_name, normalize_undertaking, Undertaking};
use crate::records::{decode_each, CompanyRef, Rejected, RegistryCompany, RegistryPerson};
use crate::Registry;

pub const NAME: &str = "FGasesRegistry";

#[derive(Debug, Clone, Deserialize)]
pub struct FgasesPerson {
    pub username: String,
    #[serde(default)]
    pub contact_firstname: Option<String>,
    #[serde(default)]
    pub contact_lastname: Option<String>,
    pub contact_email: String,
    pub companyname: String,
    pub country: String,
}

pub fn normalize_company(undertaking: Undertaking) -> RegistryCompany {
    let group_code = fgases_group_for_country_type(&undertaking.address.country.country_type);
    normalize_undertaking(undertaking, group_code)
}

pub fn normalize_person(person: FgasesPerson) -> Result<RegistryPerson, Rejected> {
    if person.contact_email.trim().is_empty() {
        return Err(Rejected::new(person.username, "missing contact email"));
    }
    Ok(RegistryPerson {
        name: full_name(person.contact_firstname, person.contact_lastname),
        username: person.username,
        email: person.contact_email.trim().to_string(),
        company: Some(CompanyRef {
            name: person.companyname,
            country: person.country,
        }),
    })
}

pub fn decode_companies(listed: Vec<Value>) -> Vec<Result<RegistryCompany, Rejected>> {
    decode_each::<Undertaking>(listed, "company_id")
        .into_iter()
        .map(|record| record.map(normalize_company))
        .collect()
}

pub fn decode_persons(listed: Vec<Value>) -> Vec<Result<RegistryPerson, Rejected>> {
    decode_each::<FgasesPerson>(listed, "username")
        .into_iter()
        .map(|record| record.and_then(normalize_person))
        .collect()
}

/// Live FGases registry.
pub struct FgasesRegistry {
    client: RegistryClient,
    companies_path: String,
    persons_path: String,
}

impl FgasesRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        Ok(Self {
            client: RegistryClient::new(NAME, config.fgases.clone(), config.timeout_secs)?,
            companies_path: config.fgases_companies_path.clone(),
            persons_path: config.fgases_persons_path.clone(),
        })
    }
}

#[async_trait]
impl Registry for FgasesRegistry {
    fn name(&self) -> &'static str {
        NAME
    }

    fn group_codes(&self) -> &'static [&'static str] {
        FGASES_GROUP_CODES
    }

    async fn companies(&self) -> Result<Vec<Result<RegistryCompany, Rejected>>, RegistryError> {
        let listed = self.client.fetch_records(&self.companies_path).await?;
        Ok(decode_companies(listed))
    }

    async fn persons(&self) -> Result<Vec<Result<RegistryPerson, Rejected>>, RegistryError> {
        let listed = self.client.fetch_records(&self.persons_path).await?;
        Ok(decode_persons(listed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifications_core::groups::{FGASES_EU_GROUP_CODE, FGASES_NONEU_GROUP_CODE};

    fn undertaking(country_type: &str) -> Undertaking {
        serde_json::from_value(serde_json::json!({
            "company_id": "F1",
            "name": "Frost GmbH",
            "address": {"country": {"code": "DE", "name": "Germany", "type": country_type}}
        }))
        .unwrap()
    }

    #[test]
    fn country_type_selects_group() {
        assert_eq!(normalize_company(undertaking("EU_TYPE")).group_code, FGASES_EU_GROUP_CODE);
        assert_eq!(
            normalize_company(undertaking("AMBIGUOUS_TYPE")).group_code,
            FGASES_NONEU_GROUP_CODE
        );
    }

    #[test]
    fn person_without_email_is_rejected() {
        let rejected = normalize_person(FgasesPerson {
            username: "nomail".into(),
            contact_firstname: Some("No".into()),
            contact_lastname: None,
            contact_email: "".into(),
            companyname: "Frost GmbH".into(),
            country: "Germany".into(),
        })
        .unwrap_err();
        assert_eq!(rejected.key, "nomail");
    }
}
