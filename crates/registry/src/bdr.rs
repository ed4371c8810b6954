//! BDR registry: car and van manufacturers.

use async_trait::async_trait;
use notifications_core::groups::{BDR_GROUP_CODES, CARS_GROUP_CODE, VANS_GROUP_CODE};
use serde::Deserialize;
use serde_json::Value;

use crate::client::{RegistryClient, RegistryError};
use crate::config::RegistryConfig;
use crate::records::{
    decode_each, id_string, non_blank, CompanyRef, Rejected, RegistryCompany, RegistryPerson,
    WireRepresentative,
};
use crate::Registry;

pub const NAME: &str = "BDRRegistry";

#[derive(Debug, Clone, Deserialize)]
pub struct BdrCompany {
    #[serde(deserialize_with = "id_string")]
    pub userid: String,
    pub name: String,
    #[serde(default)]
    pub vat_number: Option<String>,
    pub country_name: String,
    #[serde(default)]
    pub obligation: Option<String>,
    #[serde(default)]
    pub representative: Option<WireRepresentative>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BdrPerson {
    #[serde(deserialize_with = "id_string")]
    pub userid: String,
    pub contactname: String,
    pub contactemail: String,
    pub companyname: String,
    pub country: String,
}

/// Map a BDR obligation to its group code.
pub fn group_for_obligation(obligation: &str) -> Option<&'static str> {
    match obligation.trim().to_ascii_lowercase().as_str() {
        "cars" => Some(CARS_GROUP_CODE),
        "vans" => Some(VANS_GROUP_CODE),
        _ => None,
    }
}

pub fn normalize_company(company: BdrCompany) -> Result<RegistryCompany, Rejected> {
    let obligation = company.obligation.unwrap_or_default();
    let group_code = group_for_obligation(&obligation).ok_or_else(|| {
        Rejected::new(&company.userid, format!("unknown obligation '{obligation}'"))
    })?;
    let representative = company.representative.unwrap_or_default();

    Ok(RegistryCompany {
        external_id: company.userid,
        name: company.name,
        vat: non_blank(company.vat_number),
        country: company.country_name,
        group_code,
        status: String::new(),
        representative_country_name: non_blank(representative.country()),
        representative_name: non_blank(representative.name),
        representative_vat: non_blank(representative.vatnumber),
        check_passed: None,
        usernames: Vec::new(),
    })
}

pub fn normalize_person(person: BdrPerson) -> Result<RegistryPerson, Rejected> {
    if person.contactemail.trim().is_empty() {
        return Err(Rejected::new(person.userid, "missing contact email"));
    }
    Ok(RegistryPerson {
        username: person.userid,
        name: person.contactname,
        email: person.contactemail.trim().to_string(),
        company: Some(CompanyRef {
            name: person.companyname,
            country: person.country,
        }),
    })
}

pub fn decode_companies(listed: Vec<Value>) -> Vec<Result<RegistryCompany, Rejected>> {
    decode_each::<BdrCompany>(listed, "userid")
        .into_iter()
        .map(|record| record.and_then(normalize_company))
        .collect()
}

pub fn decode_persons(listed: Vec<Value>) -> Vec<Result<RegistryPerson, Rejected>> {
    decode_each::<BdrPerson>(listed, "userid")
        .into_iter()
        .map(|record| record.and_then(normalize_person))
        .collect()
}

/// Live BDR registry.
pub struct BdrRegistry {
    client: RegistryClient,
    companies_path: String,
    persons_path: String,
}

impl BdrRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        Ok(Self {
            client: RegistryClient::new(NAME, config.bdr.clone(), config.timeout_secs)?,
            companies_path: config.bdr_companies_path.clone(),
            persons_path: config.bdr_persons_path.clone(),
        })
    }
}

#[async_trait]
impl Registry for BdrRegistry {
    fn name(&self) -> &'static str {
        NAME
    }

    fn group_codes(&self) -> &'static [&'static str] {
        BDR_GROUP_CODES
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
