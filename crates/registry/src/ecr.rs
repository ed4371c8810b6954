//! European Cache Registry: ODS and F-gases undertakings.
//!
//! Companies are listed per domain. Persons carry no company reference; the
//! company records list the usernames of their users instead.

use async_trait::async_trait;
use notifications_core::groups::{fgases_group_for_country_type, ECR_GROUP_CODES, ODS_GROUP_CODE};
use serde::Deserialize;
use serde_json::Value;

use crate::client::{RegistryClient, RegistryError};
use crate::config::RegistryConfig;
use crate::records::{
    decode_each, id_string, non_blank, Rejected, RegistryCompany, RegistryPerson, WireAddress,
    WireRepresentative, WireUser,
};
use crate::Registry;

pub const NAME: &str = "EuropeanCacheRegistry";

/// Placeholder in the company path replaced by each configured domain.
pub const DOMAIN_PLACEHOLDER: &str = "[domain]";

pub const DOMAIN_ODS: &str = "ODS";
pub const DOMAIN_FGAS: &str = "FGAS";

/// An undertaking as listed by ECR and FCS.
#[derive(Debug, Clone, Deserialize)]
pub struct Undertaking {
    #[serde(deserialize_with = "id_string")]
    pub company_id: String,
    pub name: String,
    #[serde(default)]
    pub vat: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub check_passed: Option<bool>,
    pub address: WireAddress,
    #[serde(default)]
    pub users: Vec<WireUser>,
    #[serde(default)]
    pub representative: Option<WireRepresentative>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EcrPerson {
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub email: String,
}

/// Map an ECR domain and country type to a group code.
pub fn group_for_domain(domain: &str, country_type: &str) -> Option<&'static str> {
    match domain.to_ascii_uppercase().as_str() {
        DOMAIN_ODS => Some(ODS_GROUP_CODE),
        DOMAIN_FGAS => Some(fgases_group_for_country_type(country_type)),
        _ => None,
    }
}

/// Normalize an undertaking into `group_code`. Shared with the FGases registry.
pub fn normalize_undertaking(undertaking: Undertaking, group_code: &'static str) -> RegistryCompany {
    let representative = undertaking.representative.unwrap_or_default();
    RegistryCompany {
        external_id: undertaking.company_id,
        name: undertaking.name,
        vat: non_blank(undertaking.vat),
        country: undertaking.address.country.name,
        group_code,
        status: undertaking.status.unwrap_or_default(),
        representative_country_name: non_blank(representative.country()),
        representative_name: non_blank(representative.name),
        representative_vat: non_blank(representative.vatnumber),
        check_passed: undertaking.check_passed,
        usernames: undertaking.users.into_iter().map(|u| u.username).collect(),
    }
}

pub fn normalize_company(
    undertaking: Undertaking,
    domain: &str,
) -> Result<RegistryCompany, Rejected> {
    let group_code = group_for_domain(domain, &undertaking.address.country.country_type)
        .ok_or_else(|| {
            Rejected::new(&undertaking.company_id, format!("unknown domain '{domain}'"))
        })?;
    Ok(normalize_undertaking(undertaking, group_code))
}

pub fn normalize_person(person: EcrPerson) -> Result<RegistryPerson, Rejected> {
    if person.email.trim().is_empty() {
        return Err(Rejected::new(person.username, "missing email"));
    }
    Ok(RegistryPerson {
        name: full_name(person.first_name, person.last_name),
        username: person.username,
        email: person.email.trim().to_string(),
        company: None,
    })
}

/// `first last`, either part optional.
pub fn full_name(first: Option<String>, last: Option<String>) -> String {
    format!("{} {}", first.unwrap_or_default(), last.unwrap_or_default())
        .trim()
        .to_string()
}

pub fn decode_companies(
    listed: Vec<Value>,
    domain: &str,
) -> Vec<Result<RegistryCompany, Rejected>> {
    decode_each::<Undertaking>(listed, "company_id")
        .into_iter()
        .map(|record| record.and_then(|u| normalize_company(u, domain)))
        .collect()
}

pub fn decode_persons(listed: Vec<Value>) -> Vec<Result<RegistryPerson, Rejected>> {
    decode_each::<EcrPerson>(listed, "username")
        .into_iter()
        .map(|record| record.and_then(normalize_person))
        .collect()
}

/// Live European Cache Registry.
pub struct EcrRegistry {
    client: RegistryClient,
    domains: Vec<String>,
    company_path: String,
    person_path: String,
}

impl EcrRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        Ok(Self {
            client: RegistryClient::new(NAME, config.ecr.clone(), config.timeout_secs)?,
            domains: config.ecr_domains.clone(),
            company_path: config.ecr_company_path.clone(),
            person_path: config.ecr_person_path.clone(),
        })
    }
}

#[async_trait]
impl Registry for EcrRegistry {
    fn name(&self) -> &'static str {
        NAME
    }

    fn group_codes(&self) -> &'static [&'static str] {
        ECR_GROUP_CODES
    }

    async fn companies(&self) -> Result<Vec<Result<RegistryCompany, Rejected>>, RegistryError> {
        let mut companies = Vec::new();
        for domain in &self.domains {
            let path = self.company_path.replace(DOMAIN_PLACEHOLDER, domain);
            let listed = self.client.fetch_records(&path).await?;
            tracing::debug!(registry = NAME, domain, count = listed.len(), "Domain listed");
            companies.extend(decode_companies(listed, domain));
        }
        Ok(companies)
    }

    async fn persons(&self) -> Result<Vec<Result<RegistryPerson, Rejected>>, RegistryError> {
        let listed = self.client.fetch_records(&self.person_path).await?;
        Ok(decode_persons(listed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifications_core::groups::{FGASES_EU_GROUP_CODE, FGASES_NONEU_GROUP_CODE};

    fn undertaking(country_type: &str) -> Undertaking {
        serde_json::from_value(serde_json::json!({
            "company_id": 77,
            "name": "Cool Gas Ltd",
            "vat": "GB77",
            "status": "VALID",
            "check_passed": true,
            "address": {"country": {"code": "GB", "name": "United Kingdom", "type": country_type}},
            "users": [{"username": "alice"}, {"username": "bob"}],
            "representative": {
                "name": "EU Rep",
                "vatnumber": "IE1",
                "address": {"country": {"code": "IE", "name": "Ireland", "type": "EU_TYPE"}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn domain_selects_group() {
        assert_eq!(group_for_domain("ODS", "EU_TYPE"), Some(ODS_GROUP_CODE));
        assert_eq!(group_for_domain("FGAS", "EU_TYPE"), Some(FGASES_EU_GROUP_CODE));
        assert_eq!(group_for_domain("fgas", "NONEU_TYPE"), Some(FGASES_NONEU_GROUP_CODE));
        assert_eq!(group_for_domain("MOBILE", "EU_TYPE"), None);
    }

    #[test]
    fn undertaking_carries_users_and_representative() {
        let company = normalize_company(undertaking("NONEU_TYPE"), DOMAIN_FGAS).unwrap();
        assert_eq!(company.external_id, "77");
        assert_eq!(company.group_code, FGASES_NONEU_GROUP_CODE);
        assert_eq!(company.usernames, ["alice", "bob"]);
        assert_eq!(company.representative_country_name.as_deref(), Some("Ireland"));
        assert_eq!(company.check_passed, Some(true));
        assert_eq!(company.status, "VALID");
    }

    #[test]
    fn unknown_domain_is_rejected() {
        let rejected = normalize_company(undertaking("EU_TYPE"), "MOBILE").unwrap_err();
        assert_eq!(rejected.key, "77");
    }

    #[test]
    fn person_name_joins_first_and_last() {
        let person = normalize_person(EcrPerson {
            username: "alice".into(),
            first_name: Some("Alice".into()),
            last_name: Some("Smith".into()),
            email: "alice@example.com".into(),
        })
        .unwrap();
        assert_eq!(person.name, "Alice Smith");
        assert!(person.company.is_none());
    }

    #[test]
    fn null_first_name_is_accepted() {
        let persons = decode_persons(vec![serde_json::json!({
            "username": "bob", "first_name": null, "last_name": "Jones", "email": "bob@example.com"
        })]);
        assert_eq!(persons[0].as_ref().unwrap().name, "Jones");
    }
}
