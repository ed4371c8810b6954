//! Fixture-backed registries for `--test` fetches and integration tests.

use async_trait::async_trait;
use serde_json::Value;

use crate::client::RegistryError;
use crate::ecr::{DOMAIN_FGAS, DOMAIN_ODS};
use crate::records::{Rejected, RegistryCompany, RegistryPerson};
use crate::{bdr, ecr, fgases, Registry, RegistryKind};

const BDR_COMPANIES: &str = include_str!("../fixtures/bdr_companies.json");
const BDR_PERSONS: &str = include_str!("../fixtures/bdr_persons.json");
const ECR_ODS_COMPANIES: &str = include_str!("../fixtures/ecr_ods_companies.json");
const ECR_FGAS_COMPANIES: &str = include_str!("../fixtures/ecr_fgas_companies.json");
const ECR_PERSONS: &str = include_str!("../fixtures/ecr_persons.json");
const FGASES_COMPANIES: &str = include_str!("../fixtures/fgases_companies.json");
const FGASES_PERSONS: &str = include_str!("../fixtures/fgases_persons.json");

/// Serves the bundled JSON fixtures through the same decoding as the live
/// registries.
pub struct MockRegistry {
    kind: RegistryKind,
}

impl MockRegistry {
    pub fn new(kind: RegistryKind) -> Self {
        Self { kind }
    }
}

fn load(name: &'static str, json: &str) -> Result<Vec<Value>, RegistryError> {
    serde_json::from_str(json).map_err(|e| RegistryError::Decode {
        url: format!("fixture:{name}"),
        message: e.to_string(),
    })
}

#[async_trait]
impl Registry for MockRegistry {
    fn name(&self) -> &'static str {
        match self.kind {
            RegistryKind::Bdr => "BDRRegistryMock",
            RegistryKind::Ecr => "EuropeanCacheRegistryMock",
            RegistryKind::Fgases => "FGasesRegistryMock",
        }
    }

    fn group_codes(&self) -> &'static [&'static str] {
        self.kind.group_codes()
    }

    async fn companies(&self) -> Result<Vec<Result<RegistryCompany, Rejected>>, RegistryError> {
        let companies = match self.kind {
            RegistryKind::Bdr => bdr::decode_companies(load("bdr_companies", BDR_COMPANIES)?),
            RegistryKind::Ecr => {
                let mut companies = ecr::decode_companies(
                    load("ecr_fgas_companies", ECR_FGAS_COMPANIES)?,
                    DOMAIN_FGAS,
                );
                companies.extend(ecr::decode_companies(
                    load("ecr_ods_companies", ECR_ODS_COMPANIES)?,
                    DOMAIN_ODS,
                ));
                companies
            }
            RegistryKind::Fgases => {
                fgases::decode_companies(load("fgases_companies", FGASES_COMPANIES)?)
            }
        };
        Ok(companies)
    }

    async fn persons(&self) -> Result<Vec<Result<RegistryPerson, Rejected>>, RegistryError> {
        let persons = match self.kind {
            RegistryKind::Bdr => bdr::decode_persons(load("bdr_persons", BDR_PERSONS)?),
            RegistryKind::Ecr => ecr::decode_persons(load("ecr_persons", ECR_PERSONS)?),
            RegistryKind::Fgases => fgases::decode_persons(load("fgases_persons", FGASES_PERSONS)?),
        };
        Ok(persons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixtures_normalize_cleanly() {
        for kind in RegistryKind::ALL {
            let registry = MockRegistry::new(kind);
            let companies = registry.companies().await.unwrap();
            let persons = registry.persons().await.unwrap();
            assert!(!companies.is_empty(), "{kind} companies");
            assert!(!persons.is_empty(), "{kind} persons");
            assert!(companies.iter().all(Result::is_ok), "{kind} companies");
            assert!(persons.iter().all(Result::is_ok), "{kind} persons");
            for company in companies.into_iter().flatten() {
                assert!(kind.group_codes().contains(&company.group_code));
            }
        }
    }
}
