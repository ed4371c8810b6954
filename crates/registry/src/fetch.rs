//! Write a registry's records to the database and reconcile links.

use std::collections::{BTreeSet, HashMap};

use notifications_core::fetch::FetchReport;
use notifications_core::types::DbId;
use notifications_db::models::company::CreateCompany;
use notifications_db::models::person::UpsertPerson;
use notifications_db::repositories::{
    CompaniesGroupRepo, CompanyRepo, PersonCompanyRepo, PersonRepo,
};
use sqlx::error::ErrorKind;
use sqlx::PgPool;

use crate::client::RegistryError;
use crate::records::{CompanyRef, RegistryCompany};
use crate::Registry;

/// Runs one registry synchronization.
pub struct Fetcher;

impl Fetcher {
    /// Fetch everything `registry` lists and store it.
    ///
    /// 1. Companies are upserted by external id.
    /// 2. Persons are upserted by username.
    /// 3. In one transaction, every link touching the registry's groups loses
    ///    its `current` flag and the links seen in this fetch regain it.
    ///
    /// Records the database rejects are skipped and listed in the report.
    /// A list the registry fails to deliver aborts the fetch before anything
    /// is written, as do connection-level database errors.
    pub async fn run(pool: &PgPool, registry: &dyn Registry) -> Result<FetchReport, RegistryError> {
        let name = registry.name();
        let group_codes = registry.group_codes();
        let mut report = FetchReport::new(name);

        let groups: HashMap<String, DbId> = CompaniesGroupRepo::find_by_codes(pool, group_codes)
            .await?
            .into_iter()
            .map(|g| (g.code, g.id))
            .collect();

        let companies = registry.companies().await?;
        let persons = registry.persons().await?;
        let listed_anything = !companies.is_empty() || !persons.is_empty();

        // -- companies --------------------------------------------------------
        let mut company_users: Vec<(DbId, Vec<String>)> = Vec::new();
        for record in companies {
            let company = match record {
                Ok(company) => company,
                Err(rejected) => {
                    tracing::info!(registry = name, key = %rejected.key, reason = %rejected.reason, "Skipped company");
                    report.skip("company", rejected.key, rejected.reason);
                    continue;
                }
            };
            let Some(&group_id) = groups.get(company.group_code) else {
                report.skip("company", company.external_id, format!("unknown group {}", company.group_code));
                continue;
            };

            match CompanyRepo::upsert_by_external_id(pool, &to_create(&company, group_id)).await {
                Ok((stored, created)) => {
                    if created {
                        tracing::info!(registry = name, name = %stored.name, external_id = %company.external_id, "Fetched company");
                    } else {
                        tracing::info!(registry = name, id = stored.id, name = %stored.name, external_id = %company.external_id, "Updated company");
                    }
                    report.companies += 1;
                    if !company.usernames.is_empty() {
                        company_users.push((stored.id, company.usernames));
                    }
                }
                Err(e) if is_integrity_error(&e) => {
                    tracing::info!(registry = name, external_id = %company.external_id, error = %e, "Skipped company");
                    report.skip("company", company.external_id, e.to_string());
                }
                Err(e) => return Err(e.into()),
            }
        }

        // -- persons ----------------------------------------------------------
        let mut person_refs: Vec<(DbId, CompanyRef)> = Vec::new();
        for record in persons {
            let person = match record {
                Ok(person) => person,
                Err(rejected) => {
                    tracing::info!(registry = name, key = %rejected.key, reason = %rejected.reason, "Skipped person");
                    report.skip("person", rejected.key, rejected.reason);
                    continue;
                }
            };
            let input = UpsertPerson {
                username: person.username.clone(),
                name: person.name.clone(),
                email: person.email.clone(),
            };

            match PersonRepo::upsert_by_username(pool, &input).await {
                Ok((stored, created)) => {
                    if created {
                        tracing::info!(registry = name, name = %stored.name, username = %stored.username, "Fetched person");
                    } else {
                        tracing::info!(registry = name, id = stored.id, name = %stored.name, username = %stored.username, "Updated person");
                    }
                    report.persons += 1;
                    if let Some(company) = person.company {
                        person_refs.push((stored.id, company));
                    }
                }
                Err(e) if is_integrity_error(&e) => {
                    tracing::info!(registry = name, username = %person.username, error = %e, "Skipped person");
                    report.skip("person", person.username, e.to_string());
                }
                Err(e) => return Err(e.into()),
            }
        }

        // -- links ------------------------------------------------------------
        if !listed_anything {
            tracing::warn!(registry = name, "Registry listed nothing, keeping existing links");
            return Ok(report);
        }

        let links = Self::collect_links(pool, group_codes, company_users, person_refs).await?;
        let linked: Vec<(DbId, DbId)> = links.into_iter().collect();
        let marked = PersonCompanyRepo::reconcile(pool, group_codes, &linked).await?;
        report.links = marked as usize;

        tracing::info!(registry = name, message = %report.message(), links = report.links, "Registry fetch finished");
        Ok(report)
    }

    /// Resolve both link directions into `(person_id, company_id)` pairs.
    async fn collect_links(
        pool: &PgPool,
        group_codes: &[&str],
        company_users: Vec<(DbId, Vec<String>)>,
        person_refs: Vec<(DbId, CompanyRef)>,
    ) -> Result<BTreeSet<(DbId, DbId)>, RegistryError> {
        let mut links = BTreeSet::new();

        if !company_users.is_empty() {
            let usernames: Vec<String> = company_users
                .iter()
                .flat_map(|(_, users)| users.iter().cloned())
                .collect();
            let person_ids: HashMap<String, DbId> =
                PersonRepo::find_ids_by_usernames(pool, &usernames)
                    .await?
                    .into_iter()
                    .collect();

            for (company_id, users) in &company_users {
                for username in users {
                    match person_ids.get(username) {
                        Some(&person_id) => {
                            links.insert((person_id, *company_id));
                        }
                        None => {
                            tracing::debug!(username, company_id, "Company user is not a known person");
                        }
                    }
                }
            }
        }

        for (person_id, company) in &person_refs {
            let matches =
                CompanyRepo::find_by_name_country(pool, &company.name, &company.country, group_codes)
                    .await?;
            if matches.is_empty() {
                tracing::debug!(person_id, company = %company.name, country = %company.country, "No company for person");
            }
            for matched in matches {
                links.insert((*person_id, matched.id));
            }
        }

        Ok(links)
    }
}

fn to_create(company: &RegistryCompany, group_id: DbId) -> CreateCompany {
    CreateCompany {
        external_id: Some(company.external_id.clone()),
        name: company.name.clone(),
        vat: company.vat.clone(),
        country: company.country.clone(),
        group_id,
        status: company.status.clone(),
        representative_name: company.representative_name.clone(),
        representative_vat: company.representative_vat.clone(),
        representative_country_name: company.representative_country_name.clone(),
        check_passed: company.check_passed,
    }
}

/// Constraint violations on a single record, as opposed to connection failures.
fn is_integrity_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => matches!(
            db.kind(),
            ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation
        ),
        _ => false,
    }
}
