//! Integration tests for registry synchronization.

use async_trait::async_trait;
use notifications_core::groups::{BDR_GROUP_CODES, CARS_GROUP_CODE, ODS_GROUP_CODE};
use notifications_db::repositories::{CompanyRepo, PersonCompanyRepo, PersonRepo};
use notifications_registry::fetch::Fetcher;
use notifications_registry::mock::MockRegistry;
use notifications_registry::{
    CompanyRef, Registry, RegistryError, RegistryKind, Rejected, RegistryCompany, RegistryPerson,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A registry serving whatever records the test hands it.
#[derive(Default)]
struct StaticRegistry {
    companies: Vec<RegistryCompany>,
    persons: Vec<RegistryPerson>,
    rejected_persons: Vec<Rejected>,
    /// Answer the persons list with HTTP 503.
    persons_down: bool,
}

#[async_trait]
impl Registry for StaticRegistry {
    fn name(&self) -> &'static str {
        "StaticRegistry"
    }

    fn group_codes(&self) -> &'static [&'static str] {
        BDR_GROUP_CODES
    }

    async fn companies(&self) -> Result<Vec<Result<RegistryCompany, Rejected>>, RegistryError> {
        Ok(self.companies.iter().cloned().map(Ok).collect())
    }

    async fn persons(&self) -> Result<Vec<Result<RegistryPerson, Rejected>>, RegistryError> {
        if self.persons_down {
            return Err(RegistryError::HttpStatus {
                status: 503,
                url: "static://persons".to_string(),
            });
        }
        Ok(self
            .persons
            .iter()
            .cloned()
            .map(Ok)
            .chain(self.rejected_persons.iter().cloned().map(Err))
            .collect())
    }
}

fn company(external_id: &str, name: &str) -> RegistryCompany {
    RegistryCompany {
        external_id: external_id.to_string(),
        name: name.to_string(),
        vat: None,
        country: "Germany".to_string(),
        group_code: CARS_GROUP_CODE,
        status: String::new(),
        representative_name: None,
        representative_vat: None,
        representative_country_name: None,
        check_passed: None,
        usernames: Vec::new(),
    }
}

fn person(username: &str, company_name: &str) -> RegistryPerson {
    RegistryPerson {
        username: username.to_string(),
        name: username.to_uppercase(),
        email: format!("{username}@example.com"),
        company: Some(CompanyRef {
            name: company_name.to_string(),
            country: "Germany".to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mock_bdr_fetch(pool: PgPool) {
    let report = Fetcher::run(&pool, &MockRegistry::new(RegistryKind::Bdr))
        .await
        .unwrap();

    assert!(report.is_success(), "{}", report.message());
    assert_eq!(report.companies, 3);
    assert_eq!(report.persons, 3);
    assert_eq!(report.links, 3);
    assert_eq!(
        report.message(),
        "Registry fetched successfully: 3 companies, 3 persons"
    );

    let japan = CompanyRepo::find_by_external_id(&pool, "bdr-cars-003")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(japan.representative_name.as_deref(), Some("Pacific Motor Europe NV"));
    assert_eq!(japan.representative_country_name.as_deref(), Some("Belgium"));
    assert_eq!(japan.vat, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_mock_ecr_links_company_users(pool: PgPool) {
    let report = Fetcher::run(&pool, &MockRegistry::new(RegistryKind::Ecr))
        .await
        .unwrap();
    assert!(report.is_success(), "{}", report.message());
    assert_eq!(report.companies, 3);
    // pvandijk belongs to two undertakings.
    assert_eq!(report.links, 4);

    let ids = PersonRepo::find_ids_by_usernames(&pool, &["pvandijk".to_string()])
        .await
        .unwrap();
    let companies = PersonCompanyRepo::current_companies_for_person(&pool, ids[0].1)
        .await
        .unwrap();
    let mut groups: Vec<&str> = companies.iter().map(|c| c.group_code.as_str()).collect();
    groups.sort();
    assert_eq!(groups, ["f-gases-noneu", ODS_GROUP_CODE]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refetch_updates_and_flips_stale_links(pool: PgPool) {
    let first = StaticRegistry {
        companies: vec![company("c1", "Alpha"), company("c2", "Beta")],
        persons: vec![person("ann", "Alpha"), person("bob", "Beta")],
        ..Default::default()
    };
    let report = Fetcher::run(&pool, &first).await.unwrap();
    assert_eq!(report.links, 2);

    let mut renamed = company("c1", "Alpha");
    renamed.vat = Some("DE1".to_string());
    let second = StaticRegistry {
        companies: vec![renamed, company("c2", "Beta")],
        persons: vec![person("ann", "Alpha")],
        ..Default::default()
    };
    let report = Fetcher::run(&pool, &second).await.unwrap();
    assert_eq!(report.links, 1);

    let alpha = CompanyRepo::find_by_external_id(&pool, "c1").await.unwrap().unwrap();
    assert_eq!(alpha.vat.as_deref(), Some("DE1"));

    let bob = PersonRepo::find_ids_by_usernames(&pool, &["bob".to_string()])
        .await
        .unwrap()[0]
        .1;
    assert!(PersonCompanyRepo::current_companies_for_person(&pool, bob)
        .await
        .unwrap()
        .is_empty());
    let stale = PersonCompanyRepo::list_for_person(&pool, bob, true).await.unwrap();
    assert_eq!(stale.len(), 1);
    assert!(!stale[0].current);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rejected_records_are_reported(pool: PgPool) {
    let registry = StaticRegistry {
        companies: vec![company("c1", "Alpha")],
        persons: vec![person("ann", "Alpha")],
        rejected_persons: vec![Rejected::new("ghost", "missing contact email")],
        ..Default::default()
    };
    let report = Fetcher::run(&pool, &registry).await.unwrap();

    assert!(!report.is_success());
    assert_eq!(report.persons, 1);
    assert_eq!(
        report.message(),
        "Registry fetched with errors: [(missing contact email, ghost)]"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_empty_registry_keeps_links(pool: PgPool) {
    let first = StaticRegistry {
        companies: vec![company("c1", "Alpha")],
        persons: vec![person("ann", "Alpha")],
        ..Default::default()
    };
    Fetcher::run(&pool, &first).await.unwrap();

    let unreachable = StaticRegistry {
        companies: Vec::new(),
        persons: Vec::new(),
        ..Default::default()
    };
    Fetcher::run(&pool, &unreachable).await.unwrap();

    let ann = PersonRepo::find_ids_by_usernames(&pool, &["ann".to_string()])
        .await
        .unwrap()[0]
        .1;
    assert_eq!(
        PersonCompanyRepo::current_companies_for_person(&pool, ann)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_persons_outage_aborts_and_keeps_links(pool: PgPool) {
    let first = StaticRegistry {
        companies: vec![company("c1", "Alpha")],
        persons: vec![person("ann", "Alpha")],
        ..Default::default()
    };
    Fetcher::run(&pool, &first).await.unwrap();

    let outage = StaticRegistry {
        companies: vec![company("c1", "Alpha"), company("c2", "Beta")],
        persons_down: true,
        ..Default::default()
    };
    let result = Fetcher::run(&pool, &outage).await;
    assert!(matches!(result, Err(RegistryError::HttpStatus { status: 503, .. })));

    // Nothing from the aborted run was written.
    assert!(CompanyRepo::find_by_external_id(&pool, "c2").await.unwrap().is_none());

    let ann = PersonRepo::find_ids_by_usernames(&pool, &["ann".to_string()])
        .await
        .unwrap()[0]
        .1;
    assert_eq!(
        PersonCompanyRepo::current_companies_for_person(&pool, ann)
            .await
            .unwrap()
            .len(),
        1
    );
}
