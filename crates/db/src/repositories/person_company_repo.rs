//! Repository for the `person_companies` link table.
//!
//! Links carry a `current` flag. A registry fetch clears the flag for every
//! link touching its groups and sets it again for the links it saw, so only
//! the latest fetch is reflected in recipient lists.

use notifications_core::types::DbId;
use sqlx::PgPool;

use crate::models::person::{PersonCompany, PersonCompanyEntry};
use crate::models::recipient::Recipient;

const COLUMNS: &str = "id, person_id, company_id, current";

pub struct PersonCompanyRepo;

impl PersonCompanyRepo {
    /// Replace the current links for `group_codes` with `links` in one transaction.
    ///
    /// `links` are `(person_id, company_id)` pairs. Links outside the given
    /// groups are left untouched. Returns the number of links marked current.
    pub async fn reconcile(
        pool: &PgPool,
        group_codes: &[&str],
        links: &[(DbId, DbId)],
    ) -> Result<u64, sqlx::Error> {
        let codes: Vec<String> = group_codes.iter().map(|c| c.to_string()).collect();
        let mut tx = pool.begin().await?;

        let cleared = sqlx::query(
            "UPDATE person_companies pc SET current = false \
             FROM companies c \
             JOIN companies_groups g ON g.id = c.group_id \
             WHERE c.id = pc.company_id AND g.code = ANY($1) AND pc.current = true",
        )
        .bind(&codes)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let mut marked = 0u64;
        for (person_id, company_id) in links {
            let result = sqlx::query(
                "INSERT INTO person_companies (person_id, company_id, current) \
                 VALUES ($1, $2, true) \
                 ON CONFLICT (person_id, company_id) DO UPDATE SET current = true",
            )
            .bind(person_id)
            .bind(company_id)
            .execute(&mut *tx)
            .await?;
            marked += result.rows_affected();
        }

        tx.commit().await?;
        tracing::debug!(groups = ?group_codes, cleared, marked, "Person-company links reconciled");
        Ok(marked)
    }

    /// Add (or re-activate) a single link.
    pub async fn link(
        pool: &PgPool,
        person_id: DbId,
        company_id: DbId,
    ) -> Result<PersonCompany, sqlx::Error> {
        let query = format!(
            "INSERT INTO person_companies (person_id, company_id, current) \
             VALUES ($1, $2, true) \
             ON CONFLICT (person_id, company_id) DO UPDATE SET current = true \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PersonCompany>(&query)
            .bind(person_id)
            .bind(company_id)
            .fetch_one(pool)
            .await
    }

    /// Raw links for a person. `include_stale` also returns non-current links.
    pub async fn list_for_person(
        pool: &PgPool,
        person_id: DbId,
        include_stale: bool,
    ) -> Result<Vec<PersonCompany>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM person_companies \
             WHERE person_id = $1 AND (current = true OR $2) \
             ORDER BY id"
        );
        sqlx::query_as::<_, PersonCompany>(&query)
            .bind(person_id)
            .bind(include_stale)
            .fetch_all(pool)
            .await
    }

    /// Companies a person is currently linked to.
    pub async fn current_companies_for_person(
        pool: &PgPool,
        person_id: DbId,
    ) -> Result<Vec<PersonCompanyEntry>, sqlx::Error> {
        sqlx::query_as::<_, PersonCompanyEntry>(
            "SELECT c.id AS company_id, c.external_id, c.name, c.country, g.code AS group_code \
             FROM person_companies pc \
             JOIN companies c ON c.id = pc.company_id \
             JOIN companies_groups g ON g.id = c.group_id \
             WHERE pc.person_id = $1 AND pc.current = true \
             ORDER BY c.name, c.id",
        )
        .bind(person_id)
        .fetch_all(pool)
        .await
    }

    /// One row per current person-company link in `group_id`.
    ///
    /// When `external_ids` is given only companies with one of those IDs are
    /// returned.
    pub async fn recipients_for_group(
        pool: &PgPool,
        group_id: DbId,
        external_ids: Option<&[String]>,
    ) -> Result<Vec<Recipient>, sqlx::Error> {
        sqlx::query_as::<_, Recipient>(
            "SELECT p.id AS person_id, p.name AS person_name, p.email, \
                    c.id AS company_id, c.external_id, c.name AS company_name, \
                    c.country, c.vat, c.representative_name, c.representative_vat, \
                    c.representative_country_name \
             FROM person_companies pc \
             JOIN persons p ON p.id = pc.person_id \
             JOIN companies c ON c.id = pc.company_id \
             WHERE c.group_id = $1 AND pc.current = true \
               AND ($2::TEXT[] IS NULL OR c.external_id = ANY($2)) \
             ORDER BY c.name, p.name, pc.id",
        )
        .bind(group_id)
        .bind(external_ids)
        .fetch_all(pool)
        .await
    }
}
