//! Repository for the `companies` table.

use notifications_core::groups::ALWAYS_VISIBLE_GROUP_CODES;
use notifications_core::types::DbId;
use sqlx::PgPool;

use crate::models::company::{Company, CreateCompany};

const COLUMNS: &str = "id, external_id, name, vat, country, group_id, status, \
    representative_name, representative_vat, representative_country_name, check_passed, \
    created_at, updated_at";

/// Same columns qualified with the `c.` alias, for joins.
const C_COLUMNS: &str = "c.id, c.external_id, c.name, c.vat, c.country, c.group_id, c.status, \
    c.representative_name, c.representative_vat, c.representative_country_name, c.check_passed, \
    c.created_at, c.updated_at";

/// Visibility rule: BDR groups are always listed, other groups only once
/// the registry check has passed.
const VISIBLE_FILTER: &str = "(g.code = ANY($1) OR c.check_passed = true)";

pub struct CompanyRepo;

impl CompanyRepo {
    /// Insert a new company.
    pub async fn create(pool: &PgPool, input: &CreateCompany) -> Result<Company, sqlx::Error> {
        let query = format!(
            "INSERT INTO companies (external_id, name, vat, country, group_id, status, \
             representative_name, representative_vat, representative_country_name, check_passed) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Company>(&query)
            .bind(&input.external_id)
            .bind(&input.name)
            .bind(&input.vat)
            .bind(&input.country)
            .bind(input.group_id)
            .bind(&input.status)
            .bind(&input.representative_name)
            .bind(&input.representative_vat)
            .bind(&input.representative_country_name)
            .bind(input.check_passed)
            .fetch_one(pool)
            .await
    }

    /// Create or update a company keyed by `external_id`.
    ///
    /// Returns the row and whether it was newly inserted.
    pub async fn upsert_by_external_id(
        pool: &PgPool,
        input: &CreateCompany,
    ) -> Result<(Company, bool), sqlx::Error> {
        let query = format!(
            "INSERT INTO companies (external_id, name, vat, country, group_id, status, \
             representative_name, representative_vat, representative_country_name, check_passed) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (external_id) DO UPDATE SET \
                name = EXCLUDED.name, \
                vat = EXCLUDED.vat, \
                country = EXCLUDED.country, \
                group_id = EXCLUDED.group_id, \
                status = EXCLUDED.status, \
                representative_name = EXCLUDED.representative_name, \
                representative_vat = EXCLUDED.representative_vat, \
                representative_country_name = EXCLUDED.representative_country_name, \
                check_passed = EXCLUDED.check_passed, \
                updated_at = NOW() \
             RETURNING {COLUMNS}, (xmax = 0) AS inserted"
        );
        let row: CompanyUpsertRow = sqlx::query_as(&query)
            .bind(&input.external_id)
            .bind(&input.name)
            .bind(&input.vat)
            .bind(&input.country)
            .bind(input.group_id)
            .bind(&input.status)
            .bind(&input.representative_name)
            .bind(&input.representative_vat)
            .bind(&input.representative_country_name)
            .bind(input.check_passed)
            .fetch_one(pool)
            .await?;
        Ok((row.company, row.inserted))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Company>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM companies WHERE id = $1");
        sqlx::query_as::<_, Company>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_external_id(
        pool: &PgPool,
        external_id: &str,
    ) -> Result<Option<Company>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM companies WHERE external_id = $1");
        sqlx::query_as::<_, Company>(&query)
            .bind(external_id)
            .fetch_optional(pool)
            .await
    }

    /// Companies matching `name` + `country` within the given groups.
    ///
    /// Used by registries whose person records reference companies by name.
    pub async fn find_by_name_country(
        pool: &PgPool,
        name: &str,
        country: &str,
        group_codes: &[&str],
    ) -> Result<Vec<Company>, sqlx::Error> {
        let codes: Vec<String> = group_codes.iter().map(|c| c.to_string()).collect();
        let query = format!(
            "SELECT {C_COLUMNS} FROM companies c \
             JOIN companies_groups g ON g.id = c.group_id \
             WHERE c.name = $1 AND c.country = $2 AND g.code = ANY($3) \
             ORDER BY c.id"
        );
        sqlx::query_as::<_, Company>(&query)
            .bind(name)
            .bind(country)
            .bind(codes)
            .fetch_all(pool)
            .await
    }

    /// List visible companies, optionally restricted to one group, by name.
    pub async fn list_visible(
        pool: &PgPool,
        group_code: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Company>, sqlx::Error> {
        let query = format!(
            "SELECT {C_COLUMNS} FROM companies c \
             JOIN companies_groups g ON g.id = c.group_id \
             WHERE {VISIBLE_FILTER} AND ($2::TEXT IS NULL OR g.code = $2) \
             ORDER BY c.name, c.id \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Company>(&query)
            .bind(visible_codes())
            .bind(group_code)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_visible(pool: &PgPool, group_code: Option<&str>) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM companies c \
             JOIN companies_groups g ON g.id = c.group_id \
             WHERE {VISIBLE_FILTER} AND ($2::TEXT IS NULL OR g.code = $2)"
        );
        sqlx::query_scalar(&query)
            .bind(visible_codes())
            .bind(group_code)
            .fetch_one(pool)
            .await
    }

    /// Delete a company. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn visible_codes() -> Vec<String> {
    ALWAYS_VISIBLE_GROUP_CODES.iter().map(|c| c.to_string()).collect()
}

#[derive(sqlx::FromRow)]
struct CompanyUpsertRow {
    #[sqlx(flatten)]
    company: Company,
    inserted: bool,
}
