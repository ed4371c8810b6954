//! Repository for the `companies_groups` table.

use sqlx::PgPool;

use crate::models::companies_group::{CompaniesGroup, CompaniesGroupSummary};

const COLUMNS: &str = "id, title, code, created_at";

/// Read access to obligation groups. Groups are seeded by migration.
pub struct CompaniesGroupRepo;

impl CompaniesGroupRepo {
    pub async fn list(pool: &PgPool) -> Result<Vec<CompaniesGroup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM companies_groups ORDER BY id");
        sqlx::query_as::<_, CompaniesGroup>(&query)
            .fetch_all(pool)
            .await
    }

    /// List groups with their template counts.
    pub async fn list_with_counts(
        pool: &PgPool,
    ) -> Result<Vec<CompaniesGroupSummary>, sqlx::Error> {
        sqlx::query_as::<_, CompaniesGroupSummary>(
            "SELECT g.id, g.title, g.code, COUNT(t.id) AS count_emailtemplates \
             FROM companies_groups g \
             LEFT JOIN cycle_email_templates t ON t.group_id = g.id \
             GROUP BY g.id, g.title, g.code \
             ORDER BY g.id",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<CompaniesGroup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM companies_groups WHERE code = $1");
        sqlx::query_as::<_, CompaniesGroup>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_codes(
        pool: &PgPool,
        codes: &[&str],
    ) -> Result<Vec<CompaniesGroup>, sqlx::Error> {
        let codes: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
        let query = format!("SELECT {COLUMNS} FROM companies_groups WHERE code = ANY($1) ORDER BY id");
        sqlx::query_as::<_, CompaniesGroup>(&query)
            .bind(codes)
            .fetch_all(pool)
            .await
    }
}
