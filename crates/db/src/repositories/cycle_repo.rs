//! Repository for the `cycles` table.

use notifications_core::stages::DEFAULT_STAGE_TITLES;
use notifications_core::types::DbId;
use sqlx::PgPool;

use crate::models::cycle::{CreateCycle, Cycle, UpdateCycle};

const COLUMNS: &str = "id, year, closing_date, created_at, updated_at";

pub struct CycleRepo;

impl CycleRepo {
    /// Create a cycle with its default stages and one draft template per
    /// `(stage, group)`, all in one transaction.
    pub async fn create_with_defaults(
        pool: &PgPool,
        input: &CreateCycle,
    ) -> Result<Cycle, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO cycles (year, closing_date) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        let cycle = sqlx::query_as::<_, Cycle>(&query)
            .bind(input.year)
            .bind(input.closing_date)
            .fetch_one(&mut *tx)
            .await?;

        for title in DEFAULT_STAGE_TITLES {
            let stage_id: DbId = sqlx::query_scalar(
                "INSERT INTO stages (title, cycle_id) VALUES ($1, $2) RETURNING id",
            )
            .bind(title)
            .bind(cycle.id)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                "INSERT INTO cycle_email_templates (stage_id, group_id) \
                 SELECT $1, id FROM companies_groups",
            )
            .bind(stage_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(cycle)
    }

    /// All cycles, newest year first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Cycle>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cycles ORDER BY year DESC");
        sqlx::query_as::<_, Cycle>(&query).fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Cycle>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cycles WHERE id = $1");
        sqlx::query_as::<_, Cycle>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_year(pool: &PgPool, year: i16) -> Result<Option<Cycle>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cycles WHERE year = $1");
        sqlx::query_as::<_, Cycle>(&query)
            .bind(year)
            .fetch_optional(pool)
            .await
    }

    /// Update a cycle. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCycle,
    ) -> Result<Option<Cycle>, sqlx::Error> {
        let query = format!(
            "UPDATE cycles SET \
                closing_date = COALESCE($2, closing_date), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Cycle>(&query)
            .bind(id)
            .bind(input.closing_date)
            .fetch_optional(pool)
            .await
    }
}
