//! Repository for the `stages` table.

use notifications_core::types::DbId;
use sqlx::PgPool;

use crate::models::stage::Stage;

const COLUMNS: &str = "id, title, cycle_id, created_at";

pub struct StageRepo;

impl StageRepo {
    /// Stages of a cycle in creation order.
    pub async fn list_for_cycle(pool: &PgPool, cycle_id: DbId) -> Result<Vec<Stage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stages WHERE cycle_id = $1 ORDER BY id");
        sqlx::query_as::<_, Stage>(&query)
            .bind(cycle_id)
            .fetch_all(pool)
            .await
    }

    /// Add a stage to a cycle together with one draft template per group.
    pub async fn create_with_templates(
        pool: &PgPool,
        cycle_id: DbId,
        title: &str,
    ) -> Result<Stage, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO stages (title, cycle_id) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        let stage = sqlx::query_as::<_, Stage>(&query)
            .bind(title)
            .bind(cycle_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO cycle_email_templates (stage_id, group_id) \
             SELECT $1, id FROM companies_groups",
        )
        .bind(stage.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(stage)
    }
}
