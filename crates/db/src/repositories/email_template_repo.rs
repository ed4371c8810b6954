//! Repository for the `cycle_email_templates` table.
//!
//! Status transitions are guarded in SQL: content updates only apply to
//! drafts, and claiming for a trigger only succeeds from draft.

use notifications_core::template_status::TemplateStatus;
use notifications_core::types::DbId;
use sqlx::PgPool;

use crate::models::email_template::{
    CycleEmailTemplate, TemplateDetail, UpdateCycleEmailTemplate,
};

const COLUMNS: &str =
    "id, subject, body_html, stage_id, group_id, status, created_at, updated_at";

const DETAIL_SELECT: &str = "\
    SELECT t.id, t.subject, t.body_html, t.status, \
           t.stage_id, s.title AS stage_title, \
           s.cycle_id, c.year AS cycle_year, c.closing_date, \
           t.group_id, g.code AS group_code, g.title AS group_title, \
           t.updated_at \
    FROM cycle_email_templates t \
    JOIN stages s ON s.id = t.stage_id \
    JOIN cycles c ON c.id = s.cycle_id \
    JOIN companies_groups g ON g.id = t.group_id";

/// Placeholder content written by template generation.
pub const GENERATED_SUBJECT: &str = "subject";
pub const GENERATED_BODY_HTML: &str = "<p>WIP</p>";

pub struct EmailTemplateRepo;

impl EmailTemplateRepo {
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<CycleEmailTemplate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cycle_email_templates WHERE id = $1");
        sqlx::query_as::<_, CycleEmailTemplate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A template with its stage, cycle and group.
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TemplateDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE t.id = $1");
        sqlx::query_as::<_, TemplateDetail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All templates of a cycle, by stage then group.
    pub async fn list_for_cycle(
        pool: &PgPool,
        cycle_id: DbId,
    ) -> Result<Vec<TemplateDetail>, sqlx::Error> {
        let query = format!("{DETAIL_SELECT} WHERE s.cycle_id = $1 ORDER BY s.id, g.id");
        sqlx::query_as::<_, TemplateDetail>(&query)
            .bind(cycle_id)
            .fetch_all(pool)
            .await
    }

    /// Update subject/body of a draft template.
    ///
    /// Returns `None` if the template does not exist or is no longer a draft.
    pub async fn update_content(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCycleEmailTemplate,
    ) -> Result<Option<CycleEmailTemplate>, sqlx::Error> {
        let query = format!(
            "UPDATE cycle_email_templates SET \
                subject = COALESCE($2, subject), \
                body_html = COALESCE($3, body_html), \
                updated_at = NOW() \
             WHERE id = $1 AND status = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CycleEmailTemplate>(&query)
            .bind(id)
            .bind(&input.subject)
            .bind(&input.body_html)
            .bind(TemplateStatus::Draft.id())
            .fetch_optional(pool)
            .await
    }

    /// Move a draft template to processing.
    ///
    /// Returns `false` when the template was not a draft, so concurrent
    /// triggers cannot both claim it.
    pub async fn claim_for_trigger(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE cycle_email_templates SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(TemplateStatus::Processing.id())
        .bind(TemplateStatus::Draft.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: TemplateStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE cycle_email_templates SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Ensure every `(stage, group)` of a cycle has a template, filling new
    /// ones with placeholder content. Returns the number created.
    pub async fn generate_for_cycle(pool: &PgPool, cycle_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO cycle_email_templates (stage_id, group_id, subject, body_html) \
             SELECT s.id, g.id, $2, $3 \
             FROM stages s CROSS JOIN companies_groups g \
             WHERE s.cycle_id = $1 \
             ON CONFLICT (stage_id, group_id) DO NOTHING",
        )
        .bind(cycle_id)
        .bind(GENERATED_SUBJECT)
        .bind(GENERATED_BODY_HTML)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
