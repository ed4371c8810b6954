//! Repository for the `cycle_notifications` send log.

use notifications_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::{CreateCycleNotification, CycleNotification, NotifiedStage};

const COLUMNS: &str =
    "id, subject, email, body_html, sent_date, emailtemplate_id, counter, person_id, company_id";

const N_COLUMNS: &str = "n.id, n.subject, n.email, n.body_html, n.sent_date, \
    n.emailtemplate_id, n.counter, n.person_id, n.company_id";

pub struct NotificationRepo;

impl NotificationRepo {
    /// Record a sent email.
    ///
    /// The counter is one more than the highest existing counter for the same
    /// `(email, template)` pair, so the first send gets `1`. Allocation holds
    /// a transaction-scoped advisory lock keyed on the template, so
    /// concurrent sends of one template (two resends, or a resend racing the
    /// worker) never compute the same counter.
    pub async fn create_with_next_counter(
        pool: &PgPool,
        input: &CreateCycleNotification,
    ) -> Result<CycleNotification, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(input.emailtemplate_id)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO cycle_notifications \
                (subject, email, body_html, emailtemplate_id, person_id, company_id, counter) \
             SELECT $1, $2, $3, $4, $5, $6, COALESCE(MAX(counter), 0) + 1 \
             FROM cycle_notifications \
             WHERE email = $2 AND emailtemplate_id = $4 \
             RETURNING {COLUMNS}"
        );
        let notification = sqlx::query_as::<_, CycleNotification>(&query)
            .bind(&input.subject)
            .bind(&input.email)
            .bind(&input.body_html)
            .bind(input.emailtemplate_id)
            .bind(input.person_id)
            .bind(input.company_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(notification)
    }

    /// Send log of one template, newest first.
    pub async fn list_for_template(
        pool: &PgPool,
        template_id: DbId,
    ) -> Result<Vec<CycleNotification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cycle_notifications \
             WHERE emailtemplate_id = $1 \
             ORDER BY sent_date DESC, id DESC"
        );
        sqlx::query_as::<_, CycleNotification>(&query)
            .bind(template_id)
            .fetch_all(pool)
            .await
    }

    /// Send log of every template in a cycle, newest first.
    pub async fn list_for_cycle(
        pool: &PgPool,
        cycle_id: DbId,
    ) -> Result<Vec<CycleNotification>, sqlx::Error> {
        let query = format!(
            "SELECT {N_COLUMNS} FROM cycle_notifications n \
             JOIN cycle_email_templates t ON t.id = n.emailtemplate_id \
             JOIN stages s ON s.id = t.stage_id \
             WHERE s.cycle_id = $1 \
             ORDER BY n.sent_date DESC, n.id DESC"
        );
        sqlx::query_as::<_, CycleNotification>(&query)
            .bind(cycle_id)
            .fetch_all(pool)
            .await
    }

    /// Whole send log, paginated, newest first.
    pub async fn list(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CycleNotification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cycle_notifications \
             ORDER BY sent_date DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, CycleNotification>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM cycle_notifications")
            .fetch_one(pool)
            .await
    }

    /// Stages a person has been emailed for, with the latest send time.
    pub async fn notified_stages_for_person(
        pool: &PgPool,
        person_id: DbId,
    ) -> Result<Vec<NotifiedStage>, sqlx::Error> {
        sqlx::query_as::<_, NotifiedStage>(
            "SELECT s.id AS stage_id, s.title AS stage_title, c.year AS cycle_year, \
                    MAX(n.sent_date) AS last_sent \
             FROM cycle_notifications n \
             JOIN cycle_email_templates t ON t.id = n.emailtemplate_id \
             JOIN stages s ON s.id = t.stage_id \
             JOIN cycles c ON c.id = s.cycle_id \
             WHERE n.person_id = $1 \
             GROUP BY s.id, s.title, c.year \
             ORDER BY c.year DESC, s.id",
        )
        .bind(person_id)
        .fetch_all(pool)
        .await
    }
}
