//! Repository for the `email_jobs` queue.

use std::time::Duration;

use notifications_core::types::DbId;
use sqlx::PgPool;

use crate::models::email_job::{
    EmailJob, JOB_STATUS_DONE, JOB_STATUS_FAILED, JOB_STATUS_PENDING, JOB_STATUS_RUNNING,
};

const COLUMNS: &str = "\
    id, emailtemplate_id, kind, external_ids, status, attempts, error, \
    created_at, claimed_at, finished_at";

pub struct EmailJobRepo;

impl EmailJobRepo {
    /// Queue a send for a template.
    pub async fn enqueue(
        pool: &PgPool,
        template_id: DbId,
        kind: &str,
        external_ids: Option<&[String]>,
    ) -> Result<EmailJob, sqlx::Error> {
        let filter = external_ids.map(|ids| serde_json::json!(ids));
        let query = format!(
            "INSERT INTO email_jobs (emailtemplate_id, kind, external_ids, status) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmailJob>(&query)
            .bind(template_id)
            .bind(kind)
            .bind(filter)
            .bind(JOB_STATUS_PENDING)
            .fetch_one(pool)
            .await
    }

    /// Atomically claim the oldest claimable job.
    ///
    /// A job is claimable when it is pending, or when it has been running for
    /// longer than `lease` (its worker is presumed dead). `FOR UPDATE SKIP
    /// LOCKED` lets several workers poll the same table.
    pub async fn claim_next(
        pool: &PgPool,
        lease: Duration,
    ) -> Result<Option<EmailJob>, sqlx::Error> {
        let query = format!(
            "UPDATE email_jobs \
             SET status = $1, claimed_at = NOW(), attempts = attempts + 1 \
             WHERE id = ( \
                 SELECT id FROM email_jobs \
                 WHERE status = $2 \
                    OR (status = $1 AND claimed_at < NOW() - make_interval(secs => $3)) \
                 ORDER BY created_at ASC, id ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmailJob>(&query)
            .bind(JOB_STATUS_RUNNING)
            .bind(JOB_STATUS_PENDING)
            .bind(lease.as_secs_f64())
            .fetch_optional(pool)
            .await
    }

    /// Jobs waiting for a worker.
    pub async fn count_pending(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM email_jobs WHERE status = $1")
            .bind(JOB_STATUS_PENDING)
            .fetch_one(pool)
            .await
    }

    pub async fn mark_done(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE email_jobs SET status = $2, finished_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(JOB_STATUS_DONE)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Mark a job failed. There is no automatic retry.
    pub async fn mark_failed(pool: &PgPool, id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE email_jobs SET status = $2, error = $3, finished_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(JOB_STATUS_FAILED)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<EmailJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM email_jobs WHERE id = $1");
        sqlx::query_as::<_, EmailJob>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
