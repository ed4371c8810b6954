//! Background processing of queued email jobs.
//!
//! When `ASYNC_EMAILS` is enabled the API only queues trigger and resend
//! requests. This worker claims them one at a time and runs the same
//! dispatch the API would have run inline.
//!
//! Delivery is at-least-once: a job left `running` by a worker that died is
//! claimed again once its lease expires, and its recipients may be mailed
//! twice. A job that fails is not retried.

use std::time::Duration;

use notifications_db::models::email_job::EmailJob;
use notifications_db::repositories::EmailJobRepo;
use notifications_mailer::{DispatchError, DispatchSummary, Dispatcher};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Default delay between polls when the queue is empty.
pub const DEFAULT_POLL_SECS: u64 = 5;

/// Default time a job may stay `running` before another worker takes it over.
pub const DEFAULT_JOB_LEASE_SECS: u64 = 3600;

#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    pub poll_interval: Duration,
    /// Must exceed the longest expected send run.
    pub job_lease: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            job_lease: Duration::from_secs(DEFAULT_JOB_LEASE_SECS),
        }
    }
}

impl WorkerConfig {
    /// Reads `WORKER_POLL_SECS` and `WORKER_JOB_LEASE_SECS`.
    pub fn from_env() -> Self {
        let secs = |name: &str, default: u64| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };
        Self {
            poll_interval: Duration::from_secs(secs("WORKER_POLL_SECS", DEFAULT_POLL_SECS)),
            job_lease: Duration::from_secs(secs("WORKER_JOB_LEASE_SECS", DEFAULT_JOB_LEASE_SECS)),
        }
    }
}

/// Claim and run one job. Returns the job and its outcome, or `None` when the
/// queue is empty.
pub async fn process_next(
    pool: &PgPool,
    dispatcher: &Dispatcher,
    job_lease: Duration,
) -> Result<Option<(EmailJob, Result<DispatchSummary, DispatchError>)>, sqlx::Error> {
    let Some(job) = EmailJobRepo::claim_next(pool, job_lease).await? else {
        return Ok(None);
    };
    if job.attempts > 1 {
        tracing::warn!(job_id = job.id, attempts = job.attempts, "Reclaimed email job after an expired lease");
    }
    tracing::info!(job_id = job.id, template_id = job.emailtemplate_id, kind = %job.kind, "Email job claimed");

    let outcome = dispatcher.run_job(&job).await;
    match &outcome {
        Ok(summary) => {
            EmailJobRepo::mark_done(pool, job.id).await?;
            tracing::info!(job_id = job.id, sent = summary.sent, failed = summary.failed, "Email job done");
        }
        Err(e) => {
            EmailJobRepo::mark_failed(pool, job.id, &e.to_string()).await?;
            tracing::error!(job_id = job.id, error = %e, "Email job failed");
        }
    }
    Ok(Some((job, outcome)))
}

/// Drain the queue until `cancel` is triggered.
///
/// The queue is drained back-to-back while jobs are available; the loop only
/// sleeps for the poll interval once it is empty.
pub async fn run(pool: PgPool, dispatcher: Dispatcher, config: WorkerConfig, cancel: CancellationToken) {
    tracing::info!(
        poll_secs = config.poll_interval.as_secs(),
        lease_secs = config.job_lease.as_secs(),
        "Email queue worker started"
    );

    loop {
        if cancel.is_cancelled() {
            break;
        }
        let idle = match process_next(&pool, &dispatcher, config.job_lease).await {
            Ok(Some(_)) => false,
            Ok(None) => true,
            Err(e) => {
                tracing::error!(error = %e, "Email queue poll failed");
                true
            }
        };
        if idle {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(config.poll_interval) => {}
            }
        }
    }

    tracing::info!("Email queue worker stopping");
}
