//! Rendering and sending a template to its recipients.
//!
//! A template goes draft -> processing -> sent. Triggering claims the draft
//! atomically, so two concurrent triggers cannot both send. Every delivered
//! message is recorded in `cycle_notifications` with a counter one above the
//! previous send of the same template to the same address.
//!
//! Inline triggers and resends run on their own task. A caller that gives up
//! (a request timeout, a dropped connection) does not cut a send run short.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use notifications_core::error::CoreError;
use notifications_core::params::{render, validate_template, TemplateParams};
use notifications_core::recipients::validate_recipient_email;
use notifications_core::template_status::TemplateStatus;
use notifications_core::types::DbId;
use notifications_db::models::email_job::{EmailJob, JOB_KIND_RESEND, JOB_KIND_TRIGGER};
use notifications_db::models::email_template::TemplateDetail;
use notifications_db::models::notification::CreateCycleNotification;
use notifications_db::repositories::{
    EmailJobRepo, EmailTemplateRepo, NotificationRepo, PersonCompanyRepo,
};
use serde::Serialize;
use sqlx::PgPool;

use crate::transport::{EmailError, Mailer, OutgoingEmail};

/// Header identifying the template a message was rendered from.
pub const TEMPLATE_HEADER: &str = "X-Notification-Template";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Email(#[from] EmailError),
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Outcome of one send run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchSummary {
    pub template_id: DbId,
    pub recipients: usize,
    pub sent: usize,
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Run a send on its own task and wait for it.
///
/// Dropping the returned future leaves the task running to completion, so
/// the template still ends up `sent` and every delivered message is recorded.
async fn detached<F>(template_id: DbId, run: F) -> Result<DispatchSummary, DispatchError>
where
    F: Future<Output = Result<DispatchSummary, DispatchError>> + Send + 'static,
{
    tokio::spawn(run).await.map_err(|e| -> DispatchError {
        tracing::error!(template_id, error = %e, "Send task aborted");
        CoreError::Internal(format!("Send task for template {template_id} aborted: {e}")).into()
    })?
}

#[derive(Clone)]
pub struct Dispatcher {
    pool: PgPool,
    mailer: Arc<dyn Mailer>,
}

impl Dispatcher {
    pub fn new(pool: PgPool, mailer: Arc<dyn Mailer>) -> Self {
        Self { pool, mailer }
    }

    /// Send a draft template to every current recipient of its group.
    ///
    /// Fails with a conflict if the template was already triggered.
    pub async fn trigger(
        &self,
        template_id: DbId,
        external_ids: Option<&[String]>,
    ) -> Result<DispatchSummary, DispatchError> {
        let this = self.clone();
        let filter = external_ids.map(<[String]>::to_vec);
        detached(template_id, async move {
            let template = this.claim(template_id).await?;
            this.deliver(&template, filter.as_deref()).await
        })
        .await
    }

    /// Send an already triggered template again. Counters increase.
    pub async fn resend(
        &self,
        template_id: DbId,
        external_ids: Option<&[String]>,
    ) -> Result<DispatchSummary, DispatchError> {
        let this = self.clone();
        let filter = external_ids.map(<[String]>::to_vec);
        detached(template_id, async move {
            let template = this.load_triggered(template_id).await?;
            this.deliver(&template, filter.as_deref()).await
        })
        .await
    }

    /// Claim a draft and queue the send for the worker.
    pub async fn enqueue_trigger(
        &self,
        template_id: DbId,
        external_ids: Option<&[String]>,
    ) -> Result<EmailJob, DispatchError> {
        self.claim(template_id).await?;
        let job = EmailJobRepo::enqueue(&self.pool, template_id, JOB_KIND_TRIGGER, external_ids).await?;
        tracing::info!(template_id, job_id = job.id, "Trigger queued");
        Ok(job)
    }

    /// Queue a resend for the worker.
    pub async fn enqueue_resend(
        &self,
        template_id: DbId,
        external_ids: Option<&[String]>,
    ) -> Result<EmailJob, DispatchError> {
        self.load_triggered(template_id).await?;
        EmailTemplateRepo::set_status(&self.pool, template_id, TemplateStatus::Processing).await?;
        let job = EmailJobRepo::enqueue(&self.pool, template_id, JOB_KIND_RESEND, external_ids).await?;
        tracing::info!(template_id, job_id = job.id, "Resend queued");
        Ok(job)
    }

    /// Run a queued job. The template was claimed when the job was queued.
    pub async fn run_job(&self, job: &EmailJob) -> Result<DispatchSummary, DispatchError> {
        let filter = job.external_id_filter().map_err(|e| {
            CoreError::Internal(format!("Job {} has an unreadable recipient filter: {e}", job.id))
        })?;
        let template = self.load_triggered(job.emailtemplate_id).await?;
        self.deliver(&template, filter.as_deref()).await
    }

    /// Render a template with caller-supplied values and send it to one
    /// address. Nothing is recorded and the status is unchanged.
    pub async fn send_test(
        &self,
        template_id: DbId,
        email: &str,
        values: &HashMap<String, String>,
    ) -> Result<(), DispatchError> {
        let template = self.load(template_id).await?;
        let to = validate_recipient_email(email)?;
        let params = TemplateParams::from_supplied(values.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let message = OutgoingEmail::new(
            to,
            render(&template.subject, &params)?,
            render(&template.body_html, &params)?,
        )
        .with_header(TEMPLATE_HEADER, template.id.to_string());
        self.mailer.send(&message).await?;

        tracing::info!(template_id, to = %message.to, "Test email sent");
        Ok(())
    }

    // -- internals ------------------------------------------------------------

    async fn load(&self, template_id: DbId) -> Result<TemplateDetail, DispatchError> {
        EmailTemplateRepo::find_detail(&self.pool, template_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "CycleEmailTemplate",
                    id: template_id,
                }
                .into()
            })
    }

    async fn load_triggered(&self, template_id: DbId) -> Result<TemplateDetail, DispatchError> {
        let template = self.load(template_id).await?;
        if !template.is_triggered() {
            return Err(CoreError::Conflict(format!(
                "Template {} has not been triggered yet",
                template.label()
            ))
            .into());
        }
        Ok(template)
    }

    /// Validate a draft and move it to processing.
    async fn claim(&self, template_id: DbId) -> Result<TemplateDetail, DispatchError> {
        let mut template = self.load(template_id).await?;
        let already = || {
            CoreError::Conflict(format!("Template {} was already triggered", template_id))
        };
        if template.is_triggered() {
            return Err(already().into());
        }
        validate_template(&template.subject, &template.body_html)?;

        if !EmailTemplateRepo::claim_for_trigger(&self.pool, template_id).await? {
            return Err(already().into());
        }
        template.status = TemplateStatus::Processing;
        Ok(template)
    }

    /// Send to each recipient, record each success, then mark the template sent.
    ///
    /// Each address gets one message per run: when several links share an
    /// email, the first in recipient order is used. A recipient whose message
    /// the transport refuses is logged and counted; the run continues.
    async fn deliver(
        &self,
        template: &TemplateDetail,
        external_ids: Option<&[String]>,
    ) -> Result<DispatchSummary, DispatchError> {
        let linked =
            PersonCompanyRepo::recipients_for_group(&self.pool, template.group_id, external_ids)
                .await?;
        let mut seen = HashSet::new();
        let recipients: Vec<_> = linked
            .into_iter()
            .filter(|r| {
                let first = seen.insert(r.email.to_lowercase());
                if !first {
                    tracing::debug!(
                        template_id = template.id,
                        to = %r.email,
                        company_id = r.company_id,
                        "Duplicate address skipped"
                    );
                }
                first
            })
            .collect();
        let mut summary = DispatchSummary {
            template_id: template.id,
            recipients: recipients.len(),
            ..DispatchSummary::default()
        };
        tracing::info!(
            template_id = template.id,
            template = %template.label(),
            recipients = recipients.len(),
            "Sending notifications"
        );

        for recipient in &recipients {
            let params = TemplateParams::for_recipient(&recipient.context(template.closing_date));
            let subject = render(&template.subject, &params)?;
            let body_html = render(&template.body_html, &params)?;
            let message = OutgoingEmail::new(recipient.email.clone(), subject, body_html)
                .with_header(TEMPLATE_HEADER, template.id.to_string());

            if let Err(e) = self.mailer.send(&message).await {
                tracing::warn!(
                    template_id = template.id,
                    to = %recipient.email,
                    error = %e,
                    "Notification email failed"
                );
                summary.failed += 1;
                continue;
            }

            NotificationRepo::create_with_next_counter(
                &self.pool,
                &CreateCycleNotification {
                    subject: message.subject,
                    email: message.to,
                    body_html: message.body_html,
                    emailtemplate_id: template.id,
                    person_id: recipient.person_id,
                    company_id: recipient.company_id,
                },
            )
            .await?;
            summary.sent += 1;
        }

        EmailTemplateRepo::set_status(&self.pool, template.id, TemplateStatus::Sent).await?;
        tracing::info!(
            template_id = template.id,
            sent = summary.sent,
            failed = summary.failed,
            "Notifications sent"
        );
        Ok(summary)
    }
}
