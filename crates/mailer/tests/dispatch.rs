//! Integration tests for trigger, resend and test sends.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::NaiveDate;
use notifications_core::error::CoreError;
use notifications_core::groups::{CARS_GROUP_CODE, VANS_GROUP_CODE};
use notifications_core::template_status::TemplateStatus;
use notifications_db::models::company::CreateCompany;
use notifications_db::models::cycle::CreateCycle;
use notifications_db::models::email_template::UpdateCycleEmailTemplate;
use notifications_db::models::person::UpsertPerson;
use notifications_db::repositories::{
    CompaniesGroupRepo, CompanyRepo, CycleRepo, EmailJobRepo, EmailTemplateRepo,
    NotificationRepo, PersonCompanyRepo, PersonRepo,
};
use notifications_mailer::{
    DispatchError, Dispatcher, EmailError, Mailer, MemoryMailer, OutgoingEmail,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SUBJECT: &str = "{COMPANY} reporting";
const BODY: &str = "<p>Dear {CONTACT}, report {EXTERNAL_ID} by {CLOSING_DATE}.</p>";

/// Seed a 2024 cycle with two linked car companies and return the cars
/// template of the first stage.
async fn seed(pool: &PgPool) -> i64 {
    let cycle = CycleRepo::create_with_defaults(
        pool,
        &CreateCycle {
            year: 2024,
            closing_date: NaiveDate::from_ymd_opt(2024, 10, 3).unwrap(),
        },
    )
    .await
    .unwrap();

    let cars = CompaniesGroupRepo::find_by_code(pool, CARS_GROUP_CODE).await.unwrap().unwrap();
    for (external_id, name, username) in [("C1", "Acme", "ann"), ("C2", "Bolt", "bob")] {
        let company = CompanyRepo::create(
            pool,
            &CreateCompany {
                external_id: Some(external_id.to_string()),
                name: name.to_string(),
                vat: None,
                country: "Germany".to_string(),
                group_id: cars.id,
                status: String::new(),
                representative_name: None,
                representative_vat: None,
                representative_country_name: None,
                check_passed: None,
            },
        )
        .await
        .unwrap();
        let (person, _) = PersonRepo::upsert_by_username(
            pool,
            &UpsertPerson {
                username: username.to_string(),
                name: username.to_uppercase(),
                email: format!("{username}@example.com"),
            },
        )
        .await
        .unwrap();
        PersonCompanyRepo::link(pool, person.id, company.id).await.unwrap();
    }

    let template = EmailTemplateRepo::list_for_cycle(pool, cycle.id)
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.group_code == CARS_GROUP_CODE && t.stage_title == "Invitations")
        .unwrap();
    EmailTemplateRepo::update_content(
        pool,
        template.id,
        &UpdateCycleEmailTemplate {
            subject: Some(SUBJECT.to_string()),
            body_html: Some(BODY.to_string()),
        },
    )
    .await
    .unwrap();
    template.id
}

fn dispatcher(pool: &PgPool) -> (Dispatcher, Arc<MemoryMailer>) {
    let mailer = Arc::new(MemoryMailer::new());
    (Dispatcher::new(pool.clone(), mailer.clone()), mailer)
}

/// An outbox that takes `delay` per message, like a slow SMTP relay.
struct SlowMailer {
    outbox: Arc<MemoryMailer>,
    delay: Duration,
}

#[async_trait]
impl Mailer for SlowMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        tokio::time::sleep(self.delay).await;
        self.outbox.send(email).await
    }
}

async fn template_status(pool: &PgPool, template_id: i64) -> TemplateStatus {
    EmailTemplateRepo::find_by_id(pool, template_id)
        .await
        .unwrap()
        .unwrap()
        .status
}

// ---------------------------------------------------------------------------
// Trigger / resend
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_trigger_sends_and_records(pool: PgPool) {
    let template_id = seed(&pool).await;
    let (dispatcher, mailer) = dispatcher(&pool);

    let summary = dispatcher.trigger(template_id, None).await.unwrap();
    assert_eq!(summary.recipients, 2);
    assert_eq!(summary.sent, 2);
    assert_eq!(summary.failed, 0);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 2);
    let ann = sent.iter().find(|m| m.to == "ann@example.com").unwrap();
    assert_eq!(ann.subject, "Acme reporting");
    assert_eq!(ann.body_html, "<p>Dear ANN, report C1 by 03 October 2024.</p>");

    let log = NotificationRepo::list_for_template(&pool, template_id).await.unwrap();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|n| n.counter == 1));

    let template = EmailTemplateRepo::find_by_id(&pool, template_id).await.unwrap().unwrap();
    assert_eq!(template.status, TemplateStatus::Sent);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_trigger_conflicts(pool: PgPool) {
    let template_id = seed(&pool).await;
    let (dispatcher, mailer) = dispatcher(&pool);

    dispatcher.trigger(template_id, None).await.unwrap();
    let err = dispatcher.trigger(template_id, None).await.unwrap_err();
    assert_matches!(err, DispatchError::Core(CoreError::Conflict(_)));
    assert_eq!(mailer.sent().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_resend_increments_counters(pool: PgPool) {
    let template_id = seed(&pool).await;
    let (dispatcher, _mailer) = dispatcher(&pool);

    let err = dispatcher.resend(template_id, None).await.unwrap_err();
    assert_matches!(err, DispatchError::Core(CoreError::Conflict(_)));

    dispatcher.trigger(template_id, None).await.unwrap();
    let filter = vec!["C2".to_string()];
    let summary = dispatcher.resend(template_id, Some(&filter)).await.unwrap();
    assert_eq!(summary.sent, 1);

    let log = NotificationRepo::list_for_template(&pool, template_id).await.unwrap();
    let bob: Vec<i32> = log
        .iter()
        .filter(|n| n.email == "bob@example.com")
        .map(|n| n.counter)
        .collect();
    assert_eq!(bob, [2, 1]);

    let template = EmailTemplateRepo::find_by_id(&pool, template_id).await.unwrap().unwrap();
    assert_eq!(template.status, TemplateStatus::Sent);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_abandoned_trigger_still_completes(pool: PgPool) {
    let template_id = seed(&pool).await;
    let outbox = Arc::new(MemoryMailer::new());
    let dispatcher = Dispatcher::new(
        pool.clone(),
        Arc::new(SlowMailer {
            outbox: outbox.clone(),
            delay: Duration::from_millis(300),
        }),
    );

    // The caller gives up halfway through the run, as a request timeout does.
    let abandoned =
        tokio::time::timeout(Duration::from_millis(400), dispatcher.trigger(template_id, None))
            .await;
    assert!(abandoned.is_err());

    let mut waited = Duration::ZERO;
    while template_status(&pool, template_id).await != TemplateStatus::Sent {
        assert!(waited < Duration::from_secs(10), "send run never finished");
        tokio::time::sleep(Duration::from_millis(50)).await;
        waited += Duration::from_millis(50);
    }

    assert_eq!(outbox.sent().len(), 2);
    let log = NotificationRepo::list_for_template(&pool, template_id).await.unwrap();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|n| n.counter == 1));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_resends_record_every_send(pool: PgPool) {
    let template_id = seed(&pool).await;
    let (dispatcher, mailer) = dispatcher(&pool);
    dispatcher.trigger(template_id, None).await.unwrap();

    for _ in 0..5 {
        let (first, second) = tokio::join!(
            dispatcher.resend(template_id, None),
            dispatcher.resend(template_id, None)
        );
        assert_eq!(first.unwrap().sent, 2);
        assert_eq!(second.unwrap().sent, 2);
    }

    let log = NotificationRepo::list_for_template(&pool, template_id).await.unwrap();
    assert_eq!(mailer.sent().len(), 22);
    assert_eq!(log.len(), 22);

    let mut ann: Vec<i32> = log
        .iter()
        .filter(|n| n.email == "ann@example.com")
        .map(|n| n.counter)
        .collect();
    ann.sort_unstable();
    assert_eq!(ann, (1..=11).collect::<Vec<i32>>());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_shared_address_gets_one_message_per_run(pool: PgPool) {
    let template_id = seed(&pool).await;
    // bob now uses ann's address.
    PersonRepo::upsert_by_username(
        &pool,
        &UpsertPerson {
            username: "bob".to_string(),
            name: "BOB".to_string(),
            email: "ann@example.com".to_string(),
        },
    )
    .await
    .unwrap();
    let (dispatcher, mailer) = dispatcher(&pool);

    let summary = dispatcher.trigger(template_id, None).await.unwrap();
    assert_eq!(summary.recipients, 1);
    assert_eq!(summary.sent, 1);
    assert_eq!(mailer.sent().len(), 1);
    assert_eq!(mailer.sent()[0].subject, "Acme reporting");

    let log = NotificationRepo::list_for_template(&pool, template_id).await.unwrap();
    assert_eq!(log.iter().map(|n| n.counter).collect::<Vec<_>>(), [1]);

    dispatcher.resend(template_id, None).await.unwrap();
    let log = NotificationRepo::list_for_template(&pool, template_id).await.unwrap();
    assert_eq!(log.iter().map(|n| n.counter).collect::<Vec<_>>(), [2, 1]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_recipient_is_counted_not_recorded(pool: PgPool) {
    let template_id = seed(&pool).await;
    let (dispatcher, mailer) = dispatcher(&pool);
    mailer.fail_for("bob@example.com");

    let summary = dispatcher.trigger(template_id, None).await.unwrap();
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(
        NotificationRepo::list_for_template(&pool, template_id).await.unwrap().len(),
        1
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_template_with_unknown_parameter_is_not_triggered(pool: PgPool) {
    let template_id = seed(&pool).await;
    EmailTemplateRepo::update_content(
        &pool,
        template_id,
        &UpdateCycleEmailTemplate {
            subject: None,
            body_html: Some("<p>{NOPE}</p>".to_string()),
        },
    )
    .await
    .unwrap();
    let (dispatcher, mailer) = dispatcher(&pool);

    let err = dispatcher.trigger(template_id, None).await.unwrap_err();
    assert_matches!(err, DispatchError::Core(CoreError::Validation(_)));
    assert!(mailer.sent().is_empty());
    let template = EmailTemplateRepo::find_by_id(&pool, template_id).await.unwrap().unwrap();
    assert_eq!(template.status, TemplateStatus::Draft);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_vans_template_has_no_recipients(pool: PgPool) {
    seed(&pool).await;
    let (dispatcher, mailer) = dispatcher(&pool);
    let vans_template = sqlx::query_scalar::<_, i64>(
        "SELECT t.id FROM cycle_email_templates t \
         JOIN companies_groups g ON g.id = t.group_id \
         WHERE g.code = $1 LIMIT 1",
    )
    .bind(VANS_GROUP_CODE)
    .fetch_one(&pool)
    .await
    .unwrap();

    let summary = dispatcher.trigger(vans_template, None).await.unwrap();
    assert_eq!(summary.recipients, 0);
    assert!(mailer.sent().is_empty());
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_queued_trigger_runs_in_job(pool: PgPool) {
    let template_id = seed(&pool).await;
    let (dispatcher, mailer) = dispatcher(&pool);

    dispatcher.enqueue_trigger(template_id, None).await.unwrap();
    let template = EmailTemplateRepo::find_by_id(&pool, template_id).await.unwrap().unwrap();
    assert_eq!(template.status, TemplateStatus::Processing);
    assert!(mailer.sent().is_empty());

    let job = EmailJobRepo::claim_next(&pool, Duration::from_secs(3600))
        .await
        .unwrap()
        .unwrap();
    let summary = dispatcher.run_job(&job).await.unwrap();
    assert_eq!(summary.sent, 2);
    let template = EmailTemplateRepo::find_by_id(&pool, template_id).await.unwrap().unwrap();
    assert_eq!(template.status, TemplateStatus::Sent);
}

// ---------------------------------------------------------------------------
// Test sends
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_send_test_uses_supplied_values(pool: PgPool) {
    let template_id = seed(&pool).await;
    let (dispatcher, mailer) = dispatcher(&pool);
    let values = HashMap::from([
        ("company".to_string(), "Sample Co".to_string()),
        ("contact".to_string(), "Tester".to_string()),
    ]);

    dispatcher
        .send_test(template_id, " staff@example.com ", &values)
        .await
        .unwrap();

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "staff@example.com");
    assert_eq!(sent[0].subject, "Sample Co reporting");
    assert_eq!(sent[0].body_html, "<p>Dear Tester, report  by .</p>");
    assert!(NotificationRepo::list_for_template(&pool, template_id)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_send_test_rejects_bad_address(pool: PgPool) {
    let template_id = seed(&pool).await;
    let (dispatcher, mailer) = dispatcher(&pool);

    let err = dispatcher
        .send_test(template_id, "not-an-address", &HashMap::new())
        .await
        .unwrap_err();
    assert_matches!(err, DispatchError::Core(CoreError::Validation(_)));
    assert!(mailer.sent().is_empty());
}
