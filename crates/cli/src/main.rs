//! Management commands for the notifications service.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use notifications_api::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use notifications_api::handlers::fetch::SCHEDULED_REGISTRIES;
use notifications_db::models::company::CreateCompany;
use notifications_db::models::person::UpsertPerson;
use notifications_db::repositories::{
    CompaniesGroupRepo, CompanyRepo, CycleRepo, EmailTemplateRepo, PersonCompanyRepo, PersonRepo,
    StaffUserRepo,
};
use notifications_db::DbPool;
use notifications_registry::fetch::Fetcher;
use notifications_registry::{build_registry, RegistryConfig, RegistryError, RegistryKind};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "notifications-cli")]
#[command(about = "Management commands for the BDR notifications service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch companies and persons from a registry
    Fetch {
        #[arg(value_enum)]
        registry: FetchTarget,

        /// Use the bundled test fixtures instead of the live registry
        #[arg(long)]
        test: bool,
    },

    /// Create a staff account for the web interface
    CreateStaffUser {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "STAFF_PASSWORD")]
        password: String,
    },

    /// Generate fake companies and persons in every group
    CreateTestCompanies {
        /// Companies per group
        #[arg(short, long, default_value_t = 100)]
        companies: u32,

        /// Persons per company
        #[arg(short, long, default_value_t = 5)]
        people: u32,
    },

    /// Create any missing templates of a cycle
    GenerateTemplates {
        #[arg(long)]
        cycle: i16,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FetchTarget {
    Bdr,
    Ecr,
    #[value(alias = "fcs")]
    Fgases,
    /// BDR then ECR
    All,
}

impl FetchTarget {
    fn kinds(self) -> Vec<RegistryKind> {
        match self {
            Self::Bdr => vec![RegistryKind::Bdr],
            Self::Ecr => vec![RegistryKind::Ecr],
            Self::Fgases => vec![RegistryKind::Fgases],
            Self::All => SCHEDULED_REGISTRIES.to_vec(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notifications_cli=info,notifications_registry=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = notifications_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    notifications_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    match cli.command {
        Command::Fetch { registry, test } => fetch(&pool, registry, test).await,
        Command::CreateStaffUser { username, password } => {
            create_staff_user(&pool, &username, &password).await
        }
        Command::CreateTestCompanies { companies, people } => {
            create_test_companies(&pool, companies, people).await
        }
        Command::GenerateTemplates { cycle } => generate_templates(&pool, cycle).await,
    }
}

async fn fetch(pool: &DbPool, target: FetchTarget, test: bool) -> anyhow::Result<()> {
    let config = RegistryConfig::from_env();
    let mut unavailable = Vec::new();
    for kind in target.kinds() {
        let registry = build_registry(kind, &config, test)?;
        tracing::info!(registry = registry.name(), "Fetch started");
        match Fetcher::run(pool, registry.as_ref()).await {
            Ok(report) => println!("{kind}: {}", report.message()),
            Err(RegistryError::Database(e)) => return Err(e.into()),
            Err(e) => {
                println!("{kind}: Registry unavailable: {e}");
                unavailable.push(kind.as_str());
            }
        }
    }
    if !unavailable.is_empty() {
        bail!("Could not fetch: {}", unavailable.join(", "));
    }
    Ok(())
}

async fn create_staff_user(pool: &DbPool, username: &str, password: &str) -> anyhow::Result<()> {
    let username = username.trim();
    if username.is_empty() {
        bail!("Username must not be empty");
    }
    validate_password_strength(password, MIN_PASSWORD_LENGTH).map_err(anyhow::Error::msg)?;
    if StaffUserRepo::find_by_username(pool, username).await?.is_some() {
        bail!("Staff user '{username}' already exists");
    }

    let hash = hash_password(password).map_err(|e| anyhow::anyhow!("Password hashing failed: {e}"))?;
    let user = StaffUserRepo::create(pool, username, &hash).await?;
    tracing::info!(user_id = user.id, username, "Staff user created");
    println!("Created staff user {username}");
    Ok(())
}

/// Companies are keyed by external id and persons by username, so running
/// the command twice updates the same rows.
async fn create_test_companies(pool: &DbPool, companies: u32, people: u32) -> anyhow::Result<()> {
    let groups = CompaniesGroupRepo::list(pool).await?;
    let mut created = 0u64;

    for group in &groups {
        for i in 0..companies {
            let (company, inserted) = CompanyRepo::upsert_by_external_id(
                pool,
                &CreateCompany {
                    external_id: Some(format!("{}-{i}", group.code)),
                    name: format!("{} Comp-{i}", group.code),
                    vat: Some("No VAT".to_string()),
                    country: "ABC".to_string(),
                    group_id: group.id,
                    status: String::new(),
                    representative_name: None,
                    representative_vat: None,
                    representative_country_name: None,
                    check_passed: Some(true),
                },
            )
            .await?;
            if inserted {
                created += 1;
            }

            for j in 0..people {
                let (person, _) = PersonRepo::upsert_by_username(
                    pool,
                    &UpsertPerson {
                        username: format!("{}-comp-{i}-user-{j}", group.code),
                        name: format!("{} Comp-{i} Name {j}", group.code),
                        email: format!("{}-{i}-{j}@example.com", group.code),
                    },
                )
                .await?;
                PersonCompanyRepo::link(pool, person.id, company.id).await?;
            }
        }
    }

    println!(
        "Created {created} companies across {} groups ({people} persons each)",
        groups.len()
    );
    Ok(())
}

async fn generate_templates(pool: &DbPool, year: i16) -> anyhow::Result<()> {
    let cycle = CycleRepo::find_by_year(pool, year)
        .await?
        .with_context(|| format!("No reporting cycle for {year}"))?;
    let created = EmailTemplateRepo::generate_for_cycle(pool, cycle.id).await?;
    println!("Generated {created} templates for cycle {year}");
    Ok(())
}
