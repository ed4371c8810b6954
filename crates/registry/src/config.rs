//! Registry endpoints loaded from environment variables.

/// Default request timeout for registry calls, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 500;

/// Base URL and token of one registry.
#[derive(Debug, Clone, Default)]
pub struct Endpoint {
    pub url: String,
    pub token: String,
}

impl Endpoint {
    fn from_env(prefix: &str) -> Self {
        Self {
            url: env_or(&format!("{prefix}_REGISTRY_URL"), ""),
            token: env_or(&format!("{prefix}_REGISTRY_TOKEN"), ""),
        }
    }
}

/// Configuration for all registries.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub bdr: Endpoint,
    pub bdr_companies_path: String,
    pub bdr_persons_path: String,
    pub ecr: Endpoint,
    /// Domains queried on ECR, substituted for `[domain]` in the company path.
    pub ecr_domains: Vec<String>,
    pub ecr_company_path: String,
    pub ecr_person_path: String,
    pub fgases: Endpoint,
    pub fgases_companies_path: String,
    pub fgases_persons_path: String,
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            bdr: Endpoint::default(),
            bdr_companies_path: "/management/companies".into(),
            bdr_persons_path: "/management/persons".into(),
            ecr: Endpoint::default(),
            ecr_domains: vec!["FGAS".into(), "ODS".into()],
            ecr_company_path: "/undertaking/[domain]/list".into(),
            ecr_person_path: "/user/list".into(),
            fgases: Endpoint::default(),
            fgases_companies_path: "/undertaking/FGAS/list".into(),
            fgases_persons_path: "/user/list".into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from environment variables, falling back to
    /// [`Default`] for anything unset.
    ///
    /// | Env Var                                    | Default                       |
    /// |--------------------------------------------|-------------------------------|
    /// | `BDR_REGISTRY_URL` / `_TOKEN`              | empty                         |
    /// | `BDR_COMPANIES_PATH`                       | `/management/companies`       |
    /// | `BDR_PERSONS_PATH`                         | `/management/persons`         |
    /// | `ECR_REGISTRY_URL` / `_TOKEN`              | empty                         |
    /// | `ECR_DOMAINS`                              | `FGAS,ODS`                    |
    /// | `ECR_COMPANY_PATH`                         | `/undertaking/[domain]/list`  |
    /// | `ECR_PERSON_PATH`                          | `/user/list`                  |
    /// | `FGASES_REGISTRY_URL` / `_TOKEN`           | empty                         |
    /// | `FGASES_COMPANIES_PATH`                    | `/undertaking/FGAS/list`      |
    /// | `FGASES_PERSONS_PATH`                      | `/user/list`                  |
    /// | `REGISTRY_TIMEOUT_SECS`                    | `500`                         |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ecr_domains = std::env::var("ECR_DOMAINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.ecr_domains);

        let timeout_secs: u64 = std::env::var("REGISTRY_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("REGISTRY_TIMEOUT_SECS must be a valid u64");

        Self {
            bdr: Endpoint::from_env("BDR"),
            bdr_companies_path: env_or("BDR_COMPANIES_PATH", &defaults.bdr_companies_path),
            bdr_persons_path: env_or("BDR_PERSONS_PATH", &defaults.bdr_persons_path),
            ecr: Endpoint::from_env("ECR"),
            ecr_domains,
            ecr_company_path: env_or("ECR_COMPANY_PATH", &defaults.ecr_company_path),
            ecr_person_path: env_or("ECR_PERSON_PATH", &defaults.ecr_person_path),
            fgases: Endpoint::from_env("FGASES"),
            fgases_companies_path: env_or("FGASES_COMPANIES_PATH", &defaults.fgases_companies_path),
            fgases_persons_path: env_or("FGASES_PERSONS_PATH", &defaults.fgases_persons_path),
            timeout_secs,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
