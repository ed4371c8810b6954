//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` (or a transaction connection) as the first argument.

pub mod companies_group_repo;
pub mod company_repo;
pub mod cycle_repo;
pub mod email_job_repo;
pub mod email_template_repo;
pub mod notification_repo;
pub mod person_company_repo;
pub mod person_repo;
pub mod staff_user_repo;
pub mod stage_repo;

pub use companies_group_repo::CompaniesGroupRepo;
pub use company_repo::CompanyRepo;
pub use cycle_repo::CycleRepo;
pub use email_job_repo::EmailJobRepo;
pub use email_template_repo::EmailTemplateRepo;
pub use notification_repo::NotificationRepo;
pub use person_company_repo::PersonCompanyRepo;
pub use person_repo::PersonRepo;
pub use staff_user_repo::StaffUserRepo;
pub use stage_repo::StageRepo;
