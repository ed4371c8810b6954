//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for inserts and patches where the API needs them

pub mod companies_group;
pub mod company;
pub mod cycle;
pub mod email_job;
pub mod email_template;
pub mod notification;
pub mod person;
pub mod recipient;
pub mod stage;
pub mod staff_user;
