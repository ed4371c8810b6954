//! Domain building blocks for the BDR notifications service.
//!
//! Pure logic only: no database or network access lives here. The db,
//! registry, mailer and api crates all build on these types.

pub mod error;
pub mod fetch;
pub mod groups;
pub mod params;
pub mod recipients;
pub mod stages;
pub mod template_status;
pub mod types;
