//! Request extractors guarding the API.
//!
//! - [`auth::AuthUser`] -- a staff member authenticated by JWT Bearer token.
//! - [`fetch_token::FetchToken`] -- the shared-secret token of `/fetch`.

pub mod auth;
pub mod fetch_token;
