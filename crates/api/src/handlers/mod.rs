//! HTTP request handlers, one module per resource.

pub mod auth;
pub mod company;
pub mod cycle;
pub mod dashboard;
pub mod email_template;
pub mod fetch;
pub mod group;
pub mod notification;
pub mod person;
pub mod stage;
