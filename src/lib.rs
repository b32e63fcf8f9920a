//! Mirrors MailChimp lists and list members into a local Postgres database.
//!
//! Every write goes to MailChimp first; the local row is only written once the
//! provider has accepted the change, so the local store never holds an entity
//! that MailChimp rejected.

pub mod configuration;
pub mod domain;
pub mod mailchimp_client;
pub mod persistence;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod validation;
