//! Bandsite server library.
//!
//! Multi-tenant band websites: each band's public site and JSON API, the
//! admin API behind password + TOTP login, and the Shopify and SES
//! integrations. Exposed as a library so the CLI and tests can reuse it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
pub mod tenancy;
