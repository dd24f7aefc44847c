//! Bandsite Core - Shared domain types.
//!
//! This crate provides common types used across all Bandsite components:
//! - `server` - Public band websites, public JSON API and the admin API
//! - `cli` - Command-line tools for migrations, tenants and admin users
//!
//! # Architecture
//!
//! The core crate contains only types and parsing rules - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, slugs, colors and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
