//! Core types for Bandsite.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod color;
pub mod email;
pub mod id;
pub mod slug;
pub mod status;

pub use color::{ColorError, HexColor};
pub use email::{Email, EmailError};
pub use id::*;
pub use slug::{Slug, SlugError};
pub use status::*;
