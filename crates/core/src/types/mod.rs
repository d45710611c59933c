//! Core types for Kiosky.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod domain;
pub mod email;
pub mod id;
pub mod price;
pub mod role;
pub mod slug;

pub use domain::{DomainError, StoreDomain};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use role::{Role, RoleParseError};
pub use slug::{Slug, SlugError};
