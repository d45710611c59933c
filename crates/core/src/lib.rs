//! Kiosky Core - Shared domain types and the permission engine.
//!
//! This crate provides the types used across all Kiosky components:
//! - `api` - Multi-tenant storefront backend (HTTP + `PostgreSQL`)
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Authorization decisions live here so they can be tested in
//! isolation from storage and transport.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, roles, domains, slugs and prices
//! - [`authz`] - Principal model and the store-scoped permission engine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod authz;
pub mod types;

pub use authz::{Decision, DenyReason, Principal, authorize, can_read, decide, has_role_at_least};
pub use types::*;
