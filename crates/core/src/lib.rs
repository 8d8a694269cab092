//! Logistik Core - Shared domain types and policies.
//!
//! This crate provides the types used across all Logistik components:
//! - `web` - The delivery tracking web application
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure policy functions - no I/O, no
//! database access, no HTTP. Persistence adapters live in the `web` crate and
//! call into the policies defined here.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, weights, roles and statuses
//! - [`access`] - Which role may invoke which operation
//! - [`delivery`] - The delivery record and its status lifecycle

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod delivery;
pub mod types;

pub use access::{AccessDenied, Operation, authorize, authorize_admin_area};
pub use delivery::{Delivery, DeliveryFields};
pub use types::*;
