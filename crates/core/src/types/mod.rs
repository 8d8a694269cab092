//! Core types for Logistik.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod role;
pub mod status;
pub mod weight;

pub use email::{Email, EmailError};
pub use id::*;
pub use role::{ParseRoleError, Role};
pub use status::{DeliveryStatus, ParseStatusError, StatusCounts};
pub use weight::{Weight, WeightError};
