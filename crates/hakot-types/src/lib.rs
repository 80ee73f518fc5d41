//! Hakot Types - Shared domain types
//!
//! This crate contains domain types used across the hakot billing services:
//! - Subscription and invoice status enums
//! - Subscription, plan, invoice and payment records
//! - User-facing action descriptors

pub mod action;
pub mod error;
pub mod invoice;
pub mod payment;
pub mod status;
pub mod subscription;

pub use action::*;
pub use error::*;
pub use invoice::*;
pub use payment::*;
pub use status::*;
pub use subscription::*;
