//! Core types shared across treeid facilities
//!
//! This crate provides foundational types used by both the error and
//! logging facilities of the resolver:
//!
//! - **Correlation types**: PassId
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::PassId;
