//! Structured logging facility for the resolver
//!
//! - Single initialization point via `init(profile)`
//! - Structured logging macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Pass correlation through the `pass_id` field
//! - Test capture mode for deterministic assertions
//!
//! # Usage
//!
//! ```rust
//! use treeid_core::logging_facility::{init, Profile};
//!
//! // Initialize once at application startup
//! init(Profile::Development);
//! ```
//!
//! # Events
//!
//! Every `reconcile` call emits `start` and then either `end` (with action
//! counts) or `end_error` (with `err.kind` and `err.code`). Recovered
//! anomalies are logged inside the pass: `ambiguous_key` at warn and
//! `evicted` at info.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
