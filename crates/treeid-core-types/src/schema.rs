//! Canonical schema constants for structured logging and events
//!
//! These constants keep log fields consistent between the resolver,
//! its keep-alive cache and the error facility.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_PASS_ID: &str = "pass_id";

// Tree positions
pub const FIELD_INSTANCE_ID: &str = "instance_id";
pub const FIELD_PARENT_ID: &str = "parent_id";
pub const FIELD_SLOT: &str = "slot";
pub const FIELD_KEY: &str = "key";

// Plan counts
pub const FIELD_CREATED: &str = "created";
pub const FIELD_UPDATED: &str = "updated";
pub const FIELD_DESTROYED: &str = "destroyed";
pub const FIELD_ACTIVATED: &str = "activated";
pub const FIELD_DEACTIVATED: &str = "deactivated";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
pub const EVENT_AMBIGUOUS_KEY: &str = "ambiguous_key";
pub const EVENT_EVICTED: &str = "evicted";
