//! Tree identity resolver
//!
//! Decides, for each node of a freshly declared tree, which existing runtime
//! instance it continues, so that host state survives re-renders. Identity
//! is the pair (parent instance, identity token) where the token is a
//! sibling's explicit key or, failing that, its index.
//!
//! - Keyed and positional matching with first-wins duplicate handling
//! - Kind-mismatch reset of whole subtrees
//! - Fragments and text leaves as ordinary identity-bearing nodes
//! - Bounded keep-alive caches for deactivated branches
//! - Deterministic, digestible [`ReconciliationPlan`]s
//!
//! A pass is atomic: [`reconcile`] never mutates the map it is given and
//! either returns a complete new map and plan or an error.

pub mod config;
pub mod errors;
pub mod instance_map;
pub mod keep_alive;
pub mod logging_facility;
pub mod model;
pub mod plan;
pub mod policy;
pub mod resolver;

pub use treeid_core_types::schema;

// Re-export commonly used types
pub use config::ResolverConfig;
pub use errors::{ExError, ExErrorKind, ResolveError, Result};
pub use instance_map::InstanceMap;
pub use plan::{ActionKind, PlanAction, ReconciliationPlan};
pub use policy::{NoRetention, RetainComponents, Retention, RetentionPolicy};
pub use resolver::{reconcile, PassOutput, Rendered, Resolver, Session};
pub use treeid_core_types::PassId;
