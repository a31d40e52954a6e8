//! Node and instance models for the resolver.

pub mod instance;
pub mod node;
pub mod position;

pub use instance::{Instance, LifecycleStage, OpaqueState};
pub use node::{Blueprint, Children, Key, Node, NodeKind};
pub use position::{IdentityToken, InstanceId, Lineage, Position, SlotName};
