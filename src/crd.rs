//! `RoleInstance` CRD type definition.

pub mod spec;
pub mod status;
pub mod types;

pub use spec::{RoleInstance, RoleInstanceSpec};
pub use status::{RoleCondition, RoleInstanceStatus};
pub use types::{DependencyRef, RoleKind, RolePhase};
