//! Enum types for role kinds, lifecycle phases, and dependency references.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kind of a managed role instance.
///
/// The gate evaluates kinds in a fixed precedence order; see `crate::gate`.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash, JsonSchema)]
pub enum RoleKind {
    StandaloneNode,
    LicenseAuthority,
    ClusterCoordinator,
    QueryTier,
    StorageTier,
    MonitoringSink,
}

impl RoleKind {
    /// Suffix appended to the instance name to derive its backing workload
    /// (StatefulSet) name, e.g. `idx-east` -> `idx-east-storage-tier`.
    pub const fn workload_suffix(self) -> &'static str {
        match self {
            Self::StandaloneNode => "standalone-node",
            Self::LicenseAuthority => "license-authority",
            Self::ClusterCoordinator => "cluster-coordinator",
            Self::QueryTier => "query-tier",
            Self::StorageTier => "storage-tier",
            Self::MonitoringSink => "monitoring-sink",
        }
    }
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StandaloneNode => write!(f, "StandaloneNode"),
            Self::LicenseAuthority => write!(f, "LicenseAuthority"),
            Self::ClusterCoordinator => write!(f, "ClusterCoordinator"),
            Self::QueryTier => write!(f, "QueryTier"),
            Self::StorageTier => write!(f, "StorageTier"),
            Self::MonitoringSink => write!(f, "MonitoringSink"),
        }
    }
}

/// Lifecycle phase of a role instance, reported by the lifecycle reconciler.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum RolePhase {
    Pending,
    Updating,
    ScalingUp,
    ScalingDown,
    Ready,
    Error,
    Terminating,
}

impl std::fmt::Display for RolePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Updating => write!(f, "Updating"),
            Self::ScalingUp => write!(f, "ScalingUp"),
            Self::ScalingDown => write!(f, "ScalingDown"),
            Self::Ready => write!(f, "Ready"),
            Self::Error => write!(f, "Error"),
            Self::Terminating => write!(f, "Terminating"),
        }
    }
}

/// Named pointer to another role instance of a known kind.
///
/// An empty name is a valid, meaningful value: the holder declares no
/// dependency on that kind, and the gate skips the stage without error.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRef {
    /// Name of the referenced instance, in the holder's namespace.
    #[serde(default)]
    pub name: String,
}

impl DependencyRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns true if the holder actually declares this dependency.
    pub fn is_set(&self) -> bool {
        !self.name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_kind_display() {
        assert_eq!(RoleKind::StandaloneNode.to_string(), "StandaloneNode");
        assert_eq!(RoleKind::LicenseAuthority.to_string(), "LicenseAuthority");
        assert_eq!(
            RoleKind::ClusterCoordinator.to_string(),
            "ClusterCoordinator"
        );
        assert_eq!(RoleKind::QueryTier.to_string(), "QueryTier");
        assert_eq!(RoleKind::StorageTier.to_string(), "StorageTier");
        assert_eq!(RoleKind::MonitoringSink.to_string(), "MonitoringSink");
    }

    #[test]
    fn test_workload_suffix() {
        assert_eq!(
            RoleKind::ClusterCoordinator.workload_suffix(),
            "cluster-coordinator"
        );
        assert_eq!(RoleKind::QueryTier.workload_suffix(), "query-tier");
    }

    #[test]
    fn test_role_phase_display() {
        assert_eq!(RolePhase::Ready.to_string(), "Ready");
        assert_eq!(RolePhase::Updating.to_string(), "Updating");
        assert_eq!(RolePhase::ScalingDown.to_string(), "ScalingDown");
    }

    #[test]
    fn test_dependency_ref_unset_by_default() {
        let r = DependencyRef::default();
        assert!(!r.is_set());
    }

    #[test]
    fn test_dependency_ref_set() {
        let r = DependencyRef::named("lm1");
        assert!(r.is_set());
        assert_eq!(r.name, "lm1");
    }

    #[test]
    fn test_dependency_ref_deserializes_from_empty_object() {
        let r: DependencyRef = serde_json::from_str("{}").unwrap();
        assert!(!r.is_set());
    }

    #[test]
    fn test_role_kind_serde_roundtrip() {
        let json = serde_json::to_string(&RoleKind::StorageTier).unwrap();
        assert_eq!(json, "\"StorageTier\"");
        let kind: RoleKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, RoleKind::StorageTier);
    }
}
