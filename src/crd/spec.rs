//! `RoleInstance` spec types.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::status::RoleInstanceStatus;
use super::types::{DependencyRef, RoleKind};

/// `RoleInstance` spec defines the desired state of one fleet role.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[kube(
    group = "rgo.io",
    version = "v1alpha1",
    kind = "RoleInstance",
    namespaced,
    status = "RoleInstanceStatus",
    printcolumn = r#"{"name":"ROLE","type":"string","jsonPath":".spec.role"}"#,
    printcolumn = r#"{"name":"IMAGE","type":"string","jsonPath":".spec.image"}"#,
    printcolumn = r#"{"name":"PHASE","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"GATE","type":"string","jsonPath":".status.conditions[?(@.type==\"UpgradeGate\")].reason"}"#,
    printcolumn = r#"{"name":"AGE","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RoleInstanceSpec {
    /// Role this instance plays in the fleet.
    pub role: RoleKind,

    /// Desired container image (opaque version identifier).
    pub image: String,

    /// Reference to the license authority this instance depends on.
    /// Empty name means no dependency declared.
    #[serde(default)]
    pub license_authority_ref: DependencyRef,

    /// Reference to the cluster coordinator this instance depends on.
    #[serde(default)]
    pub cluster_coordinator_ref: DependencyRef,

    /// Reference to the query tier this instance depends on.
    #[serde(default)]
    pub query_tier_ref: DependencyRef,

    /// Reference to the monitoring sink this instance reports into.
    /// The sink's own gate walks these references in reverse.
    #[serde(default)]
    pub monitoring_sink_ref: DependencyRef,
}

impl RoleInstanceSpec {
    /// The holder's declared dependency reference toward the given kind, if
    /// that kind can be forward-referenced at all. `StandaloneNode`,
    /// `StorageTier`, and `MonitoringSink` are never forward dependencies.
    pub const fn forward_ref(&self, kind: RoleKind) -> Option<&DependencyRef> {
        match kind {
            RoleKind::LicenseAuthority => Some(&self.license_authority_ref),
            RoleKind::ClusterCoordinator => Some(&self.cluster_coordinator_ref),
            RoleKind::QueryTier => Some(&self.query_tier_ref),
            RoleKind::StandaloneNode | RoleKind::StorageTier | RoleKind::MonitoringSink => None,
        }
    }
}
