//! `RoleInstance` status types.
//!
//! The lifecycle reconciler (out of scope here) owns `phase` and `image`;
//! the gate only reads them and writes the `UpgradeGate` condition.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::RolePhase;

/// Condition on the `RoleInstance` resource.
#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleCondition {
    pub r#type: String,
    pub status: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_transition_time: DateTime<Utc>,
}

/// `RoleInstance` status defines the observed state of the role.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleInstanceStatus {
    /// Current lifecycle phase of the backing workload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<RolePhase>,

    /// Image the backing workload is actually running right now. Trails
    /// `spec.image` while an upgrade is in flight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Conditions; the gate maintains the `UpgradeGate` condition.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<RoleCondition>,

    /// Last observed generation of the spec.
    #[serde(default)]
    pub observed_generation: i64,

    /// Human-readable detail for the most recent gate verdict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RoleInstanceStatus {
    /// Image the instance currently runs, empty if not yet reported.
    /// An empty string never equals a real spec image, so an instance that
    /// has not reported yet always compares as a mismatch.
    pub fn current_image(&self) -> &str {
        self.image.as_deref().unwrap_or("")
    }

    /// Phase as observed, `Pending` if the lifecycle reconciler has not
    /// reported one yet.
    pub fn current_phase(&self) -> RolePhase {
        self.phase.unwrap_or(RolePhase::Pending)
    }
}
