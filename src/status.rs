//! Status patch helpers, condition builders, and event recording.

use anyhow::Result;
use chrono::Utc;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::Api;
use kube::Resource;
use kube::api::{Patch, PatchParams};
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use tracing::debug;

use crate::crd::{RoleCondition, RoleInstance, RoleInstanceStatus};

/// Condition type the gate maintains on every role instance.
pub const GATE_CONDITION: &str = "UpgradeGate";

/// Patch the status subresource of a `RoleInstance`.
pub async fn patch_status(
    api: &Api<RoleInstance>,
    name: &str,
    status: &RoleInstanceStatus,
) -> Result<RoleInstance> {
    debug!("Patching status for {}: phase={:?}", name, status.phase);

    let patch = serde_json::json!({ "status": status });
    let result = api
        .patch_status(name, &PatchParams::apply("rgo"), &Patch::Merge(&patch))
        .await?;
    Ok(result)
}

/// Set a condition on the status, replacing any existing condition of the
/// same type.
pub fn set_condition(
    status: &mut RoleInstanceStatus,
    condition_type: &str,
    condition_status: &str,
    reason: &str,
    message: Option<String>,
) {
    let now = Utc::now();

    status.conditions.retain(|c| c.r#type != condition_type);

    status.conditions.push(RoleCondition {
        r#type: condition_type.to_string(),
        status: condition_status.to_string(),
        reason: reason.to_string(),
        message,
        last_transition_time: now,
    });
}

/// Record a cleared gate on the status.
pub fn set_gate_cleared(status: &mut RoleInstanceStatus) {
    status.message = None;
    set_condition(status, GATE_CONDITION, "True", "UpgradeCleared", None);
}

/// Record a blocked or held gate on the status.
pub fn set_gate_blocked(status: &mut RoleInstanceStatus, reason: &str, message: Option<String>) {
    status.message.clone_from(&message);
    set_condition(status, GATE_CONDITION, "False", reason, message);
}

/// Event recorder bundled with its target `ObjectReference`.
pub struct EventRecorder {
    recorder: Recorder,
    obj_ref: ObjectReference,
}

impl EventRecorder {
    /// Create an event recorder for the given `RoleInstance`.
    pub fn new(client: kube::Client, obj: &RoleInstance) -> Self {
        let reporter = Reporter {
            controller: "rgo".into(),
            instance: None,
        };
        Self {
            recorder: Recorder::new(client, reporter),
            obj_ref: obj.object_ref(&()),
        }
    }

    /// Publish a Normal event.
    pub async fn publish(&self, reason: &str, message: &str) {
        self.recorder
            .publish(
                &Event {
                    type_: EventType::Normal,
                    reason: reason.into(),
                    note: Some(message.into()),
                    action: reason.into(),
                    secondary: None,
                },
                &self.obj_ref,
            )
            .await
            .unwrap_or_else(|e| tracing::warn!("Failed to publish event: {}", e));
    }

    /// Publish a Warning event.
    pub async fn publish_warning(&self, reason: &str, message: &str) {
        self.recorder
            .publish(
                &Event {
                    type_: EventType::Warning,
                    reason: reason.into(),
                    note: Some(message.into()),
                    action: reason.into(),
                    secondary: None,
                },
                &self.obj_ref,
            )
            .await
            .unwrap_or_else(|e| tracing::warn!("Failed to publish warning event: {}", e));
    }
}
