//! `RoleInstance` controller - reconcile dispatch and error policy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kube::{Api, ResourceExt};
use kube::runtime::controller::Action;
use tracing::{error, info, warn};

use crate::crd::{RoleInstance, RolePhase};
use crate::gate::{self, Verdict};
use crate::metrics::{Metrics, RoleLabels};
use crate::status::{self, EventRecorder};
use crate::store::KubeResourceStore;
use crate::topology::CoordinatorProbe;

/// Requeue interval after a wait condition.
const WAIT_INTERVAL: Duration = Duration::from_secs(30);
/// Requeue interval after an infrastructure fault.
const FAULT_INTERVAL: Duration = Duration::from_secs(60);
/// Periodic re-check once the gate has cleared.
const CLEARED_INTERVAL: Duration = Duration::from_secs(300);

/// Shared context for the controller.
pub struct Context {
    pub kube_client: kube::Client,
    pub metrics: Arc<Metrics>,
    pub probe: Arc<CoordinatorProbe>,
}

/// Reconcile one `RoleInstance`.
///
/// Re-runs the full gate evaluation on every pass; dependency state lives on
/// other objects and changes without touching this one, so nothing is cached
/// and no generation check short-circuits the evaluation.
pub async fn reconcile(obj: Arc<RoleInstance>, ctx: Arc<Context>) -> Result<Action, kube::Error> {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_default();
    let role = obj.spec.role;

    let current_status = obj.status.clone().unwrap_or_default();
    if current_status.phase == Some(RolePhase::Terminating) {
        return Ok(Action::await_change());
    }

    let api: Api<RoleInstance> = Api::namespaced(ctx.kube_client.clone(), &namespace);
    let recorder = EventRecorder::new(ctx.kube_client.clone(), &obj);
    let store = KubeResourceStore::new(ctx.kube_client.clone());
    let generation = obj.metadata.generation.unwrap_or(0);

    let started = Instant::now();
    let result = gate::evaluate(&store, ctx.probe.as_ref(), &obj, &obj.spec).await;
    ctx.metrics
        .reconcile_duration_seconds
        .get_or_create(&RoleLabels {
            role: role.to_string(),
        })
        .observe(started.elapsed().as_secs_f64());

    let mut new_status = current_status.clone();
    new_status.observed_generation = generation;

    let action = match result {
        Ok(Verdict::Proceed) => {
            ctx.metrics.observe_verdict(&role.to_string(), "proceed");
            let was_blocked = current_status
                .conditions
                .iter()
                .any(|c| c.r#type == status::GATE_CONDITION && c.status == "False");
            status::set_gate_cleared(&mut new_status);
            if was_blocked {
                info!("Upgrade gate cleared for {} {}/{}", role, namespace, name);
                recorder
                    .publish("UpgradeCleared", "All upstream dependencies are ready")
                    .await;
            }
            Action::requeue(CLEARED_INTERVAL)
        }
        Ok(Verdict::Hold) => {
            // Quiet wait: no event, just a short requeue.
            ctx.metrics.observe_verdict(&role.to_string(), "hold");
            status::set_gate_blocked(&mut new_status, "WaitingForWorkload", None);
            Action::requeue(WAIT_INTERVAL)
        }
        Err(e) if e.is_wait() => {
            ctx.metrics.observe_verdict(&role.to_string(), "blocked");
            if let Some(stage) = e.blocking_stage() {
                ctx.metrics
                    .observe_blocked(&role.to_string(), &stage.to_string());
            }
            let message = e.to_string();
            info!(
                "Upgrade gate blocked for {} {}/{}: {}",
                role, namespace, name, message
            );
            recorder.publish_warning("UpgradeBlocked", &message).await;
            status::set_gate_blocked(&mut new_status, e.condition_reason(), Some(message));
            Action::requeue(WAIT_INTERVAL)
        }
        Err(e) => {
            ctx.metrics.observe_verdict(&role.to_string(), "error");
            let message = e.to_string();
            error!(
                "Gate evaluation failed for {} {}/{}: {}",
                role, namespace, name, message
            );
            recorder
                .publish_warning("GateEvaluationFailed", &message)
                .await;
            status::set_gate_blocked(&mut new_status, e.condition_reason(), Some(message));
            Action::requeue(FAULT_INTERVAL)
        }
    };

    if let Err(e) = status::patch_status(&api, &name, &new_status).await {
        warn!("Failed to patch status for {}: {}", name, e);
        return Ok(Action::requeue(Duration::from_secs(5)));
    }

    Ok(action)
}

/// Error policy for the controller.
pub fn error_policy(obj: Arc<RoleInstance>, err: &kube::Error, _ctx: Arc<Context>) -> Action {
    let name = obj.name_any();
    error!("Controller error for {}: {}", name, err);
    Action::requeue(Duration::from_secs(30))
}
