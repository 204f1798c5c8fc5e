//! `UpgradeGate` - dependency-ordered gating of rolling image upgrades.
//!
//! Evaluated once per reconcile pass over the current snapshot of cluster
//! state. The gate walks a fixed stage sequence:
//!
//! 1. StandaloneNode / LicenseAuthority - roots of the chain, always clear
//! 2. ClusterCoordinator - waits on a declared license authority reference
//! 3. QueryTier - waits on license authority and cluster coordinator refs
//! 4. StorageTier - same forward refs, plus one-site-at-a-time sequencing
//!    when the tier is multisite
//! 5. MonitoringSink - clears only once every holder referencing it is
//!    healthy (reverse direction)
//!
//! At each stage the instance under evaluation either runs its own
//! role-specific self-check or a forward dependency check against that
//! stage's kind. The gate performs reads only; repeated calls with unchanged
//! backing state always produce the same verdict.

pub mod dependency;
pub mod reverse;
pub mod sites;

use tracing::{debug, warn};

use kube::ResourceExt;

use crate::crd::{RoleInstance, RoleInstanceSpec, RoleKind};
use crate::error::GateError;
use crate::store::ResourceStore;
use crate::topology::ClusterInfoProbe;

/// Outcome of a gate evaluation that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Safe to let the instance proceed with its upgrade now.
    Proceed,
    /// Wait quietly; the caller re-reconciles later without surfacing an
    /// error event.
    Hold,
}

/// Fixed stage precedence. Forward-branch failures halt the chain at the
/// first blocking stage.
const STAGE_ORDER: [RoleKind; 6] = [
    RoleKind::StandaloneNode,
    RoleKind::LicenseAuthority,
    RoleKind::ClusterCoordinator,
    RoleKind::QueryTier,
    RoleKind::StorageTier,
    RoleKind::MonitoringSink,
];

enum SelfOutcome {
    Terminal(Verdict),
    FallThrough,
}

/// Decide whether the instance under reconciliation may proceed with its own
/// upgrade, or must wait for an upstream dependency to finish first.
pub async fn evaluate<S, P>(
    store: &S,
    probe: &P,
    instance: &RoleInstance,
    spec: &RoleInstanceSpec,
) -> Result<Verdict, GateError>
where
    S: ResourceStore,
    P: ClusterInfoProbe,
{
    let namespace = instance.namespace().unwrap_or_default();
    debug!(
        "Evaluating upgrade gate for {} {}/{}",
        spec.role,
        namespace,
        instance.name_any()
    );

    for stage in STAGE_ORDER {
        if spec.role == stage {
            match self_check(store, probe, instance, spec, stage).await? {
                SelfOutcome::Terminal(verdict) => return Ok(verdict),
                SelfOutcome::FallThrough => {}
            }
        } else if let Some(dep_ref) = spec.forward_ref(stage) {
            dependency::check(store, &namespace, stage, dep_ref, spec).await?;
        }
        // Kinds that are never forward-referenced fall straight through.
    }

    Ok(Verdict::Proceed)
}

async fn self_check<S, P>(
    store: &S,
    probe: &P,
    instance: &RoleInstance,
    spec: &RoleInstanceSpec,
    stage: RoleKind,
) -> Result<SelfOutcome, GateError>
where
    S: ResourceStore,
    P: ClusterInfoProbe,
{
    match stage {
        // Roots of the chain they gate for everyone else.
        RoleKind::StandaloneNode | RoleKind::LicenseAuthority => {
            Ok(SelfOutcome::Terminal(Verdict::Proceed))
        }

        // Existence of the backing workload only, not readiness; first-time
        // creation is never blocked and the found/not-found answer is
        // deliberately not consulted. Only a lookup failure holds, quietly.
        RoleKind::ClusterCoordinator | RoleKind::QueryTier => {
            let namespace = instance.namespace().unwrap_or_default();
            match store
                .workload_exists(stage, &namespace, &instance.name_any())
                .await
            {
                Ok(_) => Ok(SelfOutcome::Terminal(Verdict::Proceed)),
                Err(err) => {
                    warn!(
                        "workload lookup for {} {}/{} failed, holding: {}",
                        stage,
                        namespace,
                        instance.name_any(),
                        err
                    );
                    Ok(SelfOutcome::Terminal(Verdict::Hold))
                }
            }
        }

        // The only non-terminal self branch: site sequencing, then on to the
        // monitoring sink stage.
        RoleKind::StorageTier => {
            sites::check(store, probe, instance, spec).await?;
            Ok(SelfOutcome::FallThrough)
        }

        RoleKind::MonitoringSink => {
            reverse::check(store, instance, spec).await?;
            Ok(SelfOutcome::Terminal(Verdict::Proceed))
        }
    }
}

/// Instance construction helpers shared across gate test modules.
#[cfg(test)]
pub(crate) mod fixtures {
    use crate::crd::{
        DependencyRef, RoleInstance, RoleInstanceSpec, RoleInstanceStatus, RoleKind, RolePhase,
    };

    pub fn spec(role: RoleKind, image: &str) -> RoleInstanceSpec {
        RoleInstanceSpec {
            role,
            image: image.to_string(),
            license_authority_ref: DependencyRef::default(),
            cluster_coordinator_ref: DependencyRef::default(),
            query_tier_ref: DependencyRef::default(),
            monitoring_sink_ref: DependencyRef::default(),
        }
    }

    pub fn instance(namespace: &str, name: &str, spec: RoleInstanceSpec) -> RoleInstance {
        let mut inst = RoleInstance::new(name, spec);
        inst.metadata.namespace = Some(namespace.to_string());
        inst
    }

    /// Attach an observed phase and running image.
    pub fn in_phase(mut inst: RoleInstance, phase: RolePhase, image: &str) -> RoleInstance {
        inst.status = Some(RoleInstanceStatus {
            phase: Some(phase),
            image: Some(image.to_string()),
            ..Default::default()
        });
        inst
    }

    /// Storage tier instance attached to the given coordinator.
    pub fn storage_site(
        namespace: &str,
        name: &str,
        coordinator: &str,
        image: &str,
    ) -> RoleInstance {
        let mut s = spec(RoleKind::StorageTier, image);
        s.cluster_coordinator_ref = DependencyRef::named(coordinator);
        instance(namespace, name, s)
    }
}
