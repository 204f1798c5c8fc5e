//! Site-at-a-time sequencing for multi-site storage tiers.
//!
//! Storage tier instances sharing one coordinator are ranked into a stable
//! order; each instance may only upgrade once the site immediately ahead of
//! it is Ready on the target image.

use kube::ResourceExt;

use crate::crd::{DependencyRef, RoleInstance, RoleInstanceSpec, RoleKind, RolePhase};
use crate::error::GateError;
use crate::store::ResourceStore;
use crate::topology::ClusterInfoProbe;

/// Deterministic rank ordering of storage tier siblings sharing the given
/// coordinator. Stable sort by name over the store's enumeration order.
pub fn site_rank(siblings: Vec<RoleInstance>, coordinator: &DependencyRef) -> Vec<RoleInstance> {
    let mut sites: Vec<RoleInstance> = siblings
        .into_iter()
        .filter(|s| s.spec.cluster_coordinator_ref.name == coordinator.name)
        .collect();
    sites.sort_by_key(kube::ResourceExt::name_any);
    sites
}

/// Enforce one-site-at-a-time sequencing for the storage tier instance under
/// evaluation. No-op for single-site topologies.
pub async fn check<S, P>(
    store: &S,
    probe: &P,
    instance: &RoleInstance,
    spec: &RoleInstanceSpec,
) -> Result<(), GateError>
where
    S: ResourceStore,
    P: ClusterInfoProbe,
{
    let namespace = instance.namespace().unwrap_or_default();

    // Topology is required input; a probe failure is a hard error, not a wait.
    let fact = probe
        .topology(&namespace, &spec.cluster_coordinator_ref)
        .await?;
    if !fact.multi_site {
        return Ok(());
    }

    let siblings = store.list(RoleKind::StorageTier, &namespace).await?;
    let ranked = site_rank(siblings, &spec.cluster_coordinator_ref);

    let name = instance.name_any();
    let Some(position) = ranked.iter().position(|s| s.name_any() == name) else {
        return Ok(());
    };
    if position == 0 {
        return Ok(());
    }

    // Only the single nearest predecessor is checked; the chain completes
    // sequentially as each site's own reconcile finds its predecessor done.
    let predecessor = &ranked[position - 1];
    let status = predecessor.status.clone().unwrap_or_default();
    let phase = status.current_phase();
    if phase != RolePhase::Ready || status.current_image() != spec.image {
        return Err(GateError::BlockedOnPredecessorSite {
            name: predecessor.name_any(),
            current_image: status.current_image().to_string(),
            expected_image: spec.image.clone(),
            phase,
        });
    }
    Ok(())
}
