//! Reverse dependency evaluation for the monitoring sink.
//!
//! The sink holds no outgoing reference; instead every holder that points at
//! it must be healthy before the sink's own change is unblocked. Direction is
//! intentionally inverted relative to all other stages.

use kube::ResourceExt;

use crate::crd::{RoleInstance, RoleInstanceSpec, RoleKind, RolePhase};
use crate::error::GateError;
use crate::store::ResourceStore;

/// Kinds that may reference a monitoring sink, scanned in this order.
const HOLDER_KINDS: [RoleKind; 3] = [
    RoleKind::ClusterCoordinator,
    RoleKind::QueryTier,
    RoleKind::StandaloneNode,
];

/// Require every holder referencing this sink to be healthy.
///
/// Coordinator and query tier holders only need to be Ready; image parity
/// against the sink's spec image is enforced for standalone holders alone.
/// The first failing holder wins; violations are not aggregated.
pub async fn check<S: ResourceStore>(
    store: &S,
    instance: &RoleInstance,
    spec: &RoleInstanceSpec,
) -> Result<(), GateError> {
    let namespace = instance.namespace().unwrap_or_default();
    let sink_name = instance.name_any();

    for kind in HOLDER_KINDS {
        let holders = store.list(kind, &namespace).await?;
        for holder in holders
            .iter()
            .filter(|h| h.spec.monitoring_sink_ref.name == sink_name)
        {
            let status = holder.status.clone().unwrap_or_default();
            let phase = status.current_phase();

            if kind == RoleKind::StandaloneNode {
                if phase != RolePhase::Ready || status.current_image() != spec.image {
                    return Err(GateError::BlockedOnHolderImage {
                        name: holder.name_any(),
                        current_image: status.current_image().to_string(),
                        expected_image: spec.image.clone(),
                        phase,
                    });
                }
            } else if phase != RolePhase::Ready {
                return Err(GateError::BlockedOnHolder {
                    kind,
                    name: holder.name_any(),
                    phase,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::DependencyRef;
    use crate::gate::fixtures::{in_phase, instance, spec};
    use crate::store::mem::MemoryStore;

    fn sink() -> RoleInstance {
        instance("ns", "mc1", spec(RoleKind::MonitoringSink, "v2"))
    }

    fn holder(kind: RoleKind, name: &str, sink_name: &str, image: &str) -> RoleInstance {
        let mut s = spec(kind, image);
        s.monitoring_sink_ref = DependencyRef::named(sink_name);
        instance("ns", name, s)
    }

    #[tokio::test]
    async fn test_no_holders_passes() {
        let store = MemoryStore::default();
        assert!(check(&store, &sink(), &sink().spec).await.is_ok());
    }

    #[tokio::test]
    async fn test_ready_holders_pass() {
        let cc = in_phase(
            holder(RoleKind::ClusterCoordinator, "cc1", "mc1", "v3"),
            RolePhase::Ready,
            "v3",
        );
        let sn = in_phase(
            holder(RoleKind::StandaloneNode, "sn1", "mc1", "v2"),
            RolePhase::Ready,
            "v2",
        );
        let store = MemoryStore::with_instances(vec![cc, sn]);
        assert!(check(&store, &sink(), &sink().spec).await.is_ok());
    }

    #[tokio::test]
    async fn test_coordinator_image_mismatch_does_not_block() {
        // Image parity is only required of standalone holders.
        let cc = in_phase(
            holder(RoleKind::ClusterCoordinator, "cc1", "mc1", "v9"),
            RolePhase::Ready,
            "v9",
        );
        let store = MemoryStore::with_instances(vec![cc]);
        assert!(check(&store, &sink(), &sink().spec).await.is_ok());
    }

    #[tokio::test]
    async fn test_coordinator_not_ready_blocks() {
        let cc = in_phase(
            holder(RoleKind::ClusterCoordinator, "cc1", "mc1", "v2"),
            RolePhase::Updating,
            "v2",
        );
        let store = MemoryStore::with_instances(vec![cc]);
        let err = check(&store, &sink(), &sink().spec).await.unwrap_err();
        match err {
            GateError::BlockedOnHolder { kind, name, phase } => {
                assert_eq!(kind, RoleKind::ClusterCoordinator);
                assert_eq!(name, "cc1");
                assert_eq!(phase, RolePhase::Updating);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_standalone_image_mismatch_blocks() {
        let sn = in_phase(
            holder(RoleKind::StandaloneNode, "sn1", "mc1", "v1"),
            RolePhase::Ready,
            "v1",
        );
        let store = MemoryStore::with_instances(vec![sn]);
        let err = check(&store, &sink(), &sink().spec).await.unwrap_err();
        match err {
            GateError::BlockedOnHolderImage {
                name,
                current_image,
                expected_image,
                ..
            } => {
                assert_eq!(name, "sn1");
                assert_eq!(current_image, "v1");
                assert_eq!(expected_image, "v2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_query_tier_not_ready_blocks() {
        let qt = in_phase(
            holder(RoleKind::QueryTier, "q1", "mc1", "v2"),
            RolePhase::ScalingUp,
            "v2",
        );
        let store = MemoryStore::with_instances(vec![qt]);
        let err = check(&store, &sink(), &sink().spec).await.unwrap_err();
        assert!(err.is_wait());
    }

    #[tokio::test]
    async fn test_holder_of_other_sink_ignored() {
        let cc = in_phase(
            holder(RoleKind::ClusterCoordinator, "cc1", "some-other-sink", "v2"),
            RolePhase::Updating,
            "v2",
        );
        let store = MemoryStore::with_instances(vec![cc]);
        assert!(check(&store, &sink(), &sink().spec).await.is_ok());
    }

    #[tokio::test]
    async fn test_first_failing_holder_wins() {
        // Coordinator kinds are scanned before standalone kinds.
        let cc = in_phase(
            holder(RoleKind::ClusterCoordinator, "cc1", "mc1", "v2"),
            RolePhase::Updating,
            "v2",
        );
        let sn = in_phase(
            holder(RoleKind::StandaloneNode, "sn1", "mc1", "v0"),
            RolePhase::Ready,
            "v0",
        );
        let store = MemoryStore::with_instances(vec![sn, cc]);
        let err = check(&store, &sink(), &sink().spec).await.unwrap_err();
        assert!(matches!(err, GateError::BlockedOnHolder { .. }));
    }

    #[tokio::test]
    async fn test_list_failure_is_infrastructure_fault() {
        let store = MemoryStore {
            list_fails_for: Some(RoleKind::QueryTier),
            ..Default::default()
        };
        let err = check(&store, &sink(), &sink().spec).await.unwrap_err();
        assert!(!err.is_wait());
    }
}
