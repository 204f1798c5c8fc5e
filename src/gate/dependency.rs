//! Forward dependency evaluation, shared by every forward stage.

use tracing::warn;

use crate::crd::{DependencyRef, RoleInstanceSpec, RoleKind, RolePhase};
use crate::error::GateError;
use crate::store::ResourceStore;

/// Judge one (holder, referenced-kind) pair.
///
/// An unset reference and a reference whose target does not exist yet both
/// fall through. A present target must be Ready and already running the
/// holder's spec image, otherwise the holder waits.
pub async fn check<S: ResourceStore>(
    store: &S,
    namespace: &str,
    kind: RoleKind,
    dep_ref: &DependencyRef,
    spec: &RoleInstanceSpec,
) -> Result<(), GateError> {
    if !dep_ref.is_set() {
        return Ok(());
    }

    let Some(target) = store.get(kind, namespace, &dep_ref.name).await? else {
        warn!(
            "{} {} referenced from spec not found in {}, skipping stage",
            kind, dep_ref.name, namespace
        );
        return Ok(());
    };

    let status = target.status.unwrap_or_default();
    let phase = status.current_phase();
    if phase != RolePhase::Ready || status.current_image() != spec.image {
        return Err(GateError::BlockedOnDependency {
            kind,
            name: dep_ref.name.clone(),
            current_image: status.current_image().to_string(),
            expected_image: spec.image.clone(),
            phase,
        });
    }
    Ok(())
}
