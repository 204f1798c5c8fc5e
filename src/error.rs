//! Custom error types for rgo.

use thiserror::Error;

use crate::crd::{RoleKind, RolePhase};

/// Errors produced by a gate evaluation.
///
/// Two disjoint classes: `Blocked*` variants are wait conditions the caller
/// re-queues on without treating as a fault; the rest are infrastructure
/// faults worth a warning event.
#[derive(Error, Debug)]
pub enum GateError {
    #[error(
        "{kind} {name} is not ready: current image {current_image} differs from \
         spec image {expected_image} and phase is {phase}"
    )]
    BlockedOnDependency {
        kind: RoleKind,
        name: String,
        current_image: String,
        expected_image: String,
        phase: RolePhase,
    },

    #[error(
        "storage tier site {name} preceding this one is not ready: current image \
         {current_image} differs from spec image {expected_image} and phase is {phase}"
    )]
    BlockedOnPredecessorSite {
        name: String,
        current_image: String,
        expected_image: String,
        phase: RolePhase,
    },

    #[error("{kind} {name} referencing this monitoring sink is not ready: phase is {phase}")]
    BlockedOnHolder {
        kind: RoleKind,
        name: String,
        phase: RolePhase,
    },

    #[error(
        "StandaloneNode {name} referencing this monitoring sink is not ready: current \
         image {current_image} differs from sink spec image {expected_image} and phase is {phase}"
    )]
    BlockedOnHolderImage {
        name: String,
        current_image: String,
        expected_image: String,
        phase: RolePhase,
    },

    #[error("resource store error: {0}")]
    Store(String),

    #[error("could not get topology from cluster coordinator: {0}")]
    Topology(String),
}

impl GateError {
    /// The stage a wait condition blocked at, `None` for infrastructure
    /// faults.
    pub const fn blocking_stage(&self) -> Option<RoleKind> {
        match self {
            Self::BlockedOnDependency { kind, .. } => Some(*kind),
            Self::BlockedOnPredecessorSite { .. } => Some(RoleKind::StorageTier),
            Self::BlockedOnHolder { .. } | Self::BlockedOnHolderImage { .. } => {
                Some(RoleKind::MonitoringSink)
            }
            Self::Store(_) | Self::Topology(_) => None,
        }
    }

    /// Returns true if this is a wait condition rather than an
    /// infrastructure fault.
    pub const fn is_wait(&self) -> bool {
        matches!(
            self,
            Self::BlockedOnDependency { .. }
                | Self::BlockedOnPredecessorSite { .. }
                | Self::BlockedOnHolder { .. }
                | Self::BlockedOnHolderImage { .. }
        )
    }

    /// Machine-readable reason recorded on the `UpgradeGate` condition.
    pub const fn condition_reason(&self) -> &'static str {
        match self {
            Self::BlockedOnDependency { .. } => "BlockedOnDependency",
            Self::BlockedOnPredecessorSite { .. } => "BlockedOnPredecessorSite",
            Self::BlockedOnHolder { .. } | Self::BlockedOnHolderImage { .. } => "BlockedOnHolder",
            Self::Store(_) => "StoreError",
            Self::Topology(_) => "TopologyProbeFailed",
        }
    }
}

impl From<kube::Error> for GateError {
    fn from(err: kube::Error) -> Self {
        Self::Store(err.to_string())
    }
}
