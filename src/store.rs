//! Read-only access to role instances and their backing workloads.
//!
//! The gate never writes through this interface; it is a snapshot reader
//! re-invoked on every reconcile pass.

use k8s_openapi::api::apps::v1::StatefulSet;
use kube::Api;
use kube::api::ListParams;
use tracing::debug;

use crate::crd::{RoleInstance, RoleKind};
use crate::error::GateError;

/// Name of the StatefulSet backing a role instance.
pub fn workload_name(kind: RoleKind, instance_name: &str) -> String {
    format!("{instance_name}-{}", kind.workload_suffix())
}

/// Per-kind get/list of role instances plus the backing-workload existence
/// probe. Implemented against the Kubernetes API in production and by an
/// in-memory store in tests.
pub trait ResourceStore {
    /// Fetch one instance by namespace/name. Returns `Ok(None)` when the
    /// object is absent or exists under a different role kind.
    async fn get(
        &self,
        kind: RoleKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<RoleInstance>, GateError>;

    /// List all instances of one kind in a namespace, in store enumeration
    /// order.
    async fn list(&self, kind: RoleKind, namespace: &str) -> Result<Vec<RoleInstance>, GateError>;

    /// Whether the backing workload object for the instance exists.
    /// `Ok(false)` means confirmed not-found; any other lookup problem is an
    /// error.
    async fn workload_exists(
        &self,
        kind: RoleKind,
        namespace: &str,
        instance_name: &str,
    ) -> Result<bool, GateError>;
}

/// Kubernetes-backed store.
#[derive(Clone)]
pub struct KubeResourceStore {
    client: kube::Client,
}

impl KubeResourceStore {
    pub const fn new(client: kube::Client) -> Self {
        Self { client }
    }

    fn instances(&self, namespace: &str) -> Api<RoleInstance> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

impl ResourceStore for KubeResourceStore {
    async fn get(
        &self,
        kind: RoleKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<RoleInstance>, GateError> {
        let found = self.instances(namespace).get_opt(name).await?;
        // All roles share one CRD; a name that resolves to a different kind
        // is treated the same as not found.
        Ok(found.filter(|i| i.spec.role == kind))
    }

    async fn list(&self, kind: RoleKind, namespace: &str) -> Result<Vec<RoleInstance>, GateError> {
        let list = self
            .instances(namespace)
            .list(&ListParams::default())
            .await?;
        let items: Vec<RoleInstance> = list
            .items
            .into_iter()
            .filter(|i| i.spec.role == kind)
            .collect();
        debug!("Listed {} {} instances in {}", items.len(), kind, namespace);
        Ok(items)
    }

    async fn workload_exists(
        &self,
        kind: RoleKind,
        namespace: &str,
        instance_name: &str,
    ) -> Result<bool, GateError> {
        let name = workload_name(kind, instance_name);
        let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        let found = api.get_opt(&name).await?;
        Ok(found.is_some())
    }
}
