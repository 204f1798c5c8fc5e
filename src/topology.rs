//! Live topology facts from the storage tier's cluster coordinator.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::crd::{DependencyRef, RoleKind};
use crate::error::GateError;
use crate::store::workload_name;

/// Transient topology facts for one storage tier. Fetched per evaluation,
/// never persisted on any instance.
#[derive(Debug, Clone, Copy)]
pub struct TopologyFact {
    pub multi_site: bool,
}

/// Queries the coordinator that owns a storage tier for its topology.
pub trait ClusterInfoProbe {
    async fn topology(
        &self,
        namespace: &str,
        coordinator: &DependencyRef,
    ) -> Result<TopologyFact, GateError>;
}

#[derive(Deserialize)]
struct ClusterConfigResponse {
    #[serde(default)]
    multisite: bool,
}

/// HTTP probe against the coordinator's management endpoint.
pub struct CoordinatorProbe {
    http: reqwest::Client,
    token: Option<SecretString>,
    port: u16,
}

impl CoordinatorProbe {
    /// Management port the coordinator serves its cluster config on.
    pub const DEFAULT_PORT: u16 = 8089;

    pub fn new(token: Option<SecretString>) -> Result<Self, GateError> {
        // Coordinators serve self-signed certificates inside the cluster.
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| GateError::Topology(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            token,
            port: Self::DEFAULT_PORT,
        })
    }

    fn config_url(&self, namespace: &str, coordinator: &DependencyRef) -> String {
        let service = workload_name(RoleKind::ClusterCoordinator, &coordinator.name);
        format!(
            "https://{service}.{namespace}.svc.cluster.local:{}/cluster/v1/config",
            self.port
        )
    }
}

impl ClusterInfoProbe for CoordinatorProbe {
    async fn topology(
        &self,
        namespace: &str,
        coordinator: &DependencyRef,
    ) -> Result<TopologyFact, GateError> {
        let url = self.config_url(namespace, coordinator);
        debug!("Probing coordinator topology at {}", url);

        let mut req = self.http.get(&url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token.expose_secret());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| GateError::Topology(e.to_string()))?
            .error_for_status()
            .map_err(|e| GateError::Topology(e.to_string()))?;

        let config: ClusterConfigResponse = resp
            .json()
            .await
            .map_err(|e| GateError::Topology(format!("malformed cluster config: {e}")))?;

        Ok(TopologyFact {
            multi_site: config.multisite,
        })
    }
}

/// Fixed-answer probe for gate tests.
#[cfg(test)]
pub mod fake {
    use super::{ClusterInfoProbe, TopologyFact};
    use crate::crd::DependencyRef;
    use crate::error::GateError;

    #[derive(Default)]
    pub struct FakeProbe {
        pub multi_site: bool,
        pub fails: bool,
    }

    impl ClusterInfoProbe for FakeProbe {
        async fn topology(
            &self,
            _namespace: &str,
            _coordinator: &DependencyRef,
        ) -> Result<TopologyFact, GateError> {
            if self.fails {
                return Err(GateError::Topology("injected probe failure".to_string()));
            }
            Ok(TopologyFact {
                multi_site: self.multi_site,
            })
        }
    }
}
