//! rgo - Rollout Gate Operator for distributed role fleets.
//!
//! Watches `RoleInstance` CRD resources and gates each instance's rolling
//! image upgrade on the readiness of its upstream dependencies: license
//! authority, cluster coordinator, query tier, multi-site storage tier, and
//! monitoring sink, in that fixed order.

mod controller;
mod crd;
mod error;
mod gate;
mod health;
mod metrics;
mod status;
mod store;
mod topology;

use std::sync::Arc;

use anyhow::Result;
use futures::StreamExt;
use kube::Api;
use kube::runtime::Controller;
use kube::runtime::watcher::Config;
use secrecy::SecretString;
use tracing::{error, info};

use controller::Context;
use crd::RoleInstance;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    // `rgo crd` prints the CRD manifest and exits; no logging needed.
    if std::env::args().nth(1).as_deref() == Some("crd") {
        if let Err(e) = print_crd() {
            eprintln!("Failed to generate CRD manifest: {e}");
            std::process::exit(1);
        }
        return;
    }

    // Initialize logging
    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    info!("Starting rgo v{}", VERSION);

    if let Err(e) = run().await {
        error!("Operator failed: {}", e);
        std::process::exit(1);
    }
}

/// Print the `RoleInstance` CustomResourceDefinition as YAML.
fn print_crd() -> Result<()> {
    use kube::CustomResourceExt;
    print!("{}", serde_yaml::to_string(&RoleInstance::crd())?);
    Ok(())
}

/// Initialize tracing subscriber with JSON format for production.
fn init_tracing() -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("Failed to initialize log filter: {e}"))?;

    fmt()
        .with_env_filter(filter)
        .json()
        .with_target(true)
        .init();

    Ok(())
}

/// Main operator loop.
async fn run() -> Result<()> {
    // Build in-cluster Kubernetes client
    let client = kube::Client::try_default().await?;
    info!("Connected to Kubernetes API server");

    // Initialize Prometheus metrics
    let mut registry = prometheus_client::registry::Registry::default();
    let metrics = Arc::new(metrics::Metrics::new(&mut registry));
    let registry = Arc::new(registry);

    // Start health server (port 8080)
    let health_state = health::HealthState::new();
    let health_state_clone = health_state.clone();
    tokio::spawn(async move {
        if let Err(e) = health::serve(8080, health_state_clone).await {
            error!("Health server failed: {}", e);
        }
    });

    // Start metrics server (port 8081)
    let registry_clone = registry.clone();
    tokio::spawn(async move {
        if let Err(e) = metrics::serve(8081, registry_clone).await {
            error!("Metrics server failed: {}", e);
        }
    });

    // Topology probe for the storage tier's coordinator; bearer token is
    // optional and mounted via env when the coordinator requires auth.
    let token = std::env::var("COORDINATOR_API_TOKEN")
        .ok()
        .filter(|t| !t.is_empty())
        .map(SecretString::from);
    let probe = Arc::new(topology::CoordinatorProbe::new(token).map_err(|e| {
        anyhow::anyhow!("Failed to build coordinator probe: {e}")
    })?);

    // Set up the controller
    let api: Api<RoleInstance> = Api::all(client.clone());

    let ctx = Arc::new(Context {
        kube_client: client.clone(),
        metrics,
        probe,
    });

    // Mark as ready once controller starts
    health_state.set_ready(true);

    info!("Starting RoleInstance controller");
    Controller::new(api, Config::default())
        .run(controller::reconcile, controller::error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok(o) => info!("Reconciled: {:?}", o),
                Err(e) => error!("Reconcile failed: {:?}", e),
            }
        })
        .await;

    Ok(())
}
