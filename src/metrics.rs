//! Prometheus metrics for the rgo operator.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

/// Labels for gate evaluation outcomes.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct EvaluationLabels {
    pub role: String,
    pub verdict: String,
}

/// Labels for blocked evaluations, keyed by the stage that blocked.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct BlockedLabels {
    pub role: String,
    pub stage: String,
}

/// Labels for per-role reconcile timing.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RoleLabels {
    pub role: String,
}

/// All Prometheus metrics for the operator.
pub struct Metrics {
    pub evaluations_total: Family<EvaluationLabels, Counter>,
    pub blocked_total: Family<BlockedLabels, Counter>,
    pub reconcile_duration_seconds: Family<RoleLabels, Histogram>,
}

const RECONCILE_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

impl Metrics {
    /// Create and register all metrics with the given registry.
    pub fn new(registry: &mut Registry) -> Self {
        let evaluations_total = Family::<EvaluationLabels, Counter>::default();
        registry.register(
            "rgo_gate_evaluations",
            "Total number of gate evaluations by verdict",
            evaluations_total.clone(),
        );

        let blocked_total = Family::<BlockedLabels, Counter>::default();
        registry.register(
            "rgo_gate_blocked",
            "Total number of blocked evaluations by blocking stage",
            blocked_total.clone(),
        );

        let reconcile_duration_seconds = Family::<RoleLabels, Histogram>::new_with_constructor(
            || Histogram::new(RECONCILE_BUCKETS.iter().copied()),
        );
        registry.register(
            "rgo_reconcile_duration_seconds",
            "Duration of reconcile calls in seconds",
            reconcile_duration_seconds.clone(),
        );

        Self {
            evaluations_total,
            blocked_total,
            reconcile_duration_seconds,
        }
    }

    /// Count one evaluation outcome.
    pub fn observe_verdict(&self, role: &str, verdict: &str) {
        self.evaluations_total
            .get_or_create(&EvaluationLabels {
                role: role.to_string(),
                verdict: verdict.to_string(),
            })
            .inc();
    }

    /// Count one blocked evaluation against the stage that blocked it.
    pub fn observe_blocked(&self, role: &str, stage: &str) {
        self.blocked_total
            .get_or_create(&BlockedLabels {
                role: role.to_string(),
                stage: stage.to_string(),
            })
            .inc();
    }
}

/// Axum handler that encodes the registry as OpenMetrics text.
async fn metrics_handler(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    let mut buf = String::new();
    if encode(&mut buf, &registry).is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics".to_string(),
        );
    }
    (StatusCode::OK, buf)
}

/// Start the metrics server on the given port.
pub async fn serve(port: u16, registry: Arc<Registry>) -> anyhow::Result<()> {
    use axum::Router;
    use axum::routing::get;
    use tokio::net::TcpListener;
    use tracing::info;

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(registry);

    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Metrics server listening on port {}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
