//! Prometheus metrics for the Module controller.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `kmm_sign_syncs_total` | Counter | `status` |
//! | `kmm_reconcile_errors_total` | Counter | `kind` |
//! | `kmm_reconcile_duration_seconds` | Histogram | |

use prometheus::{CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

/// Controller metrics registered with their own registry
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    syncs_total: CounterVec,
    errors_total: CounterVec,
    reconcile_duration: Histogram,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let syncs_total = CounterVec::new(
            Opts::new("kmm_sign_syncs_total", "Sign Job syncs by resulting status"),
            &["status"],
        )?;
        registry.register(Box::new(syncs_total.clone()))?;

        let errors_total = CounterVec::new(
            Opts::new("kmm_reconcile_errors_total", "Module reconcile errors by kind"),
            &["kind"],
        )?;
        registry.register(Box::new(errors_total.clone()))?;

        let reconcile_duration = Histogram::with_opts(HistogramOpts::new(
            "kmm_reconcile_duration_seconds",
            "Duration of one Module reconcile",
        ))?;
        registry.register(Box::new(reconcile_duration.clone()))?;

        Ok(Self {
            registry,
            syncs_total,
            errors_total,
            reconcile_duration,
        })
    }

    /// Count one sync that ended in `status` (e.g. "created", "completed")
    pub fn sync_finished(&self, status: &str) {
        self.syncs_total.with_label_values(&[status]).inc();
    }

    pub fn reconcile_failed(&self, kind: &str) {
        self.errors_total.with_label_values(&[kind]).inc();
    }

    pub fn observe_reconcile(&self, seconds: f64) {
        self.reconcile_duration.observe(seconds);
    }

    /// Render every metric in the Prometheus text format
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
