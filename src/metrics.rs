//! Prometheus metrics collection for tabsync.
//!
//! Metrics are registered into a crate-local registry. The host proxy decides
//! whether and where to expose [`gather_metrics`]; recording before [`init`]
//! is a silent no-op.
//!
//! - `tabsync_events_total{kind}` - lifecycle events handled
//! - `tabsync_deferred_skipped_total{task}` - deferred tasks dropped as stale
//! - `tabsync_tracked_players` - players held in the directory
//! - `tabsync_roster_members{group}` - roster size per group

use prometheus::{Encoder, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Lifecycle events handled, by kind.
pub static EVENTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Deferred tasks whose fire-time check failed.
pub static DEFERRED_SKIPPED: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

/// Players currently tracked by the directory.
pub static TRACKED_PLAYERS: OnceLock<IntGauge> = OnceLock::new();

/// Roster members per group.
pub static ROSTER_MEMBERS: OnceLock<IntGaugeVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Safe to call more than once; only the first call registers.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                match $init {
                    Ok(m) => {
                        if let Err(e) = r.register(Box::new(m.clone())) {
                            tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                        }
                        let _ = $metric.set(m);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                    }
                }
            }
        };
    }

    register!(EVENTS, IntCounterVec::new(Opts::new("tabsync_events_total", "Lifecycle events handled by kind"), &["kind"]));
    register!(DEFERRED_SKIPPED, IntCounterVec::new(Opts::new("tabsync_deferred_skipped_total", "Deferred tasks skipped because their state went stale"), &["task"]));
    register!(TRACKED_PLAYERS, IntGauge::new("tabsync_tracked_players", "Players tracked by the directory"));
    register!(ROSTER_MEMBERS, IntGaugeVec::new(Opts::new("tabsync_roster_members", "Roster members per group"), &["group"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for metric updates
// ============================================================================

#[inline]
pub fn record_event(kind: &str) {
    if let Some(c) = EVENTS.get() {
        c.with_label_values(&[kind]).inc();
    }
}

#[inline]
pub fn record_skipped(task: &str) {
    if let Some(c) = DEFERRED_SKIPPED.get() {
        c.with_label_values(&[task]).inc();
    }
}

#[inline]
pub fn set_tracked_players(count: usize) {
    if let Some(g) = TRACKED_PLAYERS.get() {
        g.set(count as i64);
    }
}

#[inline]
pub fn set_roster_members(group: &str, count: usize) {
    if let Some(g) = ROSTER_MEMBERS.get() {
        g.with_label_values(&[group]).set(count as i64);
    }
}
