//! Tracing setup and in-process counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

/// Filter used until configuration is loaded.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Handle to the installed filter, used once configuration is known.
pub struct TracingHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl TracingHandle {
    /// Swap in the configured filter unless `RUST_LOG` was set.
    pub fn apply_filter(&self, directives: &str) -> bool {
        if self.from_env {
            return false;
        }

        match self.filter.reload(EnvFilter::new(directives)) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(error = %err, "Log filter not reloaded");
                false
            }
        }
    }
}

/// Install the global fmt subscriber before anything else logs.
///
/// `RUST_LOG` wins over `default_filter` and over later reloads.
pub fn init_tracing(default_filter: &str) -> TracingHandle {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(default_filter), false),
    };
    let (filter_layer, handle) = reload::Layer::new(filter);

    // A subscriber may already be installed (tests, embedding)
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer())
        .try_init();

    TracingHandle {
        filter: handle,
        from_env,
    }
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    manifests_rewritten: AtomicU64,
    manifests_passed_through: AtomicU64,
    media_served: AtomicU64,
    media_redirects: AtomicU64,
    upstream_non_success: AtomicU64,
    upstream_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manifest_rewritten(&self) {
        self.manifests_rewritten.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "manifests_rewritten", "Metric incremented");
    }

    pub fn manifest_passed_through(&self) {
        self.manifests_passed_through.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "manifests_passed_through", "Metric incremented");
    }

    pub fn media_served(&self) {
        self.media_served.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "media_served", "Metric incremented");
    }

    pub fn media_redirect(&self) {
        self.media_redirects.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "media_redirects", "Metric incremented");
    }

    pub fn upstream_non_success(&self) {
        self.upstream_non_success.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "upstream_non_success", "Metric incremented");
    }

    pub fn upstream_failure(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "upstream_failures", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            manifests_rewritten: self.manifests_rewritten.load(Ordering::Relaxed),
            manifests_passed_through: self.manifests_passed_through.load(Ordering::Relaxed),
            media_served: self.media_served.load(Ordering::Relaxed),
            media_redirects: self.media_redirects.load(Ordering::Relaxed),
            upstream_non_success: self.upstream_non_success.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub manifests_rewritten: u64,
    pub manifests_passed_through: u64,
    pub media_served: u64,
    pub media_redirects: u64,
    pub upstream_non_success: u64,
    pub upstream_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::new();
        metrics.manifest_rewritten();
        metrics.manifest_rewritten();
        metrics.media_redirect();
        metrics.upstream_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.manifests_rewritten, 2);
        assert_eq!(snapshot.media_redirects, 1);
        assert_eq!(snapshot.upstream_failures, 1);
        assert_eq!(snapshot.media_served, 0);
    }

    #[test]
    fn test_reload_skipped_when_filter_comes_from_env() {
        let (_layer, filter) = reload::Layer::<EnvFilter, Registry>::new(EnvFilter::new("info"));
        let handle = TracingHandle {
            filter,
            from_env: true,
        };

        assert!(!handle.apply_filter("debug"));
    }

    #[test]
    fn test_reload_applies_configured_filter() {
        let (_layer, filter) = reload::Layer::<EnvFilter, Registry>::new(EnvFilter::new("info"));
        let handle = TracingHandle {
            filter,
            from_env: false,
        };

        assert!(handle.apply_filter("m3u8proxy=debug"));
    }
}
