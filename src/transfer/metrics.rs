//! Opt-in timing hooks for weight construction and field transfer.
//!
//! Timing is only collected when the `transfer_metrics` feature is enabled and
//! the target is not WASM (`std::time::Instant` is unavailable there). In every
//! other configuration the calls compile to plain closure invocations.
//!
//! ```ignore
//! let mut metrics = TransferMetrics::default();
//! metrics.begin();
//! let nearest = metrics.time(TimingBucket::NearestSearch, || nearest_pairs(&source, &target));
//! if let Some(report) = metrics.end() {
//!     println!("search: {} ns", report.nearest_search_ns);
//! }
//! ```

/// Phases of a transfer that are timed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Distance evaluation and top-2 selection per target point.
    NearestSearch,
    /// Segment projection and scattering weights into the dense matrix.
    WeightAssembly,
    /// Matrix-field products.
    Apply,
}

/// Cumulative nanoseconds per bucket.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransferTimingReport {
    pub nearest_search_ns: u64,
    pub weight_assembly_ns: u64,
    pub apply_ns: u64,
}

impl TransferTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.nearest_search_ns
            .saturating_add(self.weight_assembly_ns)
            .saturating_add(self.apply_ns)
    }

    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }
}

/// Accumulator for timing transfer operations.
///
/// When the `transfer_metrics` feature is disabled (or on WASM), all methods
/// are no-ops and [`end`](Self::end) returns `None`.
#[derive(Debug, Default)]
pub struct TransferMetrics {
    #[cfg(all(feature = "transfer_metrics", not(target_arch = "wasm32")))]
    report: TransferTimingReport,
}

impl TransferMetrics {
    /// Resets all timing counters to zero.
    pub fn begin(&mut self) {
        #[cfg(all(feature = "transfer_metrics", not(target_arch = "wasm32")))]
        {
            self.report = TransferTimingReport::default();
        }
    }

    /// Returns the accumulated report, or `None` if metrics are disabled.
    #[must_use]
    pub fn end(&self) -> Option<TransferTimingReport> {
        #[cfg(all(feature = "transfer_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "transfer_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Times `f` and accumulates the elapsed time in `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "transfer_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
            let slot = match bucket {
                TimingBucket::NearestSearch => &mut self.report.nearest_search_ns,
                TimingBucket::WeightAssembly => &mut self.report.weight_assembly_ns,
                TimingBucket::Apply => &mut self.report.apply_ns,
            };
            *slot = slot.saturating_add(nanos);
            result
        }

        #[cfg(not(all(feature = "transfer_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }
}
