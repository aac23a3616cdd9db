// SPDX-License-Identifier: MIT
//
// randimg: Random Noise Images from random.org
// Copyright (c) 2025 randimg Contributors

//! Request metrics for the random.org client

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared request counters
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    requests_total: AtomicU64,
    requests_failed: AtomicU64,
    integers_fetched: AtomicU64,

    // Latency tracking (microseconds)
    request_latencies: RwLock<Vec<u64>>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                requests_total: AtomicU64::new(0),
                requests_failed: AtomicU64::new(0),
                integers_fetched: AtomicU64::new(0),
                request_latencies: RwLock::new(Vec::with_capacity(16)),
            }),
        }
    }

    /// Record a successful request that returned `integers` values
    pub fn record_request(&self, integers: usize, latency_micros: u64) {
        self.inner.requests_total.fetch_add(1, Ordering::Relaxed);
        self.inner
            .integers_fetched
            .fetch_add(integers as u64, Ordering::Relaxed);
        self.inner.request_latencies.write().push(latency_micros);
    }

    pub fn record_request_failure(&self) {
        self.inner.requests_total.fetch_add(1, Ordering::Relaxed);
        self.inner.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_total(&self) -> u64 {
        self.inner.requests_total.load(Ordering::Relaxed)
    }

    pub fn requests_failed(&self) -> u64 {
        self.inner.requests_failed.load(Ordering::Relaxed)
    }

    pub fn integers_fetched(&self) -> u64 {
        self.inner.integers_fetched.load(Ordering::Relaxed)
    }

    pub fn latency_percentile(&self, percentile: f64) -> Option<u64> {
        let latencies = self.inner.request_latencies.read();
        if latencies.is_empty() {
            return None;
        }

        let mut sorted = latencies.clone();
        sorted.sort_unstable();
        let index = ((sorted.len() as f64 * percentile).ceil() as usize)
            .saturating_sub(1)
            .min(sorted.len() - 1);
        Some(sorted[index])
    }

    pub fn latency_p50(&self) -> Option<u64> {
        self.latency_percentile(0.50)
    }

    pub fn latency_max(&self) -> Option<u64> {
        self.inner.request_latencies.read().iter().copied().max()
    }
}
