// src/kernel/telemetry.rs

//! Shared simulator counters
//!
//! Lock-free counters shared by the worker cores and both allocator
//! variants. Every tick a worker observes contributes one unit to the total
//! and exactly one unit to either the active or the idle count.

use core::sync::atomic::{AtomicU64, Ordering};

/// CPU-tick and paging counters
#[derive(Debug, Default)]
pub struct Telemetry {
    /// Ticks on which a worker executed an instruction
    active_cpu_ticks: AtomicU64,
    /// Ticks a worker observed without doing useful work
    idle_cpu_ticks: AtomicU64,
    /// All ticks observed by workers
    total_cpu_ticks: AtomicU64,
    /// Pages brought into frames by the paging allocator
    pages_paged_in: AtomicU64,
    /// Pages released from frames by the paging allocator
    pages_paged_out: AtomicU64,
}

impl Telemetry {
    /// Creates zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active_cpu_ticks: AtomicU64::new(0),
            idle_cpu_ticks: AtomicU64::new(0),
            total_cpu_ticks: AtomicU64::new(0),
            pages_paged_in: AtomicU64::new(0),
            pages_paged_out: AtomicU64::new(0),
        }
    }

    /// Records one observed tick on which useful work was done.
    pub fn record_active_tick(&self) {
        self.active_cpu_ticks.fetch_add(1, Ordering::Relaxed);
        self.total_cpu_ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one observed tick without useful work.
    pub fn record_idle_tick(&self) {
        self.idle_cpu_ticks.fetch_add(1, Ordering::Relaxed);
        self.total_cpu_ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Records pages placed into frames.
    pub fn record_pages_in(&self, pages: u64) {
        self.pages_paged_in.fetch_add(pages, Ordering::Relaxed);
    }

    /// Records pages released from frames.
    pub fn record_pages_out(&self, pages: u64) {
        self.pages_paged_out.fetch_add(pages, Ordering::Relaxed);
    }

    /// Returns (active, idle, total) cpu ticks.
    #[must_use]
    pub fn cpu_ticks(&self) -> (u64, u64, u64) {
        (
            self.active_cpu_ticks.load(Ordering::Relaxed),
            self.idle_cpu_ticks.load(Ordering::Relaxed),
            self.total_cpu_ticks.load(Ordering::Relaxed),
        )
    }

    /// Returns (paged in, paged out) page counts.
    #[must_use]
    pub fn page_counts(&self) -> (u64, u64) {
        (
            self.pages_paged_in.load(Ordering::Relaxed),
            self.pages_paged_out.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_and_idle_sum_to_total() {
        let telemetry = Telemetry::new();
        telemetry.record_active_tick();
        telemetry.record_active_tick();
        telemetry.record_idle_tick();

        let (active, idle, total) = telemetry.cpu_ticks();
        assert_eq!(active, 2);
        assert_eq!(idle, 1);
        assert_eq!(total, active + idle);
    }

    #[test]
    fn page_counters_accumulate() {
        let telemetry = Telemetry::new();
        telemetry.record_pages_in(4);
        telemetry.record_pages_out(2);
        telemetry.record_pages_in(2);
        assert_eq!(telemetry.page_counts(), (6, 2));
    }
}
