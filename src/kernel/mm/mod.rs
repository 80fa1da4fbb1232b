// src/kernel/mm/mod.rs

//! Memory subsystem
//!
//! Two allocator variants behind one contract, selected at construction: a
//! frame size equal to total memory means one frame spans everything, so
//! there is nothing to page and the flat first-fit allocator is used;
//! otherwise the paging allocator.
//!
//! The variant is a plain enum routed by `match`; no concrete allocator
//! type crosses a module boundary.

pub mod flat;
pub mod paging;

pub use flat::FlatMemory;
pub use paging::PagingMemory;

use std::io::{self, Write};
use std::sync::Arc;

use crate::config::Config;
use crate::kernel::telemetry::Telemetry;

/// Admission verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admit {
    /// The process is resident and may run
    Accepted,
    /// Not enough capacity, even after any allowed eviction
    Rejected,
}

/// Aggregate occupancy in abstract memory units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryTotals {
    /// Configured memory size
    pub total: u64,
    /// Units currently allocated
    pub used: u64,
    /// Units currently free
    pub free: u64,
}

/// Pluggable memory allocator
#[derive(Debug)]
pub enum MemoryManager {
    /// Contiguous first-fit with a FIFO backing store
    Flat(FlatMemory),
    /// Fixed-size frames with per-process page tables
    Paging(PagingMemory),
}

impl MemoryManager {
    /// Builds the variant the configuration selects.
    #[must_use]
    pub fn from_config(config: &Config, telemetry: Arc<Telemetry>) -> Self {
        if config.is_flat_memory() {
            Self::Flat(FlatMemory::new(
                config.max_overall_mem,
                config.min_mem_per_proc,
                config.max_mem_per_proc,
            ))
        } else {
            Self::Paging(PagingMemory::new(
                config.max_overall_mem,
                config.mem_per_frame,
                config.min_mem_per_proc,
                config.max_mem_per_proc,
                telemetry,
            ))
        }
    }

    /// Tries to make `name` resident.
    ///
    /// The hint is honored only when the name has no pinned size yet.
    pub fn admit(&mut self, name: &str, size_hint: Option<u64>) -> Admit {
        match self {
            Self::Flat(memory) => memory.admit(name, size_hint),
            Self::Paging(memory) => memory.admit(name, size_hint),
        }
    }

    /// Removes `name` from the allocator's accounting. Idempotent.
    pub fn release(&mut self, name: &str) {
        match self {
            Self::Flat(memory) => memory.release(name),
            Self::Paging(memory) => memory.release(name),
        }
    }

    /// True while `name` is resident.
    #[must_use]
    pub fn in_memory(&self, name: &str) -> bool {
        match self {
            Self::Flat(memory) => memory.in_memory(name),
            Self::Paging(memory) => memory.in_memory(name),
        }
    }

    /// Pinned size of `name`, if one has been assigned.
    #[must_use]
    pub fn pinned_size_of(&self, name: &str) -> Option<u64> {
        match self {
            Self::Flat(memory) => memory.pinned_size_of(name),
            Self::Paging(memory) => memory.pinned_size_of(name),
        }
    }

    /// Current occupancy.
    #[must_use]
    pub fn totals(&self) -> MemoryTotals {
        let (total, used) = match self {
            Self::Flat(memory) => (memory.total(), memory.used()),
            Self::Paging(memory) => (memory.total(), memory.used()),
        };
        MemoryTotals { total, used, free: total - used }
    }

    /// Resident (name, size) pairs in a stable order.
    #[must_use]
    pub fn running_processes(&self) -> Vec<(String, u64)> {
        match self {
            Self::Flat(memory) => memory.running_processes(),
            Self::Paging(memory) => memory.running_processes(),
        }
    }

    /// Writes the occupancy report for this variant to `sink`.
    pub fn snapshot(&self, cycle: u64, sink: &mut dyn Write) -> io::Result<()> {
        match self {
            Self::Flat(memory) => memory.snapshot(cycle, sink),
            Self::Paging(memory) => memory.snapshot(cycle, sink),
        }
    }

    /// File name the periodic snapshot writer uses for this variant.
    #[must_use]
    pub fn snapshot_file_name(&self, cycle: u64) -> String {
        match self {
            Self::Flat(_) => format!("memory_stamp_{cycle}.txt"),
            Self::Paging(_) => format!("paging_snapshot_{cycle}.txt"),
        }
    }
}
