// src/kernel/mm/paging.rs

//! Paging allocator
//!
//! Memory is split into `total / frame_size` equal frames. Admission takes
//! `ceil(size / frame_size)` free frames in ascending id order or is
//! rejected outright; this variant never evicts. Page movements feed the
//! shared paged-in/paged-out counters.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::kernel::telemetry::Telemetry;

use super::Admit;

/// Fixed-frame allocator with per-process page tables
#[derive(Debug)]
pub struct PagingMemory {
    total: u64,
    frame_size: u64,
    min_mem_per_proc: u64,
    max_mem_per_proc: u64,
    /// Frame owners; `None` marks a free frame
    frames: Vec<Option<String>>,
    /// Owned frame ids per process, in allocation order
    page_tables: HashMap<String, Vec<usize>>,
    /// Per-process sizes, sampled on first admission and dropped on release
    pinned_sizes: HashMap<String, u64>,
    telemetry: Arc<Telemetry>,
    rng: SmallRng,
}

impl PagingMemory {
    /// Creates an allocator with `total / frame_size` free frames.
    #[must_use]
    pub fn new(
        total: u64,
        frame_size: u64,
        min_mem_per_proc: u64,
        max_mem_per_proc: u64,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        let frame_count = (total / frame_size) as usize;
        Self {
            total,
            frame_size,
            min_mem_per_proc,
            max_mem_per_proc,
            frames: vec![None; frame_count],
            page_tables: HashMap::new(),
            pinned_sizes: HashMap::new(),
            telemetry,
            rng: SmallRng::from_entropy(),
        }
    }

    fn resolve_pinned_size(&mut self, name: &str, hint: Option<u64>) -> u64 {
        if let Some(&size) = self.pinned_sizes.get(name) {
            return size;
        }
        let size = hint
            .unwrap_or_else(|| self.rng.gen_range(self.min_mem_per_proc..=self.max_mem_per_proc));
        self.pinned_sizes.insert(name.to_string(), size);
        size
    }

    /// Number of free frames.
    #[must_use]
    pub fn free_frames(&self) -> usize {
        self.frames.iter().filter(|owner| owner.is_none()).count()
    }

    /// Total number of frames.
    #[must_use]
    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    /// Admits `name` if enough free frames exist; never evicts.
    pub fn admit(&mut self, name: &str, size_hint: Option<u64>) -> Admit {
        if self.in_memory(name) {
            return Admit::Accepted;
        }
        let size = self.resolve_pinned_size(name, size_hint);
        let pages = (size.div_ceil(self.frame_size)) as usize;
        if pages > self.free_frames() {
            return Admit::Rejected;
        }

        let mut allocated = Vec::with_capacity(pages);
        for (id, owner) in self.frames.iter_mut().enumerate() {
            if owner.is_none() {
                *owner = Some(name.to_string());
                allocated.push(id);
                if allocated.len() == pages {
                    break;
                }
            }
        }
        self.telemetry.record_pages_in(allocated.len() as u64);
        self.page_tables.insert(name.to_string(), allocated);
        Admit::Accepted
    }

    /// Frees every frame of `name` and drops its pinned size. Idempotent.
    pub fn release(&mut self, name: &str) {
        if let Some(frame_ids) = self.page_tables.remove(name) {
            for id in &frame_ids {
                self.frames[*id] = None;
            }
            self.telemetry.record_pages_out(frame_ids.len() as u64);
        }
        self.pinned_sizes.remove(name);
    }

    /// True while `name` owns frames.
    #[must_use]
    pub fn in_memory(&self, name: &str) -> bool {
        self.page_tables.contains_key(name)
    }

    /// Pinned size of `name`, if one has been assigned.
    #[must_use]
    pub fn pinned_size_of(&self, name: &str) -> Option<u64> {
        self.pinned_sizes.get(name).copied()
    }

    /// Memory units covered by occupied frames.
    #[must_use]
    pub fn used(&self) -> u64 {
        (self.total_frames() - self.free_frames()) as u64 * self.frame_size
    }

    /// Total memory units.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Resident (owner, pinned size) pairs, sorted by name.
    #[must_use]
    pub fn running_processes(&self) -> Vec<(String, u64)> {
        let mut processes: Vec<_> = self
            .page_tables
            .keys()
            .map(|name| (name.clone(), self.pinned_sizes.get(name).copied().unwrap_or(0)))
            .collect();
        processes.sort();
        processes
    }

    /// Writes the paging layout report to `sink`.
    pub fn snapshot(&self, cycle: u64, sink: &mut dyn Write) -> io::Result<()> {
        writeln!(sink, "----- Paging Memory Snapshot -----")?;
        writeln!(sink, "Quantum Cycle: {cycle}")?;
        writeln!(sink, "Total Frames: {}", self.total_frames())?;
        writeln!(sink, "Free Frames: {}", self.free_frames())?;
        writeln!(sink)?;

        writeln!(sink, "Frames:")?;
        for (id, owner) in self.frames.iter().enumerate() {
            let status = if owner.is_none() { "Free" } else { "Allocated" };
            writeln!(sink, "  Frame ID: {id}, Status: {status}")?;
        }

        writeln!(sink)?;
        writeln!(sink, "Page Tables:")?;
        let mut owners: Vec<_> = self.page_tables.iter().collect();
        owners.sort_by(|a, b| a.0.cmp(b.0));
        for (owner, frame_ids) in owners {
            let ids: Vec<String> = frame_ids.iter().map(ToString::to_string).collect();
            writeln!(sink, "  Process: {owner}, Frames: {}", ids.join(" "))?;
        }
        writeln!(sink, "-----------------------------------")?;
        Ok(())
    }
}
