// src/kernel/report.rs

//! Utilization reporting
//!
//! Renders the `screen -ls` listing (also written to `csopesy_log.txt` by
//! `report-util`), the `process-smi` summary and the `vmstat` counters.
//! Content mirrors the interactive listing; callers decide where it goes.

use std::fmt;
use std::fs::File;
use std::io::Write;

use log::error;

use crate::kernel::KernelContext;
use crate::kernel::mm::MemoryTotals;
use crate::kernel::process::{Process, ProcessState};

/// File receiving the `report-util` output
pub const REPORT_FILE: &str = "csopesy_log.txt";

/// Builds the utilization listing from the current process table.
#[must_use]
pub fn utilization_report(ctx: &KernelContext) -> String {
    let processes = ctx.list_processes();
    let num_cpu = ctx.config.num_cpu;

    let mut active_cores: Vec<u32> = processes.iter().filter_map(Process::core).collect();
    active_cores.sort_unstable();
    active_cores.dedup();
    let cores_used = active_cores.len();
    let cpu_utilization = cores_used as f64 / num_cpu as f64 * 100.0;

    let mut out = String::new();
    out.push_str("---------------------------------------\n");
    out.push_str(&format!("CPU Utilization: {cpu_utilization:.2}%\n"));
    out.push_str(&format!("Cores Used: {cores_used}\n"));
    out.push_str(&format!("Cores Available: {}\n", num_cpu.saturating_sub(cores_used)));
    out.push_str("\n---------------------------------------\n");

    out.push_str("Running processes:\n");
    let mut running = 0;
    for p in processes.iter().filter(|p| p.state() != ProcessState::Finished) {
        running += 1;
        let core = p.core().map_or_else(|| "-".to_string(), |c| c.to_string());
        out.push_str(&format!(
            "{:<10}   ({})    Core: {:<3}   {} / {}\n",
            p.name(),
            p.created_at(),
            core,
            p.current_instruction(),
            p.total_instructions(),
        ));
    }
    if running == 0 {
        out.push_str("No running processes.\n");
    }

    out.push_str("\nFinished processes:\n");
    let mut finished = 0;
    for p in processes.iter().filter(|p| p.state() == ProcessState::Finished) {
        finished += 1;
        out.push_str(&format!(
            "{:<10}   ({})    Finished   {} / {}\n",
            p.name(),
            p.created_at(),
            p.current_instruction(),
            p.total_instructions(),
        ));
    }
    if finished == 0 {
        out.push_str("No finished processes.\n");
    }

    out.push_str("---------------------------------------\n");
    out
}

/// Writes the utilization listing to `csopesy_log.txt` and returns it.
#[must_use]
pub fn write_utilization_report(ctx: &KernelContext) -> String {
    let report = utilization_report(ctx);
    let path = ctx.output_path(REPORT_FILE);
    match File::create(&path) {
        Ok(mut file) => {
            if let Err(e) = file.write_all(report.as_bytes()) {
                error!("[report] failed to write {}: {e}", path.display());
            }
        }
        Err(e) => error!("[report] failed to create {}: {e}", path.display()),
    }
    report
}

/// `process-smi` payload: utilization plus the resident-process memory map
#[derive(Debug, Clone)]
pub struct ProcessSmi {
    /// Active cores over configured cores, in percent
    pub cpu_utilization: f64,
    /// Occupancy in abstract units
    pub memory: MemoryTotals,
    /// Resident processes and their pinned sizes
    pub processes: Vec<(String, u64)>,
}

impl fmt::Display for ProcessSmi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "----- PROCESS-SMI VOL. 1.00 Driver Version: 01.00 -----")?;
        writeln!(f, "CPU-Util: {:.2}%", self.cpu_utilization)?;
        writeln!(f, "Memory Usage: {}MiB / {}MiB", self.memory.used / 1024, self.memory.total / 1024)?;
        let memory_utilization = if self.memory.total == 0 {
            0.0
        } else {
            self.memory.used as f64 / self.memory.total as f64 * 100.0
        };
        writeln!(f, "Memory Util: {memory_utilization:.2}%")?;
        writeln!(f)?;
        writeln!(f, "Running processes and memory usage:")?;
        for (name, size) in &self.processes {
            writeln!(f, "{name}: {}MiB", size / 1024)?;
        }
        write!(f, "-------------------------------------------------------")
    }
}

/// Builds the `process-smi` payload.
#[must_use]
pub fn process_smi(ctx: &KernelContext) -> ProcessSmi {
    let processes = ctx.list_processes();
    let mut active_cores: Vec<u32> = processes.iter().filter_map(Process::core).collect();
    active_cores.sort_unstable();
    active_cores.dedup();
    let cpu_utilization = active_cores.len() as f64 / ctx.config.num_cpu as f64 * 100.0;

    let memory = ctx.memory.lock().expect("memory lock poisoned");
    ProcessSmi { cpu_utilization, memory: memory.totals(), processes: memory.running_processes() }
}

/// `vmstat` payload: occupancy plus tick and paging counters
#[derive(Debug, Clone, Copy)]
pub struct VmStat {
    /// Occupancy in abstract units
    pub memory: MemoryTotals,
    /// Ticks workers spent without useful work
    pub idle_cpu_ticks: u64,
    /// Ticks workers spent executing instructions
    pub active_cpu_ticks: u64,
    /// All ticks workers observed
    pub total_cpu_ticks: u64,
    /// Pages brought into frames
    pub pages_paged_in: u64,
    /// Pages released from frames
    pub pages_paged_out: u64,
}

impl fmt::Display for VmStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "----- VMSTAT REPORT -----")?;
        writeln!(f, "Total Memory: {} MiB", self.memory.total / 1024)?;
        writeln!(f, "Used Memory: {} MiB", self.memory.used / 1024)?;
        writeln!(f, "Free Memory: {} MiB", self.memory.free / 1024)?;
        writeln!(f, "Idle CPU Ticks: {}", self.idle_cpu_ticks)?;
        writeln!(f, "Active CPU Ticks: {}", self.active_cpu_ticks)?;
        writeln!(f, "Total CPU Ticks: {}", self.total_cpu_ticks)?;
        writeln!(f, "Pages Paged In: {}", self.pages_paged_in)?;
        writeln!(f, "Pages Paged Out: {}", self.pages_paged_out)?;
        write!(f, "-------------------------")
    }
}

/// Builds the `vmstat` payload.
#[must_use]
pub fn vmstat(ctx: &KernelContext) -> VmStat {
    let memory = ctx.memory.lock().expect("memory lock poisoned").totals();
    let (active, idle, total) = ctx.telemetry.cpu_ticks();
    let (pages_in, pages_out) = ctx.telemetry.page_counts();
    VmStat {
        memory,
        idle_cpu_ticks: idle,
        active_cpu_ticks: active,
        total_cpu_ticks: total,
        pages_paged_in: pages_in,
        pages_paged_out: pages_out,
    }
}
