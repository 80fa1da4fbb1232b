// src/kernel/scheduler/mod.rs

//! Scheduler core
//!
//! One long-lived worker thread per simulated core. Each worker waits for a
//! clock tick, pulls the next Ready process from the queue, coordinates
//! admission with the allocator and runs one slice: to completion under
//! FCFS, up to `quantum_cycles` instructions under round-robin. A process
//! that yields is deallocated and re-enqueued; a rejected admission simply
//! re-enqueues for a later retry.
//!
//! Core 0 doubles as the snapshot writer: after each slice it completes it
//! dumps the allocator layout, labeled in strides of `quantum_cycles`.

pub mod generator;

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};

use log::{error, warn};

use crate::config::SchedulerKind;
use crate::kernel::KernelContext;
use crate::kernel::clock::{Clock, TickSubscriber};
use crate::kernel::mm::Admit;
use crate::kernel::process::{ProcessId, ProcessState};
use crate::kernel::queue::Dequeued;
use crate::timestamp;

/// Pool of worker cores
#[derive(Debug)]
pub struct Scheduler {
    workers: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawns one worker thread per configured core.
    #[must_use]
    pub fn spawn(ctx: &Arc<KernelContext>, clock: &Clock) -> Self {
        let workers = (0..ctx.config.num_cpu)
            .map(|core| {
                let ctx = Arc::clone(ctx);
                let ticks = clock.subscribe();
                thread::Builder::new()
                    .name(format!("core-{core}"))
                    .spawn(move || worker_loop(&ctx, core as u32, ticks))
                    .expect("failed to spawn worker thread")
            })
            .collect();
        Self { workers }
    }

    /// Waits for every worker to exit.
    pub fn join(self) {
        for worker in self.workers {
            let _ = worker.join();
        }
    }
}

fn worker_loop(ctx: &Arc<KernelContext>, core_id: u32, mut ticks: TickSubscriber) {
    loop {
        if ticks.wait_next_tick().is_none() {
            if !ctx.is_shutting_down() {
                // Losing the clock outside of shutdown is fatal.
                error!("[scheduler] core {core_id}: clock subscription lost");
                return;
            }
            drain_queue(ctx);
            return;
        }

        match ctx.queue.dequeue_blocking() {
            Dequeued::Shutdown => {
                ctx.telemetry.record_idle_tick();
                return;
            }
            Dequeued::Process(id) => {
                if ctx.is_shutting_down() {
                    ctx.telemetry.record_idle_tick();
                    discard(ctx, id);
                    continue;
                }
                handle_process(ctx, core_id, &mut ticks, id);
            }
        }
    }
}

/// Spends the already-received tick on one dequeued process.
fn handle_process(
    ctx: &Arc<KernelContext>,
    core_id: u32,
    ticks: &mut TickSubscriber,
    id: ProcessId,
) {
    let (name, state, size_hint) =
        ctx.with_process(id, |p| (p.name().to_string(), p.state(), p.memory_size()));
    match state {
        ProcessState::Finished => {
            // Finished processes are never requeued; skip.
            ctx.telemetry.record_idle_tick();
        }
        ProcessState::Ready => {
            let admitted = {
                let mut memory = ctx.memory.lock().expect("memory lock poisoned");
                let verdict = memory.admit(&name, size_hint);
                if verdict == Admit::Accepted && size_hint.is_none() {
                    // First admission: pin the sampled size on the record.
                    if let Some(size) = memory.pinned_size_of(&name) {
                        ctx.with_process(id, |p| p.pin_memory_size(size));
                    }
                }
                verdict
            };
            match admitted {
                Admit::Rejected => {
                    // Not an error: stay Ready and retry on a later tick.
                    ctx.telemetry.record_idle_tick();
                    ctx.queue.enqueue(id);
                }
                Admit::Accepted => {
                    ctx.with_process(id, |p| p.to_running(core_id))
                        .expect("invalid state transition");
                    run_slice(ctx, core_id, ticks, id, &name);
                    retire_or_requeue(ctx, id, &name);
                    if core_id == 0 {
                        write_periodic_snapshot(ctx);
                    }
                }
            }
        }
        other => {
            warn!("[scheduler] core {core_id}: dequeued {name} in state {}", other.as_str());
            ctx.telemetry.record_idle_tick();
        }
    }
}

/// Runs instructions on the current tick and the ticks that follow.
///
/// The first instruction executes on the tick the caller already received;
/// each further instruction waits for the next tick, preceded by
/// `delay_per_exec` no-op ticks. Returns early if the clock stops.
fn run_slice(
    ctx: &Arc<KernelContext>,
    core_id: u32,
    ticks: &mut TickSubscriber,
    id: ProcessId,
    name: &str,
) {
    let quantum = match ctx.config.scheduler {
        SchedulerKind::Fcfs => u64::MAX,
        SchedulerKind::Rr => ctx.config.quantum_cycles,
    };

    let mut log_file = open_process_log(ctx, name);
    let mut executed = 0u64;

    loop {
        ctx.telemetry.record_active_tick();
        ctx.with_process(id, |p| p.advance(1));
        executed += 1;

        if let Some(file) = log_file.as_mut() {
            let line =
                format!("({}) Core:{core_id} \"Hello world from {name}!\"\n", timestamp::now());
            if let Err(e) = file.write_all(line.as_bytes()) {
                error!("[scheduler] failed to append to {name}.txt: {e}");
                log_file = None;
            }
        }

        if ctx.with_process(id, |p| p.is_finished()) || executed >= quantum {
            return;
        }

        for _ in 0..ctx.config.delay_per_exec {
            if ticks.wait_next_tick().is_none() {
                return;
            }
            ctx.telemetry.record_idle_tick();
        }
        if ticks.wait_next_tick().is_none() {
            return;
        }
    }
}

/// Finishes a completed process or yields an unfinished one back to Ready.
///
/// Either way the allocator entry is released; a yielding process
/// re-acquires memory on its next admission.
fn retire_or_requeue(ctx: &Arc<KernelContext>, id: ProcessId, name: &str) {
    if ctx.with_process(id, |p| p.is_finished()) {
        ctx.with_process(id, |p| p.to_finished()).expect("invalid state transition");
        ctx.memory.lock().expect("memory lock poisoned").release(name);
    } else {
        ctx.with_process(id, |p| p.to_waiting()).expect("invalid state transition");
        ctx.memory.lock().expect("memory lock poisoned").release(name);
        ctx.with_process(id, |p| p.to_ready()).expect("invalid state transition");
        ctx.queue.enqueue(id);
    }
}

fn open_process_log(ctx: &KernelContext, name: &str) -> Option<File> {
    let path = ctx.output_path(&format!("{name}.txt"));
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some(file),
        Err(e) => {
            error!("[scheduler] failed to open {}: {e}", path.display());
            None
        }
    }
}

/// Advances the snapshot-cycle label and dumps the allocator layout.
fn write_periodic_snapshot(ctx: &KernelContext) {
    let cycle = ctx.snapshot_cycle.fetch_add(ctx.config.quantum_cycles, Ordering::Relaxed);
    write_snapshot_file(ctx, cycle);
}

/// Dumps the allocator layout to its per-variant snapshot file.
pub(crate) fn write_snapshot_file(ctx: &KernelContext, cycle: u64) {
    let memory = ctx.memory.lock().expect("memory lock poisoned");
    let path = ctx.output_path(&memory.snapshot_file_name(cycle));
    match File::create(&path) {
        Ok(mut file) => {
            if let Err(e) = memory.snapshot(cycle, &mut file) {
                error!("[scheduler] failed to write {}: {e}", path.display());
            }
        }
        Err(e) => error!("[scheduler] failed to create {}: {e}", path.display()),
    }
}

/// Releases the memory of everything still queued, then exits.
fn drain_queue(ctx: &KernelContext) {
    loop {
        match ctx.queue.dequeue_blocking() {
            Dequeued::Shutdown => return,
            Dequeued::Process(id) => discard(ctx, id),
        }
    }
}

fn discard(ctx: &KernelContext, id: ProcessId) {
    let name = ctx.with_process(id, |p| p.name().to_string());
    ctx.memory.lock().expect("memory lock poisoned").release(&name);
}
