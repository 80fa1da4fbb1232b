// src/kernel/scheduler/generator.rs

//! Batch process generator
//!
//! Subscribed to the clock for the lifetime of a run. While enabled, each
//! tick creates `batch_process_freq` processes with default `processNN`
//! names and enqueues them Ready. A name collision (a user-created process
//! took the default name first) is logged and skipped; the counter still
//! advances.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};

use log::warn;

use crate::errors::ProcessError;
use crate::kernel::KernelContext;
use crate::kernel::clock::{Clock, TickSubscriber};

/// Spawns the generator thread. It exits when the clock stops.
#[must_use]
pub fn spawn(ctx: &Arc<KernelContext>, clock: &Clock) -> JoinHandle<()> {
    let ctx = Arc::clone(ctx);
    let ticks = clock.subscribe();
    thread::Builder::new()
        .name("generator".into())
        .spawn(move || generator_loop(&ctx, ticks))
        .expect("failed to spawn generator thread")
}

fn generator_loop(ctx: &Arc<KernelContext>, mut ticks: TickSubscriber) {
    while ticks.wait_next_tick().is_some() {
        if !ctx.generator_enabled() {
            continue;
        }
        for _ in 0..ctx.config.batch_process_freq {
            let n = ctx.next_generated_id.fetch_add(1, Ordering::Relaxed);
            let name = format!("process{n:02}");
            match ctx.spawn_process(name) {
                Ok(_) => {}
                Err(ProcessError::DuplicateName(name)) => {
                    warn!("[generator] skipping duplicate name {name:?}");
                }
                Err(e) => warn!("[generator] failed to create process: {e}"),
            }
        }
    }
}
