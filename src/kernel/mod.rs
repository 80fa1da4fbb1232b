// src/kernel/mod.rs

//! Simulator kernel
//!
//! The [`Kernel`] facade owns every component of a run: the clock, the
//! worker pool, the generator, the process table, the ready queue and the
//! selected allocator. Components never reach for globals; they share one
//! [`KernelContext`] handed to them at construction.

pub mod clock;
pub mod mm;
pub mod process;
pub mod queue;
pub mod report;
pub mod scheduler;
pub mod telemetry;

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::errors::{ConfigError, KernelError, ProcessError, Result};

use clock::Clock;
use mm::MemoryManager;
use process::{Process, ProcessId, ProcessTable};
use queue::ReadyQueue;
use report::{ProcessSmi, VmStat};
use scheduler::Scheduler;
use telemetry::Telemetry;

/// Shared state of one simulator run
///
/// Handed to the scheduler, the generator and the report writers at
/// construction; replaces the process-wide config and counters of older
/// designs.
#[derive(Debug)]
pub struct KernelContext {
    /// Immutable run parameters
    pub config: Config,
    pub(crate) table: RwLock<ProcessTable>,
    pub(crate) queue: ReadyQueue,
    pub(crate) memory: Mutex<MemoryManager>,
    pub(crate) telemetry: Arc<Telemetry>,
    pub(crate) next_generated_id: AtomicU64,
    pub(crate) snapshot_cycle: AtomicU64,
    shutdown: AtomicBool,
    generator_on: AtomicBool,
    rng: Mutex<SmallRng>,
}

impl KernelContext {
    fn new(config: Config) -> Self {
        let telemetry = Arc::new(Telemetry::new());
        let memory = MemoryManager::from_config(&config, Arc::clone(&telemetry));
        Self {
            config,
            table: RwLock::new(ProcessTable::new()),
            queue: ReadyQueue::new(),
            memory: Mutex::new(memory),
            telemetry,
            next_generated_id: AtomicU64::new(1),
            snapshot_cycle: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
            generator_on: AtomicBool::new(false),
            rng: Mutex::new(SmallRng::from_entropy()),
        }
    }

    /// Runs `f` with exclusive access to one process record.
    pub fn with_process<R>(&self, id: ProcessId, f: impl FnOnce(&mut Process) -> R) -> R {
        self.table.read().expect("table lock poisoned").with(id, f)
    }

    /// Copies every record in insertion order.
    #[must_use]
    pub fn list_processes(&self) -> Vec<Process> {
        self.table.read().expect("table lock poisoned").snapshot_in_order()
    }

    /// Creates a process, marks it Ready and enqueues it.
    pub fn spawn_process(&self, name: String) -> std::result::Result<ProcessId, ProcessError> {
        let total = self.sample_instruction_count();
        let id = {
            let mut table = self.table.write().expect("table lock poisoned");
            let id = table.insert(Process::new(name, total))?;
            table.with(id, Process::to_ready).expect("invalid state transition");
            id
        };
        // Table lock dropped first: the queue lock is ordered before it.
        self.queue.enqueue(id);
        Ok(id)
    }

    fn sample_instruction_count(&self) -> u64 {
        let mut rng = self.rng.lock().expect("rng lock poisoned");
        rng.gen_range(self.config.min_ins..=self.config.max_ins)
    }

    /// True while the generator creates processes on each tick.
    #[must_use]
    pub fn generator_enabled(&self) -> bool {
        self.generator_on.load(Ordering::Relaxed)
    }

    fn set_generator(&self, on: bool) {
        self.generator_on.store(on, Ordering::Relaxed);
    }

    /// True once shutdown has been requested.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Resolves a file name inside the configured output directory.
    #[must_use]
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.config.output_dir.join(file_name)
    }
}

/// One active run
struct Run {
    ctx: Arc<KernelContext>,
    clock: Clock,
    scheduler: Option<Scheduler>,
    generator: Option<JoinHandle<()>>,
}

/// Simulator entry point
///
/// All console commands route through here. `initialize` is idempotent: a
/// second call tears the previous run down and starts from scratch.
#[derive(Default)]
pub struct Kernel {
    run: Option<Run>,
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel").field("initialized", &self.run.is_some()).finish()
    }
}

impl Kernel {
    /// Creates an uninitialized kernel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a run is active.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.run.is_some()
    }

    /// Starts a run driven by the periodic wall-clock tick source.
    pub fn initialize(&mut self, config: Config) -> Result<()> {
        config.validate()?;
        let clock = Clock::periodic(config.tick_period);
        self.initialize_with_clock(config, clock)
    }

    /// Starts a run whose clock only moves via [`Kernel::advance_clock`].
    ///
    /// Deterministic mode for tests and scripted runs.
    pub fn initialize_manual(&mut self, config: Config) -> Result<()> {
        self.initialize_with_clock(config, Clock::manual())
    }

    fn initialize_with_clock(&mut self, config: Config, clock: Clock) -> Result<()> {
        config.validate()?;
        fs::create_dir_all(&config.output_dir)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", config.output_dir.display())))?;

        // Tear down any previous run before touching shared state.
        self.shutdown();

        let ctx = Arc::new(KernelContext::new(config));
        let scheduler = Scheduler::spawn(&ctx, &clock);
        let generator = scheduler::generator::spawn(&ctx, &clock);
        self.run =
            Some(Run { ctx, clock, scheduler: Some(scheduler), generator: Some(generator) });
        Ok(())
    }

    fn run(&self) -> Result<&Run> {
        self.run.as_ref().ok_or(KernelError::NotInitialized)
    }

    /// Returns the shared context of the active run.
    pub fn context(&self) -> Result<&Arc<KernelContext>> {
        Ok(&self.run()?.ctx)
    }

    /// Emits `n` ticks on a manually driven clock.
    pub fn advance_clock(&self, n: u64) -> Result<()> {
        self.run()?.clock.advance(n);
        Ok(())
    }

    /// Turns the batch generator on.
    pub fn start_generator(&self) -> Result<()> {
        self.run()?.ctx.set_generator(true);
        Ok(())
    }

    /// Turns the batch generator off.
    pub fn stop_generator(&self) -> Result<()> {
        self.run()?.ctx.set_generator(false);
        Ok(())
    }

    /// Creates a user-named process and admits it to the ready queue.
    pub fn create_named_process(&self, name: &str) -> Result<ProcessId> {
        Ok(self.run()?.ctx.spawn_process(name.to_string())?)
    }

    /// Returns a read-only copy of one process record.
    pub fn process_view(&self, name: &str) -> Result<Process> {
        let ctx = &self.run()?.ctx;
        let table = ctx.table.read().expect("table lock poisoned");
        let id = table
            .id_of(name)
            .ok_or_else(|| ProcessError::UnknownProcess(name.to_string()))?;
        Ok(table.snapshot(id))
    }

    /// Copies every record in insertion order.
    pub fn list_processes(&self) -> Result<Vec<Process>> {
        Ok(self.run()?.ctx.list_processes())
    }

    /// Writes an allocator snapshot for the current cycle label.
    pub fn snapshot_now(&self) -> Result<()> {
        let ctx = &self.run()?.ctx;
        let cycle = ctx.snapshot_cycle.load(Ordering::Relaxed);
        scheduler::write_snapshot_file(ctx, cycle);
        Ok(())
    }

    /// Writes the utilization report to `csopesy_log.txt` and returns it.
    pub fn report(&self) -> Result<String> {
        Ok(report::write_utilization_report(&self.run()?.ctx))
    }

    /// Returns the `process-smi` payload.
    pub fn process_smi(&self) -> Result<ProcessSmi> {
        Ok(report::process_smi(&self.run()?.ctx))
    }

    /// Returns the `vmstat` payload.
    pub fn vmstat(&self) -> Result<VmStat> {
        Ok(report::vmstat(&self.run()?.ctx))
    }

    /// Stops the active run: flag, clock, queue, then joins every thread.
    ///
    /// Queued processes are drained and their memory released. Idempotent.
    pub fn shutdown(&mut self) {
        let Some(mut run) = self.run.take() else {
            return;
        };
        run.ctx.request_shutdown();
        run.clock.stop();
        run.ctx.queue.shutdown();
        if let Some(scheduler) = run.scheduler.take() {
            scheduler.join();
        }
        if let Some(generator) = run.generator.take() {
            let _ = generator.join();
        }
    }
}

impl Drop for Kernel {
    fn drop(&mut self) {
        self.shutdown();
    }
}
