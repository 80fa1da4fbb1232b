// src/lib.rs

//! sim_os - a teaching operating-system simulator
//!
//! Emulates a multi-core CPU running a batch workload under FCFS or
//! preemptive round-robin scheduling, with a pluggable memory subsystem:
//! a contiguous first-fit allocator with a FIFO backing store, or a paged
//! frame allocator. A broadcast CPU-cycle clock coordinates process
//! generation, scheduler progress and periodic memory snapshots.
//!
//! The [`kernel::Kernel`] facade is the single entry point; the interactive
//! console in `main.rs` is a thin layer over it.

#![deny(missing_debug_implementations)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod kernel;
pub mod logger;
pub mod timestamp;

pub use config::{Config, SchedulerKind};
pub use errors::{ConfigError, KernelError, ProcessError};
pub use kernel::Kernel;
