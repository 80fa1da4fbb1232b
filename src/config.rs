// src/config.rs

//! Simulator configuration
//!
//! The config file is a sequence of whitespace-separated key/value pairs in
//! any order. Unrecognized keys are logged and skipped; out-of-range values
//! are clamped. Only two things are hard errors: an unknown `scheduler`
//! value and a min/max pair with min greater than max.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;

use crate::errors::ConfigError;

/// Scheduling discipline for the worker cores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerKind {
    /// First-come-first-served: a core runs a process to completion
    Fcfs,
    /// Round-robin: a core runs at most `quantum_cycles` instructions per slice
    Rr,
}

impl SchedulerKind {
    /// Returns the config-file spelling of this discipline.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fcfs => "fcfs",
            Self::Rr => "rr",
        }
    }
}

/// Runtime parameters of the simulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Worker core count, clamped to [1, 128]
    pub num_cpu: usize,
    /// Scheduling discipline
    pub scheduler: SchedulerKind,
    /// Round-robin slice length in instructions (also the snapshot stride)
    pub quantum_cycles: u64,
    /// Processes generated per tick while the generator is on
    pub batch_process_freq: u64,
    /// Minimum instruction count for a new process
    pub min_ins: u64,
    /// Maximum instruction count for a new process
    pub max_ins: u64,
    /// Extra no-op ticks between consecutive instructions
    pub delay_per_exec: u64,
    /// Total memory in abstract units
    pub max_overall_mem: u64,
    /// Frame size; equal to `max_overall_mem` selects the flat allocator
    pub mem_per_frame: u64,
    /// Minimum pinned memory size per process
    pub min_mem_per_proc: u64,
    /// Maximum pinned memory size per process
    pub max_mem_per_proc: u64,
    /// Wall-clock period of one tick (periodic clock only)
    pub tick_period: Duration,
    /// Directory receiving every file the simulator writes
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_cpu: 1,
            scheduler: SchedulerKind::Fcfs,
            quantum_cycles: 1,
            batch_process_freq: 1,
            min_ins: 1,
            max_ins: 1,
            delay_per_exec: 0,
            max_overall_mem: 16_384,
            mem_per_frame: 16_384,
            min_mem_per_proc: 4_096,
            max_mem_per_proc: 4_096,
            tick_period: Duration::from_millis(100),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Upper clamp bound for numeric config values
const VALUE_MAX: u64 = 1 << 32;

fn clamp(value: u64, lo: u64, hi: u64) -> u64 {
    value.clamp(lo, hi)
}

impl Config {
    /// Reads and parses a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::parse(&text)
    }

    /// Parses config text, starting from defaults.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let mut tokens = text.split_whitespace();

        while let Some(key) = tokens.next() {
            let Some(value) = tokens.next() else {
                return Err(ConfigError::MissingValue(key.to_string()));
            };

            match key {
                "scheduler" => {
                    let value = value.trim_matches('"');
                    config.scheduler = match value {
                        "fcfs" => SchedulerKind::Fcfs,
                        "rr" => SchedulerKind::Rr,
                        other => return Err(ConfigError::UnknownScheduler(other.to_string())),
                    };
                }
                _ => {
                    let Ok(number) = value.parse::<u64>() else {
                        warn!("[config] ignoring value {value:?} for key {key:?}");
                        continue;
                    };
                    match key {
                        "num-cpu" => config.num_cpu = clamp(number, 1, 128) as usize,
                        "quantum-cycles" => config.quantum_cycles = clamp(number, 1, VALUE_MAX),
                        "batch-process-freq" => {
                            config.batch_process_freq = clamp(number, 1, VALUE_MAX);
                        }
                        "min-ins" => config.min_ins = clamp(number, 1, VALUE_MAX),
                        "max-ins" => config.max_ins = clamp(number, 1, VALUE_MAX),
                        "delay-per-exec" | "delays-per-exec" => {
                            config.delay_per_exec = clamp(number, 0, VALUE_MAX);
                        }
                        "max-overall-mem" => config.max_overall_mem = clamp(number, 1, VALUE_MAX),
                        "mem-per-frame" => config.mem_per_frame = clamp(number, 1, VALUE_MAX),
                        "min-mem-per-proc" => {
                            config.min_mem_per_proc = clamp(number, 1, VALUE_MAX);
                        }
                        "max-mem-per-proc" => {
                            config.max_mem_per_proc = clamp(number, 1, VALUE_MAX);
                        }
                        _ => warn!("[config] ignoring unrecognized key {key:?}"),
                    }
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_ins > self.max_ins {
            return Err(ConfigError::EmptyRange("min-ins/max-ins"));
        }
        if self.min_mem_per_proc > self.max_mem_per_proc {
            return Err(ConfigError::EmptyRange("min-mem-per-proc/max-mem-per-proc"));
        }
        Ok(())
    }

    /// True when the configuration selects the flat-memory allocator.
    ///
    /// One frame spanning all of memory means there is nothing to page.
    #[must_use]
    pub fn is_flat_memory(&self) -> bool {
        self.max_overall_mem == self.mem_per_frame
    }
}
