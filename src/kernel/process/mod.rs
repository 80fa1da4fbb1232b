// src/kernel/process/mod.rs

//! Process records and lifecycle
//!
//! A process is pure bookkeeping: a name, an instruction counter and a
//! lifecycle state. Transitions are guarded; an invalid transition is a
//! programming bug and panics at the call site.

pub mod table;

pub use table::ProcessTable;

use crate::errors::ProcessError;
use crate::timestamp;

/// Process identifier: an index into the process table arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(usize);

impl ProcessId {
    /// Wraps an arena index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Lifecycle state of a process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Created but not yet admitted to the ready queue
    New,
    /// Waiting in the ready queue for a core
    Ready,
    /// Owned by a worker core
    Running,
    /// Preempted or admission-blocked, will be re-enqueued
    Waiting,
    /// All instructions executed; terminal
    Finished,
}

impl ProcessState {
    /// Returns the display name of this state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Ready => "Ready",
            Self::Running => "Running",
            Self::Waiting => "Waiting",
            Self::Finished => "Finished",
        }
    }
}

/// Bookkeeping record of one simulated process
///
/// The memory size starts unassigned and is pinned on the first successful
/// admission; it never changes for as long as the record exists.
#[derive(Debug, Clone)]
pub struct Process {
    name: String,
    total_instructions: u64,
    current_instruction: u64,
    core: Option<u32>,
    created_at: String,
    memory_size: Option<u64>,
    state: ProcessState,
}

impl Process {
    /// Creates a process in the `New` state.
    #[must_use]
    pub fn new(name: impl Into<String>, total_instructions: u64) -> Self {
        Self {
            name: name.into(),
            total_instructions,
            current_instruction: 0,
            core: None,
            created_at: timestamp::now(),
            memory_size: None,
            state: ProcessState::New,
        }
    }

    /// Returns the process name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fixed total instruction count.
    #[must_use]
    pub const fn total_instructions(&self) -> u64 {
        self.total_instructions
    }

    /// Returns the number of instructions executed so far.
    #[must_use]
    pub const fn current_instruction(&self) -> u64 {
        self.current_instruction
    }

    /// Returns the owning core while Running, `None` otherwise.
    #[must_use]
    pub const fn core(&self) -> Option<u32> {
        self.core
    }

    /// Returns the human-readable creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// Returns the pinned memory size, `None` before first admission.
    #[must_use]
    pub const fn memory_size(&self) -> Option<u64> {
        self.memory_size
    }

    /// Pins the memory size assigned by the allocator.
    ///
    /// Pinning the same value again is a no-op; pinning a different value
    /// is a programming bug.
    pub fn pin_memory_size(&mut self, size: u64) {
        debug_assert!(
            self.memory_size.is_none() || self.memory_size == Some(size),
            "memory size repinned with a different value"
        );
        self.memory_size = Some(size);
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ProcessState {
        self.state
    }

    /// True once every instruction has executed.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.current_instruction == self.total_instructions
    }

    fn invalid(&self, to: &'static str) -> ProcessError {
        ProcessError::InvalidTransition { from: self.state.as_str(), to }
    }

    /// New/Waiting -> Ready, on admission to the ready queue.
    pub fn to_ready(&mut self) -> Result<(), ProcessError> {
        match self.state {
            ProcessState::New | ProcessState::Waiting => {
                self.state = ProcessState::Ready;
                Ok(())
            }
            _ => Err(self.invalid("Ready")),
        }
    }

    /// Ready -> Running, when a worker takes ownership.
    pub fn to_running(&mut self, core: u32) -> Result<(), ProcessError> {
        match self.state {
            ProcessState::Ready => {
                self.state = ProcessState::Running;
                self.core = Some(core);
                Ok(())
            }
            _ => Err(self.invalid("Running")),
        }
    }

    /// Running -> Waiting, on preemption. Clears the core assignment.
    pub fn to_waiting(&mut self) -> Result<(), ProcessError> {
        match self.state {
            ProcessState::Running => {
                self.state = ProcessState::Waiting;
                self.core = None;
                Ok(())
            }
            _ => Err(self.invalid("Waiting")),
        }
    }

    /// Running -> Finished. Requires every instruction to have executed.
    pub fn to_finished(&mut self) -> Result<(), ProcessError> {
        match self.state {
            ProcessState::Running if self.is_finished() => {
                self.state = ProcessState::Finished;
                self.core = None;
                Ok(())
            }
            _ => Err(self.invalid("Finished")),
        }
    }

    /// Advances the instruction counter by `n`, clamped to the total.
    pub fn advance(&mut self, n: u64) {
        self.current_instruction =
            self.current_instruction.saturating_add(n).min(self.total_instructions);
    }
}
