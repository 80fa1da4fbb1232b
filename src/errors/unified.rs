// src/errors/unified.rs

//! Unified error types for the simulator
//!
//! This module provides a consistent error handling approach across
//! all simulator subsystems.

use core::fmt;

/// Top-level simulator error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Configuration error
    Config(ConfigError),
    /// Process management error
    Process(ProcessError),
    /// An operation was invoked before `initialize`
    NotInitialized,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Config error: {e}"),
            Self::Process(e) => write!(f, "Process error: {e}"),
            Self::NotInitialized => write!(f, "the simulator has not been initialized"),
        }
    }
}

/// Configuration errors
///
/// Surfaced synchronously from `initialize`; the run is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `scheduler` value is neither `fcfs` nor `rr`
    UnknownScheduler(String),
    /// A min/max pair with min greater than max
    EmptyRange(&'static str),
    /// A key without a value token
    MissingValue(String),
    /// Config file could not be read
    Io(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownScheduler(v) => write!(f, "unknown scheduler {v:?} (expected fcfs or rr)"),
            Self::EmptyRange(key) => write!(f, "empty range: {key} has min > max"),
            Self::MissingValue(key) => write!(f, "missing value for key {key:?}"),
            Self::Io(msg) => write!(f, "failed to read config file: {msg}"),
        }
    }
}

impl From<ConfigError> for KernelError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Process management errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// A process with this name already exists
    DuplicateName(String),
    /// No process with this name exists
    UnknownProcess(String),
    /// A lifecycle transition that the state machine forbids
    InvalidTransition {
        /// State the process was in
        from: &'static str,
        /// State the caller tried to enter
        to: &'static str,
    },
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "process {name:?} already exists"),
            Self::UnknownProcess(name) => write!(f, "no process named {name:?}"),
            Self::InvalidTransition { from, to } => {
                write!(f, "invalid transition {from} -> {to}")
            }
        }
    }
}

impl From<ProcessError> for KernelError {
    fn from(err: ProcessError) -> Self {
        Self::Process(err)
    }
}

/// Result type alias for simulator operations
pub type Result<T> = core::result::Result<T, KernelError>;
