// src/kernel/process/table.rs

//! Process table
//!
//! Arena of process records indexed by [`ProcessId`]. The arena is
//! append-only between `clear` calls, so slot order is insertion order and
//! listings are stable and reproducible. The ready queue and the workers
//! carry ids, never records.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::ProcessError;

use super::{Process, ProcessId};

/// Arena of process records plus a name index
#[derive(Debug, Default)]
pub struct ProcessTable {
    slots: Vec<Mutex<Process>>,
    by_name: HashMap<String, ProcessId>,
}

impl ProcessTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, assigning it the next monotonic id.
    pub fn insert(&mut self, process: Process) -> Result<ProcessId, ProcessError> {
        if self.by_name.contains_key(process.name()) {
            return Err(ProcessError::DuplicateName(process.name().to_string()));
        }
        let id = ProcessId::new(self.slots.len());
        self.by_name.insert(process.name().to_string(), id);
        self.slots.push(Mutex::new(process));
        Ok(id)
    }

    /// Looks up a process id by name.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<ProcessId> {
        self.by_name.get(name).copied()
    }

    /// Runs `f` with exclusive access to one record.
    ///
    /// Panics on an id that this table never issued.
    pub fn with<R>(&self, id: ProcessId, f: impl FnOnce(&mut Process) -> R) -> R {
        let mut process = self.slots[id.index()].lock().expect("process lock poisoned");
        f(&mut process)
    }

    /// Returns a point-in-time copy of one record.
    #[must_use]
    pub fn snapshot(&self, id: ProcessId) -> Process {
        self.with(id, |p| p.clone())
    }

    /// Returns copies of every record in insertion order.
    #[must_use]
    pub fn snapshot_in_order(&self) -> Vec<Process> {
        self.slots
            .iter()
            .map(|slot| slot.lock().expect("process lock poisoned").clone())
            .collect()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when no record exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Removes every record and resets the id counter.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.by_name.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_assigns_monotonic_ids() {
        let mut table = ProcessTable::new();
        let a = table.insert(Process::new("a", 1)).unwrap();
        let b = table.insert(Process::new("b", 1)).unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(table.id_of("b"), Some(b));
    }

    #[test]
    fn duplicate_name_is_rejected_without_state_change() {
        let mut table = ProcessTable::new();
        table.insert(Process::new("a", 1)).unwrap();
        let err = table.insert(Process::new("a", 5)).unwrap_err();
        assert_eq!(err, ProcessError::DuplicateName("a".to_string()));
        assert_eq!(table.len(), 1);
        assert_eq!(table.snapshot(table.id_of("a").unwrap()).total_instructions(), 1);
    }

    #[test]
    fn listing_preserves_insertion_order() {
        let mut table = ProcessTable::new();
        for name in ["z", "m", "a"] {
            table.insert(Process::new(name, 1)).unwrap();
        }
        let names: Vec<_> =
            table.snapshot_in_order().iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, ["z", "m", "a"]);
    }

    #[test]
    fn clear_resets_the_id_counter() {
        let mut table = ProcessTable::new();
        table.insert(Process::new("a", 1)).unwrap();
        table.insert(Process::new("b", 1)).unwrap();
        table.clear();
        assert!(table.is_empty());
        let again = table.insert(Process::new("c", 1)).unwrap();
        assert_eq!(again.index(), 0);
    }
}
