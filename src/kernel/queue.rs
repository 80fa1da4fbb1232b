// src/kernel/queue.rs

//! Ready queue
//!
//! Strict-FIFO producer/consumer queue of process ids, built on a mutex and
//! a condition variable. Consumers block until a process arrives or shutdown
//! is signaled; after shutdown, queued entries are still handed out so
//! workers can drain and release their memory.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use super::process::ProcessId;

/// Result of a blocking dequeue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dequeued {
    /// The next process in FIFO order
    Process(ProcessId),
    /// Shutdown signaled and the queue is drained; the caller should exit
    Shutdown,
}

struct QueueState {
    queue: VecDeque<ProcessId>,
    shutdown: bool,
}

/// FIFO of processes awaiting a core
pub struct ReadyQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl std::fmt::Debug for ReadyQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadyQueue").field("len", &self.len()).finish()
    }
}

impl Default for ReadyQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadyQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState { queue: VecDeque::new(), shutdown: false }),
            available: Condvar::new(),
        }
    }

    /// Appends a process and wakes one consumer.
    pub fn enqueue(&self, id: ProcessId) {
        let mut state = self.state.lock().expect("queue lock poisoned");
        debug_assert!(!state.queue.contains(&id), "process enqueued twice");
        state.queue.push_back(id);
        self.available.notify_one();
    }

    /// Blocks until a process is available or shutdown has drained the queue.
    pub fn dequeue_blocking(&self) -> Dequeued {
        let mut state = self.state.lock().expect("queue lock poisoned");
        loop {
            if let Some(id) = state.queue.pop_front() {
                return Dequeued::Process(id);
            }
            if state.shutdown {
                return Dequeued::Shutdown;
            }
            state = self.available.wait(state).expect("queue lock poisoned");
        }
    }

    /// Signals shutdown and wakes every blocked consumer.
    pub fn shutdown(&self) {
        let mut state = self.state.lock().expect("queue lock poisoned");
        state.shutdown = true;
        self.available.notify_all();
    }

    /// Number of queued processes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().expect("queue lock poisoned").queue.len()
    }

    /// True when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn fifo_order_is_preserved() {
        let queue = ReadyQueue::new();
        for i in 0..3 {
            queue.enqueue(ProcessId::new(i));
        }
        for i in 0..3 {
            assert_eq!(queue.dequeue_blocking(), Dequeued::Process(ProcessId::new(i)));
        }
    }

    #[test]
    fn shutdown_wakes_blocked_consumer() {
        let queue = Arc::new(ReadyQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || queue.dequeue_blocking())
        };
        std::thread::sleep(Duration::from_millis(20));
        queue.shutdown();
        assert_eq!(consumer.join().unwrap(), Dequeued::Shutdown);
    }

    #[test]
    fn queued_entries_survive_shutdown_for_draining() {
        let queue = ReadyQueue::new();
        queue.enqueue(ProcessId::new(7));
        queue.shutdown();
        assert_eq!(queue.dequeue_blocking(), Dequeued::Process(ProcessId::new(7)));
        assert_eq!(queue.dequeue_blocking(), Dequeued::Shutdown);
    }

    #[test]
    fn consumer_receives_later_enqueue() {
        let queue = Arc::new(ReadyQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || queue.dequeue_blocking())
        };
        std::thread::sleep(Duration::from_millis(10));
        queue.enqueue(ProcessId::new(1));
        assert_eq!(consumer.join().unwrap(), Dequeued::Process(ProcessId::new(1)));
    }
}
