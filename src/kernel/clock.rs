// src/kernel/clock.rs

//! CPU cycle source
//!
//! A single logical tick counter broadcast to every subscriber. The clock
//! either runs a producer thread emitting one tick per wall-clock period, or
//! is advanced manually (deterministic runs and tests).
//!
//! Subscribers never skip: each `wait_next_tick` call delivers exactly the
//! next tick after the previously delivered one, even if the subscriber has
//! fallen behind the counter.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

struct ClockState {
    tick: u64,
    stopped: bool,
}

struct ClockShared {
    state: Mutex<ClockState>,
    tick_cond: Condvar,
}

/// Broadcast tick source
pub struct Clock {
    shared: Arc<ClockShared>,
    producer: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("tick", &self.current_tick())
            .field("periodic", &self.producer.is_some())
            .finish()
    }
}

impl Clock {
    fn new_shared() -> Arc<ClockShared> {
        Arc::new(ClockShared {
            state: Mutex::new(ClockState { tick: 0, stopped: false }),
            tick_cond: Condvar::new(),
        })
    }

    /// Creates a clock that only moves via [`Clock::advance`].
    #[must_use]
    pub fn manual() -> Self {
        Self { shared: Self::new_shared(), producer: None }
    }

    /// Creates a clock emitting one tick per `period` from a producer thread.
    #[must_use]
    pub fn periodic(period: Duration) -> Self {
        let shared = Self::new_shared();
        let producer_shared = Arc::clone(&shared);
        let producer = thread::Builder::new()
            .name("clock".into())
            .spawn(move || loop {
                thread::sleep(period);
                let mut state = producer_shared.state.lock().expect("clock lock poisoned");
                if state.stopped {
                    return;
                }
                state.tick += 1;
                producer_shared.tick_cond.notify_all();
            })
            .expect("failed to spawn clock thread");
        Self { shared, producer: Some(producer) }
    }

    /// Registers a subscriber starting at the current tick.
    #[must_use]
    pub fn subscribe(&self) -> TickSubscriber {
        let state = self.shared.state.lock().expect("clock lock poisoned");
        TickSubscriber { shared: Arc::clone(&self.shared), seen: state.tick }
    }

    /// Emits `n` ticks at once.
    pub fn advance(&self, n: u64) {
        let mut state = self.shared.state.lock().expect("clock lock poisoned");
        state.tick += n;
        self.shared.tick_cond.notify_all();
    }

    /// Returns the current tick number.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.shared.state.lock().expect("clock lock poisoned").tick
    }

    /// Stops the clock and wakes every blocked subscriber.
    ///
    /// Idempotent. After this every `wait_next_tick` returns `None`.
    pub fn stop(&mut self) {
        {
            let mut state = self.shared.state.lock().expect("clock lock poisoned");
            state.stopped = true;
            self.shared.tick_cond.notify_all();
        }
        if let Some(producer) = self.producer.take() {
            let _ = producer.join();
        }
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One subscriber's view of the clock
pub struct TickSubscriber {
    shared: Arc<ClockShared>,
    seen: u64,
}

impl std::fmt::Debug for TickSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickSubscriber").field("seen", &self.seen).finish()
    }
}

impl TickSubscriber {
    /// Blocks until the next undelivered tick, returning its number.
    ///
    /// Returns `None` once the clock has been stopped; stopping takes
    /// priority over any backlog so blocked threads unwind promptly.
    pub fn wait_next_tick(&mut self) -> Option<u64> {
        let mut state = self.shared.state.lock().expect("clock lock poisoned");
        loop {
            if state.stopped {
                return None;
            }
            if state.tick > self.seen {
                self.seen += 1;
                return Some(self.seen);
            }
            state = self.shared.tick_cond.wait(state).expect("clock lock poisoned");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_ticks_are_delivered_in_order() {
        let clock = Clock::manual();
        let mut sub = clock.subscribe();
        clock.advance(3);
        assert_eq!(sub.wait_next_tick(), Some(1));
        assert_eq!(sub.wait_next_tick(), Some(2));
        assert_eq!(sub.wait_next_tick(), Some(3));
    }

    #[test]
    fn late_subscriber_does_not_replay_history() {
        let clock = Clock::manual();
        clock.advance(5);
        let mut sub = clock.subscribe();
        clock.advance(1);
        assert_eq!(sub.wait_next_tick(), Some(6));
    }

    #[test]
    fn every_subscriber_sees_every_tick() {
        let clock = Clock::manual();
        let mut a = clock.subscribe();
        let mut b = clock.subscribe();
        clock.advance(2);
        assert_eq!(a.wait_next_tick(), Some(1));
        assert_eq!(b.wait_next_tick(), Some(1));
        assert_eq!(a.wait_next_tick(), Some(2));
        assert_eq!(b.wait_next_tick(), Some(2));
    }

    #[test]
    fn stop_wakes_blocked_subscriber() {
        let mut clock = Clock::manual();
        let mut sub = clock.subscribe();
        let waiter = std::thread::spawn(move || sub.wait_next_tick());
        std::thread::sleep(Duration::from_millis(20));
        clock.stop();
        assert_eq!(waiter.join().unwrap(), None);
    }

    #[test]
    fn periodic_clock_produces_ticks() {
        let mut clock = Clock::periodic(Duration::from_millis(1));
        let mut sub = clock.subscribe();
        let first = sub.wait_next_tick().unwrap();
        let second = sub.wait_next_tick().unwrap();
        assert_eq!(second, first + 1);
        clock.stop();
        assert_eq!(sub.wait_next_tick(), None);
    }
}
