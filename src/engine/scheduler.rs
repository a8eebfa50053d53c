//! Delayed actions for the control thread.
//!
//! The scheduler holds no thread or clock of its own. The owner asks for due
//! actions with `take_due(now)` from whatever loop it already runs (UI event
//! loop, test harness), and can sleep until `next_deadline()`.

use std::time::Instant;

/// Handle for cancelling a scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

struct Scheduled<T> {
    token: TimerToken,
    deadline: Instant,
    action: T,
}

pub struct Scheduler<T> {
    pending: Vec<Scheduled<T>>,
    next_token: u64,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            pending: Vec::with_capacity(4),
            next_token: 0,
        }
    }

    /// Queue `action` to become due at `deadline`.
    pub fn schedule(&mut self, deadline: Instant, action: T) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.pending.push(Scheduled {
            token,
            deadline,
            action,
        });
        token
    }

    /// Drop a pending action. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.token != token);
        self.pending.len() != before
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.pending.iter().any(|s| s.token == token)
    }

    /// Earliest deadline still pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|s| s.deadline).min()
    }

    /// Remove and return every action due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<T> {
        let mut due: Vec<Scheduled<T>> = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].deadline <= now {
                due.push(self.pending.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|s| (s.deadline, s.token.0));
        due.into_iter().map(|s| s.action).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
