//! Per-provider circuit breaker.
//!
//! CLOSED counts failures inside a sliding window. Reaching the threshold
//! opens the circuit; after the cool-down one trial request is let through
//! (HALF_OPEN). The trial's outcome closes or re-opens it.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub window: Duration,
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            window: Duration::from_secs(60),
            cooldown: Duration::from_secs(30),
        }
    }
}

/// What the breaker allows for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// The single HALF_OPEN probe. Its outcome must be recorded or abandoned.
    Trial,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Closed,
    Open { since: Instant },
    HalfOpen { trial_in_flight: bool },
}

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    phase: Phase,
    failures: VecDeque<Instant>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            phase: Phase::Closed,
            failures: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// State as seen at `now`; an OPEN circuit past its cool-down reports HALF_OPEN.
    pub fn state_at(&self, now: Instant) -> CircuitState {
        match self.phase {
            Phase::Closed => CircuitState::Closed,
            Phase::Open { since } if self.cooled_down(since, now) => CircuitState::HalfOpen,
            Phase::Open { .. } => CircuitState::Open,
            Phase::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    pub fn try_acquire(&mut self, now: Instant) -> Admission {
        match self.phase {
            Phase::Closed => Admission::Allowed,
            Phase::Open { since } => {
                if self.cooled_down(since, now) {
                    self.phase = Phase::HalfOpen { trial_in_flight: true };
                    Admission::Trial
                } else {
                    Admission::Rejected
                }
            }
            Phase::HalfOpen { trial_in_flight: true } => Admission::Rejected,
            Phase::HalfOpen { trial_in_flight: false } => {
                self.phase = Phase::HalfOpen { trial_in_flight: true };
                Admission::Trial
            }
        }
    }

    /// Outcome of an attempt admitted as `admission`. Only the trial's own
    /// outcome moves a HALF_OPEN circuit; stragglers admitted earlier are
    /// ignored while OPEN or HALF_OPEN. Returns the new state when this call
    /// changed it.
    pub fn record_success(&mut self, admission: Admission) -> Option<CircuitState> {
        match (self.phase, admission) {
            (Phase::Closed, _) => {
                self.failures.clear();
                None
            }
            (Phase::HalfOpen { .. }, Admission::Trial) => {
                self.failures.clear();
                self.phase = Phase::Closed;
                Some(CircuitState::Closed)
            }
            _ => None,
        }
    }

    /// See [`record_success`](Self::record_success).
    pub fn record_failure(&mut self, admission: Admission, now: Instant) -> Option<CircuitState> {
        match (self.phase, admission) {
            (Phase::HalfOpen { .. }, Admission::Trial) => {
                self.phase = Phase::Open { since: now };
                Some(CircuitState::Open)
            }
            (Phase::Open { .. } | Phase::HalfOpen { .. }, _) => None,
            (Phase::Closed, _) => {
                while let Some(&oldest) = self.failures.front() {
                    if now.saturating_duration_since(oldest) > self.config.window {
                        self.failures.pop_front();
                    } else {
                        break;
                    }
                }
                self.failures.push_back(now);
                if self.failures.len() as u32 >= self.config.failure_threshold.max(1) {
                    self.failures.clear();
                    self.phase = Phase::Open { since: now };
                    Some(CircuitState::Open)
                } else {
                    None
                }
            }
        }
    }

    fn cooled_down(&self, since: Instant, now: Instant) -> bool {
        now.saturating_duration_since(since) >= self.config.cooldown
    }

    /// Release a trial slot whose request never finished.
    pub fn abandon_trial(&mut self) {
        if let Phase::HalfOpen { trial_in_flight: true } = self.phase {
            self.phase = Phase::HalfOpen { trial_in_flight: false };
        }
    }
}
