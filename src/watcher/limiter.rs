//! Dispatch rate limiting
//!
//! This module enforces the cooldown window between workflow dispatches.
//! A burst of service events must not produce a burst of downstream
//! invocations; the limiter remembers when the last successful dispatch
//! happened and suppresses attempts inside the window.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Granularity of the cooldown window.
///
/// `Global` keeps one shared timestamp: at most one dispatch total per
/// window, regardless of which service produced the event. `PerResource`
/// keeps one timestamp per `namespace/name` key: at most one dispatch per
/// service per window. The per-resource map is never pruned; it grows with
/// resource churn and is reset only by process restart.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerScope {
    /// One cooldown window shared across all services
    #[default]
    Global,
    /// An independent cooldown window per service key
    PerResource,
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Dispatch is permitted now
    Permit,
    /// Dispatch is suppressed; the window has this much time left
    Debounced {
        /// Time remaining until the next dispatch is permitted
        remaining: Duration,
    },
}

/// Last-dispatch memory, shaped by the configured scope.
#[derive(Debug)]
enum TriggerState {
    Global(Option<Instant>),
    PerResource(HashMap<String, Instant>),
}

/// Cooldown rate limiter for workflow dispatches.
///
/// Holds its state behind a `Mutex` so handles can be shared if event
/// handling is ever parallelized; the default watch loop is a single task
/// and never contends. State starts empty, so the first qualifying event
/// after startup is always permitted.
///
/// The caller drives the clock: [`check`](Self::check) and
/// [`record_success`](Self::record_success) take `now` explicitly, which
/// keeps the window arithmetic deterministic in tests.
pub struct RateLimiter {
    cooldown: Duration,
    scope: TriggerScope,
    state: Mutex<TriggerState>,
}

impl RateLimiter {
    /// Creates a limiter with the given cooldown window and scope.
    pub fn new(cooldown: Duration, scope: TriggerScope) -> Self {
        let state = match scope {
            TriggerScope::Global => TriggerState::Global(None),
            TriggerScope::PerResource => TriggerState::PerResource(HashMap::new()),
        };

        Self {
            cooldown,
            scope,
            state: Mutex::new(state),
        }
    }

    /// Checks whether a dispatch for `key` is permitted at `now`.
    ///
    /// Permits iff no dispatch has been recorded for the scope's slot, or
    /// the recorded one is at least a full cooldown window in the past.
    /// A `Debounced` result carries the remaining suppression time for the
    /// caller to log; it does not mutate any state.
    pub fn check(&self, now: Instant, key: &str) -> Decision {
        let state = self.state.lock().unwrap();

        let last = match &*state {
            TriggerState::Global(last) => *last,
            TriggerState::PerResource(map) => map.get(key).copied(),
        };

        match last {
            None => Decision::Permit,
            Some(last) => {
                let elapsed = now.duration_since(last);
                if elapsed >= self.cooldown {
                    Decision::Permit
                } else {
                    Decision::Debounced {
                        remaining: self.cooldown - elapsed,
                    }
                }
            }
        }
    }

    /// Records a successful dispatch for `key` at `now`.
    ///
    /// Must be called only after the downstream call reported success; a
    /// failed or skipped dispatch leaves the window untouched so the next
    /// qualifying event retries immediately.
    pub fn record_success(&self, now: Instant, key: &str) {
        let mut state = self.state.lock().unwrap();

        match &mut *state {
            TriggerState::Global(last) => *last = Some(now),
            TriggerState::PerResource(map) => {
                map.insert(key.to_string(), now);
            }
        }
    }

    /// Returns the configured cooldown window.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Returns the configured scope.
    pub fn scope(&self) -> TriggerScope {
        self.scope
    }
}
