//! FailoverGateway: ordered failover across completion backends with one
//! circuit breaker per provider.
//!
//! Providers are tried in configured order. An OPEN provider is skipped
//! without a call. The first success wins; if every provider fails or is
//! skipped the caller gets [`GatewayError::AllProvidersExhausted`] with the
//! outcome of each attempt.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::breaker::{Admission, BreakerConfig, CircuitBreaker, CircuitState};
use crate::cache::ResponseCache;
use crate::clock::{Clock, SystemClock};
use crate::provider::{
    CompletionBackend, ProviderClient, ProviderFailure, ProviderPayload, ProviderRequest,
};

/// `[gateway]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub failure_threshold: u32,
    pub window_secs: u64,
    pub cooldown_secs: u64,
    pub request_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            window_secs: 60,
            cooldown_secs: 30,
            request_timeout_ms: 20_000,
        }
    }
}

impl GatewayConfig {
    pub fn breaker(&self) -> BreakerConfig {
        BreakerConfig {
            failure_threshold: self.failure_threshold.max(1),
            window: Duration::from_secs(self.window_secs),
            cooldown: Duration::from_secs(self.cooldown_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Failed(ProviderFailure),
    SkippedOpen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub provider: String,
    pub outcome: AttemptOutcome,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::Failed(e) => write!(f, "{}: {}", self.provider, e),
            AttemptOutcome::SkippedOpen => write!(f, "{}: skipped (circuit open)", self.provider),
        }
    }
}

fn summarize(attempts: &[Attempt]) -> String {
    attempts.iter().map(|a| a.to_string()).collect::<Vec<_>>().join("; ")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("all providers exhausted: {}", summarize(.attempts))]
    AllProvidersExhausted { attempts: Vec<Attempt> },

    #[error("no providers configured")]
    NoProviders,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCompletion {
    pub provider: String,
    pub payload: ProviderPayload,
    /// Provider calls made for this completion (0 when served from cache).
    pub attempts: usize,
    pub cached: bool,
}

struct ProviderSlot<B> {
    backend: B,
    breaker: Mutex<CircuitBreaker>,
}

fn lock(m: &Mutex<CircuitBreaker>) -> MutexGuard<'_, CircuitBreaker> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ties a HALF_OPEN trial to its breaker. Dropped unresolved (timeout
/// elsewhere, cancellation) it hands the trial slot back.
struct AttemptPermit<'a> {
    breaker: &'a Mutex<CircuitBreaker>,
    admission: Admission,
    resolved: bool,
}

impl<'a> AttemptPermit<'a> {
    fn new(breaker: &'a Mutex<CircuitBreaker>, admission: Admission) -> Self {
        Self {
            breaker,
            admission,
            resolved: false,
        }
    }

    fn succeed(mut self) -> Option<CircuitState> {
        self.resolved = true;
        lock(self.breaker).record_success(self.admission)
    }

    fn fail(mut self, now: std::time::Instant) -> Option<CircuitState> {
        self.resolved = true;
        lock(self.breaker).record_failure(self.admission, now)
    }
}

impl Drop for AttemptPermit<'_> {
    fn drop(&mut self) {
        if self.admission == Admission::Trial && !self.resolved {
            lock(self.breaker).abandon_trial();
        }
    }
}

pub struct FailoverGateway<B = ProviderClient, C = SystemClock> {
    slots: Vec<ProviderSlot<B>>,
    clock: C,
    config: GatewayConfig,
    cache: Option<ResponseCache>,
}

impl<B: CompletionBackend> FailoverGateway<B, SystemClock> {
    pub fn new(backends: Vec<B>, config: GatewayConfig) -> Self {
        Self::with_clock(backends, config, SystemClock)
    }
}

impl<B: CompletionBackend, C: Clock> FailoverGateway<B, C> {
    pub fn with_clock(backends: Vec<B>, config: GatewayConfig, clock: C) -> Self {
        let breaker = config.breaker();
        Self {
            slots: backends
                .into_iter()
                .map(|backend| ProviderSlot {
                    backend,
                    breaker: Mutex::new(CircuitBreaker::new(breaker)),
                })
                .collect(),
            clock,
            config,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn request_timeout(&self) -> Duration {
        self.config.request_timeout()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn provider_states(&self) -> Vec<(String, CircuitState)> {
        let now = self.clock.now();
        self.slots
            .iter()
            .map(|s| (s.backend.name().to_string(), lock(&s.breaker).state_at(now)))
            .collect()
    }

    pub async fn complete(
        &self,
        request: &ProviderRequest,
    ) -> Result<GatewayCompletion, GatewayError> {
        if self.slots.is_empty() {
            return Err(GatewayError::NoProviders);
        }

        if let Some(cache) = &self.cache {
            if let Some((provider, payload)) = cache.get(request, self.clock.now()) {
                debug!(provider = %provider, "completion served from cache");
                return Ok(GatewayCompletion {
                    provider,
                    payload,
                    attempts: 0,
                    cached: true,
                });
            }
        }

        let mut attempts = Vec::new();
        let mut calls = 0usize;

        for slot in &self.slots {
            let name = slot.backend.name();
            let admission = lock(&slot.breaker).try_acquire(self.clock.now());
            match admission {
                Admission::Rejected => {
                    debug!(provider = name, "circuit open; skipping");
                    attempts.push(Attempt {
                        provider: name.to_string(),
                        outcome: AttemptOutcome::SkippedOpen,
                    });
                    continue;
                }
                Admission::Trial => {
                    info!(provider = name, "circuit half-open; sending trial request")
                }
                Admission::Allowed => {}
            }

            let permit = AttemptPermit::new(&slot.breaker, admission);
            calls += 1;

            let attempt = slot.backend.complete(request);
            let result = match tokio::time::timeout(request.timeout, attempt).await {
                Ok(r) => r,
                Err(_) => Err(ProviderFailure::Timeout(request.timeout)),
            };

            match result {
                Ok(payload) => {
                    if let Some(state) = permit.succeed() {
                        info!(provider = name, state = %state, "circuit transition");
                    }
                    if let Some(cache) = &self.cache {
                        cache.put(request, name, &payload, self.clock.now());
                    }
                    return Ok(GatewayCompletion {
                        provider: name.to_string(),
                        payload,
                        attempts: calls,
                        cached: false,
                    });
                }
                Err(failure) => {
                    warn!(
                        provider = name,
                        kind = failure.kind(),
                        error = %failure,
                        "provider attempt failed"
                    );
                    if let Some(state) = permit.fail(self.clock.now()) {
                        warn!(provider = name, state = %state, "circuit transition");
                    }
                    attempts.push(Attempt {
                        provider: name.to_string(),
                        outcome: AttemptOutcome::Failed(failure),
                    });
                }
            }
        }

        Err(GatewayError::AllProvidersExhausted { attempts })
    }
}
