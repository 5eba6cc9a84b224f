#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use neurosync_ai::{
    CompletionBackend, ProviderFailure, ProviderPayload, ProviderRequest, ResponseShape,
};

#[derive(Debug, Clone)]
pub enum Mode {
    Healthy,
    Failing(ProviderFailure),
    Hanging,
}

#[derive(Debug)]
struct FakeState {
    mode: Mutex<Mode>,
    delay: Mutex<Duration>,
    hang_on: Mutex<Option<String>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Scriptable backend. Clones share state so a test can keep a handle to a
/// backend the gateway owns.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    name: String,
    state: Arc<FakeState>,
}

impl FakeBackend {
    pub fn new(name: &str, mode: Mode) -> Self {
        Self {
            name: name.to_string(),
            state: Arc::new(FakeState {
                mode: Mutex::new(mode),
                delay: Mutex::new(Duration::ZERO),
                hang_on: Mutex::new(None),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }),
        }
    }

    pub fn healthy(name: &str) -> Self {
        Self::new(name, Mode::Healthy)
    }

    pub fn failing(name: &str) -> Self {
        Self::new(name, Mode::Failing(ProviderFailure::Unavailable("503 overloaded".into())))
    }

    pub fn set_mode(&self, mode: Mode) {
        *self.state.mode.lock().unwrap() = mode;
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.state.delay.lock().unwrap() = delay;
        self
    }

    /// Hang forever on prompts containing `needle`.
    pub fn hang_on(self, needle: &str) -> Self {
        *self.state.hang_on.lock().unwrap() = Some(needle.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CompletionBackend for FakeBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: &ProviderRequest,
    ) -> Result<ProviderPayload, ProviderFailure> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.state.in_flight);

        let mode = self.state.mode.lock().unwrap().clone();
        let delay = *self.state.delay.lock().unwrap();
        let hang = matches!(mode, Mode::Hanging)
            || self
                .state
                .hang_on
                .lock()
                .unwrap()
                .as_deref()
                .is_some_and(|n| request.prompt.contains(n));

        if hang {
            std::future::pending::<()>().await;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match mode {
            Mode::Failing(f) => Err(f),
            _ => Ok(match request.shape {
                ResponseShape::Text => {
                    ProviderPayload::Text(format!("{} says pace yourself", self.name))
                }
                ResponseShape::StepList { .. } => ProviderPayload::Steps(vec![
                    "Open the document".to_string(),
                    "Draft the first section".to_string(),
                    "Review and save".to_string(),
                ]),
            }),
        }
    }
}

pub fn text_request(timeout: Duration) -> ProviderRequest {
    ProviderRequest::new("system", "say hi", ResponseShape::Text, timeout)
}
