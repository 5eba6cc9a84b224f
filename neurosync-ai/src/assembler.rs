//! PlanAssembler: attaches optional AI annotations to an already-ordered plan.
//!
//! Enrichment never changes ordering or slots. Failed requests are left out.
//! The overall deadline keeps whatever finished in time; cancellation
//! discards everything and returns no plan.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use neurosync_core::{Annotation, AnnotationKind, CandidateKind, MoodSensitivity, Plan};

use crate::clock::{Clock, SystemClock};
use crate::gateway::FailoverGateway;
use crate::prompts;
use crate::provider::{CompletionBackend, ProviderClient, ProviderRequest, ResponseShape};

/// `[enrichment]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Max provider requests in flight for one plan.
    pub concurrency: usize,
    pub deadline_ms: u64,
    /// Tasks and habits at least this long get a breakdown. Heavy ones always do.
    pub breakdown_min_minutes: i32,
    pub max_steps: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            deadline_ms: 45_000,
            breakdown_min_minutes: 45,
            max_steps: 6,
        }
    }
}

impl EnrichmentConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnrichmentRequest {
    pub breakdowns: bool,
    pub learning_paths: bool,
    pub mood_insight: bool,
}

impl EnrichmentRequest {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            breakdowns: true,
            learning_paths: true,
            mood_insight: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.breakdowns || self.learning_paths || self.mood_insight)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("plan assembly cancelled")]
    Cancelled,
}

struct Job {
    /// None for plan-level notes.
    entry: Option<String>,
    kind: AnnotationKind,
    request: ProviderRequest,
}

pub struct PlanAssembler<B = ProviderClient, C = SystemClock> {
    gateway: Arc<FailoverGateway<B, C>>,
    config: EnrichmentConfig,
}

impl<B: CompletionBackend, C: Clock> PlanAssembler<B, C> {
    pub fn new(gateway: Arc<FailoverGateway<B, C>>, config: EnrichmentConfig) -> Self {
        Self { gateway, config }
    }

    pub fn config(&self) -> &EnrichmentConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<FailoverGateway<B, C>> {
        &self.gateway
    }

    pub async fn assemble(
        &self,
        plan: Plan,
        request: EnrichmentRequest,
        cancel: &CancellationToken,
    ) -> Result<Plan, AssemblyError> {
        if cancel.is_cancelled() {
            return Err(AssemblyError::Cancelled);
        }
        if request.is_empty() || self.gateway.is_empty() {
            return Ok(plan);
        }

        let jobs = self.jobs(&plan, request);
        if jobs.is_empty() {
            return Ok(plan);
        }
        info!(jobs = jobs.len(), concurrency = self.config.concurrency, "enriching plan");

        let gateway = &self.gateway;
        let mut stream = futures_util::stream::iter(jobs.into_iter().map(|job| async move {
            let res = gateway.complete(&job.request).await;
            (job, res)
        }))
        .buffer_unordered(self.config.concurrency.max(1));

        let deadline = tokio::time::sleep(self.config.deadline());
        tokio::pin!(deadline);

        let mut entry_annotations = Vec::new();
        let mut notes = Vec::new();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("plan assembly cancelled; discarding enrichment");
                    return Err(AssemblyError::Cancelled);
                }
                _ = &mut deadline => {
                    warn!(
                        collected = entry_annotations.len() + notes.len(),
                        "enrichment deadline reached; keeping partial annotations"
                    );
                    break;
                }
                next = stream.next() => match next {
                    None => break,
                    Some((job, Ok(done))) => {
                        let annotation = Annotation {
                            kind: job.kind,
                            provider: done.provider,
                            text: done.payload.text(),
                            steps: done.payload.steps().to_vec(),
                        };
                        match job.entry {
                            Some(id) => entry_annotations.push((id, annotation)),
                            None => notes.push(annotation),
                        }
                    }
                    Some((job, Err(e))) => {
                        debug!(
                            entry = ?job.entry,
                            kind = ?job.kind,
                            error = %e,
                            "enrichment omitted"
                        );
                    }
                },
            }
        }

        Ok(plan.with_annotations(entry_annotations, notes))
    }

    fn jobs(&self, plan: &Plan, request: EnrichmentRequest) -> Vec<Job> {
        let timeout = self.gateway.request_timeout();
        let steps = ResponseShape::StepList {
            min: 2,
            max: self.config.max_steps.max(2),
        };
        let mut jobs = Vec::new();

        for e in plan.entries() {
            let c = &e.scored.candidate;
            match c.kind {
                CandidateKind::Goal if request.learning_paths => jobs.push(Job {
                    entry: Some(c.id.clone()),
                    kind: AnnotationKind::LearningPath,
                    request: ProviderRequest::new(
                        prompts::system_prompt(),
                        prompts::learning_path(c, self.config.max_steps),
                        steps,
                        timeout,
                    ),
                }),
                CandidateKind::Task | CandidateKind::Habit
                    if request.breakdowns
                        && (c.estimated_duration >= self.config.breakdown_min_minutes
                            || c.sensitivity == MoodSensitivity::Heavy) =>
                {
                    jobs.push(Job {
                        entry: Some(c.id.clone()),
                        kind: AnnotationKind::Breakdown,
                        request: ProviderRequest::new(
                            prompts::system_prompt(),
                            prompts::breakdown(c, self.config.max_steps),
                            steps,
                            timeout,
                        ),
                    })
                }
                _ => {}
            }
        }

        // Nothing to say about a mood nobody reported.
        if request.mood_insight && !plan.mood().is_empty() {
            jobs.push(Job {
                entry: None,
                kind: AnnotationKind::MoodInsight,
                request: ProviderRequest::new(
                    prompts::system_prompt(),
                    prompts::mood_insight(plan.mood(), plan),
                    ResponseShape::Text,
                    timeout,
                ),
            });
        }

        jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrichment_request_flags() {
        assert!(EnrichmentRequest::none().is_empty());
        assert!(!EnrichmentRequest::all().is_empty());
        let only_mood = EnrichmentRequest {
            mood_insight: true,
            ..EnrichmentRequest::none()
        };
        assert!(!only_mood.is_empty());
    }
}
