//! PriorityScheduler — orders ready candidates by score and fits them into
//! the time budget.
//!
//! Algorithm (deterministic):
//! 1) validate; drop dependency-cycle members and candidates longer than every slot
//! 2) score the ready set (all in-set dependencies already placed)
//! 3) sort by [`plan_order`], place the first candidate that fits a slot
//!    (earliest free gap in slot order that starts no earlier than the end of
//!    its latest dependency); ready candidates that fit nowhere are dropped
//! 4) a placement may unblock dependents, so rescore and repeat
//!
//! Whatever is left over is blocked on a dependency that never got placed.
//! Entries come out in placement (priority) order. Start times follow slot
//! order, so with several slots a later entry can start earlier than the one
//! before it; [`Plan::timeline`] gives the start-ordered view.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::budget::{SlotCursor, TimeBudget};
use crate::candidate::Candidate;
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::mood::MoodState;
use crate::plan::{Plan, PlanEntry, UnscheduledCandidate, UnscheduledReason};
use crate::scoring::{plan_order, ScoredCandidate, ScoringEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Pending,
    Placed,
    Dropped,
}

#[derive(Debug, Clone, Default)]
pub struct PriorityScheduler {
    engine: ScoringEngine,
}

impl PriorityScheduler {
    pub fn new(engine: ScoringEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn build(
        &self,
        candidates: &[Candidate],
        budget: &TimeBudget,
        mood: &MoodState,
        now: DateTime<Utc>,
    ) -> Result<Plan> {
        validate_set(candidates)?;

        if candidates.is_empty() {
            return Ok(Plan::empty(now, *mood, budget.total_minutes()));
        }

        let graph = DependencyGraph::build(candidates);
        let mut status = vec![Status::Pending; candidates.len()];
        // Indexed by arena position; flattened in input order at the end.
        let mut reasons: Vec<Option<UnscheduledReason>> = vec![None; candidates.len()];

        for cycle in graph.cycles() {
            let ids: Vec<String> = cycle.iter().map(|&i| candidates[i].id.clone()).collect();
            tracing::warn!(cycle = ?ids, "dependency cycle; excluding members");
            for &i in &cycle {
                status[i] = Status::Dropped;
                reasons[i] = Some(UnscheduledReason::DependencyCycle { cycle: ids.clone() });
            }
        }

        let largest = budget.largest_slot();
        for (i, c) in candidates.iter().enumerate() {
            if status[i] == Status::Pending && c.estimated_duration > largest {
                status[i] = Status::Dropped;
                reasons[i] = Some(UnscheduledReason::ExceedsBudget);
            }
        }

        let mut cursor = SlotCursor::new(budget);
        let mut ends: Vec<Option<DateTime<Utc>>> = vec![None; candidates.len()];
        let mut entries: Vec<PlanEntry> = Vec::new();
        let mut round = 0usize;

        while !cursor.is_exhausted() {
            round += 1;
            let mut ready: Vec<(usize, ScoredCandidate)> = (0..candidates.len())
                .filter(|&i| status[i] == Status::Pending)
                .filter(|&i| graph.deps(i).iter().all(|&d| status[d] == Status::Placed))
                .map(|i| (i, self.engine.score(&candidates[i], mood, now)))
                .collect();

            if ready.is_empty() {
                break;
            }
            // Stable: equal keys keep input order.
            ready.sort_by(|a, b| plan_order(&a.1, &b.1));
            tracing::debug!(round, ready = ready.len(), "scoring round");

            let mut placed = false;
            for (i, scored) in ready {
                let minutes = scored.candidate.estimated_duration;
                let not_before = graph.deps(i).iter().filter_map(|&d| ends[d]).max();
                match cursor.take(minutes, not_before) {
                    Some((slot_index, start)) => {
                        let end = start + Duration::minutes(minutes as i64);
                        status[i] = Status::Placed;
                        ends[i] = Some(end);
                        entries.push(PlanEntry {
                            slot_index,
                            start,
                            end,
                            scored,
                            annotations: Vec::new(),
                        });
                        placed = true;
                        break;
                    }
                    None => {
                        // Free time only shrinks and the bound is fixed; it will never fit.
                        status[i] = Status::Dropped;
                        reasons[i] = Some(UnscheduledReason::InsufficientCapacity);
                    }
                }
            }

            if !placed {
                break;
            }
        }

        for (i, c) in candidates.iter().enumerate() {
            if status[i] != Status::Pending {
                continue;
            }
            let waiting_on: Vec<String> = graph
                .deps(i)
                .iter()
                .filter(|&&d| status[d] != Status::Placed)
                .map(|&d| candidates[d].id.clone())
                .collect();
            reasons[i] = Some(if waiting_on.is_empty() {
                UnscheduledReason::InsufficientCapacity
            } else {
                UnscheduledReason::BlockedByDependency { waiting_on }
            });
            tracing::debug!(candidate = %c.id, reason = ?reasons[i], "left unscheduled");
        }

        let unscheduled = candidates
            .iter()
            .zip(reasons)
            .filter_map(|(c, r)| {
                r.map(|reason| UnscheduledCandidate {
                    id: c.id.clone(),
                    reason,
                })
            })
            .collect();

        Ok(Plan::new(now, *mood, budget.total_minutes(), entries, unscheduled))
    }
}

fn validate_set(candidates: &[Candidate]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(candidates.len());
    for c in candidates {
        c.validate()?;
        if !seen.insert(c.id.as_str()) {
            return Err(Error::DuplicateCandidate { id: c.id.clone() });
        }
    }
    Ok(())
}
