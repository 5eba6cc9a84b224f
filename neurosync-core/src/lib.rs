//! neurosync-core: deterministic planning core (mood, scoring, scheduling).

pub mod budget;
pub mod candidate;
pub mod config;
pub mod error;
mod graph;
pub mod mood;
pub mod plan;
pub mod scheduler;
pub mod scoring;
pub mod time;

pub use budget::{TimeBudget, TimeSlot};
pub use candidate::{Candidate, CandidateKind, MoodSensitivity, Priority};
pub use config::PlannerConfig;
pub use error::{Error, Result};
pub use mood::{MoodConfig, MoodModel, MoodSignal, MoodState};
pub use plan::{
    Annotation, AnnotationKind, Plan, PlanEntry, UnscheduledCandidate, UnscheduledReason,
};
pub use scheduler::PriorityScheduler;
pub use scoring::{plan_order, FactorBreakdown, ScoredCandidate, ScoringEngine, ScoringWeights};
pub use time::{local_day, parse_local_deadline_to_utc, parse_local_slot};
