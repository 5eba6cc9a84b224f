//! Plan: the ordered, budget-fitting output of one planning cycle.
//!
//! A plan is immutable once handed out. Enrichment produces a new plan value
//! via [`Plan::with_annotations`]; nothing mutates one in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mood::MoodState;
use crate::scoring::ScoredCandidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Breakdown,
    LearningPath,
    MoodInsight,
}

/// AI-generated text attached to a plan or one of its entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: AnnotationKind,
    /// Provider that produced it (e.g. "anthropic:claude-3-5-sonnet-latest").
    pub provider: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub scored: ScoredCandidate,
    pub slot_index: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl PlanEntry {
    pub fn id(&self) -> &str {
        &self.scored.candidate.id
    }

    pub fn minutes(&self) -> i32 {
        self.scored.candidate.estimated_duration
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnscheduledReason {
    /// Member of a dependency cycle.
    DependencyCycle { cycle: Vec<String> },
    /// A dependency never made it into the plan.
    BlockedByDependency { waiting_on: Vec<String> },
    /// Longer than every slot in the budget.
    ExceedsBudget,
    /// Did not fit in the capacity left when it was reached.
    InsufficientCapacity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnscheduledCandidate {
    pub id: String,
    #[serde(flatten)]
    pub reason: UnscheduledReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    generated_at: DateTime<Utc>,
    mood: MoodState,
    capacity_minutes: i32,
    entries: Vec<PlanEntry>,
    unscheduled: Vec<UnscheduledCandidate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    notes: Vec<Annotation>,
}

impl Plan {
    pub(crate) fn new(
        generated_at: DateTime<Utc>,
        mood: MoodState,
        capacity_minutes: i32,
        entries: Vec<PlanEntry>,
        unscheduled: Vec<UnscheduledCandidate>,
    ) -> Self {
        Self {
            generated_at,
            mood,
            capacity_minutes,
            entries,
            unscheduled,
            notes: Vec::new(),
        }
    }

    /// An empty plan for an empty candidate set.
    pub fn empty(generated_at: DateTime<Utc>, mood: MoodState, capacity_minutes: i32) -> Self {
        Self::new(generated_at, mood, capacity_minutes, Vec::new(), Vec::new())
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn mood(&self) -> &MoodState {
        &self.mood
    }

    pub fn capacity_minutes(&self) -> i32 {
        self.capacity_minutes
    }

    /// Entries in priority order: every dependency precedes its dependents
    /// and ends before they start. Not necessarily sorted by start time.
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// Entries sorted by start time.
    pub fn timeline(&self) -> Vec<&PlanEntry> {
        let mut by_start: Vec<&PlanEntry> = self.entries.iter().collect();
        by_start.sort_by_key(|e| e.start);
        by_start
    }

    pub fn unscheduled(&self) -> &[UnscheduledCandidate] {
        &self.unscheduled
    }

    /// Plan-level annotations (not tied to one entry).
    pub fn notes(&self) -> &[Annotation] {
        &self.notes
    }

    pub fn scheduled_minutes(&self) -> i32 {
        self.entries.iter().map(|e| e.minutes()).sum()
    }

    pub fn order(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, id: &str) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn unscheduled_reason(&self, id: &str) -> Option<&UnscheduledReason> {
        self.unscheduled.iter().find(|u| u.id == id).map(|u| &u.reason)
    }

    /// New plan with annotations attached. Entry annotations for ids not in
    /// the plan are dropped. Ordering and slots are untouched.
    pub fn with_annotations(
        mut self,
        entry_annotations: impl IntoIterator<Item = (String, Annotation)>,
        notes: impl IntoIterator<Item = Annotation>,
    ) -> Plan {
        for (id, annotation) in entry_annotations {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.id() == id) {
                entry.annotations.push(annotation);
            }
        }
        self.notes.extend(notes);
        self
    }
}
