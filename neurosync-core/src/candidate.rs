//! Candidate model: one task, habit instance, or goal milestone eligible for a plan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const MIN_TITLE_CHARS: usize = 3;
pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    Task,
    Habit,
    Goal,
}

/// Which mood state a candidate suits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodSensitivity {
    /// Low effort; suits calm/low-energy states.
    Light,
    /// High effort; suits energetic states.
    Heavy,
    #[default]
    Neutral,
}

/// Caller-assigned importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Importance weight in 0..=1.
    pub fn weight(&self) -> f64 {
        match self {
            Priority::Low => 0.25,
            Priority::Medium => 0.5,
            Priority::High => 0.75,
            Priority::Urgent => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub kind: CandidateKind,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub priority: Priority,

    /// Minutes.
    pub estimated_duration: i32,

    /// Optional hard deadline (UTC).
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,

    /// Ids of candidates that must be completed first.
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub sensitivity: MoodSensitivity,

    /// Planning cycles this candidate has already been deferred.
    #[serde(default)]
    pub pending_cycles: u32,
}

impl Candidate {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: CandidateKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            description: None,
            priority: Priority::Medium,
            estimated_duration: 60,
            deadline: None,
            dependencies: Vec::new(),
            sensitivity: MoodSensitivity::Neutral,
            pending_cycles: 0,
        }
    }

    pub fn task(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(id, title, CandidateKind::Task)
    }

    pub fn habit(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(id, title, CandidateKind::Habit)
    }

    pub fn goal(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(id, title, CandidateKind::Goal)
    }

    pub fn with_duration(mut self, minutes: i32) -> Self {
        self.estimated_duration = minutes;
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: MoodSensitivity) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_dependency(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    pub fn with_pending_cycles(mut self, cycles: u32) -> Self {
        self.pending_cycles = cycles;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Reject malformed records; nothing is coerced.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::EmptyCandidateId);
        }

        let len = self.title.trim().chars().count();
        if !(MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&len) {
            return Err(Error::InvalidTitle {
                id: self.id.clone(),
                len,
            });
        }

        if let Some(desc) = &self.description {
            let len = desc.chars().count();
            if len > MAX_DESCRIPTION_CHARS {
                return Err(Error::DescriptionTooLong {
                    id: self.id.clone(),
                    len,
                });
            }
        }

        if self.estimated_duration <= 0 {
            return Err(Error::InvalidDuration {
                id: self.id.clone(),
                minutes: self.estimated_duration,
            });
        }

        if self.dependencies.iter().any(|d| d == &self.id) {
            return Err(Error::SelfDependency { id: self.id.clone() });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Candidate::task("t1", "Write report");
        assert_eq!(c.priority, Priority::Medium);
        assert_eq!(c.sensitivity, MoodSensitivity::Neutral);
        assert_eq!(c.estimated_duration, 60);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_duration() {
        let c = Candidate::task("t1", "Write report").with_duration(-5);
        assert_eq!(
            c.validate(),
            Err(Error::InvalidDuration {
                id: "t1".into(),
                minutes: -5
            })
        );
    }

    #[test]
    fn test_rejects_short_title_and_self_dependency() {
        assert!(matches!(
            Candidate::task("t1", "ab").validate(),
            Err(Error::InvalidTitle { len: 2, .. })
        ));
        assert!(matches!(
            Candidate::task("t1", "Loop forever").with_dependency("t1").validate(),
            Err(Error::SelfDependency { .. })
        ));
    }

    #[test]
    fn test_priority_weights_are_ordered() {
        assert!(Priority::Urgent.weight() > Priority::High.weight());
        assert!(Priority::High.weight() > Priority::Medium.weight());
        assert!(Priority::Medium.weight() > Priority::Low.weight());
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let c: Candidate = serde_json::from_str(
            r#"{"id":"h1","title":"Evening walk","kind":"habit",
                "estimated_duration":20,"sensitivity":"light"}"#,
        )
        .unwrap();
        assert_eq!(c.kind, CandidateKind::Habit);
        assert_eq!(c.sensitivity, MoodSensitivity::Light);
        assert!(c.dependencies.is_empty());
    }
}
