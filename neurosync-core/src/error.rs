//! Input-validation errors for the planning core.
//!
//! Unschedulable candidates are not errors; they are reported inside the
//! [`Plan`](crate::plan::Plan) next to whatever did get scheduled.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("candidate id must be non-empty")]
    EmptyCandidateId,

    #[error("candidate {id}: title must be 3..=100 characters (got {len})")]
    InvalidTitle { id: String, len: usize },

    #[error("candidate {id}: description must be at most 500 characters (got {len})")]
    DescriptionTooLong { id: String, len: usize },

    #[error("candidate {id}: estimated duration must be positive (got {minutes})")]
    InvalidDuration { id: String, minutes: i32 },

    #[error("candidate {id} depends on itself")]
    SelfDependency { id: String },

    #[error("candidate {id} appears more than once")]
    DuplicateCandidate { id: String },

    #[error("time slot {index}: length must be positive (got {minutes})")]
    InvalidTimeSlot { index: usize, minutes: i32 },

    #[error("time slot {index} starts before the previous slot ends")]
    OverlappingTimeSlot { index: usize },

    #[error("mood signal {value} is outside -1.0..=1.0")]
    MoodSignalOutOfRange { value: f64 },

    #[error("invalid scoring weights: {0}")]
    InvalidWeights(String),

    #[error("invalid mood config: {0}")]
    InvalidMoodConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
