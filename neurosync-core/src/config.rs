//! Planner configuration: scoring weights and mood model settings.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::mood::{MoodConfig, MoodModel};
use crate::scheduler::PriorityScheduler;
use crate::scoring::{ScoringEngine, ScoringWeights};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlannerConfig {
    pub scoring: ScoringWeights,
    pub mood: MoodConfig,
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        self.mood.validate()
    }

    pub fn scheduler(&self) -> Result<PriorityScheduler> {
        Ok(PriorityScheduler::new(ScoringEngine::new(self.scoring.clone())?))
    }

    /// Fresh mood model for a new session.
    pub fn mood_model(&self) -> Result<MoodModel> {
        MoodModel::new(self.mood.clone())
    }
}
