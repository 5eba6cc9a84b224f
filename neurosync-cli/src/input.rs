//! Planning-cycle input file: what the task/habit/goal store and the mood
//! parser would hand the core for one cycle.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use neurosync_core::{
    local_day, parse_local_deadline_to_utc, parse_local_slot, Candidate, MoodSignal, TimeBudget,
    TimeSlot,
};

#[derive(Debug, Clone, Deserialize)]
pub struct CycleInput {
    pub candidates: Vec<CandidateInput>,
    pub slots: Vec<SlotInput>,
    #[serde(default)]
    pub mood_signals: Vec<MoodSignalInput>,
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateInput {
    #[serde(flatten)]
    pub candidate: Candidate,
    /// "YYYY-MM-DD HH:MM" in the cycle timezone. Overrides `deadline`.
    #[serde(default)]
    pub deadline_local: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SlotInput {
    /// "09:00-10:30" on the local day of `now`.
    Local(String),
    Explicit(TimeSlot),
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MoodSignalInput {
    pub value: f64,
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

/// Input with every local time resolved to UTC.
#[derive(Debug, Clone)]
pub struct Cycle {
    pub now: DateTime<Utc>,
    pub timezone: String,
    pub candidates: Vec<Candidate>,
    pub budget: TimeBudget,
    pub mood_signals: Vec<MoodSignal>,
}

pub fn read_cycle(path: &Path) -> Result<CycleInput> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

impl CycleInput {
    pub fn resolve(self, timezone: &str, fallback_now: DateTime<Utc>) -> Result<Cycle> {
        let now = self.now.unwrap_or(fallback_now);
        let day = local_day(now, timezone)?;

        let candidates = self
            .candidates
            .into_iter()
            .map(|c| {
                let mut candidate = c.candidate;
                if let Some(local) = c.deadline_local {
                    let deadline = parse_local_deadline_to_utc(&local, timezone)
                        .with_context(|| format!("deadline of candidate '{}'", candidate.id))?;
                    candidate.deadline = Some(deadline);
                }
                Ok(candidate)
            })
            .collect::<Result<Vec<_>>>()?;

        let slots = self
            .slots
            .into_iter()
            .map(|s| match s {
                SlotInput::Explicit(slot) => Ok(slot),
                SlotInput::Local(range) => parse_local_slot(&range, day, timezone),
            })
            .collect::<Result<Vec<_>>>()?;
        let budget = TimeBudget::new(slots).context("invalid time budget")?;

        let mood_signals = self
            .mood_signals
            .into_iter()
            .map(|m| MoodSignal::new(m.value, m.at.unwrap_or(now)))
            .collect();

        Ok(Cycle {
            now,
            timezone: timezone.to_string(),
            candidates,
            budget,
            mood_signals,
        })
    }
}
