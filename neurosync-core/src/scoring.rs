//! ScoringEngine — deterministic weighted-sum priority score.
//!
//! Pure: no I/O, no clock reads. `now` and the mood state are passed in, so
//! identical inputs always produce identical scores.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, MoodSensitivity};
use crate::error::{Error, Result};
use crate::mood::MoodState;

/// Caller-overridable weights and factor shaping parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    pub urgency_weight: f64,
    pub importance_weight: f64,
    pub mood_weight: f64,
    pub staleness_weight: f64,

    /// Urgency factor for candidates without a deadline.
    pub no_deadline_urgency: f64,
    /// Hours-left scale for the urgency curve (urgency is 0.5 at this distance).
    pub urgency_horizon_hours: f64,
    /// Pending cycles at which the staleness factor saturates.
    pub staleness_saturation_cycles: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            urgency_weight: 0.40,
            importance_weight: 0.20,
            mood_weight: 0.25,
            staleness_weight: 0.15,
            no_deadline_urgency: 0.2,
            urgency_horizon_hours: 24.0,
            staleness_saturation_cycles: 10,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("urgency_weight", self.urgency_weight),
            ("importance_weight", self.importance_weight),
            ("mood_weight", self.mood_weight),
            ("staleness_weight", self.staleness_weight),
        ];
        for (name, w) in weights {
            if !w.is_finite() || w < 0.0 {
                return Err(Error::InvalidWeights(format!(
                    "{name} must be finite and >= 0 (got {w})"
                )));
            }
        }
        if weights.iter().map(|(_, w)| w).sum::<f64>() <= 0.0 {
            return Err(Error::InvalidWeights("at least one weight must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.no_deadline_urgency) {
            return Err(Error::InvalidWeights("no_deadline_urgency must be in 0..=1".into()));
        }
        if !(self.urgency_horizon_hours.is_finite() && self.urgency_horizon_hours > 0.0) {
            return Err(Error::InvalidWeights("urgency_horizon_hours must be positive".into()));
        }
        if self.staleness_saturation_cycles == 0 {
            return Err(Error::InvalidWeights("staleness_saturation_cycles must be >= 1".into()));
        }
        Ok(())
    }
}

/// Normalized factor values (each 0..=1) that produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    pub urgency: f64,
    pub importance: f64,
    pub effort_fit: f64,
    pub staleness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f64,
    pub factors: FactorBreakdown,
}

#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    weights: ScoringWeights,
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn score(
        &self,
        candidate: &Candidate,
        mood: &MoodState,
        now: DateTime<Utc>,
    ) -> ScoredCandidate {
        let w = &self.weights;
        let factors = FactorBreakdown {
            urgency: self.urgency(candidate, now),
            importance: candidate.priority.weight(),
            effort_fit: effort_fit(candidate.sensitivity, mood),
            staleness: (candidate.pending_cycles as f64 / w.staleness_saturation_cycles as f64)
                .min(1.0),
        };

        let score = w.urgency_weight * factors.urgency
            + w.importance_weight * factors.importance
            + w.mood_weight * factors.effort_fit
            + w.staleness_weight * factors.staleness;

        ScoredCandidate {
            candidate: candidate.clone(),
            score,
            factors,
        }
    }

    fn urgency(&self, candidate: &Candidate, now: DateTime<Utc>) -> f64 {
        let Some(deadline) = candidate.deadline else {
            return self.weights.no_deadline_urgency;
        };
        let hours_left = (deadline - now).num_seconds() as f64 / 3600.0;
        if hours_left <= 0.0 {
            return 1.0;
        }
        1.0 / (1.0 + hours_left / self.weights.urgency_horizon_hours)
    }
}

/// Alignment between a candidate's tag and the mood, mapped to 0..=1.
/// Low confidence pulls the fit toward the neutral 0.5.
fn effort_fit(sensitivity: MoodSensitivity, mood: &MoodState) -> f64 {
    let alignment = match sensitivity {
        MoodSensitivity::Light => mood.value,
        MoodSensitivity::Heavy => -mood.value,
        MoodSensitivity::Neutral => 0.0,
    };
    let confidence = mood.confidence.clamp(0.0, 1.0);
    ((1.0 + alignment * confidence) / 2.0).clamp(0.0, 1.0)
}

/// Plan order: score desc, then earlier deadline (none last), then shorter
/// duration. Equal under all three means the caller's stable sort keeps
/// input order.
pub fn plan_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| match (a.candidate.deadline, b.candidate.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.candidate.estimated_duration.cmp(&b.candidate.estimated_duration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Priority;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn calm() -> MoodState {
        MoodState {
            value: 0.728,
            confidence: 0.75,
            signals: 3,
        }
    }

    #[test]
    fn test_urgency_monotonic_toward_deadline() {
        let e = ScoringEngine::default();
        let mood = MoodState::empty();
        let due_in = |id: &str, hours: i64| {
            let c = Candidate::task(id, "Deadline task")
                .with_deadline(now() + Duration::hours(hours));
            e.score(&c, &mood, now())
        };
        let far = due_in("a", 48);
        let near = due_in("b", 2);
        let late = due_in("c", -1);
        assert!(far.factors.urgency < near.factors.urgency);
        assert!(near.factors.urgency < late.factors.urgency);
        assert_eq!(late.factors.urgency, 1.0);
    }

    #[test]
    fn test_no_deadline_gets_baseline() {
        let e = ScoringEngine::default();
        let s = e.score(&Candidate::task("a", "Someday"), &MoodState::empty(), now());
        assert_eq!(s.factors.urgency, 0.2);
    }

    #[test]
    fn test_heavy_scores_below_light_when_calm() {
        let e = ScoringEngine::default();
        let heavy = Candidate::task("h", "Deep work").with_sensitivity(MoodSensitivity::Heavy);
        let light = Candidate::task("l", "Inbox zero").with_sensitivity(MoodSensitivity::Light);
        let sh = e.score(&heavy, &calm(), now());
        let sl = e.score(&light, &calm(), now());
        assert!(sh.score < sl.score);
        assert!(sh.factors.effort_fit < 0.5);
        assert!(sl.factors.effort_fit > 0.5);
    }

    #[test]
    fn test_empty_mood_is_neutral_fit() {
        let e = ScoringEngine::default();
        let heavy = Candidate::task("h", "Deep work").with_sensitivity(MoodSensitivity::Heavy);
        assert_eq!(e.score(&heavy, &MoodState::empty(), now()).factors.effort_fit, 0.5);
    }

    #[test]
    fn test_staleness_boost_saturates() {
        let e = ScoringEngine::default();
        let fresh = e.score(&Candidate::task("a", "Fresh item"), &MoodState::empty(), now());
        let stale_item = Candidate::task("b", "Stale item").with_pending_cycles(25);
        let stale = e.score(&stale_item, &MoodState::empty(), now());
        assert_eq!(stale.factors.staleness, 1.0);
        assert!((stale.score - fresh.score - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_caller_weights_override() {
        let weights = ScoringWeights {
            urgency_weight: 0.0,
            importance_weight: 1.0,
            mood_weight: 0.0,
            staleness_weight: 0.0,
            ..ScoringWeights::default()
        };
        let e = ScoringEngine::new(weights).unwrap();
        let call = Candidate::task("a", "Call bank").with_priority(Priority::Urgent);
        let urgent = e.score(&call, &MoodState::empty(), now());
        assert_eq!(urgent.score, 1.0);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let neg = ScoringWeights {
            mood_weight: -0.1,
            ..ScoringWeights::default()
        };
        assert!(matches!(ScoringEngine::new(neg), Err(Error::InvalidWeights(_))));

        let zero = ScoringWeights {
            urgency_weight: 0.0,
            importance_weight: 0.0,
            mood_weight: 0.0,
            staleness_weight: 0.0,
            ..ScoringWeights::default()
        };
        assert!(ScoringEngine::new(zero).is_err());
    }

    #[test]
    fn test_tie_break_deadline_then_duration() {
        let e = ScoringEngine::default();
        let mood = MoodState::empty();
        let mk = |c: Candidate| ScoredCandidate {
            score: 0.5,
            ..e.score(&c, &mood, now())
        };
        let with_dl = mk(Candidate::task("a", "Has deadline")
            .with_deadline(now() + Duration::hours(5))
            .with_duration(90));
        let short = mk(Candidate::task("b", "Short one").with_duration(10));
        let long = mk(Candidate::task("c", "Long one").with_duration(50));

        let mut v = vec![long.clone(), short.clone(), with_dl.clone()];
        v.sort_by(plan_order);
        let ids: Vec<_> = v.iter().map(|s| s.candidate.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
