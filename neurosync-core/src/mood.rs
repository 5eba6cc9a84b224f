//! MoodModel — rolling mood state built from normalized mood signals.
//!
//! Sign convention: -1.0 is energetic/activated, +1.0 is calm/low-energy.
//! Heavy candidates fit the negative end, light candidates the positive end.
//!
//! Text/emoji parsing lives with the caller; this model only consumes numeric
//! readings already mapped into -1.0..=1.0.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MoodConfig {
    /// Weight kept from the previous state on each update (0..1).
    pub decay: f64,
    /// Confidence added per signal.
    pub confidence_step: f64,
    /// Upper bound for confidence.
    pub confidence_cap: f64,
    /// Confidence halves after this many hours without a signal.
    pub confidence_half_life_hours: f64,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            decay: 0.7,
            confidence_step: 0.25,
            confidence_cap: 1.0,
            confidence_half_life_hours: 12.0,
        }
    }
}

impl MoodConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.decay) {
            return Err(Error::InvalidMoodConfig(format!(
                "decay must be in 0..1 (got {})",
                self.decay
            )));
        }
        if !(self.confidence_step.is_finite() && self.confidence_step > 0.0) {
            return Err(Error::InvalidMoodConfig("confidence_step must be positive".into()));
        }
        if !(self.confidence_cap.is_finite() && self.confidence_cap > 0.0) {
            return Err(Error::InvalidMoodConfig("confidence_cap must be positive".into()));
        }
        if !(self.confidence_half_life_hours.is_finite() && self.confidence_half_life_hours > 0.0) {
            return Err(Error::InvalidMoodConfig(
                "confidence_half_life_hours must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// A normalized mood reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodSignal {
    pub value: f64,
    pub at: DateTime<Utc>,
}

impl MoodSignal {
    pub fn new(value: f64, at: DateTime<Utc>) -> Self {
        Self { value, at }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MoodState {
    /// -1.0 (energetic) ..= +1.0 (calm).
    pub value: f64,
    /// 0..=confidence_cap.
    pub confidence: f64,
    /// Signals folded into this state.
    pub signals: u32,
}

impl MoodState {
    /// Neutral state with no confidence (session start).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.signals == 0
    }
}

/// Session-owned mood model. One per caller session, passed explicitly.
#[derive(Debug, Clone)]
pub struct MoodModel {
    config: MoodConfig,
    state: MoodState,
    last_signal_at: Option<DateTime<Utc>>,
}

impl MoodModel {
    pub fn new(config: MoodConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: MoodState::empty(),
            last_signal_at: None,
        })
    }

    pub fn config(&self) -> &MoodConfig {
        &self.config
    }

    /// Fold one signal into the state.
    pub fn update(&mut self, signal: MoodSignal) -> Result<MoodState> {
        if !signal.value.is_finite() || !(-1.0..=1.0).contains(&signal.value) {
            return Err(Error::MoodSignalOutOfRange { value: signal.value });
        }

        let prior_confidence = self.decayed_confidence(signal.at);

        let value = if self.state.is_empty() {
            signal.value
        } else {
            self.config.decay * self.state.value + (1.0 - self.config.decay) * signal.value
        };

        self.state = MoodState {
            value: value.clamp(-1.0, 1.0),
            confidence: (prior_confidence + self.config.confidence_step)
                .min(self.config.confidence_cap),
            signals: self.state.signals.saturating_add(1),
        };
        // Out-of-order signals never move the clock backwards.
        self.last_signal_at = Some(match self.last_signal_at {
            Some(prev) if prev > signal.at => prev,
            _ => signal.at,
        });

        tracing::debug!(
            value = self.state.value,
            confidence = self.state.confidence,
            "mood updated"
        );

        Ok(self.state)
    }

    /// State as of the last update.
    pub fn current(&self) -> MoodState {
        self.state
    }

    /// State with confidence decayed for the gap since the last signal.
    pub fn current_at(&self, now: DateTime<Utc>) -> MoodState {
        MoodState {
            confidence: self.decayed_confidence(now),
            ..self.state
        }
    }

    fn decayed_confidence(&self, now: DateTime<Utc>) -> f64 {
        let Some(last) = self.last_signal_at else {
            return self.state.confidence;
        };
        let gap_hours = ((now - last).num_seconds().max(0) as f64) / 3600.0;
        let factor = 0.5f64.powf(gap_hours / self.config.confidence_half_life_hours);
        (self.state.confidence * factor).clamp(0.0, self.config.confidence_cap)
    }
}

impl Default for MoodModel {
    fn default() -> Self {
        Self {
            config: MoodConfig::default(),
            state: MoodState::empty(),
            last_signal_at: None,
        }
    }
}
