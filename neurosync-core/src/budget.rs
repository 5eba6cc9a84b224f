//! TimeBudget: ordered, available time slots for one planning horizon.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    /// Minutes.
    pub minutes: i32,
}

impl TimeSlot {
    pub fn new(start: DateTime<Utc>, minutes: i32) -> Self {
        Self { start, minutes }
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(self.minutes as i64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBudget {
    slots: Vec<TimeSlot>,
}

impl TimeBudget {
    /// Slots must have positive length and be in start order without overlap.
    pub fn new(slots: Vec<TimeSlot>) -> Result<Self> {
        for (index, slot) in slots.iter().enumerate() {
            if slot.minutes <= 0 {
                return Err(Error::InvalidTimeSlot {
                    index,
                    minutes: slot.minutes,
                });
            }
            if index > 0 && slot.start < slots[index - 1].end() {
                return Err(Error::OverlappingTimeSlot { index });
            }
        }
        Ok(Self { slots })
    }

    pub fn single(start: DateTime<Utc>, minutes: i32) -> Result<Self> {
        Self::new(vec![TimeSlot::new(start, minutes)])
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn total_minutes(&self) -> i32 {
        self.slots.iter().map(|s| s.minutes).sum()
    }

    pub fn largest_slot(&self) -> i32 {
        self.slots.iter().map(|s| s.minutes).max().unwrap_or(0)
    }
}

/// Free intervals per slot during one greedy fill.
#[derive(Debug, Clone)]
pub(crate) struct SlotCursor {
    /// `free[i]`: disjoint `(start, end)` gaps in slot `i`, in start order.
    free: Vec<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl SlotCursor {
    pub(crate) fn new(budget: &TimeBudget) -> Self {
        Self {
            free: budget.slots.iter().map(|s| vec![(s.start, s.end())]).collect(),
        }
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.free.iter().all(Vec::is_empty)
    }

    /// Earliest free gap (slots in budget order) that holds `minutes`
    /// starting no earlier than `not_before`. Consumes the space and
    /// returns (slot index, start instant).
    pub(crate) fn take(
        &mut self,
        minutes: i32,
        not_before: Option<DateTime<Utc>>,
    ) -> Option<(usize, DateTime<Utc>)> {
        let len = Duration::minutes(minutes as i64);
        for (slot_index, gaps) in self.free.iter_mut().enumerate() {
            let found = gaps.iter().enumerate().find_map(|(g, &(gap_start, gap_end))| {
                let start = not_before.map_or(gap_start, |nb| nb.max(gap_start));
                (gap_end - start >= len).then_some((g, start))
            });
            let Some((g, start)) = found else {
                continue;
            };
            let (gap_start, gap_end) = gaps.remove(g);
            let end = start + len;
            let mut at = g;
            if gap_start < start {
                gaps.insert(at, (gap_start, start));
                at += 1;
            }
            if end < gap_end {
                gaps.insert(at, (end, gap_end));
            }
            return Some((slot_index, start));
        }
        None
    }
}
