//! Time utilities: timezone-aware deadlines and local time slots.

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::budget::TimeSlot;

fn parse_tz(tz: &str) -> Result<Tz> {
    tz.parse().map_err(|_| anyhow!("invalid timezone: {tz}"))
}

fn local_to_utc(ndt: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>> {
    let local_dt = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| anyhow!("ambiguous or invalid local time (DST?): {ndt} {tz}"))?;
    Ok(local_dt.with_timezone(&Utc))
}

/// Parse a deadline like "2026-02-20 23:59" in an IANA tz like "Africa/Nairobi",
/// returning UTC.
pub fn parse_local_deadline_to_utc(local: &str, tz: &str) -> Result<DateTime<Utc>> {
    let tz = parse_tz(tz)?;
    let ndt = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M")
        .map_err(|e| anyhow!("invalid local datetime '{local}': {e}"))?;
    local_to_utc(ndt, tz)
}

/// Parse a slot like "09:00-10:30" on `day` in `tz`.
pub fn parse_local_slot(range: &str, day: NaiveDate, tz: &str) -> Result<TimeSlot> {
    let tz = parse_tz(tz)?;
    let (from, to) = range
        .split_once('-')
        .ok_or_else(|| anyhow!("slot '{range}' must look like HH:MM-HH:MM"))?;

    let from = NaiveTime::parse_from_str(from.trim(), "%H:%M")
        .map_err(|e| anyhow!("invalid slot start '{from}': {e}"))?;
    let to = NaiveTime::parse_from_str(to.trim(), "%H:%M")
        .map_err(|e| anyhow!("invalid slot end '{to}': {e}"))?;
    if to <= from {
        bail!("slot '{range}' ends before it starts");
    }

    let start = local_to_utc(day.and_time(from), tz)?;
    let end = local_to_utc(day.and_time(to), tz)?;
    Ok(TimeSlot::new(start, (end - start).num_minutes() as i32))
}

/// Today's date in `tz` for the given instant.
pub fn local_day(now: DateTime<Utc>, tz: &str) -> Result<NaiveDate> {
    Ok(now.with_timezone(&parse_tz(tz)?).date_naive())
}
