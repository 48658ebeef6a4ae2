//! Shared time axis: padded bounds and evenly spaced day-ordinal boundaries.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};

/// Hour of day the padded bounds are pinned to (presumably nobody is chatting then).
pub const ANCHOR_HOUR: u32 = 5;

/// Day ordinal of the date part, with 0001-01-01 as day 1.
pub fn day_ordinal(ts: &NaiveDateTime) -> i64 {
    i64::from(ts.date().num_days_from_ce())
}

/// Inverse of [`day_ordinal`]. `None` outside chrono's date range.
pub fn date_from_ordinal(ordinal: i64) -> Option<NaiveDate> {
    i32::try_from(ordinal)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
}

fn check_interval(interval_days: u32) -> Result<()> {
    if interval_days == 0 {
        return Err(Error::InvalidArgument(
            "interval must be at least one day".to_string(),
        ));
    }
    Ok(())
}

fn anchored(date: Option<NaiveDate>) -> Result<NaiveDateTime> {
    date.and_then(|d| d.and_hms_opt(ANCHOR_HOUR, 0, 0))
        .ok_or_else(|| Error::InvalidArgument("padded interval leaves the calendar".to_string()))
}

/// Bounds covering every timestamp plus one full interval on each side.
///
/// Both bounds are snapped to [`ANCHOR_HOUR`] on their day, so they depend
/// only on the date part of the extreme timestamps.
pub fn padded_interval<'a, I>(timestamps: I, interval_days: u32) -> Result<(NaiveDateTime, NaiveDateTime)>
where
    I: IntoIterator<Item = &'a NaiveDateTime>,
{
    check_interval(interval_days)?;
    let mut iter = timestamps.into_iter();
    let first = iter
        .next()
        .ok_or_else(|| Error::InvalidArgument("no timestamps to bin".to_string()))?;
    let (min, max) = iter.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts)));

    let pad = Days::new(u64::from(interval_days));
    let lower = anchored(min.date().checked_sub_days(pad))?;
    let upper = anchored(max.date().checked_add_days(pad))?;
    Ok((lower, upper))
}

/// Evenly spaced bin boundaries, as day ordinals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalRange {
    boundaries: Vec<i64>,
    interval_days: u32,
}

impl IntervalRange {
    pub fn boundaries(&self) -> &[i64] {
        &self.boundaries
    }

    pub fn interval_days(&self) -> u32 {
        self.interval_days
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Right-open bucketing: index of the leftmost boundary strictly greater
    /// than `ordinal`.
    ///
    /// Bin `i` covers `[b[i-1], b[i])`, so an ordinal equal to `b[k]` lands in
    /// bin `k + 1`. Ordinals past the last boundary return `len()`.
    pub fn bin_index(&self, ordinal: i64) -> usize {
        self.boundaries.partition_point(|&b| b <= ordinal)
    }

    /// Boundaries as calendar dates.
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        self.boundaries
            .iter()
            .map(|&b| {
                date_from_ordinal(b).ok_or_else(|| {
                    Error::InvariantViolation(format!("boundary ordinal {b} is not a date"))
                })
            })
            .collect()
    }
}

/// Boundaries `lower, lower + w, ...` up to and including the first one that
/// reaches `upper`.
pub fn build_range(lower: NaiveDateTime, upper: NaiveDateTime, interval_days: u32) -> Result<IntervalRange> {
    check_interval(interval_days)?;
    let (lo, hi) = (day_ordinal(&lower), day_ordinal(&upper));
    if lo > hi {
        return Err(Error::InvalidArgument(format!(
            "lower bound {lower} is after upper bound {upper}"
        )));
    }
    let step = i64::from(interval_days);
    let mut boundaries = vec![lo];
    let mut b = lo;
    while b < hi {
        b += step;
        boundaries.push(b);
    }
    Ok(IntervalRange {
        boundaries,
        interval_days,
    })
}
