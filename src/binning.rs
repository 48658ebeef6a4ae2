//! Accumulates per-record counters into the bins of a shared time axis.

use chrono::NaiveDateTime;
use log::debug;
use rayon::prelude::*;

use crate::counter::FrequencyCounter;
use crate::error::{Error, Result};
use crate::interval::{IntervalRange, build_range, day_ordinal, padded_interval};

/// Bin width used when the caller does not pick one.
pub const DEFAULT_INTERVAL_DAYS: u32 = 14;

/// One counter per bin of the shared [`IntervalRange`].
pub type BinnedSeries = Vec<FrequencyCounter>;

/// Result of [`intervalize_words`]: one shared axis, one series per entity.
///
/// Every series has exactly `range.len()` counters and index `i` means the
/// same bin for every entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Binned {
    pub range: IntervalRange,
    pub series: Vec<BinnedSeries>,
}

/// Bins counters by date.
///
/// `date_lists[e][i]` is the timestamp of `counter_lists[e][i]`. The bin
/// boundaries are computed once over every timestamp of every entity, so
/// all returned series line up. Input order within an entity is irrelevant.
pub fn intervalize_words(
    date_lists: &[Vec<NaiveDateTime>],
    counter_lists: &[Vec<FrequencyCounter>],
    interval_days: u32,
) -> Result<Binned> {
    if date_lists.len() != counter_lists.len() {
        return Err(Error::InvalidArgument(format!(
            "{} date lists but {} counter lists",
            date_lists.len(),
            counter_lists.len()
        )));
    }
    for (entity, (dates, counters)) in date_lists.iter().zip(counter_lists).enumerate() {
        if dates.len() != counters.len() {
            return Err(Error::InvalidArgument(format!(
                "entity {entity}: {} dates but {} counters",
                dates.len(),
                counters.len()
            )));
        }
    }

    let (lower, upper) = padded_interval(date_lists.iter().flatten(), interval_days)?;
    let range = build_range(lower, upper, interval_days)?;
    debug!(
        "binning {} entities into {} bins of {} days ({} .. {})",
        date_lists.len(),
        range.len(),
        interval_days,
        lower.date(),
        upper.date()
    );

    let series = date_lists
        .par_iter()
        .zip(counter_lists.par_iter())
        .map(|(dates, counters)| bin_entity(&range, dates, counters))
        .collect::<Result<Vec<BinnedSeries>>>()?;

    Ok(Binned { range, series })
}

fn bin_entity(
    range: &IntervalRange,
    dates: &[NaiveDateTime],
    counters: &[FrequencyCounter],
) -> Result<BinnedSeries> {
    let mut accumulators: BinnedSeries = vec![FrequencyCounter::new(); range.len()];
    for (date, counter) in dates.iter().zip(counters) {
        let index = range.bin_index(day_ordinal(date));
        let bin = accumulators.get_mut(index).ok_or_else(|| {
            Error::InvariantViolation(format!("{date} falls after the last boundary"))
        })?;
        bin.merge(counter);
    }
    Ok(accumulators)
}
