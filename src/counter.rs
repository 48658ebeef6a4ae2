use std::collections::{BTreeMap, HashSet};
use std::ops::AddAssign;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Maps a token to how often it occurred.
///
/// Only positive counts are ever stored: anything that drops to zero is
/// removed. Iteration and serialization follow token order, so exports are
/// stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrequencyCounter {
    counts: BTreeMap<String, u64>,
}

impl FrequencyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for `token`, 0 when absent.
    pub fn get(&self, token: &str) -> u64 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(t, c)| (t.as_str(), *c))
    }

    /// Adds `count` occurrences of `token`. A zero count is a no-op.
    pub fn add(&mut self, token: impl Into<String>, count: u64) {
        if count == 0 {
            return;
        }
        *self.counts.entry(token.into()).or_insert(0) += count;
    }

    /// Adds every count of `other` into `self`.
    pub fn merge(&mut self, other: &FrequencyCounter) {
        for (token, count) in &other.counts {
            *self.counts.entry(token.clone()).or_insert(0) += count;
        }
    }

    /// Removes every count of `other` from `self`.
    ///
    /// Fails with [`Error::InvariantViolation`] if any token would go below
    /// zero; `self` is left unchanged in that case. Tokens reaching zero are
    /// dropped.
    pub fn subtract(&mut self, other: &FrequencyCounter) -> Result<()> {
        for (token, count) in &other.counts {
            let have = self.get(token);
            if have < *count {
                return Err(Error::InvariantViolation(format!(
                    "subtracting {count} from {token:?} leaves a negative count (have {have})"
                )));
            }
        }
        for (token, count) in &other.counts {
            if let Some(have) = self.counts.get_mut(token) {
                *have -= count;
                if *have == 0 {
                    self.counts.remove(token);
                }
            }
        }
        Ok(())
    }

    /// Drops every token whose count is `<= cutoff`.
    pub fn retain_above_threshold(&mut self, cutoff: u64) {
        self.counts.retain(|_, count| *count > cutoff);
    }

    /// Copy holding only tokens with a count `> cutoff`.
    pub fn filtered_by_threshold(&self, cutoff: u64) -> FrequencyCounter {
        let mut new = self.clone();
        new.retain_above_threshold(cutoff);
        new
    }

    /// Drops every token contained in `excluded`.
    pub fn remove_excluded(&mut self, excluded: &HashSet<String>) {
        self.counts.retain(|token, _| !excluded.contains(token));
    }

    /// Copy without the tokens contained in `excluded`.
    pub fn filtered_by_exclusion_set(&self, excluded: &HashSet<String>) -> FrequencyCounter {
        let mut new = self.clone();
        new.remove_excluded(excluded);
        new
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// The `n` most frequent tokens, sorted by token.
    ///
    /// Equal counts are ranked by ascending token, so the selection is
    /// deterministic.
    pub fn top_n(&self, n: usize) -> Vec<(String, u64)> {
        let mut ranked: Vec<(&String, &u64)> = self.counts.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(n);
        let mut top: Vec<(String, u64)> = ranked
            .into_iter()
            .map(|(token, count)| (token.clone(), *count))
            .collect();
        top.sort_by(|a, b| a.0.cmp(&b.0));
        top
    }

    /// Counter reduced to its [`top_n`](Self::top_n) entries.
    pub fn truncated_to_top(&self, n: usize) -> FrequencyCounter {
        FrequencyCounter {
            counts: self.top_n(n).into_iter().collect(),
        }
    }
}

// Goes through `add` so zero counts in the input are dropped.
impl<'de> Deserialize<'de> for FrequencyCounter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let counts = BTreeMap::<String, u64>::deserialize(deserializer)?;
        Ok(counts.into_iter().collect())
    }
}

impl AddAssign<&FrequencyCounter> for FrequencyCounter {
    fn add_assign(&mut self, other: &FrequencyCounter) {
        self.merge(other);
    }
}

impl FromIterator<String> for FrequencyCounter {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut counter = FrequencyCounter::new();
        counter.extend(iter);
        counter
    }
}

impl<'a> FromIterator<&'a str> for FrequencyCounter {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(String::from).collect()
    }
}

impl Extend<String> for FrequencyCounter {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for token in iter {
            self.add(token, 1);
        }
    }
}

impl FromIterator<(String, u64)> for FrequencyCounter {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut counter = FrequencyCounter::new();
        for (token, count) in iter {
            counter.add(token, count);
        }
        counter
    }
}
