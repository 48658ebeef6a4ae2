use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::debug;

use crate::counter::FrequencyCounter;
use crate::error::Result;

///Reads a stopword file: whitespace-separated tokens, lower-cased.
pub fn load_stopwords<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let stopwords: HashSet<String> = content
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect();
    debug!("loaded {} stopwords from {}", stopwords.len(), path.display());
    Ok(stopwords)
}

/// What to drop from a counter before it is exported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    /// Tokens with a count at or below this are dropped.
    pub threshold: u64,
    pub excluded_tokens: HashSet<String>,
}

impl FilterConfig {
    /// True when [`apply`](Self::apply) would return its input unchanged.
    pub fn is_noop(&self) -> bool {
        self.threshold == 0 && self.excluded_tokens.is_empty()
    }

    /// Excluded tokens are removed first, then the threshold is applied.
    pub fn apply(&self, counter: &FrequencyCounter) -> FrequencyCounter {
        let mut filtered = counter.filtered_by_exclusion_set(&self.excluded_tokens);
        filtered.retain_above_threshold(self.threshold);
        filtered
    }
}
