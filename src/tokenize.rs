use crate::counter::FrequencyCounter;
use crate::error::{Error, Result};

/// How raw text is normalized before it is split into words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizeOptions {
    pub fold_case: bool,
    pub strip_punctuation: bool,
}

impl Default for TokenizeOptions {
    fn default() -> Self {
        Self {
            fold_case: true,
            strip_punctuation: true,
        }
    }
}

///Deletes ASCII punctuation without putting anything in its place.
///Words joined only by punctuation are fused: "end.Start" becomes "endStart".
/// # Example
/// ```
/// use chat_timeline::strip_punctuation;
/// assert_eq!(strip_punctuation("it's (fine), ok?"), "its fine ok");
/// assert_eq!(strip_punctuation("end.Start"), "endStart");
/// ```
pub fn strip_punctuation(text: &str) -> String {
    text.chars().filter(|c| !c.is_ascii_punctuation()).collect()
}

///Counts every run of `n` consecutive words in `text`, joined by a single space.
///Text with fewer than `n` words gives an empty counter; `n == 0` is rejected.
/// # Example
/// ```
/// use chat_timeline::{TokenizeOptions, make_ngram_counter};
/// let c = make_ngram_counter(2, "A b, c", TokenizeOptions::default()).unwrap();
/// assert_eq!(c.get("a b"), 1);
/// assert_eq!(c.get("b c"), 1);
/// assert_eq!(c.total(), 2);
/// ```
pub fn make_ngram_counter(n: usize, text: &str, opts: TokenizeOptions) -> Result<FrequencyCounter> {
    if n == 0 {
        return Err(Error::InvalidArgument(
            "n-gram size must be at least 1".to_string(),
        ));
    }
    let mut text = if opts.fold_case {
        text.to_lowercase()
    } else {
        text.to_string()
    };
    if opts.strip_punctuation {
        text = strip_punctuation(&text);
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    Ok(words.windows(n).map(|w| w.join(" ")).collect())
}
