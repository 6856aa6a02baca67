//! Approximate string similarity on a 0..=100 scale.

use std::collections::BTreeSet;

/// Edit-distance based similarity scores, 0 (unrelated) to 100 (identical).
pub trait FuzzyMatcher: Send + Sync {
    /// Best score of the shorter string against any equally long window of
    /// the longer one.
    fn partial_ratio(&self, a: &str, b: &str) -> u8;

    /// Score over lowercased word sets, ignoring order and duplicates; a
    /// string whose words are a subset of the other's scores 100.
    fn token_set_ratio(&self, a: &str, b: &str) -> u8;
}

/// [`FuzzyMatcher`] backed by normalized Levenshtein distance from `strsim`.
///
/// Strings are compared per Unicode scalar value, so `Mečíř` is five
/// characters and matches itself exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrsimMatcher;

impl StrsimMatcher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub fn ratio(a: &str, b: &str) -> u8 {
        if a.is_empty() || b.is_empty() {
            return 0;
        }
        to_score(strsim::normalized_levenshtein(a, b))
    }

    fn process(text: &str) -> BTreeSet<String> {
        let cleaned: String = text
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        cleaned
            .split_whitespace()
            .map(str::to_lowercase)
            .collect()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_score(similarity: f64) -> u8 {
    (similarity * 100.0).round().clamp(0.0, 100.0) as u8
}

impl FuzzyMatcher for StrsimMatcher {
    fn partial_ratio(&self, a: &str, b: &str) -> u8 {
        let (a_len, b_len) = (a.chars().count(), b.chars().count());
        let (shorter, longer, width) = if a_len <= b_len {
            (a, b, a_len)
        } else {
            (b, a, b_len)
        };

        if width == 0 {
            return 0;
        }

        let longer: Vec<char> = longer.chars().collect();
        let mut best = 0.0_f64;

        for window in longer.windows(width) {
            let window: String = window.iter().collect();
            best = best.max(strsim::normalized_levenshtein(shorter, &window));
            if best >= 1.0 {
                break;
            }
        }

        to_score(best)
    }

    fn token_set_ratio(&self, a: &str, b: &str) -> u8 {
        let words_a = Self::process(a);
        let words_b = Self::process(b);

        if words_a.is_empty() || words_b.is_empty() {
            return 0;
        }

        let join = |words: Vec<&String>| {
            words
                .into_iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ")
        };

        let intersection = join(words_a.intersection(&words_b).collect());
        let only_a = join(words_a.difference(&words_b).collect());
        let only_b = join(words_b.difference(&words_a).collect());

        let combine = |rest: &str| {
            [intersection.as_str(), rest]
                .iter()
                .filter(|s| !s.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" ")
        };
        let with_a = combine(&only_a);
        let with_b = combine(&only_b);

        [
            Self::ratio(&intersection, &with_a),
            Self::ratio(&intersection, &with_b),
            Self::ratio(&with_a, &with_b),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}
