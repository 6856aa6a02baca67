//! Widening of per-token tags to whole phrases over dependency edges.
//!
//! A tagger marks `San` and `Diego` separately, or only `thousand` in "three
//! thousand dollars". Following `compound`, `amod` and `nummod` edges in both
//! directions until nothing changes tags the whole phrase.

use std::ops::Range;

use crate::annotation::SentenceView;
use crate::numeric::strnum_value;

pub const COMPOUND_RELATIONS: [&str; 3] = ["compound", "amod", "nummod"];

#[must_use]
pub fn default_relations() -> Vec<String> {
    COMPOUND_RELATIONS.iter().map(ToString::to_string).collect()
}

/// Propagates `tagged` across the sentence's edges whose base label is in
/// `relations` until a fixed point. Tags only ever turn on, so the result does
/// not depend on edge order.
pub fn compound<S: AsRef<str>>(
    sentence: &dyn SentenceView,
    tagged: Vec<bool>,
    relations: &[S],
) -> Vec<bool> {
    let links: Vec<(usize, usize)> = sentence
        .dependencies()
        .filter(|edge| !edge.is_self_loop())
        .filter(|edge| relations.iter().any(|r| r.as_ref() == edge.base_relation()))
        .filter_map(|edge| Some((edge.governor.checked_sub(1)?, edge.dependent.checked_sub(1)?)))
        .collect();

    expand(&links, tagged)
}

/// Fixed point over 0-based `(governor, dependent)` links.
pub fn expand(links: &[(usize, usize)], mut tagged: Vec<bool>) -> Vec<bool> {
    let mut passes = 0;
    loop {
        let mut changed = 0;
        for &(governor, dependent) in links {
            let (Some(&g), Some(&d)) = (tagged.get(governor), tagged.get(dependent)) else {
                continue;
            };
            if g != d {
                tagged[governor] = true;
                tagged[dependent] = true;
                changed += 1;
            }
        }
        passes += 1;
        if changed == 0 {
            break;
        }
    }
    tracing::trace!(passes, links = links.len(), "Compound expansion converged");
    tagged
}

/// Maximal runs of `true`.
pub fn runs(tagged: &[bool]) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start = None;

    for (i, &flag) in tagged.iter().enumerate() {
        match (flag, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                out.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push(s..tagged.len());
    }

    out
}

fn sentence_runs(sentence: &dyn SentenceView, tagged: &[bool]) -> Vec<Range<usize>> {
    let len = sentence.len().min(tagged.len());
    runs(&tagged[..len])
}

/// Token text of each tagged run, space separated.
pub fn chunk(sentence: &dyn SentenceView, tagged: &[bool]) -> Vec<String> {
    sentence_runs(sentence, tagged)
        .into_iter()
        .map(|run| {
            run.filter_map(|i| sentence.token(i))
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Canonical numeric text of each tagged run. Tokens without a resolved value
/// contribute nothing; a run with no values is dropped.
pub fn chunk_num(sentence: &dyn SentenceView, tagged: &[bool]) -> Vec<String> {
    sentence_runs(sentence, tagged)
        .into_iter()
        .filter_map(|run| {
            let values: Vec<String> = run
                .filter_map(|i| sentence.token(i))
                .filter_map(|t| t.numeric_composite_value.as_ref())
                .map(strnum_value)
                .collect();
            (!values.is_empty()).then(|| values.join(" "))
        })
        .collect()
}
