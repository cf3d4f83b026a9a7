// src/filter/extension.rs
// =============================================================================
// Extension filtering for archive index lines.
//
// A line is kept when it ends with a literal dot, one of the configured
// extensions, and an optional query string:
//
//     \.(pdf|sql|tar\.gz)(\?.*)?$
//
// Matching is case-sensitive, the same way the archive reports URLs.
//
// Rust concepts:
// - Regex is compiled once and reused for every line
// - Streams: the fetcher hands us lines lazily, we fold over them
// =============================================================================

use crate::error::{HuntError, Result};
use futures::stream::{Stream, TryStreamExt};
use regex::Regex;
use serde::Serialize;

/// The ordered set of extension tokens we filter on
#[derive(Debug, Clone)]
pub struct FilterSpec {
    tokens: Vec<String>,
    rule: Regex,
}

/// Counters for the filter pass, printed before the summary table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    /// Non-empty lines read from the index
    pub total: usize,
    /// Lines kept by the filter
    pub matched: usize,
}

impl FilterSpec {
    /// Builds the match rule once. Tokens must be alphanumeric, optionally
    /// joined by escaped dots (`tar\.gz`). Duplicates are dropped, first wins.
    pub fn new<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let token_rule = Regex::new(r"^[A-Za-z0-9]+(\\\.[A-Za-z0-9]+)*$")
            .map_err(|e| HuntError::config(e.to_string()))?;

        let mut unique: Vec<String> = Vec::new();
        for token in tokens {
            let token = token.into();
            let token = token.trim().to_string();
            if !token_rule.is_match(&token) {
                return Err(HuntError::config(format!(
                    "invalid extension '{}': only letters, digits and '\\.' are allowed",
                    token
                )));
            }
            if !unique.contains(&token) {
                unique.push(token);
            }
        }

        if unique.is_empty() {
            return Err(HuntError::config("no extensions specified"));
        }

        let pattern = format!(r"\.({})(\?.*)?$", unique.join("|"));
        let rule = Regex::new(&pattern).map_err(|e| HuntError::config(e.to_string()))?;

        Ok(FilterSpec {
            tokens: unique,
            rule,
        })
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Empty lines are rejected before the regex runs
    pub fn matches(&self, line: &str) -> bool {
        !line.is_empty() && self.rule.is_match(line)
    }
}

/// Filters an in-memory sequence of lines
#[cfg(test)]
fn filter_urls<I, S>(lines: I, spec: &FilterSpec) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter(|line| spec.matches(line.as_ref()))
        .map(|line| line.as_ref().to_string())
        .collect()
}

/// Filters the fetcher's lazy line stream in a single pass.
///
/// The first read error aborts the whole pass (the caller treats it as a
/// fetch failure).
pub async fn filter_stream<S>(lines: S, spec: &FilterSpec) -> Result<(Vec<String>, FilterStats)>
where
    S: Stream<Item = Result<String>>,
{
    lines
        .try_fold(
            (Vec::new(), FilterStats::default()),
            |(mut kept, mut stats), line| async move {
                if !line.is_empty() {
                    stats.total += 1;
                    if spec.matches(&line) {
                        stats.matched += 1;
                        kept.push(line);
                    }
                }
                Ok::<_, HuntError>((kept, stats))
            },
        )
        .await
}


// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why build one regex instead of checking each extension separately?
//    - The alternation `(pdf|sql)` is compiled once into a single automaton,
//      so every line is scanned once no matter how many extensions we have
//
// 2. Why are tokens validated so strictly?
//    - They are pasted into the regex as-is; anything besides letters,
//      digits and `\.` could change what the pattern means
//
// 3. What does try_fold do?
//    - Like Iterator::fold, but for a Stream of Results: the first Err stops
//      the fold and is returned
// -----------------------------------------------------------------------------
