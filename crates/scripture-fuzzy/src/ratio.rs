use std::collections::BTreeSet;

/// Pairwise similarity of two strings on a 0..=100 scale.
pub trait Scorer: Send + Sync {
    fn score(&self, query: &str, choice: &str) -> f64;
}

/// Token-set ratio: word order and repeated words do not matter, and a
/// string whose words are all contained in the other scores 100.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSetRatio;

impl Scorer for TokenSetRatio {
    fn score(&self, query: &str, choice: &str) -> f64 {
        token_set_ratio(query, choice)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub index: usize,
    pub score: f64,
}

/// Indel similarity `200 · LCS / (|a| + |b|)` over chars; two empty
/// strings score 100.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(&a, &b) as f64 / total as f64
}

/// Longest common subsequence length, two-row DP.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb { prev[j] + 1 } else { prev[j + 1].max(cur[j]) };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Lower-cased alphanumeric runs, deduplicated and sorted.
fn tokens(s: &str) -> BTreeSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn joined(parts: &[&String]) -> String {
    parts.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" ")
}

pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let sect: Vec<&String> = ta.intersection(&tb).collect();
    let only_a: Vec<&String> = ta.difference(&tb).collect();
    let only_b: Vec<&String> = tb.difference(&ta).collect();
    if !sect.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let sect = joined(&sect);
    let with_a = [sect.as_str(), joined(&only_a).as_str()].join(" ").trim().to_string();
    let with_b = [sect.as_str(), joined(&only_b).as_str()].join(" ").trim().to_string();

    let mut best = ratio(&with_a, &with_b);
    if !sect.is_empty() {
        best = best.max(ratio(&sect, &with_a)).max(ratio(&sect, &with_b));
    }
    best
}

/// Scores every choice against `query` and keeps those at or above `cutoff`,
/// best first (ties in corpus order), at most `limit` of them.
pub fn extract(
    scorer: &dyn Scorer,
    query: &str,
    choices: &[String],
    limit: Option<usize>,
    cutoff: f64,
) -> Vec<Match> {
    let mut matches: Vec<Match> = choices
        .iter()
        .enumerate()
        .map(|(index, choice)| Match { index, score: scorer.score(query, choice) })
        .filter(|m| m.score >= cutoff)
        .collect();
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    if let Some(n) = limit {
        matches.truncate(n);
    }
    matches
}
