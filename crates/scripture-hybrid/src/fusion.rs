//! Fusion of tagged strategy hits into one ranked, deduplicated list.

use std::collections::HashMap;

use scripture_core::config::ScoreScale;
use scripture_core::types::{RawScore, SearchResult, VerseId};

use crate::fanout::TaggedHit;

/// Puts every raw score on `SearchResult::score`. The literal store's
/// relevance doubles as `rank`. Under `ScoreScale::Percent` cosine scores
/// are multiplied by 100; otherwise all values are kept as reported.
pub fn normalize(hits: Vec<TaggedHit>, scale: ScoreScale) -> Vec<SearchResult> {
    hits.into_iter()
        .map(|TaggedHit { method, hit }| {
            let (score, rank) = match hit.score {
                RawScore::Occurrence(v) => (v, Some(v)),
                RawScore::Similarity(v) => (v, None),
                RawScore::Cosine(v) => match scale {
                    ScoreScale::Native => (v, None),
                    ScoreScale::Percent => (v * 100.0, None),
                },
            };
            SearchResult { verse: hit.verse, score: Some(score), search_method: method, rank }
        })
        .collect()
}

/// One entry per verse id carrying the highest score seen. A later entry
/// replaces the kept one only when strictly better, and takes over its slot.
pub fn dedup_keep_max(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut slot: HashMap<VerseId, usize> = HashMap::with_capacity(results.len());
    let mut kept: Vec<SearchResult> = Vec::with_capacity(results.len());
    for r in results {
        let existing = slot.get(&r.id()).copied();
        match existing {
            Some(i) => {
                if r.score_or_zero() > kept[i].score_or_zero() {
                    kept[i] = r;
                }
            }
            None => {
                slot.insert(r.id(), kept.len());
                kept.push(r);
            }
        }
    }
    kept
}

/// Stable: equal scores keep their relative order.
pub fn sort_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.score_or_zero().total_cmp(&a.score_or_zero()));
}

pub fn strip_scores(results: &mut [SearchResult]) {
    for r in results {
        r.score = None;
        r.rank = None;
    }
}

/// Dedup, sort, truncate to `limit` (`None` keeps everything), and drop
/// score metadata unless `include_scores`.
pub fn fuse(results: Vec<SearchResult>, limit: Option<usize>, include_scores: bool) -> Vec<SearchResult> {
    let mut fused = dedup_keep_max(results);
    sort_by_score(&mut fused);
    if let Some(n) = limit {
        fused.truncate(n);
    }
    if !include_scores {
        strip_scores(&mut fused);
    }
    fused
}
