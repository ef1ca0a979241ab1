//! scripture-fuzzy
//!
//! Token-set string similarity (0..=100) and a fuzzy searcher over the
//! loaded verse corpus. Matches below the cutoff are dropped here, never by
//! the caller.

pub mod ratio;
pub mod searcher;

pub use ratio::{extract, ratio, token_set_ratio, Match, Scorer, TokenSetRatio};
pub use searcher::{FieldMatch, FuzzySearcher, VerseField};
