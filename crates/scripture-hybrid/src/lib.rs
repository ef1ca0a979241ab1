//! scripture-hybrid
//!
//! Query fan-out over the literal, fuzzy and semantic strategies, fusion of
//! their results into one ranked list, grouping by book and chapter, and the
//! `ScriptureSearcher` facade tying store, engines and embedding cache
//! together.

pub mod categorize;
pub mod fanout;
pub mod fusion;
pub mod searcher;
pub mod translations;

pub use categorize::{BookGroup, CategorizedResults, ChapterGroup};
pub use fanout::{fan_out, methods_for, Strategies, TaggedHit};
pub use fusion::{dedup_keep_max, fuse, normalize, sort_by_score, strip_scores};
pub use searcher::{ResponseBody, ScriptureSearcher, SearchResponse};
pub use translations::TranslationRegistry;
