//! Book → chapter grouping of a fused result list.
//!
//! Labels are used verbatim, so "Genesis 1" and "genesis 1" are different
//! chapters. Books and chapters appear in first-occurrence order, and the
//! verses of a chapter keep their fused order.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use scripture_core::types::SearchResult;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorizedResults {
    books: Vec<BookGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookGroup {
    pub name: String,
    pub chapters: Vec<ChapterGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChapterGroup {
    pub name: String,
    pub results: Vec<SearchResult>,
}

impl CategorizedResults {
    pub fn new(results: Vec<SearchResult>) -> Self {
        let mut out = Self::default();
        for r in results {
            out.push(r);
        }
        out
    }

    fn push(&mut self, result: SearchResult) {
        let book = match self.books.iter().position(|b| b.name == result.verse.book_name) {
            Some(i) => &mut self.books[i],
            None => {
                self.books.push(BookGroup { name: result.verse.book_name.clone(), chapters: Vec::new() });
                let last = self.books.len() - 1;
                &mut self.books[last]
            }
        };
        match book.chapters.iter_mut().find(|c| c.name == result.verse.chapter_name) {
            Some(chapter) => chapter.results.push(result),
            None => book.chapters.push(ChapterGroup { name: result.verse.chapter_name.clone(), results: vec![result] }),
        }
    }

    pub fn books(&self) -> &[BookGroup] { &self.books }

    pub fn get(&self, book: &str, chapter: &str) -> Option<&[SearchResult]> {
        self.books
            .iter()
            .find(|b| b.name == book)?
            .chapters
            .iter()
            .find(|c| c.name == chapter)
            .map(|c| c.results.as_slice())
    }

    /// Number of results across all buckets.
    pub fn len(&self) -> usize {
        self.books.iter().flat_map(|b| &b.chapters).map(|c| c.results.len()).sum()
    }

    pub fn is_empty(&self) -> bool { self.books.is_empty() }

    /// Book-major, chapter-minor walk over the buckets.
    pub fn flatten(&self) -> Vec<&SearchResult> {
        self.books.iter().flat_map(|b| &b.chapters).flat_map(|c| &c.results).collect()
    }
}

impl From<Vec<SearchResult>> for CategorizedResults {
    fn from(results: Vec<SearchResult>) -> Self { Self::new(results) }
}

// Serialized as nested JSON objects {book: {chapter: [result, ...]}} in
// bucket order.
impl Serialize for CategorizedResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.books.len()))?;
        for book in &self.books {
            map.serialize_entry(&book.name, &Chapters(&book.chapters))?;
        }
        map.end()
    }
}

struct Chapters<'a>(&'a [ChapterGroup]);

impl Serialize for Chapters<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for chapter in self.0 {
            map.serialize_entry(&chapter.name, &chapter.results)?;
        }
        map.end()
    }
}
