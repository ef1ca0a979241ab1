//! SQLite backend: schema, pragmas, import and literal search.

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use scripture_core::ingest::{BibleDocument, BookRecord};
use scripture_core::traits::{Retriever, VerseStore};
use scripture_core::types::{RawScore, ScoredVerse, Verse};

const SCHEMA_VERSION: i64 = 1;

const MIGRATION_V1: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    translation TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chapters (
    id INTEGER PRIMARY KEY,
    book_id INTEGER NOT NULL REFERENCES books(id),
    chapter_num INTEGER NOT NULL,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS verses (
    id INTEGER PRIMARY KEY,
    chapter_id INTEGER NOT NULL REFERENCES chapters(id),
    book_id INTEGER NOT NULL REFERENCES books(id),
    verse_num INTEGER NOT NULL,
    text TEXT NOT NULL,
    name TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_books_translation ON books(translation);
CREATE INDEX IF NOT EXISTS idx_verses_chapter ON verses(chapter_id);
"#;

const VERSE_SELECT: &str = "SELECT v.id, v.name, v.text, b.name, c.name, b.translation
     FROM verses v
     JOIN books b ON v.book_id = b.id
     JOIN chapters c ON v.chapter_id = c.id";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating db directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening sqlite db at {}", path.display()))?;
        info!(path = %path.display(), "opened verse store");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        apply_pragmas(&mut conn)?;
        migrate(&mut conn)?;
        Ok(Self { conn })
    }

    /// Verses whose text or label contains `query` literally
    /// (ASCII case-insensitive, as SQLite `LIKE`), most relevant first.
    ///
    /// `limit` caps the candidate rows taken in identity order before ranking.
    pub fn search_text(&self, query: &str, limit: Option<usize>) -> Result<Vec<ScoredVerse>> {
        let pattern = format!("%{}%", escape_like(query));
        let sql_limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        let mut stmt = self.conn.prepare_cached(&format!(
            "{VERSE_SELECT}
             WHERE v.text LIKE ?1 ESCAPE '\\' OR v.name LIKE ?1 ESCAPE '\\'
             ORDER BY v.id
             LIMIT ?2"
        ))?;
        let verses = stmt
            .query_map(params![pattern, sql_limit], verse_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("literal search for {query:?}"))?;

        let mut hits: Vec<ScoredVerse> = verses
            .into_iter()
            .map(|verse| {
                let relevance = occurrence_relevance(query, &verse.text, &verse.name);
                ScoredVerse { verse, score: RawScore::Occurrence(relevance) }
            })
            .collect();
        hits.sort_by(|a, b| raw_value(b.score).total_cmp(&raw_value(a.score)));
        debug!(query, hits = hits.len(), "literal search");
        Ok(hits)
    }

    pub fn all_verses(&self, translation: Option<&str>) -> Result<Vec<Verse>> {
        let verses = match translation {
            Some(tag) => {
                let mut stmt = self
                    .conn
                    .prepare_cached(&format!("{VERSE_SELECT} WHERE b.translation = ?1 ORDER BY v.id"))?;
                let rows = stmt.query_map(params![tag], verse_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = self.conn.prepare_cached(&format!("{VERSE_SELECT} ORDER BY v.id"))?;
                let rows = stmt.query_map([], verse_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(verses)
    }

    pub fn verse_count(&self) -> Result<usize> {
        let n: i64 = self.conn.query_row("SELECT COUNT(*) FROM verses", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    pub fn translations(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached("SELECT DISTINCT translation FROM books ORDER BY translation")?;
        let tags = stmt.query_map([], |row| row.get(0))?.collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(tags)
    }

    /// Writes a whole document in one transaction; nothing is kept on error.
    pub fn import_bible(&mut self, doc: &BibleDocument, translation: &str) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let written = import_document(&tx, doc, translation)?;
        tx.commit()?;
        Ok(written)
    }

    /// Swaps the whole corpus for `docs` in one transaction. On error the
    /// previous contents stay untouched.
    pub fn replace_all(&mut self, docs: &[(String, BibleDocument)]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute_batch("DELETE FROM verses; DELETE FROM chapters; DELETE FROM books;")?;
        let mut written = 0usize;
        for (translation, doc) in docs {
            written += import_document(&tx, doc, translation)?;
        }
        tx.commit()?;
        info!(translations = docs.len(), verses = written, "verse store replaced");
        Ok(written)
    }
}

impl VerseStore for SqliteStore {
    fn verse_count(&self) -> Result<usize> { Self::verse_count(self) }
    fn search_text(&self, query: &str, limit: Option<usize>) -> Result<Vec<ScoredVerse>> { Self::search_text(self, query, limit) }
    fn all_verses(&self, translation: Option<&str>) -> Result<Vec<Verse>> { Self::all_verses(self, translation) }
    fn translations(&self) -> Result<Vec<String>> { Self::translations(self) }
    fn import_bible(&mut self, doc: &BibleDocument, translation: &str) -> Result<usize> { Self::import_bible(self, doc, translation) }
    fn replace_all(&mut self, docs: &[(String, BibleDocument)]) -> Result<usize> { Self::replace_all(self, docs) }
}

impl Retriever for SqliteStore {
    fn retrieve(&self, query: &str, limit: Option<usize>) -> Result<Vec<ScoredVerse>> {
        self.search_text(query, limit)
    }
}

/// `min(100, 10 × occurrences)` where occurrences counts every lower-cased
/// whitespace-separated query term in the lower-cased text and label.
pub fn occurrence_relevance(query: &str, text: &str, name: &str) -> f64 {
    let text = text.to_lowercase();
    let name = name.to_lowercase();
    let count: usize = query
        .to_lowercase()
        .split_whitespace()
        .map(|term| text.matches(term).count() + name.matches(term).count())
        .sum();
    (count as f64 * 10.0).min(100.0)
}

fn raw_value(score: RawScore) -> f64 {
    match score {
        RawScore::Occurrence(v) | RawScore::Similarity(v) | RawScore::Cosine(v) => v,
    }
}

fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn verse_from_row(row: &Row<'_>) -> rusqlite::Result<Verse> {
    Ok(Verse {
        id: row.get(0)?,
        name: row.get(1)?,
        text: row.get(2)?,
        book_name: row.get(3)?,
        chapter_name: row.get(4)?,
        translation: row.get(5)?,
    })
}

fn import_document(tx: &Transaction<'_>, doc: &BibleDocument, translation: &str) -> Result<usize> {
    info!(translation, books = doc.books.len(), "importing translation");
    let mut written = 0usize;
    for book in &doc.books {
        written += insert_book(tx, book, translation)
            .with_context(|| format!("importing {translation} book {}", book.name))?;
    }
    info!(translation, verses = written, "import complete");
    Ok(written)
}

fn insert_book(tx: &Transaction<'_>, book: &BookRecord, translation: &str) -> Result<usize> {
    tx.execute("INSERT INTO books(name, translation) VALUES(?,?)", params![book.name, translation])?;
    let book_id = tx.last_insert_rowid();
    let mut written = 0usize;
    for chapter in &book.chapters {
        tx.execute(
            "INSERT INTO chapters(book_id, chapter_num, name) VALUES(?,?,?)",
            params![book_id, chapter.chapter, chapter.name],
        )?;
        let chapter_id = tx.last_insert_rowid();
        let mut stmt = tx.prepare_cached(
            "INSERT INTO verses(chapter_id, book_id, verse_num, text, name) VALUES(?,?,?,?,?)",
        )?;
        for verse in &chapter.verses {
            stmt.execute(params![chapter_id, book_id, verse.verse, verse.text, verse.name])?;
            written += 1;
        }
    }
    Ok(written)
}

fn apply_pragmas(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA synchronous = NORMAL;
        PRAGMA temp_store = MEMORY;
        PRAGMA foreign_keys = ON;
        "#,
    )?;
    Ok(())
}

fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute("CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)", [])?;
    let current: i64 = conn
        .query_row("SELECT value FROM meta WHERE key = 'schema_version'", [], |row| {
            row.get::<_, String>(0).map(|s| s.parse().unwrap_or(0))
        })
        .optional()?
        .unwrap_or(0);

    match current {
        0 => {
            conn.execute_batch(MIGRATION_V1)?;
            conn.execute(
                "INSERT OR REPLACE INTO meta(key, value) VALUES('schema_version', ?)",
                params![SCHEMA_VERSION.to_string()],
            )?;
        }
        v if v == SCHEMA_VERSION => {}
        v => return Err(anyhow!("unsupported schema version {}", v)),
    }
    Ok(())
}
