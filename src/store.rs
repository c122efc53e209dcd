//! Read-only verse store.
//!
//! The [`VerseStore`] owns every [`Book`] of the loaded document. It is built
//! once at startup, shared behind an `Arc`, and never mutated afterwards, so
//! request handlers read it without locking.
//!
//! Lookups are linear scans over the document order. At Bible size
//! (66 books, ~1,200 chapters) this is cheaper than maintaining an index,
//! and chapter/verse ordering in the source is never assumed.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::extract::ExtractError;
use crate::models::{Book, Chapter, VerseDocument};

/// In-memory book → chapter → verse hierarchy.
#[derive(Debug, Clone)]
pub struct VerseStore {
    books: Vec<Book>,
}

impl VerseStore {
    /// Loads and validates the verse document at `path`.
    ///
    /// A missing, unreadable, or malformed document is a startup-fatal
    /// condition: the caller should refuse to serve any passage request.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read verse document: {}", path.display()))?;

        let store = Self::from_json_str(&raw)
            .with_context(|| format!("Invalid verse document: {}", path.display()))?;

        tracing::info!(
            books = store.len(),
            path = %path.display(),
            "loaded verse document"
        );

        Ok(store)
    }

    /// Parses a verse document held in memory.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let doc: VerseDocument =
            serde_json::from_str(raw).context("Failed to parse verse document JSON")?;
        Self::from_books(doc.books)
    }

    /// Builds a store from already-parsed books.
    ///
    /// Rejects duplicate book names, duplicate chapter or verse numbers, and
    /// zero chapter or verse numbers.
    pub fn from_books(books: Vec<Book>) -> Result<Self> {
        let mut names = HashSet::new();
        for book in &books {
            if !names.insert(book.name.as_str()) {
                bail!("duplicate book: {}", book.name);
            }
            validate_chapters(book)?;
        }

        Ok(Self { books })
    }

    /// Number of books.
    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Finds a book by exact, case-sensitive name.
    pub fn find_book(&self, name: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.name == name)
    }

    /// Finds a chapter by number within the named book.
    pub fn find_chapter(&self, book: &str, number: u32) -> Option<&Chapter> {
        self.find_book(book).and_then(|b| b.chapter(number))
    }

    /// Book names in document order.
    pub fn book_names(&self) -> Vec<&str> {
        self.books.iter().map(|b| b.name.as_str()).collect()
    }

    /// Chapter numbers of a book in document order, or `None` for an
    /// unknown book.
    pub fn chapter_numbers(&self, book: &str) -> Option<Vec<u32>> {
        self.find_book(book)
            .map(|b| b.chapters.iter().map(|c| c.number).collect())
    }

    /// Verse numbers of a chapter in document order.
    pub fn verse_numbers(&self, book: &str, chapter: u32) -> Result<Vec<u32>, ExtractError> {
        if self.find_book(book).is_none() {
            return Err(ExtractError::BookNotFound {
                book: book.to_string(),
            });
        }
        let chapter_entry = self
            .find_chapter(book, chapter)
            .ok_or_else(|| ExtractError::ChapterNotFound {
                book: book.to_string(),
                chapter,
            })?;

        Ok(chapter_entry.verses.iter().map(|v| v.number).collect())
    }
}

fn validate_chapters(book: &Book) -> Result<()> {
    let mut chapters = HashSet::new();
    for chapter in &book.chapters {
        if chapter.number == 0 {
            bail!("{}: chapter numbers start at 1", book.name);
        }
        if !chapters.insert(chapter.number) {
            bail!("{}: duplicate chapter {}", book.name, chapter.number);
        }

        let mut verses = HashSet::new();
        for verse in &chapter.verses {
            if verse.number == 0 {
                bail!("{} {}: verse numbers start at 1", book.name, chapter.number);
            }
            if !verses.insert(verse.number) {
                bail!(
                    "{} {}: duplicate verse {}",
                    book.name,
                    chapter.number,
                    verse.number
                );
            }
        }
    }
    Ok(())
}
