//! Verse range extraction.
//!
//! Resolves a [`PassageRange`] against the [`VerseStore`] into ordered,
//! line-tagged verse texts (`"<chapter>:<verse> <text>"`). Used by the
//! `preach passage` CLI command and every passage endpoint of the server.
//!
//! # Selection rules
//!
//! Chapters are visited from `start_chapter` to `end_chapter` in ascending
//! order. Within each chapter:
//!
//! | Position | Selected verses |
//! |----------|-----------------|
//! | single-chapter range | `start_verse..=end_verse` |
//! | start chapter of a span | `>= start_verse` |
//! | end chapter of a span | `<= end_verse` |
//! | interior chapter | all |
//!
//! Every requested chapter must exist, and the overall selection must be
//! non-empty; otherwise extraction fails without a partial result.

use std::fmt;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::models::Verse;
use crate::store::VerseStore;

/// Failure kinds of passage resolution.
///
/// Callers map [`is_not_found`](ExtractError::is_not_found) kinds to
/// "not found" responses and the rest to "bad request".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Book \"{book}\" not found")]
    BookNotFound { book: String },

    #[error("Chapter \"{chapter}\" not found in {book}")]
    ChapterNotFound { book: String, chapter: u32 },

    #[error(
        "No verses found in range {}:{}–{}:{}",
        .range.start_chapter,
        .range.start_verse,
        .range.end_chapter,
        .range.end_verse
    )]
    EmptySelection { book: String, range: PassageRange },

    #[error("{0}")]
    MalformedRange(String),
}

impl ExtractError {
    /// True for unknown book or chapter.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ExtractError::BookNotFound { .. } | ExtractError::ChapterNotFound { .. }
        )
    }
}

/// An inclusive span of verses, possibly crossing chapter boundaries.
///
/// All numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassageRange {
    pub start_chapter: u32,
    pub start_verse: u32,
    pub end_chapter: u32,
    pub end_verse: u32,
}

impl PassageRange {
    /// Builds a range, defaulting the end to the start when absent
    /// (a single-verse selection).
    pub fn new(
        start_chapter: u32,
        start_verse: u32,
        end_chapter: Option<u32>,
        end_verse: Option<u32>,
    ) -> Self {
        Self {
            start_chapter,
            start_verse,
            end_chapter: end_chapter.unwrap_or(start_chapter),
            end_verse: end_verse.unwrap_or(start_verse),
        }
    }

    pub fn is_single_chapter(&self) -> bool {
        self.start_chapter == self.end_chapter
    }

    /// Whether `verse` of `chapter` falls inside the range, assuming
    /// `chapter` is within `start_chapter..=end_chapter`.
    fn selects(&self, chapter: u32, verse: u32) -> bool {
        if self.is_single_chapter() {
            verse >= self.start_verse && verse <= self.end_verse
        } else if chapter == self.start_chapter {
            verse >= self.start_verse
        } else if chapter == self.end_chapter {
            verse <= self.end_verse
        } else {
            true
        }
    }
}

impl fmt::Display for PassageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_chapter, self.start_verse, self.end_chapter, self.end_verse
        )
    }
}

/// Normalized cache key for a passage, e.g. `Genesis.1:1-1:3`.
pub fn range_key(book: &str, range: &PassageRange) -> String {
    format!("{}.{}", book, range)
}

/// Human-readable passage reference, e.g. `Genesis 1:1-1:3`.
pub fn passage_ref(book: &str, range: &PassageRange) -> String {
    format!("{} {}", book, range)
}

/// Extracts the verses of `book` covered by `range`.
///
/// Returns one `"<chapter>:<verse> <text>"` line per selected verse, ordered
/// by chapter then verse number regardless of the document's order.
///
/// # Errors
///
/// - [`ExtractError::BookNotFound`] if no book has exactly this name.
/// - [`ExtractError::ChapterNotFound`] for the first missing chapter in range.
/// - [`ExtractError::EmptySelection`] if the range matches no verses.
pub fn extract_verses(
    store: &VerseStore,
    book: &str,
    range: &PassageRange,
) -> Result<Vec<String>, ExtractError> {
    let book_entry = store
        .find_book(book)
        .ok_or_else(|| ExtractError::BookNotFound {
            book: book.to_string(),
        })?;

    let mut lines = Vec::new();

    for number in range.start_chapter..=range.end_chapter {
        let chapter = book_entry
            .chapter(number)
            .ok_or_else(|| ExtractError::ChapterNotFound {
                book: book.to_string(),
                chapter: number,
            })?;

        let mut selected: Vec<&Verse> = chapter
            .verses
            .iter()
            .filter(|v| range.selects(number, v.number))
            .collect();
        selected.sort_by_key(|v| v.number);

        lines.extend(
            selected
                .into_iter()
                .map(|v| format!("{}:{} {}", number, v.number, v.text)),
        );
    }

    if lines.is_empty() {
        return Err(ExtractError::EmptySelection {
            book: book.to_string(),
            range: *range,
        });
    }

    Ok(lines)
}

// ============ Request decoding ============

/// JSON body shared by the passage endpoints.
///
/// Numeric fields accept JSON numbers or numeric strings, since the browser
/// client posts `<select>` values verbatim. `null` and `""` count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassageRequest {
    #[serde(default)]
    pub book: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub start_chapter: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub start_verse: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub end_chapter: Option<u32>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub end_verse: Option<u32>,
}

impl PassageRequest {
    /// Validates required fields and resolves the range defaults.
    ///
    /// Chapter and verse numbers are 1-based, so an explicit `0` is rejected
    /// rather than being treated as "not provided".
    pub fn range(&self) -> Result<(String, PassageRange), ExtractError> {
        let book = self.book.as_deref().unwrap_or_default();
        let (start_chapter, start_verse) = match (self.start_chapter, self.start_verse) {
            (Some(c), Some(v)) if !book.is_empty() => (c, v),
            _ => {
                return Err(ExtractError::MalformedRange(
                    "Missing book, startChapter, or startVerse".to_string(),
                ))
            }
        };

        let numbers = [
            Some(start_chapter),
            Some(start_verse),
            self.end_chapter,
            self.end_verse,
        ];
        if numbers.contains(&Some(0)) {
            return Err(ExtractError::MalformedRange(
                "Chapter and verse numbers start at 1".to_string(),
            ));
        }

        Ok((
            book.to_string(),
            PassageRange::new(start_chapter, start_verse, self.end_chapter, self.end_verse),
        ))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Text(String),
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => u32::try_from(n)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("number out of range: {}", n))),
        Some(NumberOrText::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<u32>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid number: \"{}\"", s)))
        }
    }
}
