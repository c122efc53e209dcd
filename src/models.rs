//! Core data models for the verse document.
//!
//! These types mirror the on-disk JSON shape of the scripture source:
//!
//! ```json
//! { "books": [ { "name": "Genesis", "chapters": [
//!     { "chapter": 1, "verses": [ { "verse": 1, "text": "In the beginning..." } ] }
//! ] } ] }
//! ```

use serde::{Deserialize, Serialize};

/// Top-level verse document as loaded from disk.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerseDocument {
    pub books: Vec<Book>,
}

/// A book of scripture, identified by its case-sensitive name.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Book {
    pub name: String,
    pub chapters: Vec<Chapter>,
}

/// A numbered chapter within a [`Book`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chapter {
    /// 1-based chapter number, unique within its book.
    #[serde(rename = "chapter")]
    pub number: u32,
    pub verses: Vec<Verse>,
}

/// A numbered verse within a [`Chapter`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Verse {
    /// 1-based verse number, unique within its chapter.
    #[serde(rename = "verse")]
    pub number: u32,
    pub text: String,
}

impl Book {
    /// Finds a chapter by number. Does not assume the chapters are sorted.
    pub fn chapter(&self, number: u32) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.number == number)
    }
}
