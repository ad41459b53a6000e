//! Seams to the remote content service.

use std::future::Future;

use crate::catalog::{Book, Volume};
use crate::error::FetchError;

/// Parameters of a chapter content fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRequest {
    pub book_id: u32,
    pub chapter: u32,
    /// Verse specifier such as `"3-5"`, passed through untouched.
    pub verses: Option<String>,
    /// Ask for the alternate text source.
    pub jst: bool,
}

impl ChapterRequest {
    pub fn new(book_id: u32, chapter: u32) -> Self {
        Self {
            book_id,
            chapter,
            verses: None,
            jst: false,
        }
    }

    pub fn with_jst(mut self, jst: bool) -> Self {
        self.jst = jst;
        self
    }
}

/// Chapter content split for display, with the geocoded references found in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterDocument {
    pub lines: Vec<String>,
    pub references: Vec<String>,
}

/// The two lists a catalog is built from.
pub trait CatalogSource {
    fn fetch_books(&self) -> impl Future<Output = Result<Vec<Book>, FetchError>>;
    fn fetch_volumes(&self) -> impl Future<Output = Result<Vec<Volume>, FetchError>>;
}

/// Chapter content by book and chapter.
pub trait ChapterSource {
    fn fetch_chapter(
        &self,
        request: &ChapterRequest,
    ) -> impl Future<Output = Result<ChapterDocument, FetchError>> + Send;
}
