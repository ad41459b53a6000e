//! Previous/next chapter across book boundaries.

use crate::catalog::{Book, Catalog};

/// A neighbouring chapter, ready to navigate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRef {
    pub volume_id: u32,
    pub book_id: u32,
    pub chapter: u32,
    pub title: String,
}

impl ChapterRef {
    fn new(book: &Book, chapter: u32) -> Self {
        Self {
            volume_id: book.volume_id,
            book_id: book.id,
            chapter,
            title: book.chapter_title(chapter),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}:{}", self.volume_id, self.book_id, self.chapter)
    }
}

pub fn next_chapter(catalog: &Catalog, book_id: u32, chapter: u32) -> Option<ChapterRef> {
    let book = catalog.book(book_id)?;
    if chapter < book.num_chapters {
        return Some(ChapterRef::new(book, chapter + 1));
    }

    let next = catalog.book(book_id.checked_add(1)?)?;
    let first = if next.num_chapters == 0 { 0 } else { 1 };
    Some(ChapterRef::new(next, first))
}

/// Chapter `0` is never reached by stepping back within a book; it is only
/// the landing point of an undivided previous book.
pub fn previous_chapter(catalog: &Catalog, book_id: u32, chapter: u32) -> Option<ChapterRef> {
    let book = catalog.book(book_id)?;
    if chapter > 1 {
        return Some(ChapterRef::new(book, chapter - 1));
    }

    let previous = catalog.book(book_id.checked_sub(1)?)?;
    Some(ChapterRef::new(previous, previous.num_chapters))
}
