//! The volume → book hierarchy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: u32,
    pub full_name: String,
    pub grid_name: String,
    pub toc_name: String,
    #[serde(rename = "parentBookId")]
    pub volume_id: u32,
    /// Zero means the book's content is not divided into chapters.
    pub num_chapters: u32,
}

impl Book {
    /// Chapter `0` stands for the whole of an undivided book and is only valid
    /// when the book has no numbered chapters.
    pub fn chapter_valid(&self, chapter: u32) -> bool {
        chapter <= self.num_chapters && !(chapter == 0 && self.num_chapters > 0)
    }

    /// Books with zero or one chapter go straight to their content.
    pub fn skips_chapter_picker(&self) -> bool {
        self.num_chapters <= 1
    }

    /// The only chapter of a book that skips the picker.
    pub fn sole_chapter(&self) -> Option<u32> {
        match self.num_chapters {
            0 => Some(0),
            1 => Some(1),
            _ => None,
        }
    }

    pub fn chapter_title(&self, chapter: u32) -> String {
        if chapter > 0 {
            format!("{} {}", self.toc_name, chapter)
        } else {
            self.toc_name.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub id: u32,
    pub full_name: String,
    pub min_book_id: u32,
    pub max_book_id: u32,
}

/// A ready catalog. The per-volume book lists are materialized by
/// [`Catalog::build`] and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    books: BTreeMap<u32, Book>,
    volumes: Vec<Volume>,
    volume_books: BTreeMap<u32, Vec<u32>>,
}

impl Catalog {
    pub fn build(
        books: impl IntoIterator<Item = Book>,
        volumes: impl IntoIterator<Item = Volume>,
    ) -> Result<Self, CatalogError> {
        let books: BTreeMap<u32, Book> = books.into_iter().map(|b| (b.id, b)).collect();
        let mut volumes: Vec<Volume> = volumes.into_iter().collect();
        volumes.sort_by_key(|v| v.id);

        if let Some(pair) = volumes.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(CatalogError::DuplicateVolume(pair[0].id));
        }

        let mut owners: BTreeMap<u32, u32> = BTreeMap::new();
        let mut volume_books = BTreeMap::new();
        for volume in &volumes {
            if volume.min_book_id > volume.max_book_id {
                return Err(CatalogError::InvertedRange {
                    volume_id: volume.id,
                    min_book_id: volume.min_book_id,
                    max_book_id: volume.max_book_id,
                });
            }

            let mut owned = Vec::new();
            for book_id in volume.min_book_id..=volume.max_book_id {
                let Some(book) = books.get(&book_id) else {
                    return Err(CatalogError::MissingBook {
                        volume_id: volume.id,
                        book_id,
                    });
                };
                if let Some(first) = owners.insert(book_id, volume.id) {
                    return Err(CatalogError::OverlappingVolumes {
                        first,
                        second: volume.id,
                        book_id,
                    });
                }
                if book.volume_id != volume.id {
                    return Err(CatalogError::MisplacedBook {
                        book_id,
                        declared: book.volume_id,
                        volume_id: volume.id,
                    });
                }
                owned.push(book_id);
            }
            volume_books.insert(volume.id, owned);
        }

        if let Some(&book_id) = books.keys().find(|id| !owners.contains_key(id)) {
            return Err(CatalogError::OrphanBook { book_id });
        }

        log::debug!(
            "catalog built: {} volumes, {} books",
            volumes.len(),
            books.len()
        );

        Ok(Self {
            books,
            volumes,
            volume_books,
        })
    }

    pub fn book(&self, book_id: u32) -> Option<&Book> {
        self.books.get(&book_id)
    }

    pub fn books(&self) -> impl Iterator<Item = &Book> + '_ {
        self.books.values()
    }

    pub fn volume(&self, volume_id: u32) -> Option<&Volume> {
        self.volumes.iter().find(|v| v.id == volume_id)
    }

    /// Volumes in ascending id order.
    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    /// The books a volume owns, in ascending id order.
    pub fn books_in(&self, volume_id: u32) -> impl Iterator<Item = &Book> + '_ {
        self.volume_books
            .get(&volume_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.books.get(id))
    }

    pub fn volume_of(&self, book_id: u32) -> Option<&Volume> {
        self.book(book_id).and_then(|b| self.volume(b.volume_id))
    }

    pub fn min_volume_id(&self) -> Option<u32> {
        self.volumes.first().map(|v| v.id)
    }

    pub fn max_volume_id(&self) -> Option<u32> {
        self.volumes.last().map(|v| v.id)
    }

    pub fn contains_volume(&self, volume_id: u32) -> bool {
        match (self.min_volume_id(), self.max_volume_id()) {
            (Some(min), Some(max)) => (min..=max).contains(&volume_id),
            _ => false,
        }
    }

    pub fn book_chapter_valid(&self, book_id: u32, chapter: u32) -> bool {
        self.book(book_id)
            .is_some_and(|book| book.chapter_valid(chapter))
    }
}
