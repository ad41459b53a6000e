//! Address tokens and the positions they resolve to.
//!
//! An address is `""`, `"v"`, `"v:b"` or `"v:b:c"`. Anything that does not
//! name a position in the catalog resolves to [`Location::Home`].

use crate::catalog::{Book, Catalog};

/// A chapter that exists in the catalog it was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChapterPos {
    book_id: u32,
    chapter: u32,
}

impl ChapterPos {
    pub fn new(catalog: &Catalog, book_id: u32, chapter: u32) -> Option<Self> {
        catalog
            .book_chapter_valid(book_id, chapter)
            .then_some(Self { book_id, chapter })
    }

    pub fn book_id(&self) -> u32 {
        self.book_id
    }

    pub fn chapter(&self) -> u32 {
        self.chapter
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Location {
    #[default]
    Home,
    Volume(u32),
    Book(u32),
    Chapter(ChapterPos),
}

/// Why an address was redirected to Home.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    VolumeOutOfRange,
    UnknownBook,
    InvalidChapter,
}

impl Fallback {
    pub fn location(self) -> Location {
        Location::Home
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Fallback::VolumeOutOfRange => "volume out of range",
            Fallback::UnknownBook => "unknown book",
            Fallback::InvalidChapter => "invalid chapter",
        }
    }
}

impl std::fmt::Display for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A split address token. Segments that are not non-negative integers parse
/// to `None`, which no catalog lookup accepts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    segments: Vec<Option<u32>>,
}

impl Address {
    /// Accepts a bare token, a `#`-prefixed fragment, or a full URL whose
    /// fragment carries the token.
    pub fn parse(input: &str) -> Self {
        let token = match input.split_once('#') {
            Some((_, fragment)) => fragment,
            None => input,
        };
        let token = token.trim();
        if token.is_empty() {
            return Self::default();
        }

        let segments = token
            .split(':')
            .map(|segment| segment.trim().parse::<u32>().ok())
            .collect();
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment(&self, index: usize) -> Option<u32> {
        self.segments.get(index).copied().flatten()
    }
}

pub fn resolve(catalog: &Catalog, token: &str) -> Result<Location, Fallback> {
    resolve_address(catalog, &Address::parse(token))
}

pub fn resolve_address(catalog: &Catalog, address: &Address) -> Result<Location, Fallback> {
    match address.len() {
        0 => Ok(Location::Home),
        1 => address
            .segment(0)
            .filter(|volume_id| catalog.contains_volume(*volume_id))
            .map(Location::Volume)
            .ok_or(Fallback::VolumeOutOfRange),
        2 => {
            let book = lookup_book(catalog, address)?;
            Ok(book_location(book))
        }
        len => {
            if len > 3 {
                // Extra segments are ignored; only volume:book:chapter is read.
                log::debug!("ignoring {} trailing address segment(s)", len - 3);
            }
            let book = lookup_book(catalog, address)?;
            address
                .segment(2)
                .filter(|chapter| book.chapter_valid(*chapter))
                .map(|chapter| {
                    Location::Chapter(ChapterPos {
                        book_id: book.id,
                        chapter,
                    })
                })
                .ok_or(Fallback::InvalidChapter)
        }
    }
}

/// Resolves `token`, sending every invalid address to Home.
pub fn resolve_or_home(catalog: &Catalog, token: &str) -> Location {
    resolve(catalog, token).unwrap_or_else(|fallback| {
        log::debug!("address {token:?} redirected home: {fallback}");
        fallback.location()
    })
}

fn lookup_book<'a>(catalog: &'a Catalog, address: &Address) -> Result<&'a Book, Fallback> {
    address
        .segment(1)
        .and_then(|book_id| catalog.book(book_id))
        .ok_or(Fallback::UnknownBook)
}

/// Books with zero or one chapter skip the picker and open their content.
fn book_location(book: &Book) -> Location {
    match book.sole_chapter() {
        Some(chapter) => Location::Chapter(ChapterPos {
            book_id: book.id,
            chapter,
        }),
        None => Location::Book(book.id),
    }
}

impl Location {
    /// Opens a book the way the resolver would, including the picker skip.
    pub fn for_book(catalog: &Catalog, book_id: u32) -> Option<Self> {
        catalog.book(book_id).map(book_location)
    }

    /// The canonical address of this location.
    pub fn address(&self, catalog: &Catalog) -> String {
        let volume_of = |book_id: u32| {
            catalog
                .book(book_id)
                .map(|b| b.volume_id)
                .unwrap_or_default()
        };
        match self {
            Location::Home => String::new(),
            Location::Volume(volume_id) => volume_id.to_string(),
            Location::Book(book_id) => format!("{}:{}", volume_of(*book_id), book_id),
            Location::Chapter(pos) => format!(
                "{}:{}:{}",
                volume_of(pos.book_id),
                pos.book_id,
                pos.chapter
            ),
        }
    }

    /// One level up the hierarchy. A chapter of a book without a picker goes
    /// to the volume.
    pub fn parent(&self, catalog: &Catalog) -> Location {
        match self {
            Location::Home | Location::Volume(_) => Location::Home,
            Location::Book(book_id) => catalog
                .book(*book_id)
                .map(|b| Location::Volume(b.volume_id))
                .unwrap_or_default(),
            Location::Chapter(pos) => match catalog.book(pos.book_id) {
                Some(book) if book.skips_chapter_picker() => Location::Volume(book.volume_id),
                Some(book) => Location::Book(book.id),
                None => Location::Home,
            },
        }
    }

    pub fn volume_id(&self, catalog: &Catalog) -> Option<u32> {
        match self {
            Location::Home => None,
            Location::Volume(volume_id) => Some(*volume_id),
            Location::Book(book_id) => catalog.book(*book_id).map(|b| b.volume_id),
            Location::Chapter(pos) => catalog.book(pos.book_id).map(|b| b.volume_id),
        }
    }

    pub fn book_id(&self) -> Option<u32> {
        match self {
            Location::Book(book_id) => Some(*book_id),
            Location::Chapter(pos) => Some(pos.book_id),
            _ => None,
        }
    }
}
