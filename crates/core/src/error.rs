use thiserror::Error;

/// A single request to the content service failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// The joined book and volume lists do not form a consistent catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("volume {volume_id} has an inverted book range {min_book_id}..={max_book_id}")]
    InvertedRange {
        volume_id: u32,
        min_book_id: u32,
        max_book_id: u32,
    },

    #[error("volume {volume_id} lists book {book_id}, which is missing from the book list")]
    MissingBook { volume_id: u32, book_id: u32 },

    #[error("volumes {first} and {second} both claim book {book_id}")]
    OverlappingVolumes {
        first: u32,
        second: u32,
        book_id: u32,
    },

    #[error("book {book_id} declares volume {declared} but sits in the range of volume {volume_id}")]
    MisplacedBook {
        book_id: u32,
        declared: u32,
        volume_id: u32,
    },

    #[error("book {book_id} is not owned by any volume")]
    OrphanBook { book_id: u32 },

    #[error("duplicate volume id {0}")]
    DuplicateVolume(u32),
}

/// The catalog could not be made ready. No partial catalog is ever returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("book list unavailable")]
    Books(#[source] FetchError),

    #[error("volume list unavailable")]
    Volumes(#[source] FetchError),

    #[error("catalog is inconsistent")]
    Catalog(#[source] CatalogError),

    #[error("catalog load ended before both lists arrived")]
    Incomplete,
}
