//! Builds the catalog from the book and volume lists.

use mapscrip_core::{Book, Catalog, CatalogSource, FetchError, LoadError, Volume};

/// Joins the two list fetches. Each arrival sets its flag; the catalog is
/// built on whichever arrival sets the second one. A failed fetch settles the
/// join immediately and later arrivals are ignored.
#[derive(Debug, Default)]
pub struct CatalogJoin {
    books: Option<Vec<Book>>,
    volumes: Option<Vec<Volume>>,
    books_loaded: bool,
    volumes_loaded: bool,
    settled: bool,
}

impl CatalogJoin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn books_loaded(&self) -> bool {
        self.books_loaded
    }

    pub fn volumes_loaded(&self) -> bool {
        self.volumes_loaded
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// `None` while the volume list is still outstanding or once settled.
    pub fn books_arrived(
        &mut self,
        result: Result<Vec<Book>, FetchError>,
    ) -> Option<Result<Catalog, LoadError>> {
        if self.settled || self.books_loaded {
            return None;
        }
        match result {
            Ok(books) => {
                log::debug!("book list arrived ({} books)", books.len());
                self.books = Some(books);
                self.books_loaded = true;
                self.try_finish()
            }
            Err(err) => self.fail(LoadError::Books(err)),
        }
    }

    /// `None` while the book list is still outstanding or once settled.
    pub fn volumes_arrived(
        &mut self,
        result: Result<Vec<Volume>, FetchError>,
    ) -> Option<Result<Catalog, LoadError>> {
        if self.settled || self.volumes_loaded {
            return None;
        }
        match result {
            Ok(volumes) => {
                log::debug!("volume list arrived ({} volumes)", volumes.len());
                self.volumes = Some(volumes);
                self.volumes_loaded = true;
                self.try_finish()
            }
            Err(err) => self.fail(LoadError::Volumes(err)),
        }
    }

    fn try_finish(&mut self) -> Option<Result<Catalog, LoadError>> {
        if !(self.books_loaded && self.volumes_loaded) {
            return None;
        }
        let books = self.books.take()?;
        let volumes = self.volumes.take()?;
        self.settled = true;
        Some(Catalog::build(books, volumes).map_err(LoadError::Catalog))
    }

    fn fail(&mut self, err: LoadError) -> Option<Result<Catalog, LoadError>> {
        self.settled = true;
        self.books = None;
        self.volumes = None;
        Some(Err(err))
    }
}

/// Issues both list fetches at once and resolves when the join settles.
pub async fn load_catalog<S: CatalogSource>(source: &S) -> Result<Catalog, LoadError> {
    log::info!("loading catalog");
    let books = source.fetch_books();
    let volumes = source.fetch_volumes();
    tokio::pin!(books);
    tokio::pin!(volumes);

    let mut join = CatalogJoin::new();
    loop {
        let settled = tokio::select! {
            result = &mut books, if !join.books_loaded() => join.books_arrived(result),
            result = &mut volumes, if !join.volumes_loaded() => join.volumes_arrived(result),
            else => return Err(LoadError::Incomplete),
        };

        if let Some(outcome) = settled {
            match &outcome {
                Ok(catalog) => log::info!(
                    "catalog ready: {} volumes, {} books",
                    catalog.volumes().len(),
                    catalog.books().count()
                ),
                Err(err) => log::warn!("catalog load failed: {err}"),
            }
            return outcome;
        }
    }
}
