//! Application orchestration layer for Scriptures, Mapped.

use mapscrip_core::location::resolve_or_home;
use mapscrip_core::{
    Catalog, ChapterDocument, ChapterPos, ChapterRef, ChapterRequest, FetchError, Location,
    MarkerSet, Settings, Viewport, next_chapter, previous_chapter,
};

pub mod loader;
pub mod markers;

pub use loader::{CatalogJoin, load_catalog};
pub use markers::{Backoff, MapUpdate, MarkerPoll, MarkerScheduler};

pub const ROOT_CRUMB: &str = "The Scriptures";

/// What the renderer should put on screen for a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Home,
    Volume {
        volume_id: u32,
    },
    /// The chapter picker.
    Book {
        book_id: u32,
    },
    Chapter {
        pos: ChapterPos,
        title: String,
        previous: Option<ChapterRef>,
        next: Option<ChapterRef>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub label: String,
    pub address: String,
}

/// A chapter fetch the caller must run and report back through
/// [`Session::accept_chapter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterFetch {
    pub generation: u64,
    pub request: ChapterRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub location: Location,
    pub address: String,
    pub view: View,
    pub breadcrumbs: Vec<Crumb>,
    pub fetch: Option<ChapterFetch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterContent {
    pub pos: ChapterPos,
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChapterOutcome {
    /// A newer navigation happened after this fetch was issued.
    Stale,
    /// The previous content stays on screen.
    Failed(FetchError),
    Rendered {
        generation: u64,
        references: Vec<String>,
    },
}

/// Everything one browsing session owns: the ready catalog, where the user
/// is, the chapter on screen and its markers.
#[derive(Debug, Clone)]
pub struct Session {
    pub settings: Settings,
    catalog: Catalog,
    location: Location,
    generation: u64,
    chapter: Option<ChapterContent>,
    markers: MarkerSet,
}

impl Session {
    pub fn new(settings: Settings, catalog: Catalog) -> Self {
        Self {
            settings,
            catalog,
            location: Location::Home,
            generation: 0,
            chapter: None,
            markers: MarkerSet::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn chapter(&self) -> Option<&ChapterContent> {
        self.chapter.as_ref()
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    pub fn address(&self) -> String {
        self.location.address(&self.catalog)
    }

    /// Resolves `token` and moves there. Invalid addresses land on Home.
    pub fn navigate(&mut self, token: &str) -> RenderRequest {
        let location = resolve_or_home(&self.catalog, token);
        self.go(location)
    }

    pub fn go(&mut self, location: Location) -> RenderRequest {
        self.location = location;
        self.generation += 1;
        if !matches!(location, Location::Chapter(_)) {
            self.chapter = None;
            self.markers.clear();
        }
        log::debug!(
            "navigate to {:?} (generation {})",
            self.address(),
            self.generation
        );
        self.render_request()
    }

    pub fn up(&mut self) -> RenderRequest {
        let parent = self.location.parent(&self.catalog);
        self.go(parent)
    }

    /// `None` outside a chapter or at the end of the catalog.
    pub fn next(&mut self) -> Option<RenderRequest> {
        let Location::Chapter(pos) = self.location else {
            return None;
        };
        let target = next_chapter(&self.catalog, pos.book_id(), pos.chapter())?;
        Some(self.navigate(&target.address()))
    }

    /// `None` outside a chapter or at the start of the catalog.
    pub fn previous(&mut self) -> Option<RenderRequest> {
        let Location::Chapter(pos) = self.location else {
            return None;
        };
        let target = previous_chapter(&self.catalog, pos.book_id(), pos.chapter())?;
        Some(self.navigate(&target.address()))
    }

    /// Switches the text source and reloads the chapter on screen.
    pub fn toggle_text_source(&mut self) -> Option<RenderRequest> {
        self.settings.cycle_text_source();
        log::info!("text source now {}", self.settings.text_source);
        let location = self.location;
        matches!(location, Location::Chapter(_)).then(|| self.go(location))
    }

    /// Describes the current location without navigating.
    pub fn render_request(&self) -> RenderRequest {
        let view = match self.location {
            Location::Home => View::Home,
            Location::Volume(volume_id) => View::Volume { volume_id },
            Location::Book(book_id) => View::Book { book_id },
            Location::Chapter(pos) => View::Chapter {
                pos,
                title: self.chapter_title(pos),
                previous: previous_chapter(&self.catalog, pos.book_id(), pos.chapter()),
                next: next_chapter(&self.catalog, pos.book_id(), pos.chapter()),
            },
        };
        let fetch = match self.location {
            Location::Chapter(pos) => Some(ChapterFetch {
                generation: self.generation,
                request: ChapterRequest::new(pos.book_id(), pos.chapter())
                    .with_jst(self.settings.text_source.is_jst()),
            }),
            _ => None,
        };

        RenderRequest {
            location: self.location,
            address: self.address(),
            view,
            breadcrumbs: self.breadcrumbs(),
            fetch,
        }
    }

    pub fn breadcrumbs(&self) -> Vec<Crumb> {
        let mut crumbs = vec![Crumb {
            label: ROOT_CRUMB.to_string(),
            address: String::new(),
        }];

        if let Some(volume) = self
            .location
            .volume_id(&self.catalog)
            .and_then(|id| self.catalog.volume(id))
        {
            crumbs.push(Crumb {
                label: volume.full_name.clone(),
                address: volume.id.to_string(),
            });
        }

        if let Some(book) = self.location.book_id().and_then(|id| self.catalog.book(id)) {
            crumbs.push(Crumb {
                label: book.full_name.clone(),
                address: format!("{}:{}", book.volume_id, book.id),
            });
        }

        if let Location::Chapter(pos) = self.location
            && pos.chapter() > 0
        {
            crumbs.push(Crumb {
                label: self.chapter_title(pos),
                address: self.address(),
            });
        }

        crumbs
    }

    /// Takes the result of a fetch issued with `generation`. Responses for an
    /// older navigation are dropped.
    pub fn accept_chapter(
        &mut self,
        generation: u64,
        result: Result<ChapterDocument, FetchError>,
    ) -> ChapterOutcome {
        let Location::Chapter(pos) = self.location else {
            return ChapterOutcome::Stale;
        };
        if generation != self.generation {
            log::debug!(
                "dropping chapter response for generation {generation}, current is {}",
                self.generation
            );
            return ChapterOutcome::Stale;
        }

        match result {
            Ok(document) => {
                self.chapter = Some(ChapterContent {
                    pos,
                    title: self.chapter_title(pos),
                    lines: document.lines,
                });
                self.markers.clear();
                ChapterOutcome::Rendered {
                    generation,
                    references: document.references,
                }
            }
            Err(err) => {
                log::warn!("chapter {} unavailable: {err}", self.address());
                ChapterOutcome::Failed(err)
            }
        }
    }

    /// Aggregates the references of the chapter on screen into markers.
    /// `None` when a newer navigation has happened since.
    pub fn install_markers(&mut self, generation: u64, references: &[String]) -> Option<MapUpdate> {
        if generation != self.generation {
            return None;
        }
        self.markers = MarkerSet::from_references(references.iter().map(String::as_str));
        log::debug!(
            "{} markers from {} references",
            self.markers.len(),
            references.len()
        );
        Some(self.overview_map())
    }

    /// Centers the map on one marker at its own zoom hint.
    pub fn focus_marker(&self, index: usize) -> Option<MapUpdate> {
        let marker = self.markers.get(index)?;
        Some(MapUpdate {
            generation: self.generation,
            markers: self.markers.markers().to_vec(),
            viewport: Viewport::Center {
                center: marker.point(),
                zoom: marker.zoom_hint,
            },
            focused: Some(index),
        })
    }

    /// Every current marker framed at once, or the configured home view
    /// while there are none.
    pub fn overview_map(&self) -> MapUpdate {
        MapUpdate {
            generation: self.generation,
            markers: self.markers.markers().to_vec(),
            viewport: self
                .markers
                .viewport(self.settings.default_center, self.settings.default_zoom),
            focused: None,
        }
    }

    fn chapter_title(&self, pos: ChapterPos) -> String {
        self.catalog
            .book(pos.book_id())
            .map(|book| book.chapter_title(pos.chapter()))
            .unwrap_or_default()
    }
}
