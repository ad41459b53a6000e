//! Test helpers and fixtures.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use mapscrip_core::{
    Book, Catalog, CatalogSource, ChapterDocument, ChapterRequest, ChapterSource, FetchError,
    Volume,
};

pub fn make_book(id: u32, volume_id: u32, num_chapters: u32, name: &str) -> Book {
    Book {
        id,
        full_name: name.to_string(),
        grid_name: name.chars().take(6).collect(),
        toc_name: name.to_string(),
        volume_id,
        num_chapters,
    }
}

pub fn make_volume(id: u32, name: &str, min_book_id: u32, max_book_id: u32) -> Volume {
    Volume {
        id,
        full_name: name.to_string(),
        min_book_id,
        max_book_id,
    }
}

/// Three volumes covering every chapter shape: many chapters, a single
/// chapter, and an undivided book.
pub fn sample_books() -> Vec<Book> {
    vec![
        make_book(101, 1, 50, "Genesis"),
        make_book(102, 1, 40, "Exodus"),
        make_book(103, 1, 1, "Obadiah"),
        make_book(104, 2, 0, "Title Page"),
        make_book(105, 2, 22, "1 Nephi"),
        make_book(106, 2, 1, "Enos"),
        make_book(107, 3, 138, "Doctrine and Covenants"),
    ]
}

pub fn sample_volumes() -> Vec<Volume> {
    vec![
        make_volume(1, "Old Testament", 101, 103),
        make_volume(2, "Book of Mormon", 104, 106),
        make_volume(3, "Doctrine and Covenants", 107, 107),
    ]
}

pub fn sample_catalog() -> Catalog {
    match Catalog::build(sample_books(), sample_volumes()) {
        Ok(catalog) => catalog,
        Err(err) => panic!("sample catalog is inconsistent: {err}"),
    }
}

/// Chapter markup as the content service returns it, with two references to
/// the same spot and one elsewhere.
pub const GENESIS_12: &str = r#"
<div class="chapterheading">Genesis 12</div>
<ul class="versesblock">
  <li><span class="verse">6</span>And Abram passed through the land unto the place of
    <a onclick="showLocation(711,'Sichem',32.2137,35.2823,32.2137,35.2823,0,0,4500,0,'')">Sichem</a>,
    unto the plain of <a onclick="showLocation(466,'Moreh',32.2137,35.2823,32.2137,35.2823,0,0,4500,0,'')">Moreh</a>.</li>
  <li><span class="verse">8</span>And he removed from thence unto a mountain on the east of
    <a onclick="showLocation(90,'Beth-el',31.9305,35.2214,31.9305,35.2214,0,0,3000,0,'')">Beth-el</a>.</li>
  <li><a onclick="changeHash('1:101:13')">Next chapter</a></li>
</ul>
"#;

pub const GENESIS_12_JST: &str = r#"
<div class="chapterheading">Genesis 12 (JST)</div>
<ul class="versesblock">
  <li><span class="verse">6</span>And Abram passed through the land unto
    <a onclick="showLocation(711,'Sichem',32.2137,35.2823,32.2137,35.2823,0,0,4500,0,'')">Sichem</a>.</li>
</ul>
"#;

#[derive(Debug, Default)]
struct SourceState {
    chapters: BTreeMap<(u32, u32, bool), String>,
    fail_books: Option<FetchError>,
    fail_volumes: Option<FetchError>,
    requests: Vec<ChapterRequest>,
}

/// In-memory content service. Chapter markup goes through the same
/// extraction the HTTP client uses.
#[derive(Debug, Clone)]
pub struct MemorySource {
    books: Vec<Book>,
    volumes: Vec<Volume>,
    state: Arc<Mutex<SourceState>>,
}

impl MemorySource {
    pub fn new(books: Vec<Book>, volumes: Vec<Volume>) -> Self {
        Self {
            books,
            volumes,
            state: Arc::default(),
        }
    }

    /// [`sample_books`] and [`sample_volumes`] with Genesis 12 in both text
    /// sources.
    pub fn sample() -> Self {
        Self::new(sample_books(), sample_volumes())
            .with_chapter(101, 12, false, GENESIS_12)
            .with_chapter(101, 12, true, GENESIS_12_JST)
    }

    pub fn with_chapter(self, book_id: u32, chapter: u32, jst: bool, markup: &str) -> Self {
        self.lock()
            .chapters
            .insert((book_id, chapter, jst), markup.to_string());
        self
    }

    pub fn failing_books(self, err: FetchError) -> Self {
        self.lock().fail_books = Some(err);
        self
    }

    pub fn failing_volumes(self, err: FetchError) -> Self {
        self.lock().fail_volumes = Some(err);
        self
    }

    /// Chapter requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<ChapterRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SourceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CatalogSource for MemorySource {
    async fn fetch_books(&self) -> Result<Vec<Book>, FetchError> {
        match self.lock().fail_books.clone() {
            Some(err) => Err(err),
            None => Ok(self.books.clone()),
        }
    }

    async fn fetch_volumes(&self) -> Result<Vec<Volume>, FetchError> {
        match self.lock().fail_volumes.clone() {
            Some(err) => Err(err),
            None => Ok(self.volumes.clone()),
        }
    }
}

impl ChapterSource for MemorySource {
    async fn fetch_chapter(&self, request: &ChapterRequest) -> Result<ChapterDocument, FetchError> {
        let mut state = self.lock();
        state.requests.push(request.clone());
        match state
            .chapters
            .get(&(request.book_id, request.chapter, request.jst))
        {
            Some(markup) => Ok(mapscrip_engine::extract_document(markup)),
            None => Err(FetchError::Status {
                url: format!(
                    "memory://mapgetscrip?book={}&chap={}",
                    request.book_id, request.chapter
                ),
                status: 404,
            }),
        }
    }
}

pub fn not_found(url: &str) -> FetchError {
    FetchError::Status {
        url: url.to_string(),
        status: 404,
    }
}

#[cfg(test)]
mod tests {
    use mapscrip_application::{ChapterOutcome, Session, View, load_catalog};
    use mapscrip_core::location::resolve;
    use mapscrip_core::{
        Fallback, LoadError, Location, Settings, Viewport, next_chapter, previous_chapter,
    };

    use super::*;

    /// Every chapter in reading order, with undivided books as chapter 0.
    fn all_positions(catalog: &Catalog) -> Vec<(u32, u32)> {
        catalog
            .books()
            .flat_map(|book| {
                let first = if book.num_chapters == 0 { 0 } else { 1 };
                (first..=book.num_chapters).map(move |c| (book.id, c))
            })
            .collect()
    }

    #[test]
    fn sample_catalog_groups_books_by_volume() {
        let catalog = sample_catalog();
        let ids: Vec<u32> = catalog.books_in(2).map(|b| b.id).collect();
        assert_eq!(ids, vec![104, 105, 106]);
        for volume in catalog.volumes() {
            let ids: Vec<u32> = catalog.books_in(volume.id).map(|b| b.id).collect();
            let expected: Vec<u32> = (volume.min_book_id..=volume.max_book_id).collect();
            assert_eq!(ids, expected);
        }
    }

    #[tokio::test]
    async fn loads_catalog_from_memory_source() {
        let catalog = load_catalog(&MemorySource::sample()).await.unwrap();
        assert_eq!(catalog, sample_catalog());
    }

    #[tokio::test]
    async fn either_failing_list_fails_the_load() {
        let source = MemorySource::sample().failing_books(not_found("books"));
        assert!(matches!(
            load_catalog(&source).await,
            Err(LoadError::Books(_))
        ));

        let source = MemorySource::sample().failing_volumes(not_found("volumes"));
        assert!(matches!(
            load_catalog(&source).await,
            Err(LoadError::Volumes(_))
        ));
    }

    #[test]
    fn forward_walk_visits_every_chapter_once() {
        let catalog = sample_catalog();
        let expected = all_positions(&catalog);

        let mut walked = vec![expected[0]];
        let (mut book, mut chapter) = expected[0];
        while let Some(next) = next_chapter(&catalog, book, chapter) {
            (book, chapter) = (next.book_id, next.chapter);
            walked.push((book, chapter));
        }
        assert_eq!(walked, expected);

        let mut back = vec![(book, chapter)];
        while let Some(previous) = previous_chapter(&catalog, book, chapter) {
            (book, chapter) = (previous.book_id, previous.chapter);
            back.push((book, chapter));
        }
        back.reverse();
        assert_eq!(back, expected);
    }

    #[test]
    fn previous_undoes_next_everywhere() {
        let catalog = sample_catalog();
        for (book, chapter) in all_positions(&catalog) {
            let Some(next) = next_chapter(&catalog, book, chapter) else {
                continue;
            };
            let back = previous_chapter(&catalog, next.book_id, next.chapter).unwrap();
            assert_eq!((back.book_id, back.chapter), (book, chapter));
        }
    }

    #[test]
    fn every_invalid_address_falls_back_home() {
        let catalog = sample_catalog();
        let cases = [
            ("0", Fallback::VolumeOutOfRange),
            ("6", Fallback::VolumeOutOfRange),
            ("x", Fallback::VolumeOutOfRange),
            ("1:999", Fallback::UnknownBook),
            ("1:abc", Fallback::UnknownBook),
            ("1:101:51", Fallback::InvalidChapter),
            ("1:101:0", Fallback::InvalidChapter),
            ("2:104:1", Fallback::InvalidChapter),
        ];
        for (token, fallback) in cases {
            assert_eq!(resolve(&catalog, token), Err(fallback), "token {token:?}");
        }
    }

    #[test]
    fn addresses_resolve_through_the_hierarchy() {
        let catalog = sample_catalog();
        assert_eq!(resolve(&catalog, ""), Ok(Location::Home));
        assert_eq!(resolve(&catalog, "#3"), Ok(Location::Volume(3)));
        assert_eq!(resolve(&catalog, "1:101"), Ok(Location::Book(101)));
        let Ok(Location::Chapter(pos)) = resolve(&catalog, "2:104") else {
            panic!("undivided book should open its content");
        };
        assert_eq!(pos.chapter(), 0);
        let Ok(Location::Chapter(pos)) = resolve(&catalog, "https://host/mapscrip/#1:103") else {
            panic!("single-chapter book should open chapter 1");
        };
        assert_eq!((pos.book_id(), pos.chapter()), (103, 1));
    }

    #[tokio::test]
    async fn chapter_markup_becomes_merged_markers() {
        let source = MemorySource::sample();
        let catalog = load_catalog(&source).await.unwrap();
        let mut session = Session::new(Settings::default(), catalog);

        let request = session.navigate("1:101:12");
        assert!(matches!(request.view, View::Chapter { ref title, .. } if title == "Genesis 12"));
        let fetch = request.fetch.unwrap();
        let result = source.fetch_chapter(&fetch.request).await;

        let ChapterOutcome::Rendered {
            generation,
            references,
        } = session.accept_chapter(fetch.generation, result)
        else {
            panic!("chapter should render");
        };
        assert_eq!(references.len(), 4);
        assert_eq!(session.chapter().unwrap().lines[0], "Genesis 12");

        let update = session.install_markers(generation, &references).unwrap();
        let labels: Vec<String> = update.markers.iter().map(|m| m.label()).collect();
        assert_eq!(labels, vec!["Sichem, Moreh", "Beth-el"]);
        let Viewport::Fit(bounds) = update.viewport else {
            panic!("two markers should fit bounds");
        };
        assert!((bounds.north - 32.2137).abs() < 1e-9);
        assert!((bounds.south - 31.9305).abs() < 1e-9);
    }

    #[tokio::test]
    async fn alternate_text_source_is_requested_after_toggle() {
        let source = MemorySource::sample();
        let catalog = load_catalog(&source).await.unwrap();
        let mut session = Session::new(Settings::default(), catalog);

        session.navigate("1:101:12");
        let fetch = session.toggle_text_source().unwrap().fetch.unwrap();
        let result = source.fetch_chapter(&fetch.request).await;
        let outcome = session.accept_chapter(fetch.generation, result);
        assert!(matches!(outcome, ChapterOutcome::Rendered { .. }));
        assert_eq!(session.chapter().unwrap().lines[0], "Genesis 12 (JST)");
        assert!(source.requests().last().unwrap().jst);
    }

    #[tokio::test]
    async fn slow_response_for_an_old_chapter_is_ignored() {
        let source = MemorySource::sample().with_chapter(101, 13, false, "<p>Genesis 13</p>");
        let catalog = load_catalog(&source).await.unwrap();
        let mut session = Session::new(Settings::default(), catalog);

        let first = session.navigate("1:101:12").fetch.unwrap();
        let second = session.next().unwrap().fetch.unwrap();

        let late = source.fetch_chapter(&first.request).await;
        let current = source.fetch_chapter(&second.request).await;

        let outcome = session.accept_chapter(second.generation, current);
        assert!(matches!(outcome, ChapterOutcome::Rendered { .. }));
        assert_eq!(
            session.accept_chapter(first.generation, late),
            ChapterOutcome::Stale
        );
        assert_eq!(session.chapter().unwrap().title, "Genesis 13");
    }

    #[tokio::test]
    async fn missing_chapter_reports_fetch_error() {
        let source = MemorySource::sample();
        let catalog = load_catalog(&source).await.unwrap();
        let mut session = Session::new(Settings::default(), catalog);

        let fetch = session.navigate("3:107:76").fetch.unwrap();
        let result = source.fetch_chapter(&fetch.request).await;
        let outcome = session.accept_chapter(fetch.generation, result);
        assert!(matches!(
            outcome,
            ChapterOutcome::Failed(FetchError::Status { status: 404, .. })
        ));
        assert!(session.chapter().is_none());
    }
}
