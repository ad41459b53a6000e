//! HTTP access to the scripture content service.

use std::collections::BTreeMap;
use std::time::Duration;

use mapscrip_core::{
    Book, CatalogSource, ChapterDocument, ChapterRequest, ChapterSource, FetchError, Volume,
};
use reqwest::{Client, Url};
use serde::Deserialize;

pub mod document;

pub use document::extract_document;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct ContentClient {
    http: Client,
    base_url: String,
}

/// The book list is served as an object keyed by book id; a plain list is
/// accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BookList {
    Keyed(BTreeMap<String, Book>),
    List(Vec<Book>),
}

impl ContentClient {
    pub fn new(base_url: impl Into<String>) -> reqwest::Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("mapscrip/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn books_url(&self) -> String {
        format!("{}/model/books.php", self.base_url)
    }

    pub fn volumes_url(&self) -> String {
        format!("{}/model/volumes.php", self.base_url)
    }

    pub fn chapter_url(&self, request: &ChapterRequest) -> Result<Url, FetchError> {
        let endpoint = format!("{}/mapgetscrip.php", self.base_url);
        let book = request.book_id.to_string();
        let chapter = request.chapter.to_string();
        let params = [
            ("book", book.as_str()),
            ("chap", chapter.as_str()),
            ("verses", request.verses.as_deref().unwrap_or("")),
            ("jst", if request.jst { "JST" } else { "" }),
        ];
        Url::parse_with_params(&endpoint, &params).map_err(|err| FetchError::Transport {
            url: endpoint.clone(),
            message: err.to_string(),
        })
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        log::debug!("GET {url}");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| FetchError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|err| FetchError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        })
    }
}

impl CatalogSource for ContentClient {
    async fn fetch_books(&self) -> Result<Vec<Book>, FetchError> {
        let url = self.books_url();
        let body = self.get_text(&url).await?;
        parse_books(&url, &body)
    }

    async fn fetch_volumes(&self) -> Result<Vec<Volume>, FetchError> {
        let url = self.volumes_url();
        let body = self.get_text(&url).await?;
        parse_volumes(&url, &body)
    }
}

impl ChapterSource for ContentClient {
    async fn fetch_chapter(&self, request: &ChapterRequest) -> Result<ChapterDocument, FetchError> {
        let url = self.chapter_url(request)?;
        let body = self.get_text(url.as_str()).await?;
        let document = extract_document(&body);
        log::debug!(
            "chapter {}:{} has {} lines and {} handlers",
            request.book_id,
            request.chapter,
            document.lines.len(),
            document.references.len()
        );
        Ok(document)
    }
}

pub fn parse_books(url: &str, body: &str) -> Result<Vec<Book>, FetchError> {
    let list: BookList = serde_json::from_str(body).map_err(|err| FetchError::Decode {
        url: url.to_string(),
        message: err.to_string(),
    })?;
    let mut books = match list {
        BookList::Keyed(map) => map.into_values().collect::<Vec<_>>(),
        BookList::List(books) => books,
    };
    books.sort_by_key(|b| b.id);
    Ok(books)
}

pub fn parse_volumes(url: &str, body: &str) -> Result<Vec<Volume>, FetchError> {
    serde_json::from_str(body).map_err(|err| FetchError::Decode {
        url: url.to_string(),
        message: err.to_string(),
    })
}
