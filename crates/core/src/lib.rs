//! Core domain types for Scriptures, Mapped.

use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod error;
pub mod geo;
pub mod location;
pub mod sequence;
pub mod source;

pub use catalog::{Book, Catalog, Volume};
pub use error::{CatalogError, FetchError, LoadError};
pub use geo::{Bounds, GeoPlace, GeoPoint, Marker, MarkerSet, Viewport};
pub use location::{Address, ChapterPos, Fallback, Location};
pub use sequence::{ChapterRef, next_chapter, previous_chapter};
pub use source::{CatalogSource, ChapterDocument, ChapterRequest, ChapterSource};

pub const DEFAULT_BASE_URL: &str = "https://scriptures.byu.edu/mapscrip";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub text_source: TextSource,
    pub default_center: GeoPoint,
    pub default_zoom: u8,
    pub marker_retry: RetrySettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    Standard,
    Jst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub initial_delay_ms: u64,
    pub ceiling_ms: u64,
}

impl TextSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextSource::Standard => "standard",
            TextSource::Jst => "jst",
        }
    }

    pub fn is_jst(&self) -> bool {
        matches!(self, TextSource::Jst)
    }
}

impl std::fmt::Display for TextSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TextSource {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(TextSource::Standard),
            "jst" => Ok(TextSource::Jst),
            _ => Err("unknown text source"),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            initial_delay_ms: 500,
            ceiling_ms: 5_000,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            text_source: TextSource::Standard,
            default_center: GeoPoint::DEFAULT_CENTER,
            default_zoom: geo::DEFAULT_ZOOM,
            marker_retry: RetrySettings::default(),
        }
    }
}

impl Settings {
    pub fn normalize(&mut self) {
        let base_url = self.base_url.trim().trim_end_matches('/');
        self.base_url = if base_url.is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            base_url.to_string()
        };
        self.default_zoom = self.default_zoom.clamp(1, geo::MAX_ZOOM_HINT);
        if !self.default_center.latitude.is_finite() || !self.default_center.longitude.is_finite() {
            self.default_center = GeoPoint::DEFAULT_CENTER;
        }
        self.default_center.latitude = self.default_center.latitude.clamp(-90.0, 90.0);
        self.default_center.longitude = self.default_center.longitude.clamp(-180.0, 180.0);
        self.marker_retry.initial_delay_ms = self.marker_retry.initial_delay_ms.clamp(10, 60_000);
        self.marker_retry.ceiling_ms = self
            .marker_retry
            .ceiling_ms
            .max(self.marker_retry.initial_delay_ms);
    }

    pub fn cycle_text_source(&mut self) {
        self.text_source = match self.text_source {
            TextSource::Standard => TextSource::Jst,
            TextSource::Jst => TextSource::Standard,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_point_at_service() {
        let settings = Settings::default();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.default_zoom, 8);
    }

    #[test]
    fn cycle_text_source_rotates() {
        let mut settings = Settings::default();
        assert_eq!(settings.text_source, TextSource::Standard);
        settings.cycle_text_source();
        assert!(settings.text_source.is_jst());
        settings.cycle_text_source();
        assert_eq!(settings.text_source, TextSource::Standard);
    }

    #[test]
    fn text_source_parses_strings() {
        assert_eq!("jst".parse::<TextSource>().unwrap(), TextSource::Jst);
        assert_eq!(
            " Standard ".parse::<TextSource>().unwrap(),
            TextSource::Standard
        );
        assert!("nope".parse::<TextSource>().is_err());
    }

    #[test]
    fn settings_normalizes_fields() {
        let mut settings = Settings {
            base_url: " http://localhost:8080/mapscrip/ ".to_string(),
            text_source: TextSource::Standard,
            default_center: GeoPoint::new(120.0, f64::NAN),
            default_zoom: 40,
            marker_retry: RetrySettings {
                initial_delay_ms: 0,
                ceiling_ms: 1,
            },
        };
        settings.normalize();
        assert_eq!(settings.base_url, "http://localhost:8080/mapscrip");
        assert_eq!(settings.default_center, GeoPoint::DEFAULT_CENTER);
        assert_eq!(settings.default_zoom, 18);
        assert_eq!(settings.marker_retry.initial_delay_ms, 10);
        assert_eq!(settings.marker_retry.ceiling_ms, 10);
    }

    #[test]
    fn settings_fill_missing_fields() {
        let settings: Settings =
            serde_json::from_str(r#"{"text_source":"jst","marker_retry":{"ceiling_ms":900}}"#)
                .unwrap();
        assert!(settings.text_source.is_jst());
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.marker_retry.initial_delay_ms, 500);
        assert_eq!(settings.marker_retry.ceiling_ms, 900);
    }
}
