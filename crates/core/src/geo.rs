//! Geocoded references, map markers and the viewport that frames them.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ZOOM: u8 = 8;
pub const MIN_ZOOM_HINT: u8 = 6;
pub const MAX_ZOOM_HINT: u8 = 18;
const ALTITUDE_PER_ZOOM_LEVEL: f64 = 450.0;

const NUMBER: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?";

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    let n = NUMBER;
    let pattern = format!(
        r"^\s*(?:showLocation\s*)?\(\s*(\d+)\s*,\s*'(.*)'\s*,\s*({n})\s*,\s*({n})\s*,\s*({n})\s*,\s*({n})\s*,\s*({n})\s*,\s*({n})\s*,\s*({n})\s*,\s*({n})\s*,\s*'(.*)'\s*\)\s*;?\s*$"
    );
    Regex::new(&pattern).expect("reference pattern compiles")
});

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Jerusalem.
    pub const DEFAULT_CENTER: GeoPoint = GeoPoint {
        latitude: 31.7683,
        longitude: 35.2137,
    };

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One `showLocation(...)` reference from chapter content.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPlace {
    pub id: u32,
    pub name: String,
    pub flag: String,
    pub latitude: f64,
    pub longitude: f64,
    pub view_latitude: f64,
    pub view_longitude: f64,
    pub view_tilt: f64,
    pub view_roll: f64,
    pub view_altitude: f64,
    pub view_heading: f64,
}

impl GeoPlace {
    /// Returns `None` for anything that is not a well-formed reference.
    pub fn parse(reference: &str) -> Option<Self> {
        let caps = REFERENCE.captures(reference)?;
        let number = |i: usize| caps.get(i)?.as_str().parse::<f64>().ok();
        Some(Self {
            id: caps.get(1)?.as_str().parse().ok()?,
            name: caps.get(2)?.as_str().trim().to_string(),
            latitude: number(3)?,
            longitude: number(4)?,
            view_latitude: number(5)?,
            view_longitude: number(6)?,
            view_tilt: number(7)?,
            view_roll: number(8)?,
            view_altitude: number(9)?,
            view_heading: number(10)?,
            flag: caps.get(11)?.as_str().trim().to_string(),
        })
    }

    pub fn label(&self) -> String {
        if self.flag.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.flag)
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    pub fn zoom_hint(&self) -> u8 {
        zoom_for_altitude(self.view_altitude)
    }
}

/// Zoom level for a camera altitude, `round(altitude / 450)` kept in `[6, 18]`.
pub fn zoom_for_altitude(altitude: f64) -> u8 {
    let zoom = (altitude / ALTITUDE_PER_ZOOM_LEVEL).round();
    if !zoom.is_finite() {
        return MIN_ZOOM_HINT;
    }
    zoom.clamp(MIN_ZOOM_HINT as f64, MAX_ZOOM_HINT as f64) as u8
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub labels: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Zoom hint of the first reference placed here.
    pub zoom_hint: u8,
}

impl Marker {
    pub fn label(&self) -> String {
        self.labels.join(", ")
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Markers for the chapter on screen, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerSet {
    markers: Vec<Marker>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and merges every reference, skipping the ones that do not parse.
    pub fn from_references<'a>(references: impl IntoIterator<Item = &'a str>) -> Self {
        let mut set = Self::new();
        set.extend_references(references);
        set
    }

    /// Returns how many references parsed.
    pub fn extend_references<'a>(&mut self, references: impl IntoIterator<Item = &'a str>) -> usize {
        let mut parsed = 0;
        for reference in references {
            if let Some(place) = GeoPlace::parse(reference) {
                self.add(&place);
                parsed += 1;
            }
        }
        parsed
    }

    /// Merges `place` into the marker at the same coordinate, or appends a
    /// new marker. Coordinates compare with exact equality.
    pub fn add(&mut self, place: &GeoPlace) {
        let label = place.label();
        let existing = self
            .markers
            .iter_mut()
            .find(|m| m.latitude == place.latitude && m.longitude == place.longitude);

        match existing {
            Some(marker) => {
                if !marker.labels.contains(&label) {
                    marker.labels.push(label);
                }
            }
            None => self.markers.push(Marker {
                labels: vec![label],
                latitude: place.latitude,
                longitude: place.longitude,
                zoom_hint: place.zoom_hint(),
            }),
        }
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::around(self.markers.iter().map(Marker::point))
    }

    /// Frames the markers; with none, falls back to the given home view.
    pub fn viewport(&self, default_center: GeoPoint, default_zoom: u8) -> Viewport {
        let home = Viewport::Center {
            center: default_center,
            zoom: default_zoom,
        };
        match self.markers.as_slice() {
            [] => home,
            [only] => Viewport::Center {
                center: only.point(),
                zoom: DEFAULT_ZOOM,
            },
            _ => self.bounds().map_or(home, Viewport::Fit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn around(points: impl IntoIterator<Item = GeoPoint>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Bounds {
            south: first.latitude,
            west: first.longitude,
            north: first.latitude,
            east: first.longitude,
        };
        for p in points {
            bounds.south = bounds.south.min(p.latitude);
            bounds.north = bounds.north.max(p.latitude);
            bounds.west = bounds.west.min(p.longitude);
            bounds.east = bounds.east.max(p.longitude);
        }
        Some(bounds)
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.south..=self.north).contains(&point.latitude)
            && (self.west..=self.east).contains(&point.longitude)
    }
}

/// What the map widget should show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Viewport {
    Center { center: GeoPoint, zoom: u8 },
    Fit(Bounds),
}
