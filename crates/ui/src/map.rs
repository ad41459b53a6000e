//! World map canvas standing in for the map widget.

use mapscrip_application::MapUpdate;
use mapscrip_core::{Bounds, Marker, Viewport};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Map, MapResolution, Points};
use ratatui::widgets::{Block, Borders};

const MIN_WIDTH: u16 = 20;
const MIN_HEIGHT: u16 = 8;
const FIT_PADDING: f64 = 0.15;
const MIN_FIT_SPAN: f64 = 0.5;
/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f64 = 2.0;

#[derive(Debug, Clone)]
pub(crate) struct MapPanel {
    markers: Vec<Marker>,
    viewport: Viewport,
    focused: Option<usize>,
    area: Option<Rect>,
}

impl MapPanel {
    pub(crate) fn new(update: MapUpdate) -> Self {
        Self {
            markers: update.markers,
            viewport: update.viewport,
            focused: update.focused,
            area: None,
        }
    }

    pub(crate) fn apply(&mut self, update: MapUpdate) {
        self.markers = update.markers;
        self.viewport = update.viewport;
        self.focused = update.focused;
    }

    /// The map only counts as initialized once it has been laid out with
    /// enough room to draw.
    pub(crate) fn is_ready(&self) -> bool {
        self.area.is_some()
    }

    pub(crate) fn detach(&mut self) {
        self.area = None;
    }

    #[cfg(test)]
    pub(crate) fn attach(&mut self, area: Rect) {
        self.area = Some(area);
    }

    pub(crate) fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub(crate) fn focused(&self) -> Option<usize> {
        self.focused
    }

    fn title(&self) -> String {
        match self.focused.and_then(|i| self.markers.get(i)) {
            Some(marker) => format!("Map: {}", marker.label()),
            None if self.markers.is_empty() => "Map".to_string(),
            None => format!("Map: {} places", self.markers.len()),
        }
    }

    pub(crate) fn draw(&mut self, frame: &mut ratatui::Frame, area: Rect, accent: Color) {
        let inner_width = area.width.saturating_sub(2);
        let inner_height = area.height.saturating_sub(2);
        self.area = (area.width >= MIN_WIDTH && area.height >= MIN_HEIGHT).then_some(area);

        let block = Block::default().borders(Borders::ALL).title(self.title());

        let (x_bounds, y_bounds) = viewport_bounds(&self.viewport, inner_width, inner_height);
        let markers = &self.markers;
        let focused = self.focused;
        let canvas = Canvas::default()
            .block(block)
            .marker(symbols::Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(move |ctx| {
                ctx.draw(&Map {
                    color: Color::DarkGray,
                    resolution: MapResolution::High,
                });
                ctx.layer();
                for (i, marker) in markers.iter().enumerate() {
                    let color = if Some(i) == focused { accent } else { Color::Red };
                    ctx.draw(&Points {
                        coords: &[(marker.longitude, marker.latitude)],
                        color,
                    });
                    ctx.print(
                        marker.longitude,
                        marker.latitude,
                        Span::styled(
                            format!(" {}", marker.label()),
                            Style::default().fg(color).add_modifier(Modifier::BOLD),
                        ),
                    );
                }
            });
        frame.render_widget(canvas, area);
    }
}

/// Longitude and latitude ranges for a canvas of `width` × `height` cells.
pub(crate) fn viewport_bounds(viewport: &Viewport, width: u16, height: u16) -> ([f64; 2], [f64; 2]) {
    let aspect = if width == 0 {
        1.0
    } else {
        (height.max(1) as f64 * CELL_ASPECT) / width as f64
    };

    let (center_lng, center_lat, lng_span, lat_span) = match viewport {
        Viewport::Center { center, zoom } => {
            let lng_span = zoom_span(*zoom);
            (center.longitude, center.latitude, lng_span, lng_span * aspect)
        }
        Viewport::Fit(bounds) => {
            let (lng_span, lat_span) = fit_spans(bounds, aspect);
            let center = bounds.center();
            (center.longitude, center.latitude, lng_span, lat_span)
        }
    };

    let lng_span = lng_span.min(360.0);
    let lat_span = lat_span.min(180.0);
    (
        clamp_range(center_lng, lng_span, 180.0),
        clamp_range(center_lat, lat_span, 90.0),
    )
}

/// Degrees of longitude visible at a zoom level; zoom 2 shows the world.
fn zoom_span(zoom: u8) -> f64 {
    360.0 / 2f64.powi(zoom as i32 - 2)
}

fn fit_spans(bounds: &Bounds, aspect: f64) -> (f64, f64) {
    let lng = ((bounds.east - bounds.west) * (1.0 + 2.0 * FIT_PADDING)).max(MIN_FIT_SPAN);
    let lat = ((bounds.north - bounds.south) * (1.0 + 2.0 * FIT_PADDING)).max(MIN_FIT_SPAN);
    // Grow whichever side is short so the region keeps the canvas shape.
    if lat > lng * aspect {
        (lat / aspect, lat)
    } else {
        (lng, lng * aspect)
    }
}

/// A range of `span` around `center`, shifted back inside `[-limit, limit]`.
fn clamp_range(center: f64, span: f64, limit: f64) -> [f64; 2] {
    let half = span / 2.0;
    let mut low = center - half;
    let mut high = center + half;
    if low < -limit {
        high += -limit - low;
        low = -limit;
    }
    if high > limit {
        low -= high - limit;
        high = limit;
    }
    [low.max(-limit), high]
}
