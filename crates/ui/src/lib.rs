//! Terminal renderer for a browsing [`Session`].

use std::io::{self, Stdout};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{event, terminal};
use mapscrip_application::{
    Backoff, ChapterFetch, ChapterOutcome, MarkerPoll, MarkerScheduler, RenderRequest,
    ROOT_CRUMB, Session, View,
};
use mapscrip_core::{Address, ChapterDocument, ChapterPos, ChapterSource, FetchError, Location};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, Paragraph, Wrap,
};
use tokio::runtime::Handle;
use unicode_width::UnicodeWidthStr;

mod map;

use map::MapPanel;

const ACCENT: Color = Color::Yellow;
const CRUMB_SEPARATOR: &str = " › ";

/// A finished chapter fetch, tagged with the navigation that issued it.
#[derive(Debug)]
struct FetchDone {
    generation: u64,
    result: Result<ChapterDocument, FetchError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    label: String,
    detail: String,
    target: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Warning,
}

#[derive(Debug, Clone)]
struct Status {
    kind: StatusKind,
    text: String,
}

#[derive(Debug, Default)]
struct AddressPanel {
    open: bool,
    input: String,
}

pub struct Ui<S> {
    session: Session,
    source: S,
    runtime: Handle,
    fetch_tx: Sender<FetchDone>,
    fetch_rx: Receiver<FetchDone>,
    request: RenderRequest,
    selected: usize,
    scroll: u16,
    text_rows: u16,
    loading: bool,
    status: Option<Status>,
    address_panel: AddressPanel,
    scheduler: MarkerScheduler,
    map: MapPanel,
}

impl<S> Ui<S>
where
    S: ChapterSource + Clone + Send + Sync + 'static,
{
    /// Chapter fetches are spawned on `runtime` and their results picked up
    /// by the event loop.
    pub fn new(session: Session, source: S, runtime: Handle) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::channel();
        let request = session.render_request();
        let backoff = Backoff::from_settings(&session.settings.marker_retry);
        let scheduler = MarkerScheduler::new(backoff);
        let map = MapPanel::new(session.overview_map());
        Self {
            session,
            source,
            runtime,
            fetch_tx,
            fetch_rx,
            request,
            selected: 0,
            scroll: 0,
            text_rows: 0,
            loading: false,
            status: None,
            address_panel: AddressPanel::default(),
            scheduler,
            map,
        }
    }

    /// Opens `address` and runs until the user quits, handing back the
    /// session as it was left.
    pub fn run(&mut self, address: &str) -> anyhow::Result<Session> {
        let request = self.session.navigate(address);
        self.open(request);

        let mut terminal = setup_terminal()?;
        terminal.clear().ok();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        let restore_result = restore_terminal(&mut terminal);

        match (result, restore_result) {
            (Ok(Ok(outcome)), Ok(())) => Ok(outcome),
            (Ok(Ok(_)), Err(err)) => Err(err),
            (Ok(Err(err)), Ok(())) => Err(err),
            (Ok(_), Err(err)) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<Session> {
        let tick_rate = Duration::from_millis(250);
        let mut needs_redraw = true;

        loop {
            needs_redraw |= self.drain_fetches();

            if needs_redraw {
                terminal.draw(|frame| self.draw(frame.area(), frame))?;
                needs_redraw = false;
            }

            // The map learns its size while drawing, so markers go in after.
            if self.poll_markers(Instant::now()) {
                terminal.draw(|frame| self.draw(frame.area(), frame))?;
            }

            let timeout = self
                .scheduler
                .due()
                .map(|due| due.saturating_duration_since(Instant::now()).min(tick_rate))
                .unwrap_or(tick_rate);
            if !event::poll(timeout)? {
                continue;
            }

            match event::read()? {
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }

                    needs_redraw = true;

                    let quit = if self.address_panel.open {
                        self.handle_address_panel_key(key)?
                    } else {
                        self.handle_main_key(key)?
                    };
                    if quit {
                        return Ok(self.session.clone());
                    }
                }
                _ => {}
            }
        }
    }

    /// Shows `request` and starts its chapter fetch, if any.
    fn open(&mut self, request: RenderRequest) {
        let previous = self.request.location;
        self.request = request;
        self.address_panel.open = false;
        self.selected = self.selection_for(previous);

        match self.request.fetch.clone() {
            Some(fetch) => {
                self.loading = true;
                self.status = Some(Status {
                    kind: StatusKind::Info,
                    text: format!("Loading {}…", self.view_title()),
                });
                self.spawn_fetch(fetch);
            }
            None => {
                self.loading = false;
                self.status = None;
                self.scroll = 0;
                self.scheduler.cancel();
                self.map.apply(self.session.overview_map());
            }
        }
    }

    fn spawn_fetch(&self, fetch: ChapterFetch) {
        log::debug!(
            "fetching {}:{} for generation {}",
            fetch.request.book_id,
            fetch.request.chapter,
            fetch.generation
        );
        let source = self.source.clone();
        let tx = self.fetch_tx.clone();
        self.runtime.spawn(async move {
            let result = source.fetch_chapter(&fetch.request).await;
            // The receiver is gone once the UI has exited.
            let _ = tx.send(FetchDone {
                generation: fetch.generation,
                result,
            });
        });
    }

    fn drain_fetches(&mut self) -> bool {
        let mut changed = false;
        while let Ok(done) = self.fetch_rx.try_recv() {
            match self.session.accept_chapter(done.generation, done.result) {
                ChapterOutcome::Stale => {}
                ChapterOutcome::Failed(err) => {
                    self.loading = false;
                    self.status = Some(Status {
                        kind: StatusKind::Warning,
                        text: format!("Could not load {}: {err}", self.view_title()),
                    });
                    changed = true;
                }
                ChapterOutcome::Rendered {
                    generation,
                    references,
                } => {
                    self.loading = false;
                    self.status = None;
                    self.scroll = 0;
                    // The old chapter's places must not linger until the new ones land.
                    self.map.apply(self.session.overview_map());
                    self.scheduler.schedule(generation, references, Instant::now());
                    changed = true;
                }
            }
        }
        changed
    }

    fn poll_markers(&mut self, now: Instant) -> bool {
        match self.scheduler.poll(now, self.map.is_ready()) {
            MarkerPoll::Ready {
                generation,
                references,
            } => match self.session.install_markers(generation, &references) {
                Some(update) => {
                    self.map.apply(update);
                    true
                }
                None => false,
            },
            MarkerPoll::Abandoned { .. } => {
                self.map.apply(self.session.overview_map());
                self.status = Some(Status {
                    kind: StatusKind::Warning,
                    text: "Map is too small to show places; enlarge the window".to_string(),
                });
                true
            }
            MarkerPoll::Idle | MarkerPoll::Waiting { .. } => false,
        }
    }

    /// Returns `true` when the key ends the session.
    fn handle_main_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(true);
            }
            KeyCode::Char('g') | KeyCode::Char(':') => {
                self.address_panel.open = true;
                self.address_panel.input = self.request.address.clone();
                return Ok(false);
            }
            KeyCode::Char('j') => {
                match self.session.toggle_text_source() {
                    Some(request) => self.open(request),
                    None => {
                        self.status = Some(Status {
                            kind: StatusKind::Info,
                            text: format!("Text source: {}", self.session.settings.text_source),
                        });
                    }
                }
                return Ok(false);
            }
            KeyCode::Esc | KeyCode::Backspace => {
                if self.request.location == Location::Home {
                    return Ok(key.code == KeyCode::Esc);
                }
                let request = self.session.up();
                self.open(request);
                return Ok(false);
            }
            _ => {}
        }

        if matches!(self.request.view, View::Chapter { .. }) {
            self.handle_chapter_key(key);
        } else {
            self.handle_list_key(key);
        }
        Ok(false)
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        let len = self.entries().len();
        if len == 0 {
            return;
        }
        match key.code {
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                self.selected = (self.selected + 1).min(len - 1);
            }
            KeyCode::PageUp => {
                self.selected = self.selected.saturating_sub(10);
            }
            KeyCode::PageDown => {
                self.selected = (self.selected + 10).min(len - 1);
            }
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = len - 1,
            KeyCode::Enter | KeyCode::Right => {
                if let Some(entry) = self.entries().into_iter().nth(self.selected) {
                    let request = self.session.go(entry.target);
                    self.open(request);
                }
            }
            _ => {}
        }
    }

    fn handle_chapter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                self.scroll = self.scroll.saturating_add(1);
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(self.text_rows.max(1));
            }
            KeyCode::PageDown | KeyCode::Char(' ') => {
                self.scroll = self.scroll.saturating_add(self.text_rows.max(1));
            }
            KeyCode::Home => self.scroll = 0,
            KeyCode::Char('n') | KeyCode::Right => match self.session.next() {
                Some(request) => self.open(request),
                None => self.notice("Already at the last chapter"),
            },
            KeyCode::Char('p') | KeyCode::Left => match self.session.previous() {
                Some(request) => self.open(request),
                None => self.notice("Already at the first chapter"),
            },
            KeyCode::Char('r') => {
                let location = self.request.location;
                let request = self.session.go(location);
                self.open(request);
            }
            KeyCode::Tab => self.cycle_marker(true),
            KeyCode::BackTab => self.cycle_marker(false),
            KeyCode::Char('f') => {
                if !self.session.markers().is_empty() {
                    self.map.apply(self.session.overview_map());
                }
            }
            _ => {}
        }
    }

    /// Jumps the map to the next or previous place in the chapter.
    fn cycle_marker(&mut self, forward: bool) {
        let len = self.map.markers().len();
        if len == 0 {
            self.notice("No places in this chapter");
            return;
        }
        let index = match (self.map.focused(), forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        };
        if let Some(update) = self.session.focus_marker(index) {
            self.map.apply(update);
        }
    }

    fn handle_address_panel_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        match key.code {
            KeyCode::Esc => {
                self.address_panel.open = false;
                self.address_panel.input.clear();
            }
            KeyCode::Enter => {
                let input = std::mem::take(&mut self.address_panel.input);
                let request = self.session.navigate(&input);
                let fell_back =
                    request.location == Location::Home && !Address::parse(&input).is_empty();
                self.open(request);
                if fell_back {
                    self.notice(&format!("No such place: {}", input.trim()));
                }
            }
            KeyCode::Backspace => {
                self.address_panel.input.pop();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.address_panel.input.clear();
            }
            KeyCode::Char(ch) if ch.is_ascii_digit() || ch == ':' || ch == '#' => {
                self.address_panel.input.push(ch);
            }
            _ => {}
        }
        Ok(false)
    }

    fn notice(&mut self, text: &str) {
        self.status = Some(Status {
            kind: StatusKind::Info,
            text: text.to_string(),
        });
    }

    /// Selectable rows for the list views; empty for a chapter.
    fn entries(&self) -> Vec<Entry> {
        let catalog = self.session.catalog();
        match &self.request.view {
            View::Home => catalog
                .volumes()
                .iter()
                .map(|volume| Entry {
                    label: volume.full_name.clone(),
                    detail: plural(catalog.books_in(volume.id).count(), "book"),
                    target: Location::Volume(volume.id),
                })
                .collect(),
            View::Volume { volume_id } => catalog
                .books_in(*volume_id)
                .filter_map(|book| {
                    let target = Location::for_book(catalog, book.id)?;
                    let detail = match book.num_chapters {
                        0 => String::new(),
                        n => plural(n as usize, "chapter"),
                    };
                    Some(Entry {
                        label: book.full_name.clone(),
                        detail,
                        target,
                    })
                })
                .collect(),
            View::Book { book_id } => catalog
                .book(*book_id)
                .map(|book| {
                    (1..=book.num_chapters)
                        .filter_map(|chapter| {
                            let pos = ChapterPos::new(catalog, book.id, chapter)?;
                            Some(Entry {
                                label: book.chapter_title(chapter),
                                detail: String::new(),
                                target: Location::Chapter(pos),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default(),
            View::Chapter { .. } => Vec::new(),
        }
    }

    /// After moving up, keep the row we came from selected.
    fn selection_for(&self, previous: Location) -> usize {
        let catalog = self.session.catalog();
        self.entries()
            .iter()
            .position(|entry| match self.request.view {
                View::Home => entry.target.volume_id(catalog) == previous.volume_id(catalog),
                View::Volume { .. } => {
                    previous.book_id().is_some() && entry.target.book_id() == previous.book_id()
                }
                _ => entry.target == previous,
            })
            .unwrap_or(0)
    }

    fn view_title(&self) -> String {
        let catalog = self.session.catalog();
        match &self.request.view {
            View::Home => ROOT_CRUMB.to_string(),
            View::Volume { volume_id } => catalog
                .volume(*volume_id)
                .map(|v| v.full_name.clone())
                .unwrap_or_default(),
            View::Book { book_id } => catalog
                .book(*book_id)
                .map(|b| b.full_name.clone())
                .unwrap_or_default(),
            View::Chapter { title, .. } => title.clone(),
        }
    }

    fn draw(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        frame.render_widget(Clear, area);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(area);

        let header = Paragraph::new(Text::from(self.header_lines()))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(header, layout[0]);

        if matches!(self.request.view, View::Chapter { .. }) {
            self.draw_chapter(frame, layout[1]);
        } else {
            self.map.detach();
            self.draw_listing(frame, layout[1]);
        }

        let footer = Paragraph::new(Text::from(self.footer_lines()))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::TOP));
        frame.render_widget(footer, layout[2]);

        if self.address_panel.open {
            self.draw_address_panel(area, frame);
        }
    }

    fn header_lines(&self) -> Vec<Line<'static>> {
        let mut spans = Vec::new();
        for (i, crumb) in self.request.breadcrumbs.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(CRUMB_SEPARATOR));
            }
            let style = if i + 1 == self.request.breadcrumbs.len() {
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            spans.push(Span::styled(crumb.label.clone(), style));
        }

        let address = if self.request.address.is_empty() {
            "#".to_string()
        } else {
            format!("#{}", self.request.address)
        };
        let source = format!("{} text", self.session.settings.text_source);
        vec![
            Line::from(spans),
            Line::from(Span::styled(
                format!("{address}  ·  {source}"),
                Style::default().fg(Color::DarkGray),
            )),
        ]
    }

    fn footer_lines(&self) -> Vec<Line<'static>> {
        let hint = match self.request.view {
            View::Chapter { .. } => {
                "n/p chapter  ↑↓ scroll  Tab place  f fit  j text  g go  Esc up  q quit"
            }
            View::Home => "↑↓ select  Enter open  g go  j text  q quit",
            _ => "↑↓ select  Enter open  Esc up  g go  j text  q quit",
        };
        let status = match &self.status {
            Some(Status {
                kind: StatusKind::Warning,
                text,
            }) => Line::from(Span::styled(
                text.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Some(Status {
                kind: StatusKind::Info,
                text,
            }) => Line::from(Span::styled(text.clone(), Style::default().fg(ACCENT))),
            None => Line::raw(""),
        };
        vec![Line::raw(hint), status]
    }

    fn draw_listing(&self, frame: &mut ratatui::Frame, area: Rect) {
        let entries = self.entries();
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.view_title());
        if entries.is_empty() {
            let paragraph = Paragraph::new("Nothing here.").block(block);
            frame.render_widget(paragraph, body[0]);
        } else {
            let max_width = body[0].width.saturating_sub(6) as usize;
            let items: Vec<ListItem> = entries
                .iter()
                .map(|entry| {
                    let text = if entry.detail.is_empty() {
                        entry.label.clone()
                    } else {
                        format!("{} ({})", entry.label, entry.detail)
                    };
                    let lines = wrap_text(&text, max_width.max(8))
                        .into_iter()
                        .map(Line::raw)
                        .collect::<Vec<_>>();
                    ListItem::new(Text::from(lines))
                })
                .collect();

            let highlight_style = Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD);
            let list = List::new(items)
                .block(block)
                .highlight_style(highlight_style)
                .highlight_symbol("> ")
                .highlight_spacing(HighlightSpacing::Always);

            let mut state = ListState::default();
            state.select(Some(self.selected.min(entries.len() - 1)));
            frame.render_stateful_widget(list, body[0], &mut state);
        }

        let details = Paragraph::new(Text::from(self.detail_lines(&entries, body[1].width)))
            .block(Block::default().borders(Borders::ALL).title("Contents"));
        frame.render_widget(details, body[1]);
    }

    /// Preview of the highlighted row: a volume's books or a book's chapters.
    fn detail_lines(&self, entries: &[Entry], width: u16) -> Vec<Line<'static>> {
        let catalog = self.session.catalog();
        let max_width = width.saturating_sub(2) as usize;
        let Some(entry) = entries.get(self.selected) else {
            return Vec::new();
        };

        let text = match entry.target {
            Location::Volume(volume_id) => catalog
                .books_in(volume_id)
                .map(|b| b.grid_name.as_str())
                .collect::<Vec<_>>()
                .join(" · "),
            Location::Book(book_id) => catalog
                .book(book_id)
                .map(|b| {
                    (1..=b.num_chapters)
                        .map(|c| c.to_string())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default(),
            Location::Chapter(pos) => catalog
                .book(pos.book_id())
                .map(|b| format!("{} opens directly.", b.chapter_title(pos.chapter())))
                .unwrap_or_default(),
            Location::Home => String::new(),
        };

        let mut lines = vec![Line::from(Span::styled(
            entry.label.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        lines.push(Line::raw(""));
        lines.extend(wrap_text(&text, max_width).into_iter().map(Line::raw));
        lines
    }

    fn draw_chapter(&mut self, frame: &mut ratatui::Frame, area: Rect) {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let chapter = self.session.chapter();
        let title = match (chapter, &self.request.view) {
            (Some(content), _) if !self.loading => content.title.clone(),
            (_, View::Chapter { title, .. }) => title.clone(),
            _ => String::new(),
        };
        let title = if self.session.settings.text_source.is_jst() {
            format!("{title} (JST)")
        } else {
            title
        };

        let max_width = body[0].width.saturating_sub(2) as usize;
        let mut lines: Vec<Line> = Vec::new();
        match chapter {
            Some(content) => {
                for (i, line) in content.lines.iter().enumerate() {
                    if i > 0 {
                        lines.push(Line::raw(""));
                    }
                    lines.extend(wrap_text(line, max_width).into_iter().map(Line::raw));
                }
            }
            None if self.loading => lines.push(Line::raw("Loading…")),
            None => lines.push(Line::raw("Nothing loaded.")),
        }

        self.text_rows = body[0].height.saturating_sub(2);
        let max_scroll = (lines.len() as u16).saturating_sub(self.text_rows);
        self.scroll = self.scroll.min(max_scroll);

        let text = Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title(title))
            .scroll((self.scroll, 0));
        frame.render_widget(text, body[0]);

        let markers_height = (self.map.markers().len() as u16 + 2).clamp(3, 8);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(markers_height)])
            .split(body[1]);

        self.map.draw(frame, right[0], ACCENT);
        self.draw_places(frame, right[1]);
    }

    fn draw_places(&self, frame: &mut ratatui::Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Places");
        let markers = self.map.markers();
        if markers.is_empty() {
            frame.render_widget(Paragraph::new("No places.").block(block), area);
            return;
        }

        let items: Vec<ListItem> = markers
            .iter()
            .map(|marker| {
                ListItem::new(format!(
                    "{} ({:.3}, {:.3})",
                    marker.label(),
                    marker.latitude,
                    marker.longitude
                ))
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ")
            .highlight_spacing(HighlightSpacing::Always);
        let mut state = ListState::default();
        state.select(self.map.focused());
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_address_panel(&self, area: Rect, frame: &mut ratatui::Frame) {
        let popup_area = centered_rect(48, 28, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title(Span::styled(
            "Go to address",
            Style::default().add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(block.clone(), popup_area);

        let inner = block.inner(popup_area);
        let lines = vec![
            Line::from(vec![
                Span::styled("Address: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(self.address_panel.input.clone()),
            ]),
            Line::raw(""),
            Line::raw("volume[:book[:chapter]], e.g. 1:101:12"),
            Line::raw("Enter goes, Esc cancels, Ctrl+u clears."),
        ];

        let paragraph = Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Left);
        frame.render_widget(paragraph, inner);
    }
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen).context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("leave alt screen")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in text.split_whitespace() {
        let word_width = UnicodeWidthStr::width(word);
        let sep_width = if current.is_empty() { 0 } else { 1 };

        if current_width + sep_width + word_width <= max_width {
            if !current.is_empty() {
                current.push(' ');
                current_width += 1;
            }
            current.push_str(word);
            current_width += word_width;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }

        if word_width <= max_width {
            current.push_str(word);
            current_width = word_width;
            continue;
        }

        let mut chunk = String::new();
        let mut chunk_width = 0usize;
        for ch in word.chars() {
            let mut buf = [0u8; 4];
            let s = ch.encode_utf8(&mut buf);
            let w = UnicodeWidthStr::width(s);
            if chunk_width + w > max_width && !chunk.is_empty() {
                lines.push(std::mem::take(&mut chunk));
                chunk_width = 0;
            }
            chunk.push(ch);
            chunk_width += w;
        }
        if !chunk.is_empty() {
            lines.push(std::mem::take(&mut chunk));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}
