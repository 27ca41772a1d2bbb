use std::cell::Cell;
use std::io::{self, Stdout};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Padding, Paragraph, Tabs, Wrap};
use ratatui::{Frame, Terminal};
use textwrap::wrap;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::api::{Character, Episode};
use crate::data::{CharacterService, EpisodeService};
use crate::seasons;

const COLOR_BG: Color = Color::Rgb(30, 30, 46);
const COLOR_PANEL_BG: Color = Color::Rgb(24, 24, 36);
const COLOR_PANEL_FOCUSED_BG: Color = Color::Rgb(49, 50, 68);
const COLOR_PANEL_SELECTED_BG: Color = Color::Rgb(69, 71, 90);
const COLOR_BORDER_IDLE: Color = Color::Rgb(49, 50, 68);
const COLOR_BORDER_FOCUSED: Color = Color::Rgb(137, 180, 250);
const COLOR_TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
const COLOR_TEXT_SECONDARY: Color = Color::Rgb(166, 173, 200);
const COLOR_ACCENT: Color = Color::Rgb(137, 180, 250);

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const CARD_WIDTH: u16 = 30;
const CARD_HEIGHT: u16 = 5;

#[derive(Clone)]
pub struct Options {
    pub status_message: String,
    pub episodes: Vec<Episode>,
    pub episode_service: Option<Arc<dyn EpisodeService + Send + Sync>>,
    pub character_service: Option<Arc<dyn CharacterService + Send + Sync>>,
    pub fetch_episodes_on_start: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    List,
    Detail,
}

struct DetailState {
    episode_id: i64,
    characters: Vec<Character>,
    selected: usize,
    status: String,
}

impl DetailState {
    fn new(episode_id: i64) -> Self {
        Self {
            episode_id,
            characters: Vec::new(),
            selected: 0,
            status: String::new(),
        }
    }
}

struct PendingEpisodes {
    request_id: u64,
}

struct PendingCharacters {
    request_id: u64,
    episode_id: i64,
    cancel_flag: Arc<AtomicBool>,
}

enum AsyncResponse {
    Episodes {
        request_id: u64,
        result: Result<Vec<Episode>>,
    },
    Characters {
        request_id: u64,
        episode_id: i64,
        result: Result<Vec<Character>>,
    },
}

struct Spinner {
    index: usize,
    last_tick: Instant,
}

impl Spinner {
    fn new() -> Self {
        Self {
            index: 0,
            last_tick: Instant::now(),
        }
    }

    fn frame(&self) -> &'static str {
        SPINNER_FRAMES[self.index % SPINNER_FRAMES.len()]
    }

    fn advance(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_tick) >= Duration::from_millis(120) {
            self.index = (self.index + 1) % SPINNER_FRAMES.len();
            self.last_tick = now;
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.index = 0;
        self.last_tick = Instant::now();
    }
}

struct Card {
    title: String,
    lines: Vec<String>,
}

fn episode_card(episode: &Episode) -> Card {
    Card {
        title: episode.name.clone(),
        lines: vec![episode.episode.clone(), format!("Aired {}", episode.air_date)],
    }
}

fn character_card(character: &Character) -> Card {
    let descriptor = match (
        character.species.trim().is_empty(),
        character.status.trim().is_empty(),
    ) {
        (false, false) => format!("{} · {}", character.species, character.status),
        (false, true) => character.species.clone(),
        (true, false) => character.status.clone(),
        (true, true) => String::new(),
    };
    Card {
        title: character.name.clone(),
        lines: vec![descriptor, character.image.clone()],
    }
}

fn season_tab_labels(seasons: &[u32]) -> Vec<String> {
    let mut labels = vec!["All".to_string()];
    labels.extend(seasons.iter().map(|season| format!("Season {season}")));
    labels
}

fn grid_columns(width: u16) -> usize {
    ((width / CARD_WIDTH) as usize).max(1)
}

fn scrolled_first_row(selected_row: usize, first_row: usize, visible_rows: usize) -> usize {
    if visible_rows == 0 || selected_row < first_row {
        selected_row
    } else if selected_row >= first_row + visible_rows {
        selected_row + 1 - visible_rows
    } else {
        first_row
    }
}

fn move_selection(selected: usize, len: usize, delta: isize) -> usize {
    if len == 0 {
        return 0;
    }
    let moved = selected as isize + delta;
    moved.clamp(0, len as isize - 1) as usize
}

fn truncate_to_width(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width + 1 > width {
            break;
        }
        used += ch_width;
        out.push(ch);
    }
    out.push('…');
    out
}

fn panel_block(title: String) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            title,
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(COLOR_BORDER_IDLE))
        .style(Style::default().bg(COLOR_PANEL_BG))
        .padding(Padding::uniform(1))
}

pub struct Model {
    status_message: String,
    episodes: Vec<Episode>,
    seasons: Vec<u32>,
    season_filter: Option<u32>,
    visible: Vec<usize>,
    selected_card: usize,
    grid_offset: Cell<usize>,
    grid_cols: Cell<usize>,
    view: View,
    detail: Option<DetailState>,
    episode_service: Option<Arc<dyn EpisodeService + Send + Sync>>,
    character_service: Option<Arc<dyn CharacterService + Send + Sync>>,
    spinner: Spinner,
    needs_redraw: bool,
    response_tx: Sender<AsyncResponse>,
    response_rx: Receiver<AsyncResponse>,
    next_request_id: u64,
    pending_episodes: Option<PendingEpisodes>,
    pending_characters: Option<PendingCharacters>,
}

impl Model {
    pub fn new(opts: Options) -> Self {
        let (response_tx, response_rx) = unbounded();
        let mut model = Self {
            status_message: opts.status_message.clone(),
            episodes: opts.episodes.clone(),
            seasons: Vec::new(),
            season_filter: None,
            visible: Vec::new(),
            selected_card: 0,
            grid_offset: Cell::new(0),
            grid_cols: Cell::new(1),
            view: View::List,
            detail: None,
            episode_service: opts.episode_service.clone(),
            character_service: opts.character_service.clone(),
            spinner: Spinner::new(),
            needs_redraw: true,
            response_tx,
            response_rx,
            next_request_id: 1,
            pending_episodes: None,
            pending_characters: None,
        };

        model.seasons = seasons::extract_seasons(&model.episodes);
        model.rebuild_visible();

        if opts.fetch_episodes_on_start {
            model.reload_episodes();
        }

        model
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        let tick_rate = Duration::from_millis(120);

        loop {
            if self.poll_async() {
                self.mark_dirty();
            }

            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(16));

            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        match self.handle_key(key.code) {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(err) => {
                                self.status_message = format!("Error: {}", err);
                                self.mark_dirty();
                            }
                        }
                    }
                }
            }

            if self.poll_async() {
                self.mark_dirty();
            }

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
                if self.is_loading() {
                    if self.spinner.advance() {
                        self.mark_dirty();
                    }
                } else {
                    self.spinner.reset();
                }
            }
        }

        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    fn is_loading(&self) -> bool {
        self.pending_episodes.is_some() || self.pending_characters.is_some()
    }

    fn episode(&self, id: i64) -> Option<&Episode> {
        self.episodes.iter().find(|episode| episode.id == id)
    }

    fn rebuild_visible(&mut self) {
        self.visible = match self.season_filter {
            Some(season) => self
                .episodes
                .iter()
                .enumerate()
                .filter(|(_, episode)| episode.season() == Some(season))
                .map(|(index, _)| index)
                .collect(),
            None => (0..self.episodes.len()).collect(),
        };
        if self.selected_card >= self.visible.len() {
            self.selected_card = self.visible.len().saturating_sub(1);
        }
    }

    fn set_season_filter(&mut self, filter: Option<u32>) {
        self.season_filter = filter;
        self.rebuild_visible();
        self.selected_card = 0;
        self.grid_offset.set(0);
        self.status_message = match filter {
            Some(season) => format!("Season {season} — {} episodes.", self.visible.len()),
            None => format!("All episodes — {}.", self.visible.len()),
        };
        self.mark_dirty();
    }

    fn cycle_season_filter(&mut self, direction: isize) {
        if self.seasons.is_empty() {
            return;
        }
        // Tab order is All, then each season in first-seen order.
        let positions = self.seasons.len() as isize + 1;
        let current = match self.season_filter {
            None => 0,
            Some(season) => self
                .seasons
                .iter()
                .position(|candidate| *candidate == season)
                .map(|index| index as isize + 1)
                .unwrap_or(0),
        };
        let next = (current + direction).rem_euclid(positions);
        let filter = if next == 0 {
            None
        } else {
            Some(self.seasons[next as usize - 1])
        };
        self.set_season_filter(filter);
    }

    fn select_season_index(&mut self, index: usize) {
        if let Some(&season) = self.seasons.get(index) {
            self.set_season_filter(Some(season));
        }
    }

    fn reload_episodes(&mut self) {
        let Some(service) = self.episode_service.clone() else {
            self.status_message = "Episode data is unavailable.".to_string();
            self.mark_dirty();
            return;
        };
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.pending_episodes = Some(PendingEpisodes { request_id });
        self.status_message = "Loading episodes…".to_string();
        self.mark_dirty();

        let tx = self.response_tx.clone();
        thread::spawn(move || {
            let result = service.all_episodes();
            let _ = tx.send(AsyncResponse::Episodes { request_id, result });
        });
    }

    fn request_characters(&mut self, episode: Episode) {
        if let Some(pending) = self.pending_characters.take() {
            pending.cancel_flag.store(true, Ordering::SeqCst);
        }
        let Some(service) = self.character_service.clone() else {
            if let Some(detail) = self.detail.as_mut() {
                detail.status = "Character data is unavailable.".to_string();
            }
            return;
        };
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        let cancel_flag = Arc::new(AtomicBool::new(false));
        self.pending_characters = Some(PendingCharacters {
            request_id,
            episode_id: episode.id,
            cancel_flag: cancel_flag.clone(),
        });
        if let Some(detail) = self.detail.as_mut() {
            detail.status = "Loading characters…".to_string();
        }

        let tx = self.response_tx.clone();
        let episode_id = episode.id;
        thread::spawn(move || {
            if cancel_flag.load(Ordering::SeqCst) {
                return;
            }
            let result = service.characters_for(&episode);
            let _ = tx.send(AsyncResponse::Characters {
                request_id,
                episode_id,
                result,
            });
        });
    }

    fn open_selected_episode(&mut self) {
        let Some(&index) = self.visible.get(self.selected_card) else {
            return;
        };
        let id = self.episodes[index].id;
        self.open_episode(id);
    }

    fn open_episode(&mut self, id: i64) {
        let Some(episode) = self.episode(id).cloned() else {
            // Graceful no-op on a miss; stay in the list.
            self.status_message = format!("Episode {id} not found.");
            self.mark_dirty();
            return;
        };
        self.view = View::Detail;
        self.detail = Some(DetailState::new(episode.id));
        self.grid_offset.set(0);
        self.status_message = format!("{} ({})", episode.name, episode.episode);
        self.request_characters(episode);
        self.mark_dirty();
    }

    fn back_to_list(&mut self) {
        if let Some(pending) = self.pending_characters.take() {
            pending.cancel_flag.store(true, Ordering::SeqCst);
        }
        self.detail = None;
        self.view = View::List;
        self.season_filter = None;
        self.rebuild_visible();
        self.selected_card = 0;
        self.grid_offset.set(0);
        self.status_message = format!("All episodes — {}.", self.visible.len());
        self.mark_dirty();
    }

    fn poll_async(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.response_rx.try_recv() {
            self.handle_async_response(message);
            changed = true;
        }
        changed
    }

    fn handle_async_response(&mut self, message: AsyncResponse) {
        match message {
            AsyncResponse::Episodes { request_id, result } => {
                let Some(pending) = &self.pending_episodes else {
                    return;
                };
                if pending.request_id != request_id {
                    return;
                }
                self.pending_episodes = None;

                match result {
                    Ok(episodes) => {
                        self.episodes = episodes;
                        self.seasons = seasons::extract_seasons(&self.episodes);
                        self.season_filter = None;
                        self.rebuild_visible();
                        self.selected_card = 0;
                        self.grid_offset.set(0);
                        self.status_message = format!(
                            "Loaded {} episodes across {} seasons. Enter opens an episode, Tab filters by season.",
                            self.episodes.len(),
                            self.seasons.len()
                        );
                    }
                    Err(err) => {
                        self.status_message = format!("Failed to load episodes: {err}");
                    }
                }
                self.mark_dirty();
            }
            AsyncResponse::Characters {
                request_id,
                episode_id,
                result,
            } => {
                let Some(pending) = &self.pending_characters else {
                    return;
                };
                if pending.cancel_flag.load(Ordering::SeqCst)
                    || pending.request_id != request_id
                    || pending.episode_id != episode_id
                {
                    return;
                }
                let Some(detail) = self.detail.as_mut() else {
                    return;
                };
                if detail.episode_id != episode_id {
                    return;
                }
                self.pending_characters = None;

                match result {
                    Ok(characters) => {
                        detail.status = if characters.is_empty() {
                            "No characters listed for this episode.".to_string()
                        } else {
                            String::new()
                        };
                        detail.characters = characters;
                        detail.selected = 0;
                    }
                    Err(err) => {
                        detail.characters.clear();
                        detail.status = format!("Failed to load characters: {err}");
                    }
                }
                self.mark_dirty();
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        match self.view {
            View::List => self.handle_list_key(code),
            View::Detail => self.handle_detail_key(code),
        }
    }

    fn handle_list_key(&mut self, code: KeyCode) -> Result<bool> {
        let cols = self.grid_cols.get().max(1) as isize;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char('r') | KeyCode::Char('R') => self.reload_episodes(),
            KeyCode::Tab => self.cycle_season_filter(1),
            KeyCode::BackTab => self.cycle_season_filter(-1),
            KeyCode::Char('0') => self.set_season_filter(None),
            KeyCode::Char(ch @ '1'..='9') => {
                self.select_season_index((ch as u8 - b'1') as usize);
            }
            KeyCode::Char('h') | KeyCode::Left => {
                self.selected_card = move_selection(self.selected_card, self.visible.len(), -1);
                self.mark_dirty();
            }
            KeyCode::Char('l') | KeyCode::Right => {
                self.selected_card = move_selection(self.selected_card, self.visible.len(), 1);
                self.mark_dirty();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_card = move_selection(self.selected_card, self.visible.len(), -cols);
                self.mark_dirty();
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.selected_card = move_selection(self.selected_card, self.visible.len(), cols);
                self.mark_dirty();
            }
            KeyCode::Enter => self.open_selected_episode(),
            _ => {}
        }
        Ok(false)
    }

    fn handle_detail_key(&mut self, code: KeyCode) -> Result<bool> {
        let cols = self.grid_cols.get().max(1) as isize;
        let character_count = self
            .detail
            .as_ref()
            .map(|detail| detail.characters.len())
            .unwrap_or(0);
        match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => self.back_to_list(),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let episode = self
                    .detail
                    .as_ref()
                    .and_then(|detail| self.episode(detail.episode_id))
                    .cloned();
                if let Some(episode) = episode {
                    self.request_characters(episode);
                    self.mark_dirty();
                }
            }
            KeyCode::Char('h') | KeyCode::Left => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.selected = move_selection(detail.selected, character_count, -1);
                }
                self.mark_dirty();
            }
            KeyCode::Char('l') | KeyCode::Right => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.selected = move_selection(detail.selected, character_count, 1);
                }
                self.mark_dirty();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.selected = move_selection(detail.selected, character_count, -cols);
                }
                self.mark_dirty();
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.selected = move_selection(detail.selected, character_count, cols);
                }
                self.mark_dirty();
            }
            _ => {}
        }
        Ok(false)
    }

    fn footer_text(&self) -> String {
        match self.view {
            View::List => {
                "j/k/h/l move · Enter open episode · Tab season filter · 0 all · r refresh · q quit"
                    .to_string()
            }
            View::Detail => "j/k/h/l move · Esc back to episodes · r reload cast · q quit".to_string(),
        }
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let full = frame.size();
        frame.render_widget(Block::default().style(Style::default().bg(COLOR_BG)), full);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(full);

        let status_text = if self.is_loading() {
            format!("{} {}", self.spinner.frame(), self.status_message)
                .trim()
                .to_string()
        } else {
            self.status_message.clone()
        };
        let status_line = Paragraph::new(status_text).style(
            Style::default()
                .fg(COLOR_TEXT_PRIMARY)
                .bg(COLOR_PANEL_FOCUSED_BG)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, layout[0]);

        match self.view {
            View::List => self.draw_list(frame, layout[1]),
            View::Detail => self.draw_detail(frame, layout[1]),
        }

        let footer = Paragraph::new(self.footer_text())
            .style(
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .bg(COLOR_PANEL_BG)
                    .add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(footer, layout[2]);
    }

    fn draw_list(&self, frame: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(area);

        let title = Paragraph::new("RM-TUI — Rick and Morty episode browser").style(
            Style::default()
                .fg(COLOR_ACCENT)
                .bg(COLOR_BG)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(title, chunks[0]);

        let selected_tab = self
            .season_filter
            .and_then(|season| {
                self.seasons
                    .iter()
                    .position(|candidate| *candidate == season)
            })
            .map(|index| index + 1)
            .unwrap_or(0);
        let tabs = Tabs::new(season_tab_labels(&self.seasons))
            .select(selected_tab)
            .style(Style::default().fg(COLOR_TEXT_SECONDARY).bg(COLOR_BG))
            .highlight_style(
                Style::default()
                    .fg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            );
        frame.render_widget(tabs, chunks[1]);

        let block_title = match self.season_filter {
            Some(season) => format!("Episodes — {}", seasons::season_key(season)),
            None => "Episodes".to_string(),
        };
        let block = panel_block(block_title);
        let inner = block.inner(chunks[2]);
        frame.render_widget(block, chunks[2]);

        if self.visible.is_empty() {
            let message = if self.is_loading() {
                "Fetching episodes…".to_string()
            } else {
                "No episodes loaded. Press r to retry.".to_string()
            };
            let placeholder = Paragraph::new(message)
                .style(Style::default().fg(COLOR_TEXT_SECONDARY))
                .alignment(Alignment::Center);
            frame.render_widget(placeholder, inner);
            return;
        }

        let cards: Vec<Card> = self
            .visible
            .iter()
            .map(|&index| episode_card(&self.episodes[index]))
            .collect();
        self.draw_card_grid(frame, inner, &cards, self.selected_card);
    }

    fn draw_detail(&self, frame: &mut Frame<'_>, area: Rect) {
        let Some(detail) = &self.detail else {
            return;
        };
        let Some(episode) = self.episode(detail.episode_id) else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(9), Constraint::Min(0)])
            .split(area);

        let block = panel_block("Episode".to_string());
        let inner = block.inner(chunks[0]);
        frame.render_widget(block, chunks[0]);

        let width = inner.width.max(1) as usize;
        let mut lines: Vec<Line> = Vec::new();
        for piece in wrap(&episode.name, width) {
            lines.push(Line::from(Span::styled(
                piece.into_owned(),
                Style::default()
                    .fg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD),
            )));
        }
        lines.push(Line::from(Span::styled(
            episode.episode.clone(),
            Style::default().fg(COLOR_TEXT_PRIMARY),
        )));
        lines.push(Line::from(Span::styled(
            format!("Aired: {}", episode.air_date),
            Style::default().fg(COLOR_TEXT_SECONDARY),
        )));
        lines.push(Line::from(Span::styled(
            format!("{} characters appear in this episode", episode.characters.len()),
            Style::default().fg(COLOR_TEXT_SECONDARY),
        )));
        frame.render_widget(Paragraph::new(lines), inner);

        let block = panel_block("Characters".to_string());
        let inner = block.inner(chunks[1]);
        frame.render_widget(block, chunks[1]);

        if !detail.status.is_empty() {
            let placeholder = Paragraph::new(detail.status.clone())
                .style(Style::default().fg(COLOR_TEXT_SECONDARY))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(placeholder, inner);
            return;
        }

        let cards: Vec<Card> = detail.characters.iter().map(character_card).collect();
        self.draw_card_grid(frame, inner, &cards, detail.selected);
    }

    fn draw_card_grid(&self, frame: &mut Frame<'_>, area: Rect, cards: &[Card], selected: usize) {
        if area.width == 0 || area.height == 0 || cards.is_empty() {
            return;
        }

        let cols = grid_columns(area.width);
        self.grid_cols.set(cols);
        let visible_rows = ((area.height / CARD_HEIGHT) as usize).max(1);
        let selected_row = selected.min(cards.len().saturating_sub(1)) / cols;
        let first_row = scrolled_first_row(selected_row, self.grid_offset.get(), visible_rows);
        self.grid_offset.set(first_row);

        for (index, card) in cards.iter().enumerate() {
            let row = index / cols;
            if row < first_row || row >= first_row + visible_rows {
                continue;
            }
            let col = index % cols;
            let x_offset = (col as u16) * CARD_WIDTH;
            let y_offset = ((row - first_row) as u16) * CARD_HEIGHT;
            let width = CARD_WIDTH.min(area.width.saturating_sub(x_offset));
            let height = CARD_HEIGHT.min(area.height.saturating_sub(y_offset));
            if width < 6 || height < 3 {
                continue;
            }
            let rect = Rect {
                x: area.x + x_offset,
                y: area.y + y_offset,
                width,
                height,
            };

            let is_selected = index == selected;
            let border_style = if is_selected {
                Style::default().fg(COLOR_BORDER_FOCUSED)
            } else {
                Style::default().fg(COLOR_BORDER_IDLE)
            };
            let background = if is_selected {
                COLOR_PANEL_SELECTED_BG
            } else {
                COLOR_PANEL_BG
            };
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .style(Style::default().bg(background))
                .padding(Padding::horizontal(1));

            let text_width = width.saturating_sub(4) as usize;
            let mut lines = vec![Line::from(Span::styled(
                truncate_to_width(&card.title, text_width),
                Style::default()
                    .fg(COLOR_TEXT_PRIMARY)
                    .add_modifier(Modifier::BOLD),
            ))];
            for body in &card.lines {
                lines.push(Line::from(Span::styled(
                    truncate_to_width(body, text_width),
                    Style::default().fg(COLOR_TEXT_SECONDARY),
                )));
            }
            frame.render_widget(Paragraph::new(lines).block(block), rect);
        }
    }
}
