// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use prefdesk_app::{
    FlagKind, FormCommand, FormEvent, FormState, NoticeKind, PreferenceError, PreferenceRecord,
    SearchResults, SubmitOutcome, SubmitRequest,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::warn;

const RESULTS_PAGE_LINES: u16 = 6;
const NO_RESULTS_TEXT: &str = "No results found";

/// Executes remote work on behalf of the form.
///
/// The `spawn_*` hooks report back through `tx`; the defaults run inline,
/// which is what tests want. Runtimes backed by a network service override
/// them to keep the draw loop responsive.
pub trait AppRuntime {
    fn submit_preferences(
        &mut self,
        request: &SubmitRequest,
    ) -> Result<SubmitOutcome, PreferenceError>;
    fn search_records(&mut self, query: &str) -> Result<Vec<PreferenceRecord>, PreferenceError>;

    fn spawn_submit(&mut self, request: SubmitRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self.submit_preferences(&request);
        tx.send(InternalEvent::SubmitSettled(result))
            .map_err(|_| anyhow::anyhow!("form event channel closed"))?;
        Ok(())
    }

    fn spawn_search(&mut self, query: String, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self.search_records(&query);
        tx.send(InternalEvent::SearchSettled(result))
            .map_err(|_| anyhow::anyhow!("form event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    SubmitSettled(Result<SubmitOutcome, PreferenceError>),
    SearchSettled(Result<Vec<PreferenceRecord>, PreferenceError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Name,
    Flag(FlagKind),
    Submit,
    Query,
    SearchButton,
}

impl Focus {
    const RING: [Self; 9] = [
        Self::Name,
        Self::Flag(FlagKind::SubDom),
        Self::Flag(FlagKind::Roleplay),
        Self::Flag(FlagKind::Pictures),
        Self::Flag(FlagKind::Videos),
        Self::Flag(FlagKind::Challenges),
        Self::Submit,
        Self::Query,
        Self::SearchButton,
    ];

    fn rotate(self, delta: isize) -> Self {
        let current = Self::RING
            .iter()
            .position(|focus| *focus == self)
            .unwrap_or(0) as isize;
        let len = Self::RING.len() as isize;
        Self::RING[(current + delta).rem_euclid(len) as usize]
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Flag(kind) => kind.column(),
            Self::Submit => "update",
            Self::Query => "search",
            Self::SearchButton => "search button",
        }
    }

    const fn in_search_section(self) -> bool {
        matches!(self, Self::Query | Self::SearchButton)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    focus: Focus,
    results_scroll: u16,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(state: &mut FormState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(false) => {}
            Ok(true) => match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            },
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut FormState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(FormCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::SubmitSettled(result) => {
                let events = state.dispatch(FormCommand::SubmitSettled(result));
                apply_view_events(view_data, tx, &events);
            }
            InternalEvent::SearchSettled(result) => {
                let events = state.dispatch(FormCommand::SearchSettled(result));
                apply_view_events(view_data, tx, &events);
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn apply_view_events(view_data: &mut ViewData, tx: &Sender<InternalEvent>, events: &[FormEvent]) {
    for event in events {
        match event {
            FormEvent::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(tx, view_data.status_token);
            }
            FormEvent::ResultsChanged => view_data.results_scroll = 0,
            _ => {}
        }
    }
}

/// Applies `command` and hands any requested remote work to the runtime.
fn dispatch_and_run<R: AppRuntime>(
    state: &mut FormState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: FormCommand,
) {
    let events = state.dispatch(command);
    apply_view_events(view_data, tx, &events);

    for event in events {
        let follow_up = match event {
            FormEvent::SubmitRequested(request) => runtime
                .spawn_submit(request, tx.clone())
                .err()
                .map(|error| {
                    warn!(error = %format!("{error:#}"), "could not start submit");
                    FormCommand::SubmitSettled(Err(PreferenceError::dispatch(&error)))
                }),
            FormEvent::SearchRequested(query) => runtime
                .spawn_search(query, tx.clone())
                .err()
                .map(|error| {
                    warn!(error = %format!("{error:#}"), "could not start search");
                    FormCommand::SearchSettled(Err(PreferenceError::dispatch(&error)))
                }),
            _ => None,
        };
        if let Some(command) = follow_up {
            let events = state.dispatch(command);
            apply_view_events(view_data, tx, &events);
        }
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut FormState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if state.notice.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            state.dispatch(FormCommand::DismissNotice);
        }
        return false;
    }

    let focus = view_data.focus;
    match key.code {
        KeyCode::Tab | KeyCode::Down => {
            view_data.focus = focus.rotate(1);
        }
        KeyCode::BackTab | KeyCode::Up => {
            view_data.focus = focus.rotate(-1);
        }
        KeyCode::PageDown => {
            view_data.results_scroll = view_data.results_scroll.saturating_add(RESULTS_PAGE_LINES);
        }
        KeyCode::PageUp => {
            view_data.results_scroll = view_data.results_scroll.saturating_sub(RESULTS_PAGE_LINES);
        }
        KeyCode::Enter => {
            let command = if focus.in_search_section() {
                FormCommand::Search
            } else {
                FormCommand::Submit
            };
            dispatch_and_run(state, runtime, view_data, internal_tx, command);
        }
        KeyCode::Char(' ') if !matches!(focus, Focus::Name | Focus::Query) => match focus {
            Focus::Flag(kind) => {
                state.dispatch(FormCommand::ToggleFlag(kind));
            }
            Focus::Submit => {
                dispatch_and_run(state, runtime, view_data, internal_tx, FormCommand::Submit);
            }
            Focus::SearchButton => {
                dispatch_and_run(state, runtime, view_data, internal_tx, FormCommand::Search);
            }
            Focus::Name | Focus::Query => {}
        },
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            edit_focused_text(state, focus, |text| text.push(ch));
        }
        KeyCode::Backspace => {
            edit_focused_text(state, focus, |text| {
                text.pop();
            });
        }
        _ => {}
    }
    false
}

fn edit_focused_text(state: &mut FormState, focus: Focus, edit: impl FnOnce(&mut String)) {
    match focus {
        Focus::Name => {
            let mut name = state.name.clone();
            edit(&mut name);
            state.dispatch(FormCommand::SetName(name));
        }
        Focus::Query => {
            let mut query = state.search_query.clone();
            edit(&mut query);
            state.dispatch(FormCommand::SetSearchQuery(query));
        }
        Focus::Flag(_) | Focus::Submit | Focus::SearchButton => {}
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &FormState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let form = Paragraph::new(render_form_text(state, view_data.focus)).block(
        Block::default()
            .title("User Preferences")
            .borders(Borders::ALL),
    );
    frame.render_widget(form, layout[0]);

    let search = Paragraph::new(render_search_text(state, view_data.focus))
        .block(Block::default().title("Search").borders(Borders::ALL));
    frame.render_widget(search, layout[1]);

    let results = Paragraph::new(render_results_text(&state.results))
        .wrap(Wrap { trim: false })
        .scroll((view_data.results_scroll, 0))
        .block(Block::default().title("Results").borders(Borders::ALL));
    frame.render_widget(results, layout[2]);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    if let Some(notice) = &state.notice {
        let area = centered_rect(60, 25, frame.area());
        frame.render_widget(Clear, area);
        let (title, color) = match notice.kind {
            NoticeKind::Info => ("done", Color::Green),
            NoticeKind::Error => ("error", Color::Red),
        };
        let body = Paragraph::new(format!("{}\n\nenter/esc to dismiss", notice.message))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .style(Style::default().fg(color).add_modifier(Modifier::BOLD)),
            );
        frame.render_widget(body, area);
    }
}

fn cursor(focused: bool) -> &'static str {
    if focused { "> " } else { "  " }
}

fn render_form_text(state: &FormState, focus: Focus) -> String {
    let mut lines = Vec::with_capacity(7);
    lines.push(format!(
        "{}Name: {}",
        cursor(focus == Focus::Name),
        state.name
    ));
    for kind in FlagKind::ALL {
        let mark = if state.flags.get(kind) { "[x]" } else { "[ ]" };
        lines.push(format!(
            "{}{}: {mark}",
            cursor(focus == Focus::Flag(kind)),
            kind.label()
        ));
    }
    let button = if state.submit_in_flight {
        "[ updating... ]"
    } else {
        "[ Update Preferences ]"
    };
    lines.push(format!("{}{button}", cursor(focus == Focus::Submit)));
    lines.join("\n")
}

fn render_search_text(state: &FormState, focus: Focus) -> String {
    let query = if state.search_query.is_empty() && focus != Focus::Query {
        "Search by Name"
    } else {
        state.search_query.as_str()
    };
    let button = if state.search_in_flight {
        "[ searching... ]"
    } else {
        "[ Search ]"
    };
    format!(
        "{}{query}\n{}{button}",
        cursor(focus == Focus::Query),
        cursor(focus == Focus::SearchButton)
    )
}

fn render_results_text(results: &SearchResults) -> String {
    match results {
        SearchResults::NotSearched => String::new(),
        SearchResults::NoMatches => NO_RESULTS_TEXT.to_owned(),
        SearchResults::Matches(records) => records
            .iter()
            .map(render_record_text)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn render_record_text(record: &PreferenceRecord) -> String {
    let mut out = format!("{}:\n", record.name);
    for kind in FlagKind::ALL {
        out.push_str(&format!(
            "  {}: {}\n",
            kind.label(),
            kind.value_label(record.flags.get(kind))
        ));
    }
    out
}

fn status_text(state: &FormState, view_data: &ViewData) -> String {
    let default = "tab/shift+tab move | space toggle | enter update/search | pgup/pgdn results | ctrl+q quit";
    let focus = view_data.focus.label();
    match &state.status_line {
        Some(status) => format!("{focus} | {status} | {default}"),
        None => format!("{focus} | {default}"),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
