// cli/picker.rs — `shopregd pick` interactive terminal address picker.
//
// Full-screen ratatui widget around the autocomplete engine:
//   - Input line at the top (typed text appears immediately)
//   - Suggestion panel: bold primary line (first comma segment) over the
//     full display name, Up/Down to move, Enter to commit
//   - "No locations found" panel when a search comes back empty
//   - Spinner in the status line while a search is in flight

use anyhow::{Context as _, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Terminal,
};
use std::io;
use std::sync::Arc;

use crate::autocomplete::{Autocomplete, AutocompleteOptions, QueryState};
use crate::config::AppConfig;
use crate::geocode::{GeocodeClient, SelectedLocation};

const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];
const PLACEHOLDER: &str = "Search for an address...";

/// Run the picker. Returns the committed location, or `None` if the user
/// cancelled with Esc / Ctrl+C.
pub async fn run_picker(config: &AppConfig) -> Result<Option<SelectedLocation>> {
    let backend = Arc::new(
        GeocodeClient::new(&config.geocoder).context("failed to build geocode client")?,
    );
    let engine = Autocomplete::new(backend, AutocompleteOptions::from_config(&config.geocoder));

    // Set up terminal.
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend).context("create terminal")?;

    let result = event_loop(&mut terminal, &engine).await;

    // Restore terminal regardless of result.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    engine: &Autocomplete<GeocodeClient>,
) -> Result<Option<SelectedLocation>> {
    let mut list_state = ListState::default();
    let mut spinner_frame: usize = 0;

    loop {
        let state = engine.snapshot();

        // Keep the cursor inside the candidate list.
        if state.candidates.is_empty() {
            list_state.select(None);
        } else {
            let selected = list_state.selected().unwrap_or(0);
            list_state.select(Some(selected.min(state.candidates.len() - 1)));
        }

        if state.in_flight {
            spinner_frame = (spinner_frame + 1) % SPINNER_FRAMES.len();
        }

        terminal.draw(|f| draw_ui(f, &state, &mut list_state, spinner_frame))?;

        // Poll for terminal events (non-blocking, 50ms timeout). The async
        // engine keeps making progress between polls.
        if !event::poll(std::time::Duration::from_millis(50))? {
            tokio::task::yield_now().await;
            continue;
        }

        if let Event::Key(key) = event::read()? {
            match (key.code, key.modifiers) {
                (KeyCode::Esc, _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                    return Ok(None);
                }
                (KeyCode::Enter, _) => {
                    if state.panel_visible && !state.candidates.is_empty() {
                        let index = list_state.selected().unwrap_or(0);
                        if let Some(location) = engine.select(index) {
                            return Ok(Some(location));
                        }
                    }
                }
                (KeyCode::Up, _) => {
                    if let Some(current) = list_state.selected() {
                        list_state.select(Some(current.saturating_sub(1)));
                    }
                }
                (KeyCode::Down, _) => {
                    if let Some(current) = list_state.selected() {
                        if !state.candidates.is_empty() {
                            list_state
                                .select(Some((current + 1).min(state.candidates.len() - 1)));
                        }
                    }
                }
                (KeyCode::Backspace, _) => {
                    let mut text = state.input.clone();
                    text.pop();
                    engine.input(&text);
                }
                (KeyCode::Char(c), _) => {
                    let mut text = state.input.clone();
                    text.push(c);
                    engine.input(&text);
                }
                _ => {}
            }
        }
    }
}

// ─── UI rendering ─────────────────────────────────────────────────────────────

fn draw_ui(
    f: &mut ratatui::Frame,
    state: &QueryState,
    list_state: &mut ListState,
    spinner_frame: usize,
) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // input
            Constraint::Min(3),    // suggestion panel
            Constraint::Length(1), // status line
        ])
        .split(area);

    // Input line.
    let input_line = if state.input.is_empty() {
        Line::from(Span::styled(
            PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(state.input.as_str())
    };
    let input = Paragraph::new(input_line)
        .block(Block::default().borders(Borders::ALL).title(" Address "));
    f.render_widget(input, chunks[0]);

    // Suggestion panel.
    if state.panel_visible && !state.candidates.is_empty() {
        let items: Vec<ListItem> = state
            .candidates
            .iter()
            .map(|candidate| {
                ListItem::new(vec![
                    Line::from(Span::styled(
                        candidate.primary_line().to_string(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        candidate.display_name.clone(),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(" Suggestions "))
            .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
            .highlight_symbol("» ");
        f.render_stateful_widget(list, chunks[1], list_state);
    } else if state.panel_visible && !state.in_flight {
        let empty = Paragraph::new(vec![
            Line::from(Span::styled(
                "No locations found",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from("Try searching with a different term like \"Tariq Road Karachi\""),
        ])
        .block(Block::default().borders(Borders::ALL).title(" Suggestions "));
        f.render_widget(empty, chunks[1]);
    }

    // Status line.
    let status = if state.in_flight {
        Line::from(format!("{} Searching…", SPINNER_FRAMES[spinner_frame]))
    } else {
        Line::from(Span::styled(
            "↑/↓ select · Enter commit · Esc cancel",
            Style::default().fg(Color::DarkGray),
        ))
    };
    f.render_widget(Paragraph::new(status), chunks[2]);
}
