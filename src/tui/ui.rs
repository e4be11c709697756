//! UI rendering functions for the TUI.
//!
//! Left column: map of locations above the question input. Right column:
//! answer, keyword chart and previous questions. A notice line and the
//! shortcut bar run along the bottom.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span, Text},
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, Paragraph, Wrap,
        canvas::{Canvas, Map, MapResolution, Points},
    },
};

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use super::app::{App, Focus, Notice, Status};
use crate::models::{LOCATIONS, LocationPoint, view_center};

pub const CHART_TITLE: &str = "Keyword Frequency in Answers";
pub const CHART_X_LABEL: &str = "Keywords";
pub const CHART_Y_LABEL: &str = "Frequency";

const SESSION_TIME_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[hour]:[minute]");

const BAR_WIDTH: u16 = 7;
const BAR_GAP: u16 = 1;

/// Extra longitude to the east of the furthest point, so its label fits.
const LABEL_ROOM_DEG: f64 = 25.0;
const LAT_MARGIN_DEG: f64 = 10.0;

/// Main rendering function for the TUI.
///
/// # Arguments
///
/// * `frame` - The ratatui Frame to render into
/// * `app` - The application state containing input, answer and history
pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Min(0),    // Content area
            Constraint::Length(1), // Notice
            Constraint::Length(1), // Shortcut bar
        ])
        .split(size);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(main_chunks[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(columns[1]);

    render_title(frame, app, main_chunks[0]);
    render_map(frame, left[0]);
    render_input(frame, app, left[1]);
    render_answer(frame, app, right[0]);
    render_keyword_chart(frame, app, right[1]);
    render_history(frame, app, right[2]);
    render_notice(frame, app, main_chunks[2]);
    render_shortcut_bar(frame, app, main_chunks[3]);
}

fn focus_block(title: &str, focused: bool) -> Block<'_> {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(border_style)
}

fn render_title(frame: &mut Frame, app: &App, area: Rect) {
    let started = app
        .session_started_at()
        .and_then(|t| t.format(SESSION_TIME_FORMAT).ok())
        .unwrap_or_else(|| "--:--".to_string());

    let line = Line::from(vec![
        Span::styled("evsearch", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(
                "  session {} started {} UTC | {} answered",
                app.session_id(),
                started,
                app.history().len()
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Canvas bounds `([west, east], [south, north])` centred on the mean of `points`.
pub fn map_bounds(points: &[LocationPoint]) -> ([f64; 2], [f64; 2]) {
    let (lat, lon) = view_center(points);
    let half_lon = points
        .iter()
        .map(|p| (p.longitude - lon).abs())
        .fold(0.0, f64::max)
        + LABEL_ROOM_DEG;
    let half_lat = points
        .iter()
        .map(|p| (p.latitude - lat).abs())
        .fold(0.0, f64::max)
        + LAT_MARGIN_DEG;

    (
        [lon - half_lon, lon + half_lon],
        [lat - half_lat, lat + half_lat],
    )
}

fn render_map(frame: &mut Frame, area: Rect) {
    let (x_bounds, y_bounds) = map_bounds(&LOCATIONS);

    let canvas = Canvas::default()
        .block(focus_block("Locations", false))
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            ctx.draw(&Map {
                color: Color::DarkGray,
                resolution: MapResolution::High,
            });
            ctx.layer();
            for point in &LOCATIONS {
                ctx.draw(&Points {
                    coords: &[(point.longitude, point.latitude)],
                    color: Color::Red,
                });
                ctx.print(
                    point.longitude + 1.0,
                    point.latitude,
                    Span::styled(point.name, Style::default().fg(Color::Yellow)),
                );
            }
        });

    frame.render_widget(canvas, area);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus() == Focus::Input;
    let block = focus_block("Question", is_focused);

    let mut content = app.input().to_string();
    if is_focused {
        content.push('█'); // Cursor indicator
    }

    frame.render_widget(Paragraph::new(content).block(block), area);
}

fn render_answer(frame: &mut Frame, app: &App, area: Rect) {
    let block = focus_block("Answer", app.focus() == Focus::Answer);

    let text = match (app.status(), app.answer()) {
        (Status::Thinking, _) => Text::styled("Thinking…", Style::default().fg(Color::Yellow)),
        (Status::Idle, Some(answer)) => tui_markdown::from_str(answer),
        (Status::Idle, None) => Text::styled(
            "Type a question and press Enter.",
            Style::default().fg(Color::DarkGray),
        ),
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.answer_scroll(), 0));

    frame.render_widget(paragraph, area);
}

/// How many bars of the chart fit in `width` columns of chart interior.
fn bars_that_fit(width: u16) -> usize {
    usize::from((width + BAR_GAP) / (BAR_WIDTH + BAR_GAP))
}

fn render_keyword_chart(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(CHART_TITLE).centered())
        .title_top(Line::from(CHART_Y_LABEL).right_aligned())
        .title_bottom(Line::from(CHART_X_LABEL).centered());

    let inner_width = block.inner(area).width;
    let bars: Vec<Bar> = app
        .keywords()
        .iter()
        .take(bars_that_fit(inner_width))
        .map(|k| {
            Bar::default()
                .value(k.count as u64)
                .label(Line::from(k.keyword.clone()))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(BAR_WIDTH)
        .bar_gap(BAR_GAP)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));

    frame.render_widget(chart, area);
}

fn render_history(frame: &mut Frame, app: &App, area: Rect) {
    let history = app.history();
    let title = format!("Previous Questions and Answers ({})", history.len());
    let block = focus_block(&title, app.focus() == Focus::History);

    let mut text = Text::default();
    for (i, (question, answer)) in history.iter().enumerate() {
        if i > 0 {
            text.lines.push(Line::from(""));
        }
        text.lines.push(Line::from(vec![
            Span::styled("Q: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(*question),
        ]));
        // Spans drop newlines, so every answer line gets its own Line
        let mut answer_lines = answer.lines();
        text.lines.push(Line::from(vec![
            Span::styled("A: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(answer_lines.next().unwrap_or_default()),
        ]));
        text.lines.extend(answer_lines.map(Line::raw));
    }

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.history_scroll(), 0));

    frame.render_widget(paragraph, area);
}

fn render_notice(frame: &mut Frame, app: &App, area: Rect) {
    let line = match (app.status(), app.notice()) {
        (Status::Thinking, _) => Line::styled("Thinking…", Style::default().fg(Color::Yellow)),
        (Status::Idle, Some(notice @ Notice::Warning(_))) => {
            Line::styled(notice.message(), Style::default().fg(Color::Yellow))
        }
        (Status::Idle, Some(notice @ Notice::Error(_))) => Line::styled(
            notice.message(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        (Status::Idle, None) => Line::default(),
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Renders the shortcut bar at the bottom of the screen.
///
/// Shows context-aware keyboard shortcuts based on current focus state.
/// Format: `Key: action | Key: action` with keys highlighted in cyan.
fn render_shortcut_bar(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::default().fg(Color::Cyan);
    let sep_style = Style::default().fg(Color::DarkGray);

    let mut spans = Vec::new();
    match app.focus() {
        Focus::Input => {
            spans.push(Span::styled("Enter", key_style));
            spans.push(Span::raw(": ask"));
        }
        Focus::Answer | Focus::History => {
            spans.push(Span::styled("j/k", key_style));
            spans.push(Span::raw(": scroll"));
            spans.push(Span::styled(" | ", sep_style));
            spans.push(Span::styled("q", key_style));
            spans.push(Span::raw(": quit"));
        }
    }

    spans.extend([
        Span::styled(" | ", sep_style),
        Span::styled("Tab", key_style),
        Span::raw(": next panel"),
        Span::styled(" | ", sep_style),
        Span::styled("Shift+Tab", key_style),
        Span::raw(": prev panel"),
        Span::styled(" | ", sep_style),
        Span::styled("Esc", key_style),
        Span::raw(": question"),
        Span::styled(" | ", sep_style),
        Span::styled("Ctrl+C", key_style),
        Span::raw(": quit"),
    ]);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
