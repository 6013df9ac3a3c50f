//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]). The source list is rendered from
//! [`select_source`], recomputed every frame from the latest snapshot.
//!
//! ## For contributors
//!
//! * The layout is a two-row split: the source list on top and a one-line
//!   status bar at the bottom.
//! * Colours and styles are defined inline.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};
use sourcepane::{select_source, SourceState, SourceView};

use crate::app::App;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

    let state = app.store.snapshot();
    let view = select_source(&state, app.mode());

    draw_source_list(app, &state, &view, frame, main_area);
    draw_status_bar(app, &state, &view, frame, status_area);
}

fn count_style(count: i64) -> Style {
    if count > 0 {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

/// Render the preset row followed by every visible source.
fn draw_source_list(
    app: &mut App,
    state: &SourceState,
    view: &SourceView<'_>,
    frame: &mut Frame,
    area: Rect,
) {
    let preset = Line::from(vec![
        Span::styled(
            format!("{:<32}", format!("{} items", view.mode)),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{:>6}", view.total_count), count_style(view.total_count)),
    ]);

    let sources = view.list.iter().map(|source| {
        let icon = if source.icon.is_some() { "◆ " } else { "  " };
        Line::from(vec![
            Span::styled(icon, Style::default().fg(Color::Cyan)),
            Span::styled(
                format!("{:<30}", source.name),
                Style::default().fg(Color::White),
            ),
            Span::styled(format!("{:>6}", source.count), count_style(source.count)),
        ])
    });

    let items: Vec<ListItem> = std::iter::once(preset)
        .chain(sources)
        .map(ListItem::new)
        .collect();

    let title = if state.refreshing {
        " Sources ⟳ ".to_string()
    } else {
        " Sources ".to_string()
    };

    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    app.list_state.select(app.selected_row(state));
    frame.render_stateful_widget(list, area, &mut app.list_state);
}

/// Render the bottom status bar, or the rename prompt while editing.
fn draw_status_bar(
    app: &App,
    state: &SourceState,
    view: &SourceView<'_>,
    frame: &mut Frame,
    area: Rect,
) {
    if let Some(buffer) = &app.editing {
        let prompt = Paragraph::new(Line::from(vec![
            Span::styled(" Rename: ", Style::default().fg(Color::Yellow)),
            Span::raw(buffer.as_str()),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
            Span::raw("  Enter: save  Esc: cancel"),
        ]));
        frame.render_widget(prompt, area);
        return;
    }

    let synced = app
        .last_sync
        .map(|t| format!("synced {}", t.format("%H:%M")))
        .unwrap_or_else(|| "never synced".into());

    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(app.status.as_str(), Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{}/{} sources", view.list.len(), state.list.len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(synced, Style::default().fg(Color::DarkGray)),
        Span::raw("  q: quit  r: sync  m: mode  a: read  e: rename  d: remove"),
    ]));
    frame.render_widget(status, area);
}
