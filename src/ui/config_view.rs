use itertools::Itertools;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::App,
    clock::Clock,
    config::Config,
    format::{fmt_clock, fmt_minutes},
};

const MIN_NAME_WIDTH: u16 = 8;
const MAX_NAME_WIDTH: u16 = 40;

/// Width of the section name column, sized to the longest name
pub fn name_column_width(config: &Config) -> u16 {
    let widest = config
        .sections
        .iter()
        .map(|s| s.name.width())
        .max()
        .unwrap_or(0);
    (widest as u16).clamp(MIN_NAME_WIDTH, MAX_NAME_WIDTH)
}

/// One line describing the plan's total against the allowed range
pub fn plan_summary(config: &Config) -> String {
    let (min, max) = config.range_minutes();
    format!(
        "Planned {} (range {}–{}) {}",
        fmt_minutes(config.total_planned_minutes()),
        fmt_minutes(min),
        fmt_minutes(max),
        if config.is_valid() { "✓" } else { "✗ out of range" }
    )
}

pub fn render_config<C: Clock + Clone>(app: &App<C>, f: &mut Frame) {
    let config = &app.config;
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // plan summary
            Constraint::Length(3), // presenters
            Constraint::Min(0),    // sections
            Constraint::Length(3), // instructions
        ])
        .split(area);

    let summary_style = if config.is_valid() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red)
    };
    let summary = Paragraph::new(Span::styled(
        plan_summary(config),
        summary_style.add_modifier(Modifier::BOLD),
    ))
    .block(Block::default().borders(Borders::ALL).title("Plan"))
    .alignment(Alignment::Center);
    f.render_widget(summary, chunks[0]);

    let presenters = if config.presenters.is_empty() {
        "none".to_string()
    } else {
        config.presenters.iter().join(", ")
    };
    f.render_widget(
        Paragraph::new(presenters)
            .block(Block::default().borders(Borders::ALL).title("Presenters")),
        chunks[1],
    );

    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from("Section"),
        Cell::from("Presenter"),
        Cell::from("Planned"),
    ])
    .style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = config
        .sections
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Row::new(vec![
                Cell::from((i + 1).to_string()),
                Cell::from(s.name.clone()),
                Cell::from(if s.presenter.is_empty() {
                    "-".to_string()
                } else {
                    s.presenter.clone()
                }),
                Cell::from(fmt_clock(s.planned_secs())),
            ])
        })
        .collect();

    if rows.is_empty() {
        f.render_widget(
            Paragraph::new("No sections configured.\nAdd one with `pacer add-section`.")
                .block(Block::default().borders(Borders::ALL).title("Running order"))
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center),
            chunks[2],
        );
    } else {
        let table = Table::new(
            rows,
            [
                Constraint::Length(3),
                Constraint::Length(name_column_width(config)),
                Constraint::Min(10),
                Constraint::Length(8),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Running order"));
        f.render_widget(table, chunks[2]);
    }

    let (hint, style) = match &app.status {
        Some(status) => (status.clone(), Style::default().fg(Color::Red)),
        None => (
            "(enter) present / (q)uit / (esc)ape".to_string(),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        ),
    };
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(hint, style)))
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center),
        chunks[3],
    );
}
