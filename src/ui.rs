pub mod config_view;
pub mod report_table;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
    Frame,
};

use crate::{
    app::App,
    clock::Clock,
    config::{Config, RangeStatus},
    format::{fmt_diff, fmt_remaining, fmt_time},
    schedule::{ScheduleSnapshot, ScheduleStatus},
    section::Section,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

/// Render whichever screen matches the app state
pub fn draw<C: Clock + Clone>(app: &App<C>, f: &mut Frame) {
    screen::current_screen::<C>(app.state()).render(app, f);
}

/// Live view of a running presentation
pub struct PresentationView<'a> {
    pub snapshot: ScheduleSnapshot,
    pub section: &'a Section,
    pub next: Option<&'a Section>,
    pub config: &'a Config,
}

impl<'a> PresentationView<'a> {
    pub fn from_app<C: Clock + Clone>(app: &'a App<C>) -> Option<Self> {
        let engine = app.session()?;
        Some(Self {
            snapshot: engine.snapshot(),
            section: engine.current_section(),
            next: engine.next_section(),
            config: &app.config,
        })
    }
}

impl Widget for &PresentationView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snap = &self.snapshot;
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // counter
                Constraint::Length(1), // padding
                Constraint::Length(1), // section name
                Constraint::Length(1), // presenter
                Constraint::Min(3),    // countdown
                Constraint::Length(1), // next section
                Constraint::Length(3), // totals row
                Constraint::Length(1), // progress
                Constraint::Length(1), // padding
                Constraint::Length(1), // hints
            ])
            .split(area);

        let run_marker = if snap.is_running { "▶" } else { "⏸" };
        Paragraph::new(Span::styled(
            format!(
                "{run_marker}  SECTION {} / {}",
                snap.current_index + 1,
                snap.section_count
            ),
            dim_style.patch(bold_style),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        let name = if self.section.name.is_empty() {
            "Untitled"
        } else {
            self.section.name.as_str()
        };
        Paragraph::new(Span::styled(name.to_string(), bold_style.fg(Color::Cyan)))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        let presenter = if self.section.presenter.is_empty() {
            "No presenter"
        } else {
            self.section.presenter.as_str()
        };
        Paragraph::new(Span::styled(presenter.to_string(), italic_style))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        let countdown_style = if snap.is_overtime() {
            bold_style
                .fg(Color::Red)
                .add_modifier(Modifier::SLOW_BLINK)
        } else {
            bold_style
        };
        let countdown_area = chunks[4];
        let countdown_row = Rect {
            y: countdown_area.y + countdown_area.height / 2,
            height: countdown_area.height.min(1),
            ..countdown_area
        };
        Paragraph::new(Span::styled(fmt_remaining(snap.section_remaining), countdown_style))
            .alignment(Alignment::Center)
            .render(countdown_row, buf);

        if let Some(next) = self.next {
            let next_name = if next.name.is_empty() { "Untitled" } else { next.name.as_str() };
            let next_presenter = if next.presenter.is_empty() { "No presenter" } else { next.presenter.as_str() };
            Paragraph::new(Line::from(vec![
                Span::styled("Next: ", dim_style),
                Span::raw(format!("{next_name} — {next_presenter}")),
            ]))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
        }

        render_totals(snap, self.config, chunks[6], buf);

        Gauge::default()
            .gauge_style(Style::default().fg(Color::Magenta))
            .ratio(snap.progress_fraction.clamp(0.0, 1.0))
            .label(format!("{:.0}%", snap.progress_fraction * 100.0))
            .render(chunks[7], buf);

        let next_label = if snap.is_last_section() { "finish" } else { "next" };
        Paragraph::new(Span::styled(
            format!("(space) play/pause / (←) prev / (→) {next_label} / (r)eset section / (c)onfig / (esc)ape"),
            italic_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[9], buf);
    }
}

fn render_totals(snap: &ScheduleSnapshot, config: &Config, area: Rect, buf: &mut Buffer) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let bold_style = Style::default().add_modifier(Modifier::BOLD);

    Paragraph::new(Span::styled(fmt_time(snap.total_remaining), bold_style))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Remaining"))
        .render(cols[0], buf);

    let (min, max) = config.range_minutes();
    let range_color = match config.range_status(snap.global_elapsed) {
        RangeStatus::InRange => Color::Green,
        RangeStatus::OverRange => Color::Red,
        RangeStatus::Below => Color::Reset,
    };
    Paragraph::new(Line::from(vec![
        Span::styled(fmt_time(snap.global_elapsed), bold_style.fg(range_color)),
        Span::styled(
            format!(" / {}–{}", fmt_time(min * 60.0), fmt_time(max * 60.0)),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Elapsed"))
    .render(cols[1], buf);

    let (title, color) = match snap.status() {
        ScheduleStatus::Ahead => ("Ahead", Color::Green),
        ScheduleStatus::Behind => ("Behind", Color::Red),
    };
    Paragraph::new(Span::styled(
        fmt_diff(snap.schedule_deviation as f64),
        bold_style.fg(color),
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title(title))
    .render(cols[2], buf);
}

pub fn render_presentation<C: Clock + Clone>(app: &App<C>, f: &mut Frame) {
    if let Some(view) = PresentationView::from_app(app) {
        f.render_widget(&view, f.area());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::derive_snapshot;
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(buf: &Buffer) -> String {
        buf.content.iter().map(|c| c.symbol()).collect()
    }

    fn render_view(view: &PresentationView, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);
        buffer_text(&buf)
    }

    #[test]
    fn shows_section_and_countdown() {
        let config = Config::default();
        let snapshot = derive_snapshot(&config.sections, 0, 30.0, 30.0);
        let view = PresentationView {
            snapshot,
            section: &config.sections[0],
            next: config.sections.get(1),
            config: &config,
        };

        let text = render_view(&view, 100, 24);
        assert!(text.contains("SECTION 1 / 3"));
        assert!(text.contains("Introduction"));
        assert!(text.contains("02:30"));
        assert!(text.contains("Demo"));
        assert!(text.contains("Ahead"));
    }

    #[test]
    fn overtime_and_behind_are_visible() {
        let config = Config::default();
        let snapshot = derive_snapshot(&config.sections, 2, 150.0, 700.0);
        let view = PresentationView {
            snapshot,
            section: &config.sections[2],
            next: None,
            config: &config,
        };

        let text = render_view(&view, 100, 24);
        assert!(text.contains("-00:30"));
        assert!(text.contains("Behind"));
        assert!(text.contains("finish"));
        assert!(!text.contains("Next:"));
    }

    #[test]
    fn blank_section_fields_use_fallbacks() {
        let config = Config {
            sections: vec![Section::new("", "", 1.0, 0.0)],
            ..Config::default()
        };
        let snapshot = derive_snapshot(&config.sections, 0, 0.0, 0.0);
        let view = PresentationView {
            snapshot,
            section: &config.sections[0],
            next: None,
            config: &config,
        };

        let text = render_view(&view, 100, 24);
        assert!(text.contains("Untitled"));
        assert!(text.contains("No presenter"));
    }

    #[test]
    fn next_section_uses_same_fallbacks() {
        let config = Config {
            sections: vec![Section::new("Intro", "Ana", 1.0, 0.0), Section::new("", "", 1.0, 0.0)],
            ..Config::default()
        };
        let snapshot = derive_snapshot(&config.sections, 0, 0.0, 0.0);
        let view = PresentationView {
            snapshot,
            section: &config.sections[0],
            next: config.sections.get(1),
            config: &config,
        };

        let text = render_view(&view, 100, 24);
        assert!(text.contains("Untitled — No presenter"));
        assert!(!text.contains("?"));
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let config = Config::default();
        let snapshot = derive_snapshot(&config.sections, 0, 0.0, 0.0);
        let view = PresentationView {
            snapshot,
            section: &config.sections[0],
            next: None,
            config: &config,
        };
        for (w, h) in [(12, 4), (1, 1), (40, 8)] {
            render_view(&view, w, h);
        }
    }

    #[test]
    fn draw_dispatches_on_state() {
        use crate::{app::Outputs, clock::ManualClock, runtime::FrameScheduler};

        let mut app = App::new(
            Config::default(),
            ManualClock::new(),
            FrameScheduler::new(),
            Outputs::default(),
        );
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();

        terminal.draw(|f| draw(&app, f)).unwrap();
        assert!(buffer_text(terminal.backend().buffer()).contains("Running order"));

        app.enter_presentation_mode().unwrap();
        terminal.draw(|f| draw(&app, f)).unwrap();
        assert!(buffer_text(terminal.backend().buffer()).contains("SECTION 1 / 3"));

        app.session_mut().unwrap().finish_presentation();
        terminal.draw(|f| draw(&app, f)).unwrap();
        assert!(buffer_text(terminal.backend().buffer()).contains("TOTAL"));
    }
}
