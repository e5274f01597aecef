use ratatui::Frame;

use crate::{
    app::{App, AppState},
    clock::Clock,
    ui::{config_view::render_config, render_presentation, report_table::render_report},
};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen<C: Clock + Clone> {
    fn render(&self, app: &App<C>, f: &mut Frame);
}

/// Configuration summary shown between presentations
pub struct ConfigScreen;

impl<C: Clock + Clone> Screen<C> for ConfigScreen {
    fn render(&self, app: &App<C>, f: &mut Frame) {
        render_config(app, f);
    }
}

/// Live timers for the running presentation
pub struct PresentationScreen;

impl<C: Clock + Clone> Screen<C> for PresentationScreen {
    fn render(&self, app: &App<C>, f: &mut Frame) {
        render_presentation(app, f);
    }
}

/// Planned vs. actual table once the presentation is finished
pub struct ReportScreen;

impl<C: Clock + Clone> Screen<C> for ReportScreen {
    fn render(&self, app: &App<C>, f: &mut Frame) {
        render_report(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen<C: Clock + Clone>(state: AppState) -> Box<dyn Screen<C>> {
    match state {
        AppState::Config => Box::new(ConfigScreen),
        AppState::Presenting => Box::new(PresentationScreen),
        AppState::Report => Box::new(ReportScreen),
    }
}
