use std::path::PathBuf;
use std::rc::Rc;

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{PacerError, Result};
use crate::report::Report;
use crate::runtime::FrameScheduler;
use crate::schedule::ScheduleEngine;

/// Which screen the app is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Config,
    Presenting,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

/// Where finished sessions are written
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    pub log_path: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
}

/// Top-level mode machine. A presentation session only exists between
/// [`App::enter_presentation_mode`] and [`App::exit_presentation_mode`];
/// leaving drops it, which cancels its refresh registrations and any pending
/// resume.
#[derive(Debug)]
pub struct App<C: Clock> {
    pub config: Config,
    pub outputs: Outputs,
    pub status: Option<String>,
    session: Option<ScheduleEngine<C>>,
    clock: C,
    scheduler: FrameScheduler,
    logged: bool,
}

impl<C: Clock + Clone> App<C> {
    pub fn new(config: Config, clock: C, scheduler: FrameScheduler, outputs: Outputs) -> Self {
        Self {
            config,
            outputs,
            status: None,
            session: None,
            clock,
            scheduler,
            logged: false,
        }
    }

    pub fn state(&self) -> AppState {
        match &self.session {
            None => AppState::Config,
            Some(engine) if engine.is_finished() => AppState::Report,
            Some(_) => AppState::Presenting,
        }
    }

    pub fn session(&self) -> Option<&ScheduleEngine<C>> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut ScheduleEngine<C>> {
        self.session.as_mut()
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// Start a fresh session over a snapshot of the configured sections.
    pub fn enter_presentation_mode(&mut self) -> Result<()> {
        if !self.config.can_present() {
            return Err(PacerError::NoSections);
        }
        // drop any previous session before its replacement registers refreshes
        self.session = None;
        let engine = ScheduleEngine::start(
            self.config.sections.clone(),
            self.clock.clone(),
            Rc::new(self.scheduler.clone()),
        )?;
        self.session = Some(engine);
        self.logged = false;
        self.status = None;
        Ok(())
    }

    pub fn exit_presentation_mode(&mut self) {
        if self.session.take().is_some() {
            tracing::info!("returned to configuration");
        }
        self.logged = false;
    }

    pub fn report(&self) -> Option<Report> {
        self.session.as_ref().map(ScheduleEngine::report)
    }

    /// Run work deferred to the turn after a state change was drawn.
    pub fn after_render(&mut self) -> bool {
        self.session
            .as_mut()
            .map(ScheduleEngine::run_deferred)
            .unwrap_or(false)
    }

    pub fn export_report(&mut self) -> Result<Option<PathBuf>> {
        let (Some(report), Some(dir)) = (self.report(), self.outputs.report_dir.clone()) else {
            return Ok(None);
        };
        let path = report.export_csv(&dir, Local::now())?;
        Ok(Some(path))
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return KeyOutcome::Quit;
        }

        match self.state() {
            AppState::Config => match key.code {
                KeyCode::Char('q') => return KeyOutcome::Quit,
                KeyCode::Enter | KeyCode::Char('p') => {
                    if let Err(err) = self.enter_presentation_mode() {
                        self.status = Some(err.to_string());
                    }
                }
                _ => {}
            },
            AppState::Presenting => {
                if matches!(key.code, KeyCode::Char('c') | KeyCode::Tab) {
                    self.exit_presentation_mode();
                } else if let Some(engine) = self.session.as_mut() {
                    match key.code {
                        KeyCode::Char(' ') => engine.toggle_play_pause(),
                        KeyCode::Right => engine.go_next(),
                        KeyCode::Left => engine.go_prev(),
                        KeyCode::Char('r') => engine.reset_current_section(),
                        _ => {}
                    }
                    self.log_if_finished();
                }
            }
            AppState::Report => match key.code {
                KeyCode::Char('e') => {
                    self.status = Some(match self.export_report() {
                        Ok(Some(path)) => format!("report saved to {}", path.display()),
                        Ok(None) => "no report directory configured".to_string(),
                        Err(err) => format!("export failed: {err}"),
                    });
                }
                KeyCode::Char('c') | KeyCode::Enter | KeyCode::Tab => self.exit_presentation_mode(),
                _ => {}
            },
        }

        KeyOutcome::Continue
    }

    fn log_if_finished(&mut self) {
        if self.logged || self.state() != AppState::Report {
            return;
        }
        self.logged = true;
        let (Some(report), Some(path)) = (self.report(), self.outputs.log_path.clone()) else {
            return;
        };
        if let Err(err) = report.append_to_log(&path, Local::now()) {
            tracing::warn!(%err, path = %path.display(), "could not append session log");
        }
    }
}
