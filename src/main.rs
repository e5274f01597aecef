use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::KeyEventKind,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use pacer::{
    app::{App, KeyOutcome, Outputs},
    app_dirs::AppDirs,
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    format::fmt_clock,
    runtime::{CrosstermEventSource, FrameScheduler, FrameTicker, PacerEvent, Runner},
    ui::{self, config_view::plan_summary},
    PacerError,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing_subscriber::EnvFilter;

/// terminal presentation timer that keeps every section of a talk on schedule
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A presentation timer for the terminal: plan a running order of timed sections, present with a live countdown and ahead/behind indicator, then review planned vs. actual time."
)]
pub struct Cli {
    /// config file to use instead of the per-user default
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// write diagnostics to this file (filter with PACER_LOG)
    #[clap(long, global = true)]
    log_file: Option<PathBuf>,

    /// directory for exported csv reports
    #[clap(long)]
    report_dir: Option<PathBuf>,

    /// do not append finished sessions to the session log
    #[clap(long)]
    no_log: bool,

    /// skip the configuration screen and start presenting right away
    #[clap(long)]
    present: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

/// Non-interactive edits to the saved configuration. Positions are 1-based,
/// as printed by `show`.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// print the running order and plan summary
    Show,
    /// append a section (5 min, first presenter unless given)
    AddSection {
        name: String,
        #[clap(short, long)]
        minutes: Option<f64>,
        #[clap(short, long)]
        seconds: Option<f64>,
        #[clap(short, long)]
        presenter: Option<String>,
    },
    /// remove the section at a position
    RemoveSection {
        #[clap(value_parser = clap::value_parser!(u64).range(1..))]
        position: u64,
    },
    /// move a section to a new position
    MoveSection {
        #[clap(value_parser = clap::value_parser!(u64).range(1..))]
        from: u64,
        #[clap(value_parser = clap::value_parser!(u64).range(1..))]
        to: u64,
    },
    /// change fields of the section at a position
    SetSection {
        #[clap(value_parser = clap::value_parser!(u64).range(1..))]
        position: u64,
        #[clap(short, long)]
        name: Option<String>,
        #[clap(short, long)]
        minutes: Option<f64>,
        #[clap(short, long)]
        seconds: Option<f64>,
        #[clap(short, long)]
        presenter: Option<String>,
    },
    /// add a presenter
    AddPresenter { name: String },
    /// remove a presenter; their sections are left without one
    RemovePresenter { name: String },
    /// rename a presenter everywhere
    RenamePresenter { old: String, new: String },
    /// set the acceptable total length in minutes
    SetRange { min: f64, max: f64 },
    /// restore the built-in example configuration
    Reset,
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    fn outputs(&self) -> Outputs {
        Outputs {
            log_path: if self.no_log { None } else { AppDirs::log_path() },
            report_dir: self.report_dir.clone().or_else(AppDirs::report_dir),
        }
    }
}

fn index(position: u64) -> usize {
    position.saturating_sub(1) as usize
}

/// Apply one editor command. Returns whether the config changed. Section
/// errors report the same 1-based positions the user typed.
fn apply_command(command: &Command, config: &mut Config) -> Result<bool, PacerError> {
    apply_edit(command, config).map_err(|err| match err {
        PacerError::InvalidIndex { index, len } => PacerError::InvalidIndex {
            index: index + 1,
            len,
        },
        other => other,
    })
}

fn apply_edit(command: &Command, config: &mut Config) -> Result<bool, PacerError> {
    match command {
        Command::Show => return Ok(false),
        Command::AddSection {
            name,
            minutes,
            seconds,
            presenter,
        } => {
            let idx = config.add_section();
            let section = config.section_mut(idx)?;
            section.name = name.clone();
            if let Some(m) = minutes {
                section.planned_minutes = pacer::section::coerce_non_negative(*m);
            }
            if let Some(s) = seconds {
                section.planned_seconds = pacer::section::coerce_non_negative(*s);
            }
            if let Some(p) = presenter {
                section.presenter = p.clone();
            }
        }
        Command::RemoveSection { position } => {
            config.remove_section(index(*position))?;
        }
        Command::MoveSection { from, to } => {
            let len = config.sections.len();
            for pos in [*from, *to] {
                if index(pos) >= len {
                    return Err(PacerError::InvalidIndex {
                        index: index(pos),
                        len,
                    });
                }
            }
            return Ok(config.move_section(index(*from), index(*to)));
        }
        Command::SetSection {
            position,
            name,
            minutes,
            seconds,
            presenter,
        } => {
            let section = config.section_mut(index(*position))?;
            if let Some(n) = name {
                section.name = n.clone();
            }
            if let Some(m) = minutes {
                section.planned_minutes = pacer::section::coerce_non_negative(*m);
            }
            if let Some(s) = seconds {
                section.planned_seconds = pacer::section::coerce_non_negative(*s);
            }
            if let Some(p) = presenter {
                section.presenter = p.clone();
            }
        }
        Command::AddPresenter { name } => config.add_presenter(name.clone()),
        Command::RemovePresenter { name } => config.remove_presenter(name)?,
        Command::RenamePresenter { old, new } => config.rename_presenter(old, new)?,
        Command::SetRange { min, max } => config.set_range(*min, *max),
        Command::Reset => *config = Config::default(),
    }
    Ok(true)
}

/// Plain-text listing used by `show` and after every edit
fn describe(config: &Config) -> String {
    let mut out = String::new();
    for (i, s) in config.sections.iter().enumerate() {
        let presenter = if s.presenter.is_empty() { "-" } else { s.presenter.as_str() };
        out.push_str(&format!(
            "{:>3}. {} ({}) {}\n",
            i + 1,
            if s.name.is_empty() { "Untitled" } else { s.name.as_str() },
            presenter,
            fmt_clock(s.planned_secs())
        ));
    }
    if config.sections.is_empty() {
        out.push_str("no sections\n");
    }
    out.push_str(&plan_summary(config));
    out.push('\n');
    out
}

fn init_tracing(path: &Path) -> Result<(), Box<dyn Error>> {
    let file = File::options().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_env("PACER_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_tracing(path)?;
    }

    let store = cli.config_store();

    if let Some(command) = &cli.command {
        let mut config = store.load_or_default();
        let changed = match apply_command(command, &mut config) {
            Ok(changed) => changed,
            Err(err @ (PacerError::InvalidIndex { .. } | PacerError::UnknownPresenter(_))) => {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::InvalidValue, err).exit();
            }
            Err(err) => return Err(err.into()),
        };
        if changed {
            store.save(&config)?;
            tracing::info!(?command, path = %store.path().display(), "config updated");
        }
        print!("{}", describe(&config));
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(
        store.load_or_default(),
        SystemClock,
        FrameScheduler::new(),
        cli.outputs(),
    );
    if cli.present {
        if let Err(err) = app.enter_presentation_mode() {
            app.status = Some(err.to_string());
        }
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<SystemClock>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FrameTicker::new(app.scheduler().clone()),
    );

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        // a deferred resume changes what is on screen; draw it before waiting
        if app.after_render() {
            continue;
        }

        match runner.step() {
            PacerEvent::Tick | PacerEvent::Resize => {}
            PacerEvent::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key) == KeyOutcome::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["pacer"]);

        assert_eq!(cli.config, None);
        assert_eq!(cli.log_file, None);
        assert_eq!(cli.report_dir, None);
        assert!(!cli.no_log);
        assert!(!cli.present);
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "pacer",
            "--config",
            "/tmp/talk.json",
            "--report-dir",
            "/tmp/reports",
            "--no-log",
            "--present",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/talk.json")));
        assert_eq!(cli.report_dir, Some(PathBuf::from("/tmp/reports")));
        assert!(cli.no_log);
        assert!(cli.present);
        assert_eq!(cli.outputs().log_path, None);
        assert_eq!(cli.outputs().report_dir, Some(PathBuf::from("/tmp/reports")));
    }

    #[test]
    fn test_cli_subcommands() {
        let cli = Cli::parse_from(["pacer", "add-section", "Q&A", "-m", "4", "-p", "Bo"]);
        assert_eq!(
            cli.command,
            Some(Command::AddSection {
                name: "Q&A".to_string(),
                minutes: Some(4.0),
                seconds: None,
                presenter: Some("Bo".to_string()),
            })
        );

        let cli = Cli::parse_from(["pacer", "move-section", "3", "1"]);
        assert_eq!(cli.command, Some(Command::MoveSection { from: 3, to: 1 }));

        let cli = Cli::parse_from(["pacer", "set-range", "12", "20"]);
        assert_eq!(cli.command, Some(Command::SetRange { min: 12.0, max: 20.0 }));

        // global flags are accepted after the subcommand
        let cli = Cli::parse_from(["pacer", "show", "--config", "x.json"]);
        assert_eq!(cli.command, Some(Command::Show));
        assert_eq!(cli.config, Some(PathBuf::from("x.json")));
    }

    #[test]
    fn test_cli_rejects_position_zero() {
        assert!(Cli::try_parse_from(["pacer", "remove-section", "0"]).is_err());
    }

    #[test]
    fn test_apply_add_and_set_section() {
        let mut config = Config::default();
        let cmd = Command::AddSection {
            name: "Q&A".into(),
            minutes: Some(4.0),
            seconds: Some(30.0),
            presenter: None,
        };
        assert!(apply_command(&cmd, &mut config).unwrap());
        let added = config.sections.last().unwrap();
        assert_eq!(added.name, "Q&A");
        assert_eq!(added.presenter, "Presenter 1");
        assert_eq!(added.planned_secs(), 270.0);

        let cmd = Command::SetSection {
            position: 1,
            name: None,
            minutes: Some(-2.0),
            seconds: None,
            presenter: Some("Ana".into()),
        };
        apply_command(&cmd, &mut config).unwrap();
        assert_eq!(config.sections[0].planned_minutes, 0.0);
        assert_eq!(config.sections[0].presenter, "Ana");
    }

    #[test]
    fn test_apply_move_and_remove() {
        let mut config = Config::default();
        assert!(apply_command(&Command::MoveSection { from: 3, to: 1 }, &mut config).unwrap());
        assert_eq!(config.sections[0].name, "Closing");

        assert!(!apply_command(&Command::MoveSection { from: 2, to: 2 }, &mut config).unwrap());
        assert_matches!(
            apply_command(&Command::MoveSection { from: 9, to: 1 }, &mut config),
            Err(PacerError::InvalidIndex { index: 9, len: 3 })
        );

        apply_command(&Command::RemoveSection { position: 1 }, &mut config).unwrap();
        assert_eq!(config.sections.len(), 2);
        assert_matches!(
            apply_command(&Command::RemoveSection { position: 5 }, &mut config),
            Err(PacerError::InvalidIndex { index: 5, len: 2 })
        );
        let set = Command::SetSection {
            position: 3,
            name: Some("x".into()),
            minutes: None,
            seconds: None,
            presenter: None,
        };
        let err = apply_command(&set, &mut config).unwrap_err();
        assert_eq!(err.to_string(), "no section at position 3 (have 2)");
    }

    #[test]
    fn test_apply_presenters_and_reset() {
        let mut config = Config::default();
        apply_command(&Command::AddPresenter { name: "Bo".into() }, &mut config).unwrap();
        apply_command(
            &Command::RenamePresenter {
                old: "Presenter 1".into(),
                new: "Ana".into(),
            },
            &mut config,
        )
        .unwrap();
        assert_eq!(config.presenters, vec!["Ana", "Bo"]);
        assert!(config.sections.iter().all(|s| s.presenter == "Ana"));

        apply_command(&Command::RemovePresenter { name: "Ana".into() }, &mut config).unwrap();
        assert!(config.sections.iter().all(|s| s.presenter.is_empty()));
        assert_matches!(
            apply_command(&Command::RemovePresenter { name: "Zed".into() }, &mut config),
            Err(PacerError::UnknownPresenter(_))
        );

        assert!(!apply_command(&Command::Show, &mut config).unwrap());
        apply_command(&Command::Reset, &mut config).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_describe_lists_sections() {
        let text = describe(&Config::default());
        assert!(text.contains("  1. Introduction (Presenter 1) 03:00"));
        assert!(text.contains("Planned 10 min"));

        let empty = Config {
            sections: vec![],
            ..Config::default()
        };
        assert!(describe(&empty).contains("no sections"));
    }
}
