use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PacerError, Result};
use crate::section::{coerce_non_negative, lenient_number, total_planned_secs, Section};

/// Minutes and seconds given to sections created in the editor
pub const NEW_SECTION_MINUTES: f64 = 5.0;

/// Everything the presenter sets up before a run: the running order and
/// the acceptable total length.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default, alias = "minTime", deserialize_with = "lenient_number")]
    pub min_time_minutes: f64,
    #[serde(default, alias = "maxTime", deserialize_with = "lenient_number")]
    pub max_time_minutes: f64,
    pub presenters: Vec<String>,
    pub sections: Vec<Section>,
}

impl Default for Config {
    fn default() -> Self {
        let presenter = "Presenter 1".to_string();
        Self {
            min_time_minutes: 10.0,
            max_time_minutes: 15.0,
            sections: vec![
                Section::new("Introduction", presenter.clone(), 3.0, 0.0),
                Section::new("Demo", presenter.clone(), 5.0, 0.0),
                Section::new("Closing", presenter.clone(), 2.0, 0.0),
            ],
            presenters: vec![presenter],
        }
    }
}

/// Where the real elapsed time sits relative to the configured range
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum RangeStatus {
    Below,
    InRange,
    OverRange,
}

impl Config {
    pub fn can_present(&self) -> bool {
        !self.sections.is_empty()
    }

    pub fn total_planned_secs(&self) -> f64 {
        total_planned_secs(&self.sections)
    }

    pub fn total_planned_minutes(&self) -> f64 {
        self.total_planned_secs() / 60.0
    }

    /// The plan fits inside `[min, max]` and the range itself is ordered.
    pub fn is_valid(&self) -> bool {
        let (min, max) = self.range_minutes();
        let total = self.total_planned_minutes();
        total >= min && total <= max && min <= max
    }

    pub fn range_minutes(&self) -> (f64, f64) {
        (
            coerce_non_negative(self.min_time_minutes),
            coerce_non_negative(self.max_time_minutes),
        )
    }

    /// Classify real elapsed seconds against the configured range.
    pub fn range_status(&self, elapsed_secs: f64) -> RangeStatus {
        let (min, max) = self.range_minutes();
        if elapsed_secs >= min * 60.0 && elapsed_secs <= max * 60.0 {
            RangeStatus::InRange
        } else if elapsed_secs > max * 60.0 {
            RangeStatus::OverRange
        } else {
            RangeStatus::Below
        }
    }

    pub fn set_range(&mut self, min_minutes: f64, max_minutes: f64) {
        self.min_time_minutes = coerce_non_negative(min_minutes);
        self.max_time_minutes = coerce_non_negative(max_minutes);
    }

    /// Append a blank section owned by the first presenter; returns its index.
    pub fn add_section(&mut self) -> usize {
        let presenter = self.presenters.first().cloned().unwrap_or_default();
        self.sections
            .push(Section::new("", presenter, NEW_SECTION_MINUTES, 0.0));
        self.sections.len() - 1
    }

    pub fn remove_section(&mut self, index: usize) -> Result<Section> {
        self.check_index(index)?;
        Ok(self.sections.remove(index))
    }

    pub fn section_mut(&mut self, index: usize) -> Result<&mut Section> {
        self.check_index(index)?;
        Ok(&mut self.sections[index])
    }

    /// Move the section at `from` so it ends up at `to`. Returns false and
    /// leaves the order alone when either index is out of range or they match.
    pub fn move_section(&mut self, from: usize, to: usize) -> bool {
        let len = self.sections.len();
        if from == to || from >= len || to >= len {
            return false;
        }
        let moved = self.sections.remove(from);
        self.sections.insert(to, moved);
        true
    }

    pub fn add_presenter(&mut self, name: impl Into<String>) {
        self.presenters.push(name.into());
    }

    /// Drop a presenter; sections they owned are left without one.
    pub fn remove_presenter(&mut self, name: &str) -> Result<()> {
        let pos = self
            .presenters
            .iter()
            .position(|p| p == name)
            .ok_or_else(|| PacerError::UnknownPresenter(name.to_string()))?;
        self.presenters.remove(pos);
        for section in self.sections.iter_mut().filter(|s| s.presenter == name) {
            section.presenter.clear();
        }
        Ok(())
    }

    /// Rename a presenter and carry the new name into their sections.
    pub fn rename_presenter(&mut self, old: &str, new: &str) -> Result<()> {
        let slot = self
            .presenters
            .iter_mut()
            .find(|p| p.as_str() == old)
            .ok_or_else(|| PacerError::UnknownPresenter(old.to_string()))?;
        *slot = new.to_string();
        for section in self.sections.iter_mut().filter(|s| s.presenter == old) {
            section.presenter = new.to_string();
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.sections.len() {
            Ok(())
        } else {
            Err(PacerError::InvalidIndex {
                index,
                len: self.sections.len(),
            })
        }
    }
}

pub trait ConfigStore {
    /// `None` when nothing usable is stored
    fn load(&self) -> Option<Config>;
    fn save(&self, cfg: &Config) -> Result<()>;

    fn load_or_default(&self) -> Config {
        self.load().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "pacer") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("pacer_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Option<Config> {
        let bytes = fs::read(&self.path).ok()?;
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => Some(cfg),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                None
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        tracing::debug!(path = %self.path.display(), "config saved");
        Ok(())
    }
}
