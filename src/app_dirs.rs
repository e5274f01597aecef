use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// State directory holding the session log and exported reports
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("pacer"))
        } else {
            ProjectDirs::from("", "", "pacer").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("log.csv"))
    }

    pub fn report_dir() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("reports"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_live_under_state_dir() {
        if let Some(state) = AppDirs::state_dir() {
            assert_eq!(AppDirs::log_path(), Some(state.join("log.csv")));
            assert_eq!(AppDirs::report_dir(), Some(state.join("reports")));
        }
    }
}
