use directories::ProjectDirs;
use std::path::PathBuf;

/// Where mnemo keeps its history database and log files.
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("mnemo"))
        } else {
            ProjectDirs::from("", "", "mnemo")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("history.db"))
    }

    pub fn log_dir() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_under_the_state_dir() {
        let (Some(state), Some(db), Some(logs)) =
            (AppDirs::state_dir(), AppDirs::db_path(), AppDirs::log_dir())
        else {
            return;
        };
        assert!(state.ends_with("mnemo"));
        assert_eq!(db, state.join("history.db"));
        assert_eq!(logs.parent(), Some(state.as_path()));
    }
}
