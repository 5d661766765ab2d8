use std::env;
use std::path::PathBuf;

/// Maximum number of hints a single task may carry
pub const MAX_TASK_HINTS: usize = 3;

/// Get the path to the Questline directory (~/.questline)
pub fn questline_dir() -> PathBuf {
    // First try HOME environment variable (useful for tests)
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".questline")
    } else {
        // Fall back to dirs crate for normal usage
        dirs::home_dir()
            .expect("Unable to get home directory")
            .join(".questline")
    }
}

/// Get the path to the SQLite database file (~/.questline/questline.db)
pub fn database_path() -> PathBuf {
    questline_dir().join("questline.db")
}
