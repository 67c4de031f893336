//! Persist the best score to disk (XDG config or ~/.config/mergetui).

use anyhow::Result;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

const FILENAME: &str = "highscores";
/// Key of the best-score line in the highscores file.
const BEST_SCORE_KEY: &str = "best_score";

/// Config base directory from `XDG_CONFIG_HOME` / `HOME`; an empty
/// `XDG_CONFIG_HOME` counts as unset.
fn config_base(xdg: Option<OsString>, home: Option<OsString>) -> PathBuf {
    match xdg.filter(|x| !x.is_empty()) {
        Some(xdg) => PathBuf::from(xdg),
        None => home
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

/// Path of the highscores file (config dir / mergetui / highscores).
pub fn default_path() -> PathBuf {
    config_base(
        std::env::var_os("XDG_CONFIG_HOME"),
        std::env::var_os("HOME"),
    )
    .join("mergetui")
    .join(FILENAME)
}

/// Best score stored at `path`; 0 on a missing file or parse error.
pub fn load_best(path: &Path) -> u32 {
    let Ok(content) = fs::read_to_string(path) else {
        return 0;
    };
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == BEST_SCORE_KEY)
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

/// Write `best` to `path`, creating the config directory if needed.
pub fn save_best(path: &Path, best: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("{BEST_SCORE_KEY}={best}\n"))?;
    Ok(())
}
