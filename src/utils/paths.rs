use std::{env, fs, io, path::Path, path::PathBuf};

use dirs::home_dir;

const HOME_ENV: &str = "STARJAR_HOME";
const DEFAULT_DIR_NAME: &str = ".starjar";
const DATA_DIR: &str = "data";
const CONFIG_FILE: &str = "config.json";

/// Resolves where StarJar keeps its files.
pub struct PathResolver;

impl PathResolver {
    /// `$STARJAR_HOME`, falling back to `~/.starjar`.
    pub fn base_dir() -> PathBuf {
        if let Some(custom) = env::var_os(HOME_ENV) {
            return PathBuf::from(custom);
        }
        home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DIR_NAME)
    }

    pub fn data_dir_in(base: &Path) -> PathBuf {
        base.join(DATA_DIR)
    }

    pub fn config_file_in(base: &Path) -> PathBuf {
        base.join(CONFIG_FILE)
    }
}

pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
