use std::fs;
use std::io;
use std::path::PathBuf;

use directories::ProjectDirs;

const APP_QUALIFIER: &str = "in";
const APP_ORG: &str = "MandiAdvisor";
const APP_NAME: &str = "MandiAdvisor";
const CONFIG_FILENAME: &str = "advisor.json";

/// Per-user override for the market and tariff tables.
pub fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Write `contents` as the user config, refusing to clobber unless `force`.
pub fn save_user_config(contents: &str, force: bool) -> Result<PathBuf, PersistSaveError> {
    let path = user_config_file().ok_or(PersistSaveError::StorageUnavailable)?;
    if path.exists() && !force {
        return Err(PersistSaveError::AlreadyExists(path));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, contents)?;
    Ok(path)
}

#[derive(Debug, thiserror::Error)]
pub enum PersistSaveError {
    #[error("storage directory unavailable")]
    StorageUnavailable,
    #[error("{} already exists; pass --force to overwrite", .0.display())]
    AlreadyExists(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
}
