use std::path::PathBuf;

use crate::detection::infrastructure::cascade::{Cascade, CascadeError};
use crate::shared::constants::{APP_DIR_NAME, CASCADE_FILE_NAME, DEFAULT_CASCADE_LOCATIONS};

/// Ordered cascade locations to try.
///
/// Resolution order:
/// 1. Explicitly configured paths, in the order given
/// 2. Working-directory defaults (`./facefinder`, `./cascade/facefinder`)
/// 3. Platform data directory (`<data_dir>/watchguard/facefinder`)
pub fn candidate_paths(explicit: &[PathBuf]) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = explicit.to_vec();
    paths.extend(DEFAULT_CASCADE_LOCATIONS.iter().map(PathBuf::from));
    if let Some(dir) = model_data_dir() {
        paths.push(dir.join(CASCADE_FILE_NAME));
    }
    paths
}

/// Platform-specific directory for installed cascade files.
///
/// - macOS: `~/Library/Application Support/watchguard/`
/// - Linux: `$XDG_DATA_HOME/watchguard/` or `~/.local/share/watchguard/`
/// - Windows: `%APPDATA%/watchguard/`
pub fn model_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_DIR_NAME))
}

/// Loads the first candidate that exists and unpacks cleanly.
///
/// Candidates that exist but fail to load are logged and skipped. When
/// none succeeds, the last load error is returned, or
/// [`CascadeError::NotFound`] if no candidate existed at all.
pub fn load_first(candidates: &[PathBuf]) -> Result<(PathBuf, Cascade), CascadeError> {
    let mut last_err = None;
    for path in candidates {
        if !path.exists() {
            log::debug!("Cascade candidate {} does not exist", path.display());
            continue;
        }
        match Cascade::from_file(path) {
            Ok(cascade) => {
                log::info!(
                    "Loaded cascade from {} ({} trees, depth {})",
                    path.display(),
                    cascade.trees(),
                    cascade.depth()
                );
                return Ok((path.clone(), cascade));
            }
            Err(e) => {
                log::warn!("Skipping cascade candidate {}: {e}", path.display());
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| CascadeError::NotFound {
        tried: candidates.to_vec(),
    }))
}
