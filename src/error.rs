use std::path::PathBuf;

use thiserror::Error;

/// Structural failures that abort a run. Degraded inputs (missing keep file,
/// absent package manifest) never surface here; they fall back to defaults.
#[derive(Debug, Error)]
pub enum PruneError {
    #[error("cannot enumerate project tree under {path}: {message}")]
    Walk { path: PathBuf, message: String },

    #[error("module graph build failed on {file}: {message}")]
    Graph { file: String, message: String },

    #[error(
        "{stage} failed after prune; quarantined files were restored, \
         permanent deletions were already committed"
    )]
    Validation { stage: String },
}
