use std::path::PathBuf;

use thiserror::Error;

use crate::types::EpisodeKey;

/// Errors raised by the reconciliation, synthesis, and rename operations.
///
/// A rename that would change nothing is not an error; it is reported as a
/// successful outcome with `changed == false`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The catalog listed the same `(season, episode)` twice. Never
    /// deduplicated silently.
    #[error("duplicate catalog entry for {0}")]
    DuplicateCatalogEntry(EpisodeKey),

    /// A selected key has no counterpart in the reconciled episode set.
    #[error("unknown episode {0}")]
    UnknownEpisode(EpisodeKey),

    /// A selection must contain at least one episode.
    #[error("selection is empty")]
    EmptySelection,

    /// The same key was selected twice.
    #[error("episode {0} selected more than once")]
    DuplicateSelection(EpisodeKey),

    /// A selection may not span seasons.
    #[error("selection spans seasons {first} and {second}")]
    MultiSeasonSelection { first: u32, second: u32 },

    /// The file to rename is gone.
    #[error("source file missing: {0}")]
    SourceMissing(PathBuf),

    /// The target name is already taken by a different file.
    #[error("target already exists: {0}")]
    TargetCollision(PathBuf),

    /// A path that cannot name a file (no final component).
    #[error("path has no file name: {0}")]
    InvalidPath(PathBuf),

    #[error("filesystem error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
