use std::collections::HashSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Identity of an episode within a series: `(season, episode)`.
///
/// Orders by season, then episode number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EpisodeKey {
    pub season: u32,
    pub episode: u32,
}

impl EpisodeKey {
    pub fn new(season: u32, episode: u32) -> Self {
        Self { season, episode }
    }
}

impl std::fmt::Display for EpisodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.episode)
    }
}

/// An episode as listed by the catalog provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEpisode {
    pub season_number: u32,
    pub episode_number: u32,
    pub title: String,
    pub air_date: Option<NaiveDate>,
    pub absolute_number: Option<u32>,
}

impl CatalogEpisode {
    pub fn key(&self) -> EpisodeKey {
        EpisodeKey::new(self.season_number, self.episode_number)
    }
}

/// Per-episode library state from the status provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStatus {
    pub season_number: u32,
    pub episode_number: u32,
    pub has_file: bool,
    pub quality_tag: Option<String>,
}

impl LibraryStatus {
    pub fn key(&self) -> EpisodeKey {
        EpisodeKey::new(self.season_number, self.episode_number)
    }
}

/// Catalog episode overlaid with library state, built fresh on every
/// reconciliation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledEpisode {
    pub season_number: u32,
    pub episode_number: u32,
    pub title: String,
    pub air_date: Option<NaiveDate>,
    pub absolute_number: Option<u32>,
    pub has_file: bool,
    pub quality_tag: Option<String>,
    /// Suspected to share one physical file with another episode: same
    /// season, same air date, and neither has a file yet.
    pub is_multi_episode_candidate: bool,
}

impl ReconciledEpisode {
    pub fn key(&self) -> EpisodeKey {
        EpisodeKey::new(self.season_number, self.episode_number)
    }
}

/// A user's episode pick: ordered, non-empty, duplicate-free, and confined
/// to a single season. Validated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    keys: Vec<EpisodeKey>,
}

impl Selection {
    pub fn new(keys: Vec<EpisodeKey>) -> Result<Self, EngineError> {
        let Some(first) = keys.first() else {
            return Err(EngineError::EmptySelection);
        };
        let season = first.season;
        let mut seen = HashSet::new();
        for key in &keys {
            if key.season != season {
                return Err(EngineError::MultiSeasonSelection {
                    first: season,
                    second: key.season,
                });
            }
            if !seen.insert(*key) {
                return Err(EngineError::DuplicateSelection(*key));
            }
        }
        Ok(Self { keys })
    }

    pub fn keys(&self) -> &[EpisodeKey] {
        &self.keys
    }

    pub fn season(&self) -> u32 {
        // Non-empty by construction.
        self.keys[0].season
    }
}

/// A validated rename about to happen. Built on demand, consumed once by
/// the executor, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub preserved_quality_tag: Option<String>,
}

/// What the executor did. `changed == false` means source and target were
/// already the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    pub target_path: PathBuf,
    pub changed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn episode_key_display() {
        assert_eq!(EpisodeKey::new(1, 5).to_string(), "S01E05");
        assert_eq!(EpisodeKey::new(12, 104).to_string(), "S12E104");
    }

    #[test]
    fn episode_key_orders_by_season_then_episode() {
        let mut keys = vec![
            EpisodeKey::new(2, 1),
            EpisodeKey::new(1, 10),
            EpisodeKey::new(1, 2),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                EpisodeKey::new(1, 2),
                EpisodeKey::new(1, 10),
                EpisodeKey::new(2, 1),
            ]
        );
    }

    #[test]
    fn selection_rejects_empty() {
        assert!(matches!(
            Selection::new(vec![]),
            Err(EngineError::EmptySelection)
        ));
    }

    #[test]
    fn selection_rejects_duplicates() {
        let err = Selection::new(vec![EpisodeKey::new(1, 3), EpisodeKey::new(1, 3)]);
        assert!(matches!(err, Err(EngineError::DuplicateSelection(k)) if k.episode == 3));
    }

    #[test]
    fn selection_rejects_multi_season() {
        let err = Selection::new(vec![EpisodeKey::new(1, 3), EpisodeKey::new(2, 1)]);
        assert!(matches!(
            err,
            Err(EngineError::MultiSeasonSelection { first: 1, second: 2 })
        ));
    }

    #[test]
    fn selection_preserves_order() {
        let sel =
            Selection::new(vec![EpisodeKey::new(4, 7), EpisodeKey::new(4, 2)]).unwrap();
        assert_eq!(sel.season(), 4);
        assert_eq!(sel.keys()[0].episode, 7);
        assert_eq!(sel.keys()[1].episode, 2);
    }
}
