use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use tracing::debug;

use renamarr_core::{CatalogEpisode, EngineError, EpisodeKey, LibraryStatus, ReconciledEpisode};

/// Merge a catalog episode list with library statuses into one
/// per-episode view, ordered ascending by `(season, episode)`.
///
/// The catalog decides which episodes exist: status rows with no catalog
/// match are dropped. A catalog that lists the same key twice is a data
/// integrity failure, not something to paper over.
pub fn reconcile(
    catalog: &[CatalogEpisode],
    statuses: &[LibraryStatus],
) -> Result<Vec<ReconciledEpisode>, EngineError> {
    let mut by_key: BTreeMap<EpisodeKey, &CatalogEpisode> = BTreeMap::new();
    for ep in catalog {
        if by_key.insert(ep.key(), ep).is_some() {
            return Err(EngineError::DuplicateCatalogEntry(ep.key()));
        }
    }

    let status_by_key: HashMap<EpisodeKey, &LibraryStatus> =
        statuses.iter().map(|s| (s.key(), s)).collect();

    let mut merged: Vec<ReconciledEpisode> = by_key
        .values()
        .map(|ep| {
            let status = status_by_key.get(&ep.key());
            ReconciledEpisode {
                season_number: ep.season_number,
                episode_number: ep.episode_number,
                title: ep.title.clone(),
                air_date: ep.air_date,
                absolute_number: ep.absolute_number,
                has_file: status.map(|s| s.has_file).unwrap_or(false),
                quality_tag: status.and_then(|s| s.quality_tag.clone()),
                is_multi_episode_candidate: false,
            }
        })
        .collect();

    flag_multi_episode_candidates(&mut merged);

    debug!(
        episodes = merged.len(),
        candidates = merged.iter().filter(|e| e.is_multi_episode_candidate).count(),
        "reconciled season view"
    );

    Ok(merged)
}

/// Episodes that aired the same day and still lack a file are likely
/// bundled in one release file. Episodes with a file, or without an air
/// date, are never flagged.
fn flag_multi_episode_candidates(episodes: &mut [ReconciledEpisode]) {
    let mut fileless_per_date: HashMap<(u32, NaiveDate), u32> = HashMap::new();
    for ep in episodes.iter() {
        if ep.has_file {
            continue;
        }
        if let Some(date) = ep.air_date {
            *fileless_per_date
                .entry((ep.season_number, date))
                .or_insert(0) += 1;
        }
    }

    for ep in episodes.iter_mut() {
        if ep.has_file {
            continue;
        }
        if let Some(date) = ep.air_date {
            let shared = fileless_per_date
                .get(&(ep.season_number, date))
                .copied()
                .unwrap_or(0);
            ep.is_multi_episode_candidate = shared > 1;
        }
    }
}
