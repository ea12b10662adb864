use renamarr_core::{CatalogEpisode, LibraryStatus};

use crate::ProviderError;

/// Read-only source of authoritative episode metadata.
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Search for a TV series by title.
    async fn search_series(&self, query: &str)
        -> Result<Vec<SeriesSearchResult>, ProviderError>;

    /// List one season's episodes, specials excluded.
    async fn season_episodes(
        &self,
        series_id: &str,
        season: u32,
    ) -> Result<Vec<CatalogEpisode>, ProviderError>;
}

/// Read-only source of per-episode library state, plus the single write
/// command the engine needs: asking the library to rescan a series.
#[async_trait::async_trait]
pub trait StatusProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Series known to the library, filtered by title substring.
    async fn search_series(&self, query: &str)
        -> Result<Vec<SeriesSearchResult>, ProviderError>;

    /// File status for one season's episodes, specials excluded.
    async fn season_statuses(
        &self,
        series_id: &str,
        season: u32,
    ) -> Result<Vec<LibraryStatus>, ProviderError>;

    /// Ask the library to rescan a series after files changed on disk.
    async fn trigger_rescan(&self, series_id: &str) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SeriesSearchResult {
    pub provider_id: String,
    pub title: String,
    pub year: Option<i32>,
    pub overview: Option<String>,
}
