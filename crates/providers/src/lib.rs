pub mod provider;
pub mod sonarr;
pub mod tvdb;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider error: {0}")]
    Provider(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("authentication failed: {0}")]
    Unauthorized(String),
    #[error("not found")]
    NotFound,
}

pub use provider::{CatalogProvider, SeriesSearchResult, StatusProvider};
pub use sonarr::SonarrClient;
pub use tvdb::TvdbClient;
