pub mod error;
pub mod types;

pub use error::EngineError;
pub use types::{
    CatalogEpisode, EpisodeKey, LibraryStatus, ReconciledEpisode, RenameOutcome, RenamePlan,
    Selection,
};
