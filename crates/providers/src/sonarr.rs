//! Sonarr library-status client.
//!
//! Uses Sonarr API v3. Read-only except for the rescan command.

use tracing::debug;

use renamarr_core::LibraryStatus;

use crate::provider::{SeriesSearchResult, StatusProvider};
use crate::ProviderError;

pub struct SonarrClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl SonarrClient {
    pub fn new(base_url: impl Into<String>, api_key: String) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v3{path}", self.base_url)
    }

    async fn get_json(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, ProviderError> {
        let url = self.url(path);
        debug!(url = %url, "Sonarr request");

        let resp = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(params)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Unauthorized("Sonarr rejected API key".into()));
        }
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(ProviderError::Provider(format!(
                "Sonarr returned {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| ProviderError::Provider(format!("parse JSON: {e}")))
    }
}

#[async_trait::async_trait]
impl StatusProvider for SonarrClient {
    fn name(&self) -> &str {
        "sonarr"
    }

    async fn search_series(
        &self,
        query: &str,
    ) -> Result<Vec<SeriesSearchResult>, ProviderError> {
        let data = self.get_json("/series", &[]).await?;
        let all = data.as_array().cloned().unwrap_or_default();

        let needle = query.to_lowercase();
        Ok(all
            .iter()
            .filter(|s| {
                s["title"]
                    .as_str()
                    .map(|t| t.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .map(parse_series)
            .collect())
    }

    async fn season_statuses(
        &self,
        series_id: &str,
        season: u32,
    ) -> Result<Vec<LibraryStatus>, ProviderError> {
        let data = self
            .get_json(
                "/episode",
                &[
                    ("seriesId", series_id.to_string()),
                    ("includeEpisodeFile", "true".to_string()),
                ],
            )
            .await?;

        let statuses = statuses_from_response(&data, season);
        debug!(series_id, season, count = statuses.len(), "Sonarr statuses fetched");
        Ok(statuses)
    }

    async fn trigger_rescan(&self, series_id: &str) -> Result<(), ProviderError> {
        let series_id: u64 = series_id
            .parse()
            .map_err(|_| ProviderError::Provider(format!("bad series id: {series_id}")))?;

        let resp = self
            .client
            .post(self.url("/command"))
            .header("X-Api-Key", &self.api_key)
            .json(&serde_json::json!({
                "name": "RescanSeries",
                "seriesId": series_id,
            }))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ProviderError::Provider(format!(
                "Sonarr rescan command returned {}",
                resp.status()
            )));
        }

        debug!(series_id, "Sonarr rescan triggered");
        Ok(())
    }
}

fn parse_series(s: &serde_json::Value) -> SeriesSearchResult {
    SeriesSearchResult {
        provider_id: s["id"].as_u64().unwrap_or(0).to_string(),
        title: s["title"].as_str().unwrap_or("Unknown").to_string(),
        year: s["year"].as_i64().map(|y| y as i32),
        overview: s["overview"].as_str().map(|v| v.to_string()),
    }
}

/// Convert Sonarr's episode listing into library statuses for one season.
/// Specials (season 0) are skipped; the quality name rides along from the
/// attached episode file when one exists.
fn statuses_from_response(data: &serde_json::Value, season: u32) -> Vec<LibraryStatus> {
    let episodes = data.as_array().cloned().unwrap_or_default();

    episodes
        .iter()
        .filter_map(|ep| {
            let season_number = ep["seasonNumber"].as_u64()? as u32;
            let episode_number = ep["episodeNumber"].as_u64()? as u32;
            if season_number == 0 || season_number != season {
                return None;
            }

            let has_file = ep["hasFile"].as_bool().unwrap_or(false);
            let quality_tag = ep["episodeFile"]["quality"]["quality"]["name"]
                .as_str()
                .map(|q| q.to_string());

            Some(LibraryStatus {
                season_number,
                episode_number,
                has_file,
                quality_tag,
            })
        })
        .collect()
}
