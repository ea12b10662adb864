//! TVDB catalog client.
//!
//! Uses TVDB API v4: https://thetvdb.github.io/v4-api/

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::debug;

use renamarr_core::CatalogEpisode;

use crate::provider::{CatalogProvider, SeriesSearchResult};
use crate::ProviderError;

const BASE_URL: &str = "https://api4.thetvdb.com/v4";

pub struct TvdbClient {
    api_key: String,
    // Bearer token, fetched lazily on first request.
    token: Mutex<Option<String>>,
    client: reqwest::Client,
}

impl TvdbClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            token: Mutex::new(None),
            client: reqwest::Client::new(),
        }
    }

    async fn login(&self) -> Result<String, ProviderError> {
        let resp = self
            .client
            .post(format!("{BASE_URL}/login"))
            .json(&serde_json::json!({ "apikey": self.api_key }))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Unauthorized("TVDB rejected API key".into()));
        }
        if !resp.status().is_success() {
            return Err(ProviderError::Provider(format!(
                "TVDB login returned {}",
                resp.status()
            )));
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::Provider(format!("parse JSON: {e}")))?;

        let token = data["data"]["token"]
            .as_str()
            .ok_or_else(|| ProviderError::Provider("login response missing token".into()))?
            .to_string();

        debug!("TVDB authentication succeeded");
        Ok(token)
    }

    async fn bearer_token(&self) -> Result<String, ProviderError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }
        let token = self.login().await?;
        *guard = Some(token.clone());
        Ok(token)
    }

    async fn get_json(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, ProviderError> {
        let token = self.bearer_token().await?;
        let url = format!("{BASE_URL}{path}");
        debug!(url = %url, "TVDB request");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(params)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            // Token expired; drop it so the next request logs in again.
            *self.token.lock().await = None;
            return Err(ProviderError::Unauthorized("TVDB token expired".into()));
        }
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(ProviderError::Provider(format!(
                "TVDB returned {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| ProviderError::Provider(format!("parse JSON: {e}")))
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TvdbClient {
    fn name(&self) -> &str {
        "tvdb"
    }

    async fn search_series(
        &self,
        query: &str,
    ) -> Result<Vec<SeriesSearchResult>, ProviderError> {
        let data = self
            .get_json(
                "/search",
                &[("query", query.to_string()), ("type", "series".to_string())],
            )
            .await?;

        let results = data["data"].as_array().cloned().unwrap_or_default();
        Ok(results.iter().take(10).map(parse_search_result).collect())
    }

    async fn season_episodes(
        &self,
        series_id: &str,
        season: u32,
    ) -> Result<Vec<CatalogEpisode>, ProviderError> {
        let mut episodes = Vec::new();
        let mut page = 0u32;

        // The episode endpoint cannot filter by season, so walk every page
        // and keep the season we want.
        loop {
            let data = self
                .get_json(
                    &format!("/series/{series_id}/episodes/default"),
                    &[("page", page.to_string())],
                )
                .await?;

            let (mut page_episodes, has_next) = episodes_from_page(&data, season);
            episodes.append(&mut page_episodes);

            if !has_next {
                break;
            }
            page += 1;
        }

        debug!(series_id, season, count = episodes.len(), "TVDB episodes fetched");
        Ok(episodes)
    }
}

fn parse_search_result(r: &serde_json::Value) -> SeriesSearchResult {
    SeriesSearchResult {
        provider_id: r["tvdb_id"].as_str().unwrap_or_default().to_string(),
        title: r["name"].as_str().unwrap_or("Unknown").to_string(),
        year: r["year"].as_str().and_then(|y| y.parse().ok()),
        overview: r["overview"].as_str().map(|s| s.to_string()),
    }
}

/// Pull one page of episodes for the requested season. Specials
/// (season 0) are skipped. Returns the episodes plus whether another
/// page follows.
fn episodes_from_page(data: &serde_json::Value, season: u32) -> (Vec<CatalogEpisode>, bool) {
    let episodes = data["data"]["episodes"]
        .as_array()
        .cloned()
        .unwrap_or_default();

    let parsed = episodes
        .iter()
        .filter_map(parse_episode)
        .filter(|ep| ep.season_number != 0 && ep.season_number == season)
        .collect();

    let has_next = !data["links"]["next"].is_null();
    (parsed, has_next)
}

fn parse_episode(ep: &serde_json::Value) -> Option<CatalogEpisode> {
    let season_number = ep["seasonNumber"].as_u64()? as u32;
    let episode_number = ep["number"].as_u64()? as u32;

    Some(CatalogEpisode {
        season_number,
        episode_number,
        title: ep["name"].as_str().unwrap_or("").to_string(),
        air_date: ep["aired"]
            .as_str()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        absolute_number: ep["absoluteNumber"]
            .as_u64()
            .filter(|&n| n > 0)
            .map(|n| n as u32),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_episode_page() {
        let json = serde_json::json!({
            "data": {
                "episodes": [
                    {
                        "id": 101,
                        "seasonNumber": 9,
                        "number": 1,
                        "name": "Pups Save a Sweet Mission",
                        "aired": "2022-02-11",
                        "absoluteNumber": 201
                    },
                    {
                        "id": 102,
                        "seasonNumber": 9,
                        "number": 2,
                        "name": "Pups Save a Flying Frog",
                        "aired": "2022-02-11",
                        "absoluteNumber": 202
                    },
                    {
                        "id": 103,
                        "seasonNumber": 0,
                        "number": 1,
                        "name": "Special",
                        "aired": null,
                        "absoluteNumber": 0
                    },
                    {
                        "id": 104,
                        "seasonNumber": 8,
                        "number": 5,
                        "name": "Wrong Season",
                        "aired": "2021-06-01"
                    }
                ]
            },
            "links": { "next": "series/1234/episodes/default?page=1" }
        });

        let (episodes, has_next) = episodes_from_page(&json, 9);
        assert!(has_next);
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].title, "Pups Save a Sweet Mission");
        assert_eq!(episodes[0].absolute_number, Some(201));
        assert_eq!(
            episodes[0].air_date.unwrap().to_string(),
            "2022-02-11"
        );
    }

    #[test]
    fn last_page_has_no_next_link() {
        let json = serde_json::json!({
            "data": { "episodes": [] },
            "links": { "next": null }
        });
        let (episodes, has_next) = episodes_from_page(&json, 1);
        assert!(episodes.is_empty());
        assert!(!has_next);
    }

    #[test]
    fn episode_without_numbers_skipped() {
        let json = serde_json::json!({
            "data": {
                "episodes": [
                    { "name": "No numbering", "aired": "2022-01-01" }
                ]
            },
            "links": {}
        });
        let (episodes, _) = episodes_from_page(&json, 1);
        assert!(episodes.is_empty());
    }

    #[test]
    fn parse_search_result_fields() {
        let json = serde_json::json!({
            "tvdb_id": "75710",
            "name": "Paw Patrol",
            "year": "2013",
            "overview": "Six heroic puppies."
        });
        let r = parse_search_result(&json);
        assert_eq!(r.provider_id, "75710");
        assert_eq!(r.title, "Paw Patrol");
        assert_eq!(r.year, Some(2013));
        assert_eq!(r.overview.as_deref(), Some("Six heroic puppies."));
    }
}
