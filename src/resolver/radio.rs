//! Internet-radio directory resolver (TuneIn-style scraping).
//!
//! The directory has no public JSON API; both pages embed the data inside
//! their HTML. Search scrapes a `TuneIn.payload = {...}` blob and keeps the
//! first entry of the "Stations" category; resolution scrapes a
//! scheme-relative `"StreamUrl":"..."` redirect URL from the station page,
//! fetches it and takes the first stream of the decoded list. The response
//! shapes are treated as opaque and fragile: one attempt per fetch, any
//! missing marker ends the session.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{Candidate, StreamResolver, StreamTarget};
use crate::error::{Error, Result};

/// Category kept from the search payload; everything else is discarded
const STATIONS_CATEGORY: &str = "Stations";

const NO_STATIONS: &str = "Didn't find any stations";
const NO_STREAMS: &str = "Didn't find any streams";

static PAYLOAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"TuneIn\.payload = (\{.*\})").unwrap());
static STREAM_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""StreamUrl":"(.*?)""#).unwrap());

pub struct RadioResolver {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(rename = "ContainerGuideItems")]
    container_guide_items: ContainerGuideItems,
}

#[derive(Debug, Deserialize)]
struct ContainerGuideItems {
    containers: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "GuideItems", default)]
    guide_items: Vec<GuideItem>,
}

#[derive(Debug, Deserialize)]
struct GuideItem {
    #[serde(rename = "Id")]
    id: serde_json::Value,
    #[serde(rename = "Title")]
    title: String,
}

#[derive(Debug, Deserialize)]
struct StreamList {
    #[serde(rename = "Streams")]
    streams: Vec<StreamEntry>,
}

#[derive(Debug, Deserialize)]
struct StreamEntry {
    #[serde(rename = "Url")]
    url: String,
}

impl RadioResolver {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn fetch_text(&self, url: Url) -> Result<String> {
        tracing::debug!(url = %url, "GET");
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }

    fn page_url(&self, path: &str, key: &str, value: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?.join(path)?;
        url.query_pairs_mut().append_pair(key, value);
        Ok(url)
    }
}

#[async_trait]
impl StreamResolver for RadioResolver {
    fn subject(&self) -> &'static str {
        "station"
    }

    async fn search(&self, query: &str) -> Result<Vec<Candidate>> {
        let url = self
            .page_url("search/", "query", query)
            .map_err(|_| Error::NotFound(NO_STATIONS.to_string()))?;

        let body = self.fetch_text(url).await.map_err(|e| {
            tracing::warn!(error = %e, query, "Directory search fetch failed");
            Error::NotFound(NO_STATIONS.to_string())
        })?;

        let Some(captures) = PAYLOAD_RE.captures(&body) else {
            tracing::warn!(query, "Payload marker missing from search page");
            return Err(Error::NotFound(NO_STATIONS.to_string()));
        };

        let payload: SearchPayload = serde_json::from_str(&captures[1]).map_err(|e| {
            tracing::warn!(error = %e, query, "Search payload did not decode");
            Error::NotFound(NO_STATIONS.to_string())
        })?;

        let stations = payload
            .container_guide_items
            .containers
            .into_iter()
            .find(|category| category.title == STATIONS_CATEGORY)
            .map(|category| category.guide_items)
            .unwrap_or_default();

        if stations.is_empty() {
            tracing::info!(query, "No stations in search payload");
            return Err(Error::NotFound(NO_STATIONS.to_string()));
        }

        tracing::debug!(query, count = stations.len(), "Directory search hits");
        Ok(stations
            .into_iter()
            .map(|item| Candidate {
                id: scalar_to_string(&item.id),
                title: item.title,
            })
            .collect())
    }

    async fn resolve(&self, candidate: &Candidate) -> Result<StreamTarget> {
        let no_streams = || Error::Resolution(NO_STREAMS.to_string());

        let url = self
            .page_url("station/", "stationId", &candidate.id)
            .map_err(|_| no_streams())?;
        let body = self.fetch_text(url).await.map_err(|e| {
            tracing::warn!(error = %e, station = %candidate.id, "Station page fetch failed");
            no_streams()
        })?;

        let redirect = STREAM_URL_RE
            .captures(&body)
            .map(|captures| captures[1].to_string())
            .filter(|captured| !captured.is_empty())
            .ok_or_else(|| {
                tracing::warn!(station = %candidate.id, "StreamUrl marker missing");
                no_streams()
            })?;

        // The embedded URL is scheme-relative
        let redirect = if redirect.starts_with("//") {
            format!("http:{redirect}")
        } else {
            redirect
        };
        let redirect = Url::parse(&redirect).map_err(|_| no_streams())?;

        let listing = self.fetch_text(redirect).await.map_err(|e| {
            tracing::warn!(error = %e, station = %candidate.id, "Stream list fetch failed");
            no_streams()
        })?;
        let list: StreamList = serde_json::from_str(&listing).map_err(|e| {
            tracing::warn!(error = %e, station = %candidate.id, "Stream list did not decode");
            no_streams()
        })?;

        let first = list.streams.into_iter().next().ok_or_else(no_streams)?;
        tracing::debug!(station = %candidate.id, url = %first.url, "Stream resolved");

        Ok(StreamTarget {
            url: first.url,
            label: candidate.title.clone(),
        })
    }
}

/// Directory ids show up as numbers or strings depending on the page
fn scalar_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
