//! Upstream station directory client
//!
//! The directory is served by a GraphQL-style endpoint that takes a POST
//! with `{"query": "..."}` and answers with `data.radioPage.<field>`.
//! Two queries are used:
//! - regions: `{radioPage(cid:432, page:1){...,regions,...}}` → `data.radioPage.regions`
//! - stations: `{radioPage(cid:<region>, page:1){contents}}` → `data.radioPage.contents.items`
//!
//! Failures are reported once and never retried.

use crate::config::UpstreamConfig;
use crate::{Error, Result};
use axum::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A station object, passed through exactly as upstream returned it
pub type Station = Value;

/// A region object, passed through exactly as upstream returned it
pub type RegionObject = Value;

/// Numeric region identifier
///
/// Only digits are accepted when parsing from text, so a region id can be
/// interpolated into an upstream query without escaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(u64);

impl RegionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RegionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidInput(format!("region id must be numeric: {:?}", s)));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|e| Error::InvalidInput(format!("region id {:?}: {}", s, e)))
    }
}

impl<'de> Deserialize<'de> for RegionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // Upstream has been seen to send ids both as numbers and as strings
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Typed view of a region object (province, city or category)
///
/// Only the fields needed to walk the directory; everything else stays in
/// the [`RegionObject`] it was read from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub title: String,
}

impl Region {
    pub fn from_object(object: &RegionObject) -> Result<Self> {
        Ok(Self::deserialize(object)?)
    }
}

/// Read access to the station directory
#[async_trait]
pub trait StationDirectory: Send + Sync {
    /// Where the directory is read from, for diagnostics
    fn endpoint(&self) -> &str;

    /// All regions, untouched
    async fn regions(&self) -> Result<Vec<RegionObject>>;

    /// Stations within one region
    async fn stations(&self, region: RegionId) -> Result<Vec<Station>>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<PageData<T>>,
}

#[derive(Deserialize)]
struct PageData<T> {
    #[serde(rename = "radioPage")]
    radio_page: Option<T>,
}

#[derive(Deserialize)]
struct RegionsPage {
    regions: Option<Vec<RegionObject>>,
}

#[derive(Deserialize)]
struct ContentsPage {
    contents: Option<Contents>,
}

#[derive(Deserialize)]
struct Contents {
    items: Option<Vec<Station>>,
}

fn radio_page<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_slice(body)?;
    envelope
        .data
        .ok_or_else(|| Error::UpstreamShape("data".to_string()))?
        .radio_page
        .ok_or_else(|| Error::UpstreamShape("data.radioPage".to_string()))
}

/// Extract `data.radioPage.regions` from a response body
pub fn parse_regions(body: &[u8]) -> Result<Vec<RegionObject>> {
    radio_page::<RegionsPage>(body)?
        .regions
        .ok_or_else(|| Error::UpstreamShape("data.radioPage.regions".to_string()))
}

/// Extract `data.radioPage.contents.items` from a response body
pub fn parse_stations(body: &[u8]) -> Result<Vec<Station>> {
    radio_page::<ContentsPage>(body)?
        .contents
        .ok_or_else(|| Error::UpstreamShape("data.radioPage.contents".to_string()))?
        .items
        .ok_or_else(|| Error::UpstreamShape("data.radioPage.contents.items".to_string()))
}

/// Query listing every region on the given page
pub fn regions_query(page_cid: u64) -> String {
    format!(
        "{{radioPage(cid:{}, page:1){{bannerData,regions,radioPlaying,replayRadio,classes,}}}}",
        page_cid
    )
}

/// Query listing the stations of one region
pub fn stations_query(region: RegionId) -> String {
    format!("{{radioPage(cid:{}, page:1){{contents}}}}", region)
}

#[derive(Serialize)]
struct QueryBody<'a> {
    query: &'a str,
}

/// HTTP client for the upstream directory
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http_client: reqwest::Client,
    endpoint: String,
    regions_page_cid: u64,
}

impl DirectoryClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            regions_page_cid: config.regions_page_cid,
        })
    }

    /// POST one query and return the raw response body
    async fn query(&self, query: &str) -> Result<Vec<u8>> {
        tracing::debug!(endpoint = %self.endpoint, query = %query, "Querying upstream directory");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&QueryBody { query })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl StationDirectory for DirectoryClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn regions(&self) -> Result<Vec<RegionObject>> {
        let body = self.query(&regions_query(self.regions_page_cid)).await?;
        let regions = parse_regions(&body)?;
        tracing::info!(count = regions.len(), "Retrieved regions from upstream");
        Ok(regions)
    }

    async fn stations(&self, region: RegionId) -> Result<Vec<Station>> {
        let body = self.query(&stations_query(region)).await?;
        let stations = parse_stations(&body)?;
        tracing::info!(region = %region, count = stations.len(), "Retrieved stations from upstream");
        Ok(stations)
    }
}
