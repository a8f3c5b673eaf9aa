//! V'Lille station API client.

use std::time::Duration;

use crate::deferred::Deferred;
use crate::domain::{Coordinates, RankedStation, StationDetails, StationId, StationMarker};
use crate::error::VlilleError;
use crate::geo::{DEFAULT_CLOSEST_LIMIT, rank_closest};
use crate::projection::{station_from_document, stations_from_document};
use crate::scheduler::Scheduler;
use crate::transport::Transport;

/// Path of the stations feed, relative to the proxy URL.
const STATIONS_PATH: &str = "xml-stations.aspx";

/// Path of the station details document, relative to the proxy URL.
const STATION_PATH: &str = "xml-station.aspx";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the V'Lille client.
#[derive(Debug, Clone)]
pub struct VlilleConfig {
    /// Base URL of the proxy forwarding to the V'Lille API
    pub api_proxy_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl VlilleConfig {
    /// Create a new config for the given proxy URL.
    pub fn new(api_proxy_url: impl Into<String>) -> Self {
        Self {
            api_proxy_url: api_proxy_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Client for the V'Lille station API.
///
/// Every query returns a [`Deferred`] that settles once the response has
/// arrived and been projected. Requests run on the ambient tokio runtime.
#[derive(Debug, Clone)]
pub struct Vlille {
    transport: Transport,
    base_url: String,
}

impl Vlille {
    /// Create a new client.
    ///
    /// Fails if the proxy URL is empty. A trailing `/` is added to the URL
    /// when missing.
    pub fn new(config: VlilleConfig, scheduler: &Scheduler) -> Result<Self, VlilleError> {
        if config.api_proxy_url.is_empty() {
            return Err(VlilleError::MissingProxyUrl);
        }

        let base_url = if config.api_proxy_url.ends_with('/') {
            config.api_proxy_url
        } else {
            format!("{}/", config.api_proxy_url)
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            transport: Transport::new(http, scheduler.clone()),
            base_url,
        })
    }

    /// The normalized proxy URL, always ending in `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the full stations list.
    pub fn stations(&self) -> Deferred<Vec<StationMarker>> {
        let url = format!("{}{STATIONS_PATH}", self.base_url);
        self.transport
            .get(&url, &[])
            .map(|document| stations_from_document(&document))
    }

    /// Fetch live details of the station `id`.
    pub fn station(&self, id: &StationId) -> Deferred<StationDetails> {
        let url = format!("{}{STATION_PATH}", self.base_url);
        self.transport
            .get(&url, &[("borne", id.as_str())])
            .map(|document| station_from_document(&document))
    }

    /// Fetch the stations closest to `origin`, nearest first.
    ///
    /// Returns at most `max` stations, [`DEFAULT_CLOSEST_LIMIT`] if `None`.
    pub fn closest_stations(
        &self,
        origin: Coordinates,
        max: Option<usize>,
    ) -> Deferred<Vec<RankedStation>> {
        let max = max.unwrap_or(DEFAULT_CLOSEST_LIMIT);
        self.stations()
            .map(move |stations| rank_closest(stations, origin, max))
    }
}
