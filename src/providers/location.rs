//! IP-based geolocation with layered fallbacks.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ProviderError;

/// How long a resolved fix stays fresh.
const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Per-request timeout for geolocation endpoints.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A resolved site location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub country: String,
    pub timezone: String,
}

impl Default for LocationFix {
    /// Oslo, Norway. Used whenever no source can produce a fix.
    fn default() -> Self {
        Self {
            latitude: 59.9139,
            longitude: 10.7522,
            city: "Oslo".to_string(),
            country: "Norway".to_string(),
            timezone: "Europe/Oslo".to_string(),
        }
    }
}

/// One way of resolving the site location.
#[async_trait]
pub trait LocationSource: Send + Sync {
    fn name(&self) -> &str;

    async fn resolve(&self) -> Result<LocationFix, ProviderError>;
}

fn default_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// ipapi.co JSON endpoint.
pub struct IpApiSource {
    client: Client,
    url: String,
}

impl IpApiSource {
    pub fn new() -> Self {
        Self {
            client: default_client(),
            url: "https://ipapi.co/json/".to_string(),
        }
    }
}

impl Default for IpApiSource {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct IpApiResponse {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country_name: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
}

#[async_trait]
impl LocationSource for IpApiSource {
    fn name(&self) -> &str {
        "ipapi.co"
    }

    async fn resolve(&self) -> Result<LocationFix, ProviderError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }
        let data: IpApiResponse = response.json().await?;
        Ok(LocationFix {
            latitude: data.latitude,
            longitude: data.longitude,
            city: data.city.unwrap_or_else(|| "Unknown".to_string()),
            country: data.country_name.unwrap_or_else(|| "Unknown".to_string()),
            timezone: data.timezone.unwrap_or_else(|| "UTC".to_string()),
        })
    }
}

/// ipinfo.io JSON endpoint. Coordinates arrive as a single `"lat,lng"`
/// string.
pub struct IpInfoSource {
    client: Client,
    url: String,
}

impl IpInfoSource {
    pub fn new() -> Self {
        Self {
            client: default_client(),
            url: "https://ipinfo.io/json".to_string(),
        }
    }
}

impl Default for IpInfoSource {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct IpInfoResponse {
    #[serde(default)]
    loc: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
}

fn parse_loc(loc: &str) -> Result<(f64, f64), ProviderError> {
    let malformed = || ProviderError::Malformed(format!("bad loc field: {loc:?}"));
    let (lat, lng) = loc.split_once(',').ok_or_else(malformed)?;
    let latitude = lat.trim().parse().map_err(|_| malformed())?;
    let longitude = lng.trim().parse().map_err(|_| malformed())?;
    Ok((latitude, longitude))
}

#[async_trait]
impl LocationSource for IpInfoSource {
    fn name(&self) -> &str {
        "ipinfo.io"
    }

    async fn resolve(&self) -> Result<LocationFix, ProviderError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }
        let data: IpInfoResponse = response.json().await?;
        let loc = data
            .loc
            .ok_or_else(|| ProviderError::Malformed("missing loc field".to_string()))?;
        let (latitude, longitude) = parse_loc(&loc)?;
        Ok(LocationFix {
            latitude,
            longitude,
            city: data.city.unwrap_or_else(|| "Unknown".to_string()),
            country: data.country.unwrap_or_else(|| "Unknown".to_string()),
            timezone: data.timezone.unwrap_or_else(|| "UTC".to_string()),
        })
    }
}

/// Tries an ordered list of sources, caching the first success for 24 hours.
///
/// `resolve` is total: when every source fails it falls back to the default
/// fix (Oslo). The fallback is not cached, so later calls retry the sources.
pub struct LocationResolver {
    sources: Vec<Box<dyn LocationSource>>,
    cache: Option<(Instant, LocationFix)>,
    ttl: Duration,
}

impl LocationResolver {
    /// Resolver over the standard source chain (ipapi.co, then ipinfo.io).
    pub fn new() -> Self {
        Self::with_sources(vec![
            Box::new(IpApiSource::new()),
            Box::new(IpInfoSource::new()),
        ])
    }

    pub fn with_sources(sources: Vec<Box<dyn LocationSource>>) -> Self {
        Self {
            sources,
            cache: None,
            ttl: CACHE_TTL,
        }
    }

    pub async fn resolve(&mut self) -> LocationFix {
        if let Some((fetched_at, fix)) = &self.cache {
            if fetched_at.elapsed() < self.ttl {
                return fix.clone();
            }
        }

        for source in &self.sources {
            match source.resolve().await {
                Ok(fix) => {
                    debug!(source = source.name(), city = %fix.city, "location resolved");
                    self.cache = Some((Instant::now(), fix.clone()));
                    return fix;
                }
                Err(err) => {
                    warn!(source = source.name(), error = %err, "location source failed");
                }
            }
        }

        warn!("all location sources failed, using default location");
        LocationFix::default()
    }
}

impl Default for LocationResolver {
    fn default() -> Self {
        Self::new()
    }
}
