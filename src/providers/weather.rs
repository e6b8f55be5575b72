//! Open-Meteo weather data and the solar production forecast derived from it.

use std::f32::consts::PI;
use std::time::{Duration as StdDuration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Timelike, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ProviderError;

/// How long a fetched series stays fresh.
const CACHE_TTL: StdDuration = StdDuration::from_secs(60 * 60);

/// Per-request timeout for the forecast endpoint.
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Nominal panel efficiency applied to incident radiation.
const PANEL_EFFICIENCY: f32 = 0.18;

/// Fraction of output lost under full cloud cover.
const CLOUD_ATTENUATION: f32 = 0.7;

/// Current conditions block of a forecast response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub time: String,
    pub temperature_2m: f32,
    pub cloud_cover: f32,
    pub weather_code: u16,
    pub is_day: u8,
}

/// Hourly arrays of a forecast response. All arrays are index-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    pub temperature_2m: Vec<f32>,
    pub cloud_cover: Vec<f32>,
    pub direct_radiation: Vec<f32>,
    pub diffuse_radiation: Vec<f32>,
    pub is_day: Vec<u8>,
}

/// A weather forecast in the Open-Meteo response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSeries {
    pub current: CurrentConditions,
    pub hourly: HourlySeries,
}

/// Hourly solar production estimate derived from a weather series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolarForecast {
    pub time: Vec<String>,
    pub production_kw: Vec<f32>,
    pub efficiency_percent: Vec<f32>,
}

/// One way of fetching a forecast for a coordinate.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, latitude: f64, longitude: f64)
    -> Result<WeatherSeries, ProviderError>;
}

/// Open-Meteo forecast API client.
pub struct OpenMeteoSource {
    client: Client,
    base_url: String,
}

impl OpenMeteoSource {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: "https://api.open-meteo.com/v1/forecast".to_string(),
        }
    }
}

impl Default for OpenMeteoSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoSource {
    fn name(&self) -> &str {
        "open-meteo"
    }

    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSeries, ProviderError> {
        let url = format!(
            "{}?latitude={latitude:.4}&longitude={longitude:.4}\
             &current=temperature_2m,cloud_cover,weather_code,is_day\
             &hourly=temperature_2m,cloud_cover,direct_radiation,diffuse_radiation,is_day\
             &timezone=auto",
            self.base_url
        );
        debug!(%url, "fetching weather forecast");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }
}

/// Deterministic synthetic forecast used when no live data is available.
///
/// Sinusoidal day shapes starting at the current hour: temperature swings
/// around 15 °C, radiation peaks near noon at 600 W/m², constant 40% cloud
/// cover. Daylight spans hours 6..20.
pub fn fallback_series(now: DateTime<Utc>) -> WeatherSeries {
    let mut hourly = HourlySeries {
        time: Vec::with_capacity(24),
        temperature_2m: Vec::with_capacity(24),
        cloud_cover: Vec::with_capacity(24),
        direct_radiation: Vec::with_capacity(24),
        diffuse_radiation: Vec::with_capacity(24),
        is_day: Vec::with_capacity(24),
    };

    for i in 0..24 {
        let stamp = now + Duration::hours(i);
        let hour = stamp.hour();
        let is_day = u8::from((6..20).contains(&hour));

        let radiation = if is_day == 1 {
            (600.0 * ((hour as f32 - 6.0) * PI / 14.0).sin()).max(0.0)
        } else {
            0.0
        };

        hourly.time.push(stamp.format("%Y-%m-%dT%H:00").to_string());
        hourly
            .temperature_2m
            .push(15.0 + ((hour as f32 - 12.0) * PI / 12.0).sin() * 5.0);
        hourly.cloud_cover.push(40.0);
        hourly.direct_radiation.push(radiation);
        hourly.diffuse_radiation.push(radiation * 0.3);
        hourly.is_day.push(is_day);
    }

    WeatherSeries {
        current: CurrentConditions {
            time: now.format("%Y-%m-%dT%H:%M").to_string(),
            temperature_2m: 18.0,
            cloud_cover: 40.0,
            weather_code: 1,
            is_day: u8::from((6..20).contains(&now.hour())),
        },
        hourly,
    }
}

/// Caching facade over a weather source.
///
/// Serves a cached series for up to an hour. On fetch failure it serves the
/// stale cache when one exists, otherwise a synthetic fallback; it never
/// returns an error.
pub struct WeatherService {
    source: Box<dyn WeatherSource>,
    cache: Option<(Instant, WeatherSeries)>,
    ttl: StdDuration,
}

impl WeatherService {
    pub fn new() -> Self {
        Self::with_source(Box::new(OpenMeteoSource::new()))
    }

    pub fn with_source(source: Box<dyn WeatherSource>) -> Self {
        Self {
            source,
            cache: None,
            ttl: CACHE_TTL,
        }
    }

    pub async fn forecast(&mut self, latitude: f64, longitude: f64) -> WeatherSeries {
        if let Some((fetched_at, series)) = &self.cache {
            if fetched_at.elapsed() < self.ttl {
                return series.clone();
            }
        }

        match self.source.fetch(latitude, longitude).await {
            Ok(series) => {
                self.cache = Some((Instant::now(), series.clone()));
                series
            }
            Err(err) => {
                warn!(source = self.source.name(), error = %err, "weather fetch failed");
                if let Some((_, stale)) = &self.cache {
                    debug!("serving stale weather cache");
                    stale.clone()
                } else {
                    fallback_series(Utc::now())
                }
            }
        }
    }
}

impl Default for WeatherService {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives hourly solar production from a weather series and the array's
/// nameplate capacity.
///
/// Production per hour is `radiation/1000 × capacity × cloud_factor × 0.18`
/// (kW, 2 decimals), zero at night, where `cloud_factor` loses up to 70% of
/// output under full cloud cover. Efficiency is the cloud factor as a
/// percentage, zero when there is no radiation.
pub fn solar_forecast(series: &WeatherSeries, capacity_kw: f32) -> SolarForecast {
    let hourly = &series.hourly;

    let production_kw = hourly
        .direct_radiation
        .iter()
        .zip(&hourly.cloud_cover)
        .zip(&hourly.is_day)
        .map(|((radiation, cloud), is_day)| {
            if *is_day == 0 {
                return 0.0;
            }
            let cloud_factor = 1.0 - (cloud / 100.0) * CLOUD_ATTENUATION;
            let kw = (radiation / 1000.0) * capacity_kw * cloud_factor * PANEL_EFFICIENCY;
            (kw * 100.0).round() / 100.0
        })
        .collect();

    let efficiency_percent = hourly
        .direct_radiation
        .iter()
        .zip(&hourly.cloud_cover)
        .map(|(radiation, cloud)| {
            if *radiation == 0.0 {
                return 0.0;
            }
            let cloud_factor = 1.0 - (cloud / 100.0) * CLOUD_ATTENUATION;
            (cloud_factor * 1000.0).round() / 10.0
        })
        .collect();

    SolarForecast {
        time: hourly.time.clone(),
        production_kw,
        efficiency_percent,
    }
}
