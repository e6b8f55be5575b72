//! External data providers: IP geolocation and weather.
//!
//! Everything here is best-effort. Individual sources return
//! [`ProviderError`], but the facades ([`location::LocationResolver`],
//! [`weather::WeatherService`]) always recover with a cached or fallback
//! value, so callers never need an error path.

pub mod location;
pub mod weather;

use thiserror::Error;

/// Failure of a single provider source.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),
}
