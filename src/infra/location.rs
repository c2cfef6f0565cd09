//! Where is the farmer?
//!
//! Providers may fail or hang; `resolve_location` bounds them with a timeout
//! and substitutes the configured fallback coordinate, so callers always get
//! an answer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::Coordinate;
use crate::util::version::user_agent;

pub const DEFAULT_LOCATION_ENDPOINT: &str = "http://ip-api.com/json/";

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn locate(&self) -> Result<Coordinate, LocationError>;
}

/// A coordinate supplied up front, e.g. from the command line.
#[derive(Clone, Copy, Debug)]
pub struct FixedLocation(pub Coordinate);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}

/// Approximate position from the public IP address.
#[derive(Clone)]
pub struct IpLocationProvider {
    http: Client,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct IpLocationDto {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, alias = "latitude")]
    lat: Option<f64>,
    #[serde(default, alias = "longitude")]
    lon: Option<f64>,
}

impl IpLocationProvider {
    pub fn with_endpoint(endpoint: &str) -> Result<Self, LocationError> {
        let endpoint = Url::parse(endpoint)?;
        let http = Client::builder().user_agent(user_agent()).build()?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl LocationProvider for IpLocationProvider {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        debug!(endpoint = %self.endpoint, "requesting IP location");
        let dto: IpLocationDto = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        dto.into_coordinate()
    }
}

impl IpLocationDto {
    fn into_coordinate(self) -> Result<Coordinate, LocationError> {
        if let Some(status) = self.status.as_deref() {
            if !status.eq_ignore_ascii_case("success") {
                return Err(LocationError::Unavailable(
                    self.message.unwrap_or_else(|| status.to_string()),
                ));
            }
        }
        match (self.lat, self.lon) {
            (Some(latitude), Some(longitude)) => Ok(Coordinate::new(latitude, longitude)),
            _ => Err(LocationError::Unavailable(
                "response missing coordinates".to_string(),
            )),
        }
    }
}

/// Ask `provider` for a position, falling back on error or timeout.
pub async fn resolve_location(
    provider: &dyn LocationProvider,
    timeout: Duration,
    fallback: Coordinate,
) -> Coordinate {
    match tokio::time::timeout(timeout, provider.locate()).await {
        Ok(Ok(coordinate)) => {
            debug!(
                latitude = coordinate.latitude,
                longitude = coordinate.longitude,
                "location resolved"
            );
            coordinate
        }
        Ok(Err(error)) => {
            warn!(%error, "location lookup failed, using fallback");
            fallback
        }
        Err(_) => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "location lookup timed out, using fallback"
            );
            fallback
        }
    }
}
