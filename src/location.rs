//! Location descriptions for found items.
//!
//! The reporter either shares their current position or picks a point on a
//! map. Either way the draft receives a human-readable string produced by
//! [`describe_location`]:
//!
//! | Resolver result | Draft location |
//! |---|---|
//! | `Ok(Some(address))` | the address |
//! | `Ok(None)` | `Lat: <lat>, Lon: <lon>` |
//! | `Err(_)` | `Could not get address` |

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::GeocoderConfig;
use crate::traits::LocationResolver;

/// Shown when reverse geocoding fails outright.
pub const UNKNOWN_ADDRESS: &str = "Could not get address";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Describe `coords` for the draft's location field.
pub async fn describe_location(resolver: &dyn LocationResolver, coords: Coordinates) -> String {
    match resolver.reverse_geocode(coords).await {
        Ok(Some(address)) => address,
        Ok(None) => format!("Lat: {}, Lon: {}", coords.latitude, coords.longitude),
        Err(e) => {
            tracing::warn!(error = %e, "reverse geocoding failed");
            UNKNOWN_ADDRESS.to_string()
        }
    }
}

/// Resolver used when no geocoder is configured; never finds an address.
#[derive(Debug, Clone, Default)]
pub struct CoordinatesOnly;

#[async_trait]
impl LocationResolver for CoordinatesOnly {
    async fn reverse_geocode(&self, _coords: Coordinates) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Nominatim / OpenStreetMap reverse geocoder.
///
/// The public instance allows one request per second and requires an
/// identifying `User-Agent`.
///
/// See <https://nominatim.org/release-docs/develop/api/Reverse/>
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("trackback/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl LocationResolver for NominatimGeocoder {
    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Option<String>> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("format", "jsonv2".to_string()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            bail!("Nominatim reverse lookup failed (HTTP {})", resp.status());
        }

        let body: serde_json::Value = resp.json().await?;
        Ok(parse_reverse_response(&body))
    }
}

/// Extract `display_name` from a reverse response.
///
/// Nominatim answers `{"error": "Unable to geocode"}` for points it cannot
/// place, which maps to `None`.
fn parse_reverse_response(body: &serde_json::Value) -> Option<String> {
    body.get("display_name")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Build the resolver selected by `[geocoder]`.
pub fn create_resolver(config: &GeocoderConfig) -> Result<Box<dyn LocationResolver>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(CoordinatesOnly)),
        "nominatim" => Ok(Box::new(NominatimGeocoder::new(config)?)),
        other => bail!("Unknown geocoder provider: '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingResolver;

    #[async_trait]
    impl LocationResolver for FailingResolver {
        async fn reverse_geocode(&self, _coords: Coordinates) -> Result<Option<String>> {
            bail!("service unavailable")
        }
    }

    struct FixedResolver(&'static str);

    #[async_trait]
    impl LocationResolver for FixedResolver {
        async fn reverse_geocode(&self, _coords: Coordinates) -> Result<Option<String>> {
            Ok(Some(self.0.to_string()))
        }
    }

    #[tokio::test]
    async fn test_describe_falls_back_to_coordinates() {
        let text = describe_location(&CoordinatesOnly, Coordinates::new(20.221495, 85.735871)).await;
        assert_eq!(text, "Lat: 20.221495, Lon: 85.735871");
    }

    #[tokio::test]
    async fn test_describe_on_error() {
        let text = describe_location(&FailingResolver, Coordinates::new(1.0, 2.0)).await;
        assert_eq!(text, UNKNOWN_ADDRESS);
    }

    #[tokio::test]
    async fn test_describe_uses_address() {
        let text = describe_location(&FixedResolver("Main Gate"), Coordinates::new(1.0, 2.0)).await;
        assert_eq!(text, "Main Gate");
    }

    #[test]
    fn parses_nominatim_reverse_result() {
        let body = serde_json::json!({
            "lat": "20.2214",
            "lon": "85.7358",
            "display_name": "Central Library, Bhubaneswar, Odisha, India"
        });
        assert_eq!(
            parse_reverse_response(&body).as_deref(),
            Some("Central Library, Bhubaneswar, Odisha, India")
        );
    }

    #[test]
    fn parses_nominatim_unable_to_geocode() {
        let body = serde_json::json!({ "error": "Unable to geocode" });
        assert!(parse_reverse_response(&body).is_none());
    }
}
