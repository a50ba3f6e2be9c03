use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use tracing::debug;

use crate::error::PollError;

/// NOAA SWPC real-time plasma series (5-minute cadence).
pub const DEFAULT_ENDPOINT: &str =
    "https://services.swpc.noaa.gov/products/solar-wind/plasma-5-minute.json";

/// Produces the raw JSON body of the wind speed series.
pub trait SampleSource: Send {
    fn fetch(&self) -> Result<String, PollError>;
}

/// Fetches the series with a single unauthenticated `GET`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    http: Client,
    url: Url,
}

impl HttpSource {
    /// Builds a source for `endpoint`.
    ///
    /// `timeout` of `None` leaves requests unbounded; a hung request then only
    /// delays the poller's own cycle.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self, PollError> {
        let http = Client::builder()
            .user_agent(concat!("solarshade/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(PollError::Client)?;
        Self::with_client(endpoint, http)
    }

    /// Builds a source around a preconfigured client.
    pub fn with_client(endpoint: &str, http: Client) -> Result<Self, PollError> {
        let url = Url::parse(endpoint.trim()).map_err(|err| PollError::Endpoint {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PollError::Endpoint {
                endpoint: endpoint.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        Ok(Self { http, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl SampleSource for HttpSource {
    fn fetch(&self) -> Result<String, PollError> {
        debug!(url = %self.url, "requesting solar wind series");
        let response = self
            .http
            .get(self.url.clone())
            .send()
            .map_err(|source| PollError::Request {
                url: self.url.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Status {
                url: self.url.to_string(),
                status,
            });
        }
        response.text().map_err(|source| PollError::Request {
            url: self.url.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unparseable_endpoints() {
        let err = HttpSource::new("not a url", None).unwrap_err();
        assert!(matches!(err, PollError::Endpoint { .. }));
    }

    #[test]
    fn rejects_non_http_schemes() {
        let err = HttpSource::new("ftp://example.com/series.json", None).unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn accepts_default_endpoint() {
        let source = HttpSource::new(DEFAULT_ENDPOINT, None).expect("source");
        assert_eq!(source.url().host_str(), Some("services.swpc.noaa.gov"));
    }
}
