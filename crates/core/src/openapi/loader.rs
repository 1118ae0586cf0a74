//! Locating and fetching the API description.
//!
//! Discovery is an ordered list of strategies tried until one hits:
//! an explicit file or URL, conventional document locations on the backend, and finally
//! heuristic probing of common REST paths, which yields endpoint seeds instead of a document.

use std::time::Duration;

use futures_util::{StreamExt, stream};
use reqwest::{StatusCode, header};
use tracing::{debug, info, warn};
use url::Url;

use super::endpoint::{EndpointSeed, HttpMethod};
use super::spec::SpecDocument;
use crate::config::{DiscoveryConfig, GenerationConfig};
use crate::error::{GenError, Result};

const ACCEPT_DOCUMENT: &str = "application/json, application/yaml;q=0.9, text/yaml;q=0.9, */*;q=0.5";

/// One way of finding the API description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryStrategy {
    /// A user-supplied file path or http(s) URL.
    Explicit(String),
    /// Well-known document locations under the base URL.
    Conventional,
    /// Exploratory `GET`s against common REST paths.
    Heuristic,
}

impl DiscoveryStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            DiscoveryStrategy::Explicit(_) => "explicit",
            DiscoveryStrategy::Conventional => "conventional",
            DiscoveryStrategy::Heuristic => "heuristic",
        }
    }
}

/// Result of a successful discovery.
#[derive(Debug)]
pub enum LoadedSpec {
    Document {
        document: SpecDocument,
        /// File path or URL the document came from.
        source: String,
    },
    /// Heuristic discovery: method and path only.
    Seeds(Vec<EndpointSeed>),
}

/// Runs the discovery strategies for one generation run.
#[derive(Debug)]
pub struct SpecLoader {
    client: reqwest::Client,
    base_url: Url,
    spec_location: Option<String>,
    discovery: DiscoveryConfig,
}

impl SpecLoader {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url_trimmed())
            .map_err(|e| GenError::Config(format!("invalid base URL '{}': {e}", config.base_url)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(GenError::Config(format!(
                "base URL '{}' must use http or https",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("apiconnect/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GenError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            spec_location: config.spec_location.clone(),
            discovery: config.discovery.clone(),
        })
    }

    /// Strategies in the order they are tried.
    pub fn strategies(&self) -> Vec<DiscoveryStrategy> {
        let mut strategies = Vec::with_capacity(3);
        if let Some(location) = &self.spec_location {
            strategies.push(DiscoveryStrategy::Explicit(location.clone()));
        }
        strategies.push(DiscoveryStrategy::Conventional);
        strategies.push(DiscoveryStrategy::Heuristic);
        strategies
    }

    /// Try each strategy in turn.
    ///
    /// Only a malformed explicit document aborts the chain; every other miss moves on.
    pub async fn load(&self) -> Result<LoadedSpec> {
        for strategy in self.strategies() {
            debug!(strategy = strategy.name(), "Trying discovery strategy.");
            let found = match &strategy {
                DiscoveryStrategy::Explicit(location) => self.load_explicit(location).await?,
                DiscoveryStrategy::Conventional => self.probe_conventional().await,
                DiscoveryStrategy::Heuristic => self.probe_heuristic().await,
            };
            if let Some(loaded) = found {
                info!(strategy = strategy.name(), "Discovery succeeded.");
                return Ok(loaded);
            }
            info!(strategy = strategy.name(), "Discovery strategy found nothing.");
        }

        Err(GenError::SpecNotFound(format!(
            "no description or probe-able endpoints at {}",
            self.base_url
        )))
    }

    async fn load_explicit(&self, location: &str) -> Result<Option<LoadedSpec>> {
        let text = if is_remote(location) {
            match self.fetch(location).await {
                Ok((status, body)) if status.is_success() => body,
                Ok((status, _)) => {
                    warn!(%location, %status, "Explicit API description is not available.");
                    return Ok(None);
                }
                Err(err) => {
                    warn!(%location, error = %err, "Failed to fetch explicit API description.");
                    return Ok(None);
                }
            }
        } else {
            match tokio::fs::read_to_string(location).await {
                Ok(text) => text,
                Err(err) => {
                    warn!(%location, error = %err, "Failed to read explicit API description.");
                    return Ok(None);
                }
            }
        };

        let document = SpecDocument::parse(&text, location)?;
        Ok(Some(LoadedSpec::Document {
            document,
            source: location.to_string(),
        }))
    }

    /// Probe the conventional locations concurrently; the first well-formed document wins and
    /// the remaining probes are dropped.
    async fn probe_conventional(&self) -> Option<LoadedSpec> {
        let urls: Vec<String> = self
            .discovery
            .probe_paths
            .iter()
            .map(|path| self.endpoint_url(path))
            .collect();

        let search = async {
            let mut probes = stream::iter(urls.iter().map(|url| self.probe_document(url)))
                .buffer_unordered(self.discovery.max_concurrency.max(1));
            while let Some(found) = probes.next().await {
                if found.is_some() {
                    return found;
                }
            }
            None
        };

        match tokio::time::timeout(self.discovery.timeout, search).await {
            Ok(found) => found,
            Err(_) => {
                warn!(
                    timeout_secs = self.discovery.timeout.as_secs(),
                    "Conventional discovery timed out."
                );
                None
            }
        }
    }

    async fn probe_document(&self, url: &str) -> Option<LoadedSpec> {
        let (status, body) = match self.fetch(url).await {
            Ok(response) => response,
            Err(err) => {
                debug!(%url, error = %err, "Probe failed.");
                return None;
            }
        };
        if !status.is_success() {
            debug!(%url, %status, "Probe missed.");
            return None;
        }
        match SpecDocument::parse(&body, url) {
            Ok(document) => {
                info!(%url, "Found API description.");
                Some(LoadedSpec::Document {
                    document,
                    source: url.to_string(),
                })
            }
            Err(err) => {
                debug!(%url, error = %err, "Probe response is not an API description.");
                None
            }
        }
    }

    /// Probe the heuristic paths, keeping configured order.
    async fn probe_heuristic(&self) -> Option<LoadedSpec> {
        let probes = stream::iter(self.discovery.heuristic_paths.iter().map(|path| async move {
            let url = self.endpoint_url(path);
            let exists = match self.fetch(&url).await {
                Ok((status, _)) => {
                    debug!(%url, %status, "Heuristic probe answered.");
                    is_existing_route(status)
                }
                Err(err) => {
                    debug!(%url, error = %err, "Heuristic probe failed.");
                    false
                }
            };
            (path, exists)
        }))
        .buffered(self.discovery.max_concurrency.max(1))
        .collect::<Vec<_>>();

        let results = match tokio::time::timeout(self.discovery.timeout, probes).await {
            Ok(results) => results,
            Err(_) => {
                warn!(
                    timeout_secs = self.discovery.timeout.as_secs(),
                    "Heuristic discovery timed out."
                );
                return None;
            }
        };

        let seeds: Vec<EndpointSeed> = results
            .into_iter()
            .filter(|(_, exists)| *exists)
            .map(|(path, _)| EndpointSeed {
                method: HttpMethod::Get,
                path: path.clone(),
            })
            .collect();

        if seeds.is_empty() {
            None
        } else {
            info!(count = seeds.len(), "Inferred endpoints from heuristic probes.");
            Some(LoadedSpec::Seeds(seeds))
        }
    }

    /// `GET` with bounded retries on transient transport errors.
    async fn fetch(&self, url: &str) -> Result<(StatusCode, String)> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_transient && attempt < self.discovery.retries => {
                    attempt += 1;
                    debug!(%url, attempt, error = %err.message, "Retrying probe.");
                    tokio::time::sleep(retry_delay(attempt)).await;
                }
                Err(err) => return Err(GenError::network(url, err.message)),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<(StatusCode, String), FetchFailure> {
        debug!(%url, "Sending discovery request.");
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, ACCEPT_DOCUMENT)
            .timeout(self.discovery.timeout)
            .send()
            .await
            .map_err(FetchFailure::from)?;
        let status = response.status();
        let body = response.text().await.map_err(FetchFailure::from)?;
        Ok((status, body))
    }

    fn endpoint_url(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

#[derive(Debug)]
struct FetchFailure {
    message: String,
    is_transient: bool,
}

impl From<reqwest::Error> for FetchFailure {
    fn from(err: reqwest::Error) -> Self {
        Self {
            is_transient: err.is_connect() || err.is_timeout() || err.is_request(),
            message: err.to_string(),
        }
    }
}

fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(100 * u64::from(attempt))
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// A heuristic path exists when the backend serves it or guards it.
fn is_existing_route(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}
