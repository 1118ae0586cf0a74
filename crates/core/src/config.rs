//! Generation configuration.
//!
//! A run's configuration is assembled in layers: built-in defaults, then an optional
//! `apiconnect.toml` file, then whatever the caller (usually the CLI) sets explicitly.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{GenError, Result};

/// Default config file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "apiconnect.toml";

pub const DEFAULT_FRAMEWORK: &str = "react";
pub const DEFAULT_AUTH_MODE: &str = "token";
pub const DEFAULT_OUTPUT_DIR: &str = "src/api";

const DEFAULT_PROBE_CONCURRENCY: usize = 4;
const DEFAULT_DISCOVERY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PROBE_RETRIES: u32 = 1;
const DEFAULT_MOCK_LATENCY_MS: u64 = 250;
const DEFAULT_MOCK_ARRAY_LEN: usize = 3;

/// Locations where backends commonly expose their API description.
const CONVENTIONAL_SPEC_PATHS: [&str; 8] = [
    "/openapi.json",
    "/swagger.json",
    "/v3/api-docs",
    "/api-docs",
    "/swagger/v1/swagger.json",
    "/api/openapi.json",
    "/docs/openapi.json",
    "/openapi.yaml",
];

/// REST paths tried when no description document can be found.
const HEURISTIC_PATHS: [&str; 12] = [
    "/health",
    "/api/health",
    "/users",
    "/api/users",
    "/items",
    "/api/items",
    "/products",
    "/api/products",
    "/posts",
    "/api/posts",
    "/todos",
    "/api/todos",
];

/// Path segments that mark an endpoint as public when the document says nothing.
const PUBLIC_SEGMENTS: [&str; 19] = [
    "health",
    "healthz",
    "healthcheck",
    "ping",
    "ready",
    "readiness",
    "liveness",
    "login",
    "signin",
    "sign-in",
    "signup",
    "sign-up",
    "register",
    "token",
    "refresh",
    "forgot-password",
    "reset-password",
    "csrf",
    "csrf-token",
];

/// Everything a single `connect` run needs.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Backend base URL, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Target framework tag, resolved against the emitter registry.
    pub framework: String,
    /// Directory the module set is written to.
    pub output_dir: PathBuf,
    /// Auth mode tag, resolved by the auth strategy resolver.
    pub auth_mode: String,
    /// Emit the mocks module and wire the client to it.
    pub mock: bool,
    /// Explicit spec path or URL; auto-discovered when absent.
    pub spec_location: Option<String>,
    pub discovery: DiscoveryConfig,
    pub public_paths: PublicPathPolicy,
    pub csrf: CsrfConfig,
    pub mock_options: MockConfig,
}

impl GenerationConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            framework: DEFAULT_FRAMEWORK.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            auth_mode: DEFAULT_AUTH_MODE.to_string(),
            mock: false,
            spec_location: None,
            discovery: DiscoveryConfig::default(),
            public_paths: PublicPathPolicy::default(),
            csrf: CsrfConfig::default(),
            mock_options: MockConfig::default(),
        }
    }

    /// Base URL without a trailing slash, ready to have paths appended.
    pub fn base_url_trimmed(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Overlay values from a config file. Fields the file leaves out keep their value.
    pub fn apply_file(&mut self, file: FileConfig) {
        if let Some(framework) = file.framework {
            self.framework = framework;
        }
        if let Some(output) = file.output {
            self.output_dir = output;
        }
        if let Some(auth) = file.auth {
            self.auth_mode = auth;
        }
        if let Some(mock) = file.mock {
            self.mock = mock;
        }
        if file.spec.is_some() {
            self.spec_location = file.spec;
        }
        if let Some(discovery) = file.discovery {
            if let Some(paths) = discovery.probe_paths {
                self.discovery.probe_paths = paths;
            }
            if let Some(paths) = discovery.heuristic_paths {
                self.discovery.heuristic_paths = paths;
            }
            if let Some(limit) = discovery.max_concurrency {
                self.discovery.max_concurrency = limit.max(1);
            }
            if let Some(secs) = discovery.timeout_secs {
                self.discovery.timeout = Duration::from_secs(secs);
            }
            if let Some(retries) = discovery.retries {
                self.discovery.retries = retries;
            }
        }
        if let Some(public) = file.public_paths {
            self.public_paths = PublicPathPolicy::new(public.segments);
        }
        if let Some(csrf) = file.csrf {
            if let Some(endpoint) = csrf.endpoint {
                self.csrf.endpoint = endpoint;
            }
            if let Some(field) = csrf.response_field {
                self.csrf.response_field = field;
            }
            if let Some(header) = csrf.header_name {
                self.csrf.header_name = header;
            }
        }
        if let Some(mock) = file.mock_options {
            if let Some(latency) = mock.latency_ms {
                self.mock_options.latency_ms = latency;
            }
            if let Some(len) = mock.array_len {
                self.mock_options.array_len = len;
            }
        }
    }
}

/// Tuning for spec discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub probe_paths: Vec<String>,
    pub heuristic_paths: Vec<String>,
    /// Upper bound on in-flight probe requests.
    pub max_concurrency: usize,
    /// Bound on each probing phase (conventional, heuristic).
    pub timeout: Duration,
    /// Extra attempts per probe after a transient network failure.
    pub retries: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            probe_paths: CONVENTIONAL_SPEC_PATHS.iter().map(|p| (*p).to_string()).collect(),
            heuristic_paths: HEURISTIC_PATHS.iter().map(|p| (*p).to_string()).collect(),
            max_concurrency: DEFAULT_PROBE_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_DISCOVERY_TIMEOUT_SECS),
            retries: DEFAULT_PROBE_RETRIES,
        }
    }
}

/// Heuristic that marks conventional public routes (health checks, login) as not
/// requiring auth.
#[derive(Debug, Clone)]
pub struct PublicPathPolicy {
    segments: Vec<String>,
}

impl PublicPathPolicy {
    pub fn new(segments: Vec<String>) -> Self {
        Self {
            segments: segments
                .into_iter()
                .map(|s| s.trim_matches('/').to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// True when any literal segment of `path` is on the public list.
    pub fn matches(&self, path: &str) -> bool {
        path.split('/')
            .filter(|segment| !segment.is_empty() && !segment.starts_with('{'))
            .any(|segment| {
                let segment = segment.to_ascii_lowercase();
                self.segments.iter().any(|public| *public == segment)
            })
    }
}

impl Default for PublicPathPolicy {
    fn default() -> Self {
        Self::new(PUBLIC_SEGMENTS.iter().map(|s| (*s).to_string()).collect())
    }
}

/// Where the session strategy obtains its CSRF token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfConfig {
    /// Path (relative to the base URL) returning the token.
    pub endpoint: String,
    /// JSON field of the endpoint's response holding the token.
    pub response_field: String,
    /// Header the token is sent in on mutating requests.
    pub header_name: String,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            endpoint: "/csrf-token".to_string(),
            response_field: "csrfToken".to_string(),
            header_name: "X-CSRF-Token".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockConfig {
    /// Simulated latency attached to every mock response.
    pub latency_ms: u64,
    /// Number of elements synthesized for array schemas.
    pub array_len: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            latency_ms: DEFAULT_MOCK_LATENCY_MS,
            array_len: DEFAULT_MOCK_ARRAY_LEN,
        }
    }
}

/// On-disk shape of `apiconnect.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub framework: Option<String>,
    pub output: Option<PathBuf>,
    pub auth: Option<String>,
    pub mock: Option<bool>,
    pub spec: Option<String>,
    pub discovery: Option<FileDiscovery>,
    pub public_paths: Option<FilePublicPaths>,
    pub csrf: Option<FileCsrf>,
    pub mock_options: Option<FileMockOptions>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileDiscovery {
    pub probe_paths: Option<Vec<String>>,
    pub heuristic_paths: Option<Vec<String>>,
    pub max_concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilePublicPaths {
    pub segments: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileCsrf {
    pub endpoint: Option<String>,
    pub response_field: Option<String>,
    pub header_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileMockOptions {
    pub latency_ms: Option<u64>,
    pub array_len: Option<usize>,
}

impl FileConfig {
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| GenError::Config(format!("{CONFIG_FILENAME}: {e}")))
    }

    /// Read a config file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| GenError::Config(format!("failed to read {}: {e}", path.display())))?;
        debug!(path = %path.display(), "Loaded config file.");
        Self::from_toml(&contents)
    }

    /// Read `apiconnect.toml` from `dir` if it exists.
    pub fn discover(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(CONFIG_FILENAME);
        if !path.exists() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GenerationConfig::new("http://localhost:8000/");
        assert_eq!(config.framework, "react");
        assert_eq!(config.auth_mode, "token");
        assert!(!config.mock);
        assert_eq!(config.output_dir, PathBuf::from("src/api"));
        assert_eq!(config.base_url_trimmed(), "http://localhost:8000");
        assert_eq!(config.discovery.probe_paths[0], "/openapi.json");
    }

    #[test]
    fn test_public_path_policy() {
        let policy = PublicPathPolicy::default();
        assert!(policy.matches("/health"));
        assert!(policy.matches("/api/auth/login"));
        assert!(policy.matches("/api/Health"));
        assert!(!policy.matches("/users"));
        assert!(!policy.matches("/users/{health}"));
        assert!(!policy.matches("/auth/me"));
    }

    #[test]
    fn test_apply_file_overrides_only_given_fields() {
        let file = FileConfig::from_toml(
            r#"
framework = "vue"
mock = true

[discovery]
max_concurrency = 0
timeout_secs = 3

[public_paths]
segments = ["status"]

[csrf]
header_name = "X-XSRF-TOKEN"
"#,
        )
        .unwrap();

        let mut config = GenerationConfig::new("http://api.test");
        config.apply_file(file);

        assert_eq!(config.framework, "vue");
        assert!(config.mock);
        assert_eq!(config.auth_mode, "token");
        assert_eq!(config.discovery.max_concurrency, 1);
        assert_eq!(config.discovery.timeout, Duration::from_secs(3));
        assert!(config.public_paths.matches("/status"));
        assert!(!config.public_paths.matches("/health"));
        assert_eq!(config.csrf.header_name, "X-XSRF-TOKEN");
        assert_eq!(config.csrf.endpoint, "/csrf-token");
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = FileConfig::from_toml("colour = \"red\"").unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn test_discover_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileConfig::discover(dir.path()).unwrap().is_none());

        fs::write(dir.path().join(CONFIG_FILENAME), "auth = \"session\"\n").unwrap();
        let file = FileConfig::discover(dir.path()).unwrap().unwrap();
        assert_eq!(file.auth.as_deref(), Some("session"));
    }
}
