//! Backend URL and route resolution from environment variables.
//!
//! DESIGN
//! ======
//! The environment is read once into a `ClientConfig` snapshot. Every
//! derived URL (API base, route table, absolute resource URLs, WebSocket
//! URLs) is a pure function of that snapshot, so the rest of the crate
//! never touches `std::env` directly.
//!
//! ERROR HANDLING
//! ==============
//! Nothing here fails. An unparseable backend URL falls back to
//! `DEFAULT_BACKEND_URL` with a warning, and an unusable timeout falls back
//! to `DEFAULT_API_TIMEOUT_MS`.

use std::time::Duration;

use serde::Serialize;
use url::Url;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_API_TIMEOUT_MS: u64 = 30_000;

pub const BACKEND_URL_ENV: &str = "BACKEND_URL";
/// Older deployments configured the backend under this name.
pub const LEGACY_BACKEND_URL_ENV: &str = "API_BASE_URL";
pub const API_VERSION_ENV: &str = "API_VERSION";
pub const API_TIMEOUT_ENV: &str = "API_TIMEOUT";

// =============================================================================
// ROUTE TABLE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthRoutes {
    pub login: String,
    pub signup: String,
    pub refresh: String,
    pub refresh_token: String,
    pub logout: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreRoutes {
    pub uploads: String,
}

/// Fully-qualified HTTP endpoints derived from the API base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiRoutes {
    pub auth: AuthRoutes,
    pub core: CoreRoutes,
}

impl ApiRoutes {
    fn new(api_base_url: &str) -> Self {
        Self {
            auth: AuthRoutes {
                login: format!("{api_base_url}/users/login/"),
                signup: format!("{api_base_url}/users/signup/"),
                refresh: format!("{api_base_url}/users/refresh/"),
                refresh_token: format!("{api_base_url}/users/refresh/token/"),
                logout: format!("{api_base_url}/users/logout/"),
            },
            core: CoreRoutes {
                uploads: format!("{api_base_url}/core/uploads/"),
            },
        }
    }
}

// =============================================================================
// BACKEND ENDPOINT
// =============================================================================

/// The parts of the backend URL needed to address WebSocket endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BackendEndpoint {
    secure: bool,
    /// Host with explicit port, if the URL carried a non-default one.
    host: String,
    /// Path prefix without a trailing slash (empty for a bare origin).
    path_prefix: String,
}

impl Default for BackendEndpoint {
    fn default() -> Self {
        Self {
            secure: false,
            host: "localhost:3000".to_owned(),
            path_prefix: String::new(),
        }
    }
}

impl BackendEndpoint {
    fn parse(raw: &str) -> Option<Self> {
        let url = Url::parse(raw).ok()?;
        let host = url.host_str()?;
        let host = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        };
        let path_prefix = url.path().strip_suffix('/').unwrap_or(url.path()).to_owned();
        Some(Self {
            secure: url.scheme() == "https",
            host,
            path_prefix,
        })
    }
}

// =============================================================================
// CLIENT CONFIG
// =============================================================================

/// Snapshot of the client's backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientConfig {
    /// Backend origin (plus optional path prefix) without trailing slash.
    pub backend_url: String,
    /// API version segment without surrounding slashes.
    pub api_version: String,
    /// `{backend_url}/api/{api_version}`.
    pub api_base_url: String,
    pub api_timeout_ms: u64,
    pub routes: ApiRoutes,
    #[serde(skip)]
    endpoint: BackendEndpoint,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ClientConfig {
    /// Build the config from the process environment.
    ///
    /// Optional:
    /// - `BACKEND_URL` (falls back to `API_BASE_URL`): default `http://localhost:3000`
    /// - `API_VERSION`: default `v1`
    /// - `API_TIMEOUT`: milliseconds, default 30000
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let raw_backend = present(BACKEND_URL_ENV)
            .or_else(|| present(LEGACY_BACKEND_URL_ENV))
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_owned());
        let mut backend_url = normalize_base_url(raw_backend.trim());
        let endpoint = if let Some(endpoint) = BackendEndpoint::parse(&backend_url) {
            endpoint
        } else {
            tracing::warn!(backend_url = %backend_url, "invalid backend URL, using default");
            backend_url = DEFAULT_BACKEND_URL.to_owned();
            BackendEndpoint::default()
        };

        let api_version = present(API_VERSION_ENV);
        let api_version = normalize_segment(api_version.as_deref().unwrap_or(DEFAULT_API_VERSION));
        let api_timeout_ms = parse_timeout(present(API_TIMEOUT_ENV).as_deref());
        let api_base_url = format!("{backend_url}/api/{api_version}");
        let routes = ApiRoutes::new(&api_base_url);

        Self {
            backend_url,
            api_version,
            api_base_url,
            api_timeout_ms,
            routes,
            endpoint,
        }
    }

    #[must_use]
    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }

    /// Resolve a resource path returned by the API into an absolute URL.
    ///
    /// Paths already starting with `http://` or `https://` (any case) are
    /// returned unchanged; an empty path yields an empty string.
    #[must_use]
    pub fn to_absolute_url(&self, path: &str) -> String {
        if path.is_empty() {
            return String::new();
        }
        if is_http_url(path) {
            return path.to_owned();
        }
        format!("{}/{}", self.backend_url, path.trim_start_matches('/'))
    }

    /// Build a WebSocket URL for `path` on the backend host.
    ///
    /// The scheme is `wss:` when the backend is served over `https:`, `ws:`
    /// otherwise. The backend's own path prefix is kept in front of `path`.
    #[must_use]
    pub fn build_websocket_url(&self, path: &str) -> String {
        let scheme = if self.endpoint.secure { "wss:" } else { "ws:" };
        let cleaned = if path.starts_with('/') { path.to_owned() } else { format!("/{path}") };
        let joined = collapse_slashes(&format!("{}{cleaned}", self.endpoint.path_prefix));
        format!("{scheme}//{}{joined}", self.endpoint.host)
    }

    /// Same as [`build_websocket_url`](Self::build_websocket_url) with
    /// URL-encoded query parameters appended.
    #[must_use]
    pub fn build_websocket_url_with_query(&self, path: &str, params: &[(&str, &str)]) -> String {
        let base = self.build_websocket_url(path);
        if params.is_empty() {
            return base;
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        format!("{base}?{query}")
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_owned()
}

fn normalize_segment(segment: &str) -> String {
    segment.trim().trim_matches('/').to_owned()
}

fn parse_timeout(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_API_TIMEOUT_MS)
}

fn is_http_url(path: &str) -> bool {
    let has_prefix = |prefix: &str| {
        path.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    has_prefix("http://") || has_prefix("https://")
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;
    for ch in path.chars() {
        if ch == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
