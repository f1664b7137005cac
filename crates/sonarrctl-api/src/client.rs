//! `SonarrClient` - REST transport adapter for the Sonarr API.

use std::collections::HashMap;

use anyhow::{Context, Result as AnyResult};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::instrument;
use url::Url;

use super::api::{LocalRestClient, Params};
use super::config::SonarrConfiguration;
use super::endpoint::{Endpoint, HttpMethod, render_value};
use super::error::{Result, SonarrError};

/// Header carrying the Sonarr API key.
const API_KEY_HEADER: &str = "X-Api-Key";

/// JSON media type sent in `Accept` and `Content-Type`.
const JSON_MEDIA_TYPE: &str = "application/json";

/// Default User-Agent.
const DEFAULT_USER_AGENT: &str = concat!("sonarrctl/", env!("CARGO_PKG_VERSION"));

/// Maximum number of body characters kept in an error message.
const ERROR_BODY_PREVIEW: usize = 200;

/// Sonarr REST client.
///
/// Performs exactly one HTTP round trip per call; holds no per-call state.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SonarrClient {
    /// HTTP client.
    http_client: Client,
    /// `scheme://host:port[/url_base]`, port always explicit.
    base_url: String,
    /// Connection settings.
    config: SonarrConfiguration,
}

/// Builder for `SonarrClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SonarrClientBuilder {
    config: Option<SonarrConfiguration>,
    user_agent: Option<String>,
}

impl SonarrClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            config: None,
            user_agent: None,
        }
    }

    /// Sets the connection settings (required).
    #[must_use]
    pub fn configuration(mut self, config: SonarrConfiguration) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the User-Agent (default: `sonarrctl/<version>`).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `configuration` is not set.
    /// - The configured host, port and URL base do not form a valid URL.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> AnyResult<SonarrClient> {
        let config = self.config.context("configuration is required")?;
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| String::from(DEFAULT_USER_AGENT));

        let base_url = config.base_url();
        Url::parse(&base_url).with_context(|| format!("invalid Sonarr base URL: {base_url}"))?;

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(config.timeout_duration())
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(SonarrClient {
            http_client,
            base_url,
            config,
        })
    }
}

impl SonarrClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> SonarrClientBuilder {
        SonarrClientBuilder::new()
    }

    /// Connection settings in use.
    #[must_use]
    pub const fn configuration(&self) -> &SonarrConfiguration {
        &self.config
    }

    /// Joins the base URL and a rendered path with a single `/`.
    #[must_use]
    pub fn build_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Builds a `Connection` error for the configured host and port.
    fn connection_error(&self, message: impl Into<String>) -> SonarrError {
        SonarrError::connection(self.config.host.clone(), self.config.port, message)
    }

    /// Maps a non-2xx status onto the error taxonomy.
    fn classify_status(&self, status: StatusCode, body: &str, path: &str) -> SonarrError {
        match status.as_u16() {
            401 => SonarrError::Authentication,
            404 => SonarrError::NotFound {
                path: String::from(path),
            },
            400 | 422 => SonarrError::Validation {
                body: serde_json::from_str(body).unwrap_or(Value::Null),
            },
            code => {
                let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
                let message = if preview.is_empty() {
                    format!("HTTP request returned status code {code}")
                } else {
                    format!("HTTP request returned status code {code}: {preview}")
                };
                self.connection_error(message)
            }
        }
    }

    /// Sends one request and classifies the outcome.
    #[instrument(skip_all, fields(method = %method, endpoint = endpoint.name()))]
    async fn request(
        &self,
        method: HttpMethod,
        endpoint: &Endpoint,
        mut params: Params,
    ) -> Result<Option<Value>> {
        let path_params = extract_path_params(endpoint, &mut params);
        let path = endpoint.path(&path_params);
        let url = self.build_url(&path);

        let mut builder = self
            .http_client
            .request(to_reqwest_method(method), url.as_str())
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .header(CONTENT_TYPE, JSON_MEDIA_TYPE);
        builder = if method.has_body() {
            builder.json(&Value::Object(params))
        } else {
            builder.query(&query_pairs(&params))
        };

        tracing::debug!(%url, "Sonarr API request");

        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                let message = describe_transport_error(&e, self.config.timeout);
                tracing::warn!(%url, error = %message, "Sonarr API request failed");
                return Err(self.connection_error(message));
            }
        };

        let status = response.status();
        let body_result = response.text().await;

        if !status.is_success() {
            let body = body_result.unwrap_or_default();
            let err = self.classify_status(status, &body, &path);
            tracing::warn!(%url, status = status.as_u16(), error = %err, "Sonarr API error");
            return Err(err);
        }

        let body = body_result.map_err(|e| {
            self.connection_error(format!("failed to read response body: {e}"))
        })?;

        if body.is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| self.connection_error(format!("failed to decode JSON response: {e}")))
    }
}

impl LocalRestClient for SonarrClient {
    async fn get(&self, endpoint: &Endpoint, params: Params) -> Result<Option<Value>> {
        self.request(HttpMethod::Get, endpoint, params).await
    }

    async fn post(&self, endpoint: &Endpoint, data: Params) -> Result<Option<Value>> {
        self.request(HttpMethod::Post, endpoint, data).await
    }

    async fn put(&self, endpoint: &Endpoint, data: Params) -> Result<Option<Value>> {
        self.request(HttpMethod::Put, endpoint, data).await
    }

    async fn delete(&self, endpoint: &Endpoint, params: Params) -> Result<Option<Value>> {
        self.request(HttpMethod::Delete, endpoint, params).await
    }
}

/// Moves non-null params named by the endpoint's placeholders out of `params`.
pub(crate) fn extract_path_params(
    endpoint: &Endpoint,
    params: &mut Params,
) -> HashMap<String, Value> {
    endpoint
        .placeholders()
        .into_iter()
        .filter_map(|name| {
            if params.get(name).is_some_and(|value| !value.is_null()) {
                params.remove(name).map(|value| (String::from(name), value))
            } else {
                None
            }
        })
        .collect()
}

/// Flattens params into query pairs. `null` is skipped; arrays repeat the key.
fn query_pairs(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => pairs.extend(
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| (key.clone(), render_value(item))),
            ),
            other => pairs.push((key.clone(), render_value(other))),
        }
    }
    pairs
}

/// Converts the endpoint verb to a `reqwest` method.
fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

/// Renders a transport error with its source chain.
fn describe_transport_error(err: &reqwest::Error, timeout_secs: u64) -> String {
    if err.is_timeout() {
        return format!("request timed out after {timeout_secs}s");
    }
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
