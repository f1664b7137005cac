//! `Sonarr` - typed operations over any [`LocalRestClient`].
//!
//! The client is injected at construction, so tests pass a
//! [`FakeRestClient`](crate::FakeRestClient) where production code passes a
//! [`SonarrClient`](crate::SonarrClient).
#![allow(clippy::future_not_send)]

mod types;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::instrument;

use super::api::{LocalRestClient, Params};
use super::endpoint::{Endpoint, HttpMethod};
use super::error::{Result, SonarrError};

pub use types::{
    Command, Episode, HistoryRecord, Page, QueueRecord, Series, SeriesStatistics, SystemStatus,
};

/// Default page size for paged endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Typed Sonarr API operations.
#[derive(Debug)]
pub struct Sonarr<C> {
    /// REST transport.
    client: C,
    /// API version segment (`v3`).
    api_version: String,
}

impl<C: LocalRestClient> Sonarr<C> {
    /// Wraps `client`, addressing `api/{api_version}/...` endpoints.
    #[must_use]
    pub fn new(client: C, api_version: impl Into<String>) -> Self {
        Self {
            client,
            api_version: api_version.into(),
        }
    }

    /// Underlying transport.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Builds a versioned endpoint descriptor.
    fn endpoint(&self, name: &str, method: HttpMethod, path: &str) -> Endpoint {
        Endpoint::new(name, method, format!("api/{}/{path}", self.api_version))
    }

    /// Dispatches on the endpoint's verb.
    async fn call(&self, endpoint: &Endpoint, params: Params) -> Result<Option<Value>> {
        match endpoint.method() {
            HttpMethod::Get => self.client.get(endpoint, params).await,
            HttpMethod::Post => self.client.post(endpoint, params).await,
            HttpMethod::Put => self.client.put(endpoint, params).await,
            HttpMethod::Delete => self.client.delete(endpoint, params).await,
        }
    }

    /// Calls `endpoint` and decodes a required body into `T`.
    async fn fetch<T: DeserializeOwned>(&self, endpoint: &Endpoint, params: Params) -> Result<T> {
        let body = self.call(endpoint, params).await?;
        decode(endpoint, body)
    }

    /// Fetches `system/status`.
    ///
    /// # Errors
    ///
    /// Returns the transport error, or `UnexpectedResponse` on a shape mismatch.
    #[instrument(skip_all)]
    pub async fn system_status(&self) -> Result<SystemStatus> {
        let endpoint = self.endpoint("systemStatus", HttpMethod::Get, "system/status");
        self.fetch(&endpoint, Params::new()).await
    }

    /// Lists all series.
    ///
    /// # Errors
    ///
    /// Returns the transport error, or `UnexpectedResponse` on a shape mismatch.
    #[instrument(skip_all)]
    pub async fn series(&self) -> Result<Vec<Series>> {
        let endpoint = self.endpoint("series", HttpMethod::Get, "series");
        self.fetch(&endpoint, Params::new()).await
    }

    /// Fetches one series.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown ID, or another transport error.
    #[instrument(skip_all, fields(id = id))]
    pub async fn series_by_id(&self, id: u64) -> Result<Series> {
        let endpoint = self.endpoint("seriesById", HttpMethod::Get, "series/{id}");
        self.fetch(&endpoint, params(json!({ "id": id }))).await
    }

    /// Adds a series. `data` is the Sonarr series resource.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when Sonarr rejects the resource.
    #[instrument(skip_all)]
    pub async fn add_series(&self, data: Params) -> Result<Series> {
        let endpoint = self.endpoint("addSeries", HttpMethod::Post, "series");
        self.fetch(&endpoint, data).await
    }

    /// Updates a series. `id` fills the path; `data` is the body.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when Sonarr rejects the resource.
    #[instrument(skip_all, fields(id = id))]
    pub async fn update_series(&self, id: u64, mut data: Params) -> Result<Series> {
        let endpoint = self.endpoint("updateSeries", HttpMethod::Put, "series/{id}");
        data.insert(String::from("id"), json!(id));
        self.fetch(&endpoint, data).await
    }

    /// Deletes a series, optionally with its files.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown ID, or another transport error.
    #[instrument(skip_all, fields(id = id))]
    pub async fn delete_series(&self, id: u64, delete_files: bool) -> Result<()> {
        let endpoint = self.endpoint("deleteSeries", HttpMethod::Delete, "series/{id}");
        self.call(
            &endpoint,
            params(json!({ "id": id, "deleteFiles": delete_files })),
        )
        .await?;
        Ok(())
    }

    /// Lists the episodes of a series.
    ///
    /// # Errors
    ///
    /// Returns the transport error, or `UnexpectedResponse` on a shape mismatch.
    #[instrument(skip_all, fields(series_id = series_id))]
    pub async fn episodes(&self, series_id: u64) -> Result<Vec<Episode>> {
        let endpoint = self.endpoint("episodes", HttpMethod::Get, "episode");
        self.fetch(&endpoint, params(json!({ "seriesId": series_id })))
            .await
    }

    /// Fetches one episode.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown ID, or another transport error.
    #[instrument(skip_all, fields(id = id))]
    pub async fn episode_by_id(&self, id: u64) -> Result<Episode> {
        let endpoint = self.endpoint("episodeById", HttpMethod::Get, "episode/{id}");
        self.fetch(&endpoint, params(json!({ "id": id }))).await
    }

    /// Lists episodes airing between `start` and `end` (ISO 8601 dates).
    ///
    /// Sonarr defaults to today .. today + 2 days when omitted.
    ///
    /// # Errors
    ///
    /// Returns the transport error, or `UnexpectedResponse` on a shape mismatch.
    #[instrument(skip_all)]
    pub async fn calendar(&self, start: Option<&str>, end: Option<&str>) -> Result<Vec<Episode>> {
        let endpoint = self.endpoint("calendar", HttpMethod::Get, "calendar");
        let mut query = Params::new();
        if let Some(start) = start {
            query.insert(String::from("start"), json!(start));
        }
        if let Some(end) = end {
            query.insert(String::from("end"), json!(end));
        }
        self.fetch(&endpoint, query).await
    }

    /// Lists active downloads.
    ///
    /// # Errors
    ///
    /// Returns the transport error, or `UnexpectedResponse` on a shape mismatch.
    #[instrument(skip_all)]
    pub async fn queue(&self, page: u32, page_size: u32) -> Result<Page<QueueRecord>> {
        let endpoint = self.endpoint("queue", HttpMethod::Get, "queue");
        self.fetch(&endpoint, paging(page, page_size)).await
    }

    /// Lists history entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns the transport error, or `UnexpectedResponse` on a shape mismatch.
    #[instrument(skip_all)]
    pub async fn history(&self, page: u32, page_size: u32) -> Result<Page<HistoryRecord>> {
        let endpoint = self.endpoint("history", HttpMethod::Get, "history");
        let mut query = paging(page, page_size);
        query.insert(String::from("sortKey"), json!("date"));
        query.insert(String::from("sortDirection"), json!("descending"));
        self.fetch(&endpoint, query).await
    }

    /// Lists monitored episodes without a file.
    ///
    /// # Errors
    ///
    /// Returns the transport error, or `UnexpectedResponse` on a shape mismatch.
    #[instrument(skip_all)]
    pub async fn wanted_missing(&self, page: u32, page_size: u32) -> Result<Page<Episode>> {
        let endpoint = self.endpoint("wantedMissing", HttpMethod::Get, "wanted/missing");
        self.fetch(&endpoint, paging(page, page_size)).await
    }

    /// Queues a command such as `RefreshSeries` or `RssSync`.
    /// `extra` carries command-specific fields (e.g. `seriesId`).
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an unknown command, or another transport error.
    #[instrument(skip_all, fields(name = name))]
    pub async fn run_command(&self, name: &str, mut extra: Params) -> Result<Command> {
        let endpoint = self.endpoint("command", HttpMethod::Post, "command");
        extra.insert(String::from("name"), json!(name));
        self.fetch(&endpoint, extra).await
    }

    /// Fetches a command's status.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown ID, or another transport error.
    #[instrument(skip_all, fields(id = id))]
    pub async fn command_by_id(&self, id: u64) -> Result<Command> {
        let endpoint = self.endpoint("commandById", HttpMethod::Get, "command/{id}");
        self.fetch(&endpoint, params(json!({ "id": id }))).await
    }
}

/// Converts a `json!` object literal into `Params`.
fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

/// Standard `page`/`pageSize` query.
fn paging(page: u32, page_size: u32) -> Params {
    params(json!({ "page": page.max(1), "pageSize": page_size }))
}

/// Decodes a required response body.
fn decode<T: DeserializeOwned>(endpoint: &Endpoint, body: Option<Value>) -> Result<T> {
    let value = body.ok_or_else(|| {
        SonarrError::UnexpectedResponse(format!("{} returned no content", endpoint.name()))
    })?;
    serde_json::from_value(value)
        .map_err(|e| SonarrError::UnexpectedResponse(format!("{}: {e}", endpoint.name())))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::{FakeRestClient, SonarrClient, SonarrConfiguration};

    fn fake_sonarr(fake: FakeRestClient) -> Sonarr<FakeRestClient> {
        Sonarr::new(fake, "v3")
    }

    #[tokio::test]
    async fn test_series_decodes_fake_response() {
        // Arrange
        let sonarr = fake_sonarr(FakeRestClient::with_responses([(
            "series",
            json!([
                {"id": 1, "title": "Breaking Bad", "year": 2008},
                {"id": 2, "title": "The Wire", "year": 2002}
            ]),
        )]));

        // Act
        let series = sonarr.series().await.unwrap();

        // Assert
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].title, "Breaking Bad");
        assert_eq!(series[0].year, Some(2008));
        assert_eq!(series[1].title, "The Wire");
        sonarr.client().assert_called("series");
    }

    #[tokio::test]
    async fn test_series_by_id_uses_specific_response() {
        // Arrange
        let sonarr = fake_sonarr(FakeRestClient::with_responses([
            ("seriesById/10", json!({"id": 10, "title": "Series Ten"})),
            ("seriesById/20", json!({"id": 20, "title": "Series Twenty"})),
        ]));

        // Act
        let ten = sonarr.series_by_id(10).await.unwrap();
        let twenty = sonarr.series_by_id(20).await.unwrap();

        // Assert
        assert_eq!(ten.title, "Series Ten");
        assert_eq!(twenty.title, "Series Twenty");
        sonarr.client().assert_called_times("seriesById", 2);
        sonarr
            .client()
            .assert_called_with("seriesById", &json!({"id": 10}));
    }

    #[tokio::test]
    async fn test_series_by_id_records_versioned_path() {
        // Arrange
        let sonarr = Sonarr::new(FakeRestClient::new().with_default(json!({"id": 5})), "v5");

        // Act
        sonarr.series_by_id(5).await.unwrap();

        // Assert
        let calls = sonarr.client().calls();
        assert_eq!(calls["seriesById"][0].path, "api/v5/series/5");
    }

    #[tokio::test]
    async fn test_system_status_custom_response() {
        // Arrange
        let sonarr = fake_sonarr(FakeRestClient::with_responses([(
            "systemStatus",
            json!({"version": "4.0.0.0", "branch": "develop", "isDocker": true}),
        )]));

        // Act
        let status = sonarr.system_status().await.unwrap();

        // Assert
        assert_eq!(status.version, "4.0.0.0");
        assert_eq!(status.branch.as_deref(), Some("develop"));
        assert!(status.is_docker);
    }

    #[tokio::test]
    async fn test_queue_sends_paging() {
        // Arrange
        let sonarr = fake_sonarr(FakeRestClient::with_responses([(
            "queue",
            json!({
                "page": 1,
                "pageSize": 10,
                "totalRecords": 2,
                "records": [{"id": 1}, {"id": 2}]
            }),
        )]));

        // Act
        let page = sonarr.queue(0, 10).await.unwrap();

        // Assert
        assert_eq!(page.records.len(), 2);
        sonarr
            .client()
            .assert_called_with("queue", &json!({"page": 1, "pageSize": 10}));
    }

    #[tokio::test]
    async fn test_delete_series_accepts_no_content() {
        // Arrange
        let fake = FakeRestClient::new();
        fake.set_response("deleteSeries", crate::FakeResponse::NoContent);
        let sonarr = fake_sonarr(fake);

        // Act
        let result = sonarr.delete_series(3, true).await;

        // Assert
        assert!(result.is_ok());
        sonarr
            .client()
            .assert_called_with("deleteSeries", &json!({"id": 3, "deleteFiles": true}));
    }

    #[tokio::test]
    async fn test_required_body_missing_is_unexpected_response() {
        // Arrange
        let fake = FakeRestClient::new();
        fake.set_response("systemStatus", crate::FakeResponse::NoContent);
        let sonarr = fake_sonarr(fake);

        // Act
        let result = sonarr.system_status().await;

        // Assert
        assert!(matches!(result, Err(SonarrError::UnexpectedResponse(_))));
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_unexpected_response() {
        // Arrange
        let sonarr = fake_sonarr(FakeRestClient::with_responses([(
            "series",
            json!({"not": "a list"}),
        )]));

        // Act
        let result = sonarr.series().await;

        // Assert
        assert!(matches!(result, Err(SonarrError::UnexpectedResponse(_))));
    }

    #[tokio::test]
    async fn test_errors_propagate_unchanged() {
        // Arrange
        let sonarr = fake_sonarr(FakeRestClient::with_responses([(
            "seriesById",
            SonarrError::NotFound {
                path: String::from("api/v3/series/9"),
            },
        )]));

        // Act
        let result = sonarr.series_by_id(9).await;

        // Assert
        assert!(matches!(result, Err(SonarrError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_run_command_posts_name() {
        // Arrange
        let sonarr = fake_sonarr(FakeRestClient::with_responses([(
            "command",
            json!({"id": 42, "name": "RefreshSeries", "status": "queued"}),
        )]));

        // Act
        let command = sonarr
            .run_command("RefreshSeries", params(json!({"seriesId": 1})))
            .await
            .unwrap();

        // Assert
        assert_eq!(command.id, 42);
        sonarr.client().assert_called_with(
            "command",
            &json!({"name": "RefreshSeries", "seriesId": 1}),
        );
    }

    #[tokio::test]
    async fn test_calendar_omits_missing_bounds() {
        // Arrange
        let sonarr = fake_sonarr(FakeRestClient::new().with_default(json!([])));

        // Act
        sonarr.calendar(Some("2024-01-01"), None).await.unwrap();

        // Assert
        let calls = sonarr.client().calls();
        let call = &calls["calendar"][0];
        assert_eq!(call.params, params(json!({"start": "2024-01-01"})));
    }

    #[tokio::test]
    async fn test_series_by_id_over_http() {
        // Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/series/5"))
            .and(header("X-Api-Key", "test-api-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"id":5,"title":"Breaking Bad","year":2008}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
        let config = SonarrConfiguration::new(
            mock_server.address().ip().to_string(),
            mock_server.address().port(),
            "test-api-key",
        );
        let client = SonarrClient::builder()
            .configuration(config)
            .build()
            .unwrap();
        let sonarr = Sonarr::new(client, "v3");

        // Act
        let series = sonarr.series_by_id(5).await.unwrap();

        // Assert
        assert_eq!(series.id, 5);
        assert_eq!(series.title, "Breaking Bad");
    }

    #[tokio::test]
    async fn test_update_series_over_http_moves_id_into_path() {
        // Arrange
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v3/series/8"))
            .and(body_json(json!({"title": "Renamed", "monitored": true})))
            .respond_with(
                ResponseTemplate::new(202).set_body_string(r#"{"id":8,"title":"Renamed"}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
        let config = SonarrConfiguration::new(
            mock_server.address().ip().to_string(),
            mock_server.address().port(),
            "test-api-key",
        );
        let client = SonarrClient::builder()
            .configuration(config)
            .build()
            .unwrap();
        let sonarr = Sonarr::new(client, "v3");

        // Act
        let series = sonarr
            .update_series(8, params(json!({"title": "Renamed", "monitored": true})))
            .await
            .unwrap();

        // Assert
        assert_eq!(series.title, "Renamed");
    }
}
