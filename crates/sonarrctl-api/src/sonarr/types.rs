//! Sonarr v3 response models.
//!
//! Only the fields sonarrctl reads are modelled; unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// `GET /api/v3/system/status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemStatus {
    /// Application name (`Sonarr`).
    pub app_name: Option<String>,
    /// Version string.
    pub version: String,
    /// Release branch.
    pub branch: Option<String>,
    /// Running inside Docker.
    pub is_docker: bool,
    /// Host OS name.
    pub os_name: Option<String>,
    /// Configured URL base.
    pub url_base: Option<String>,
    /// Process start time (ISO 8601).
    pub start_time: Option<String>,
}

/// Per-series file statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeriesStatistics {
    /// Number of seasons.
    pub season_count: u32,
    /// Episodes with a file on disk.
    pub episode_file_count: u32,
    /// Monitored episodes that have aired.
    pub episode_count: u32,
    /// Bytes on disk.
    pub size_on_disk: u64,
}

/// A series (`/api/v3/series`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Series {
    /// Sonarr series ID.
    pub id: u64,
    /// Title.
    pub title: String,
    /// First-air year.
    pub year: Option<u32>,
    /// `continuing`, `ended`, ...
    pub status: Option<String>,
    /// Whether the series is monitored.
    pub monitored: bool,
    /// Root path on disk.
    pub path: Option<String>,
    /// `TheTVDB` ID.
    pub tvdb_id: Option<u64>,
    /// File statistics.
    pub statistics: Option<SeriesStatistics>,
}

/// An episode (`/api/v3/episode`, calendar, wanted).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Episode {
    /// Sonarr episode ID.
    pub id: u64,
    /// Parent series ID.
    pub series_id: u64,
    /// Season number.
    pub season_number: u32,
    /// Episode number within the season.
    pub episode_number: u32,
    /// Episode title.
    pub title: Option<String>,
    /// Air time (UTC, ISO 8601).
    pub air_date_utc: Option<String>,
    /// Whether a file exists.
    pub has_file: bool,
    /// Whether the episode is monitored.
    pub monitored: bool,
}

/// Paged response wrapper (`queue`, `history`, `wanted/missing`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// 1-based page number.
    #[serde(default)]
    pub page: u32,
    /// Items per page.
    #[serde(default)]
    pub page_size: u32,
    /// Total across all pages.
    #[serde(default)]
    pub total_records: u64,
    /// Items on this page.
    #[serde(default)]
    pub records: Vec<T>,
}

/// A download in progress (`/api/v3/queue`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueRecord {
    /// Queue item ID.
    pub id: u64,
    /// Series ID.
    pub series_id: Option<u64>,
    /// Episode ID.
    pub episode_id: Option<u64>,
    /// Release title.
    pub title: Option<String>,
    /// `downloading`, `paused`, `completed`, ...
    pub status: Option<String>,
    /// `downloading`, `importPending`, `failedPending`, ...
    pub tracked_download_state: Option<String>,
    /// Total bytes.
    pub size: f64,
    /// Bytes remaining.
    #[serde(rename = "sizeleft")]
    pub size_left: f64,
    /// Estimated time left (`hh:mm:ss`).
    #[serde(rename = "timeleft")]
    pub time_left: Option<String>,
    /// `usenet` or `torrent`.
    pub protocol: Option<String>,
    /// Download client name.
    pub download_client: Option<String>,
}

/// A history entry (`/api/v3/history`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryRecord {
    /// History entry ID.
    pub id: u64,
    /// Series ID.
    pub series_id: Option<u64>,
    /// Episode ID.
    pub episode_id: Option<u64>,
    /// Release title.
    pub source_title: Option<String>,
    /// `grabbed`, `downloadFolderImported`, ...
    pub event_type: Option<String>,
    /// Event time (ISO 8601).
    pub date: Option<String>,
}

/// A command (`/api/v3/command`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Command {
    /// Command ID.
    pub id: u64,
    /// Command name (`RefreshSeries`, `RssSync`, ...).
    pub name: String,
    /// `queued`, `started`, `completed`, `failed`.
    pub status: Option<String>,
    /// Queue time (ISO 8601).
    pub queued: Option<String>,
    /// Last status message.
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    #[test]
    fn test_parse_series_ignores_unknown_fields() {
        // Arrange
        let json = r#"{
            "id": 1,
            "title": "Breaking Bad",
            "year": 2008,
            "status": "ended",
            "monitored": true,
            "tvdbId": 81189,
            "seasons": [{"seasonNumber": 1}],
            "statistics": {"seasonCount": 5, "episodeFileCount": 62, "episodeCount": 62, "sizeOnDisk": 1024}
        }"#;

        // Act
        let series: Series = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(series.id, 1);
        assert_eq!(series.title, "Breaking Bad");
        assert_eq!(series.year, Some(2008));
        assert_eq!(series.tvdb_id, Some(81_189));
        assert_eq!(series.statistics.unwrap().season_count, 5);
    }

    #[test]
    fn test_parse_queue_page() {
        // Arrange
        let json = r#"{
            "page": 1,
            "pageSize": 10,
            "totalRecords": 1,
            "records": [{
                "id": 7,
                "seriesId": 1,
                "episodeId": 11,
                "title": "Show.S01E01.1080p",
                "status": "downloading",
                "trackedDownloadState": "downloading",
                "size": 1000.0,
                "sizeleft": 250.0,
                "timeleft": "00:05:00",
                "protocol": "torrent"
            }]
        }"#;

        // Act
        let page: Page<QueueRecord> = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(page.total_records, 1);
        let record = &page.records[0];
        assert_eq!(record.id, 7);
        assert_eq!(record.time_left.as_deref(), Some("00:05:00"));
        assert!((record.size_left - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_empty_page_defaults() {
        // Arrange & Act
        let page: Page<HistoryRecord> = serde_json::from_str("{}").unwrap();

        // Assert
        assert_eq!(page.page, 0);
        assert!(page.records.is_empty());
    }
}
