//! Sonarr REST API client library for sonarrctl.
//!
//! Provides the REST transport adapter, its configuration, a recording fake
//! for tests, and a thin domain layer over the Sonarr v3 API.

mod api;
mod client;
mod config;
mod endpoint;
mod error;
mod fake;

/// Domain layer over the adapter contract.
pub mod sonarr;

pub use api::{LocalRestClient, Params, RestClient};
#[allow(clippy::module_name_repetitions)]
pub use client::{SonarrClient, SonarrClientBuilder};
#[allow(clippy::module_name_repetitions)]
pub use config::SonarrConfiguration;
pub use endpoint::{Endpoint, HttpMethod};
#[allow(clippy::module_name_repetitions)]
pub use error::{Result, SonarrError};
pub use fake::{FakeResponse, FakeRestClient, RecordedCall};
pub use sonarr::Sonarr;
