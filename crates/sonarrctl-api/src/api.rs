//! `RestClient` trait definition.
#![allow(clippy::future_not_send)]

use serde_json::{Map, Value};

use super::endpoint::Endpoint;
use super::error::Result;

/// Call parameters: path placeholders plus query or body fields.
pub type Params = Map<String, Value>;

/// REST transport contract consumed by the domain layer.
///
/// Abstracts the HTTP adapter for fake substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
///
/// Every operation resolves to `Ok(Some(json))`, `Ok(None)` when the
/// server answered 2xx with an empty body, or exactly one [`SonarrError`].
///
/// [`SonarrError`]: crate::SonarrError
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(RestClient: Send)]
pub trait LocalRestClient {
    /// Issues a `GET`; remaining params become the query string.
    ///
    /// # Errors
    ///
    /// Returns the classified [`SonarrError`](crate::SonarrError).
    async fn get(&self, endpoint: &Endpoint, params: Params) -> Result<Option<Value>>;

    /// Issues a `POST`; remaining data becomes the JSON body.
    ///
    /// # Errors
    ///
    /// Returns the classified [`SonarrError`](crate::SonarrError).
    async fn post(&self, endpoint: &Endpoint, data: Params) -> Result<Option<Value>>;

    /// Issues a `PUT`; remaining data becomes the JSON body.
    ///
    /// # Errors
    ///
    /// Returns the classified [`SonarrError`](crate::SonarrError).
    async fn put(&self, endpoint: &Endpoint, data: Params) -> Result<Option<Value>>;

    /// Issues a `DELETE`; remaining params become the query string.
    ///
    /// # Errors
    ///
    /// Returns the classified [`SonarrError`](crate::SonarrError).
    async fn delete(&self, endpoint: &Endpoint, params: Params) -> Result<Option<Value>>;
}
