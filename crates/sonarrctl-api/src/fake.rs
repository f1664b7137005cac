//! `FakeRestClient` - in-memory stand-in for `SonarrClient` in tests.
//!
//! Records every call and answers from canned responses keyed by
//! `"{endpoint}/{id}"` (when the call carries an `id`) or `"{endpoint}"`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use super::api::{LocalRestClient, Params};
use super::endpoint::{Endpoint, HttpMethod, render_value};
use super::error::{Result, SonarrError};

/// Canned answer for a fake call.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    /// Decoded JSON body.
    Json(Value),
    /// 2xx with an empty body.
    NoContent,
    /// Fail the call with this error.
    Error(SonarrError),
}

impl From<Value> for FakeResponse {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<SonarrError> for FakeResponse {
    fn from(err: SonarrError) -> Self {
        Self::Error(err)
    }
}

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// HTTP verb used.
    pub method: HttpMethod,
    /// Endpoint name.
    pub endpoint: String,
    /// Rendered path.
    pub path: String,
    /// Params as passed by the caller, path params included.
    pub params: Params,
}

/// Recording fake implementing the same contract as `SonarrClient`.
#[derive(Debug, Default)]
pub struct FakeRestClient {
    /// Canned responses by lookup key.
    responses: Mutex<HashMap<String, FakeResponse>>,
    /// Fallback when no key matches.
    default_response: Mutex<Option<FakeResponse>>,
    /// Calls grouped by endpoint name.
    calls: Mutex<BTreeMap<String, Vec<RecordedCall>>>,
}

/// Locks `mutex`, recovering the data if a panicking test poisoned it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeRestClient {
    /// Creates a fake with no responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fake preloaded with `responses`.
    #[must_use]
    pub fn with_responses<K, R>(responses: impl IntoIterator<Item = (K, R)>) -> Self
    where
        K: Into<String>,
        R: Into<FakeResponse>,
    {
        let fake = Self::new();
        for (key, response) in responses {
            fake.set_response(key, response);
        }
        fake
    }

    /// Sets the fallback response for unregistered keys.
    #[must_use]
    pub fn with_default(self, response: impl Into<FakeResponse>) -> Self {
        *lock(&self.default_response) = Some(response.into());
        self
    }

    /// Registers (or replaces) the response for `key`.
    pub fn set_response(&self, key: impl Into<String>, response: impl Into<FakeResponse>) {
        lock(&self.responses).insert(key.into(), response.into());
    }

    /// Returns all recorded calls grouped by endpoint name.
    #[must_use]
    pub fn calls(&self) -> BTreeMap<String, Vec<RecordedCall>> {
        lock(&self.calls).clone()
    }

    /// Number of recorded calls to `endpoint`.
    #[must_use]
    pub fn call_count(&self, endpoint: &str) -> usize {
        lock(&self.calls).get(endpoint).map_or(0, Vec::len)
    }

    /// Asserts that `endpoint` was called at least once.
    ///
    /// # Panics
    ///
    /// Panics if `endpoint` was never called.
    pub fn assert_called(&self, endpoint: &str) {
        assert!(
            self.call_count(endpoint) > 0,
            "expected {endpoint:?} to be called, but it was not"
        );
    }

    /// Asserts that `endpoint` was never called.
    ///
    /// # Panics
    ///
    /// Panics if `endpoint` was called.
    pub fn assert_not_called(&self, endpoint: &str) {
        let count = self.call_count(endpoint);
        assert!(
            count == 0,
            "expected {endpoint:?} not to be called, but it was called {count} time(s)"
        );
    }

    /// Asserts that `endpoint` was called exactly `times` times.
    ///
    /// # Panics
    ///
    /// Panics on a different call count.
    pub fn assert_called_times(&self, endpoint: &str, times: usize) {
        let count = self.call_count(endpoint);
        assert!(
            count == times,
            "expected {endpoint:?} to be called {times} time(s), but it was called {count} time(s)"
        );
    }

    /// Asserts that some call to `endpoint` carried every field of `expected`.
    ///
    /// # Panics
    ///
    /// Panics if `expected` is not an object or no call matches.
    pub fn assert_called_with(&self, endpoint: &str, expected: &Value) {
        assert!(
            expected.is_object(),
            "assert_called_with expects a JSON object, got {expected}"
        );
        let empty = Params::new();
        let expected = expected.as_object().unwrap_or(&empty);
        let calls = lock(&self.calls);
        let recorded = calls.get(endpoint).map_or(&[][..], Vec::as_slice);
        let matched = recorded.iter().any(|call| {
            expected
                .iter()
                .all(|(key, value)| call.params.get(key) == Some(value))
        });
        assert!(
            matched,
            "expected {endpoint:?} to be called with {expected:?}, recorded: {:?}",
            recorded.iter().map(|c| &c.params).collect::<Vec<_>>()
        );
    }

    /// Asserts that no endpoint was called.
    ///
    /// # Panics
    ///
    /// Panics if any call was recorded.
    pub fn assert_nothing_called(&self) {
        let calls = lock(&self.calls);
        assert!(
            calls.is_empty(),
            "expected no calls, but recorded: {:?}",
            calls.keys().collect::<Vec<_>>()
        );
    }

    /// Records the call and resolves its canned response.
    fn respond(
        &self,
        method: HttpMethod,
        endpoint: &Endpoint,
        params: Params,
    ) -> Result<Option<Value>> {
        let substitutions: HashMap<String, Value> = endpoint
            .placeholders()
            .into_iter()
            .filter_map(|name| params.get(name).map(|v| (String::from(name), v.clone())))
            .collect();
        let specific_key = params
            .get("id")
            .map(|id| format!("{}/{}", endpoint.name(), render_value(id)));

        lock(&self.calls)
            .entry(String::from(endpoint.name()))
            .or_default()
            .push(RecordedCall {
                method,
                endpoint: String::from(endpoint.name()),
                path: endpoint.path(&substitutions),
                params,
            });

        let found = {
            let responses = lock(&self.responses);
            specific_key
                .as_deref()
                .and_then(|key| responses.get(key))
                .or_else(|| responses.get(endpoint.name()))
                .cloned()
        };
        let found = found.or_else(|| lock(&self.default_response).clone());

        match found {
            Some(FakeResponse::Json(value)) => Ok(Some(value)),
            Some(FakeResponse::NoContent) => Ok(None),
            Some(FakeResponse::Error(err)) => Err(err),
            None => Err(SonarrError::UnregisteredResponse {
                key: specific_key.unwrap_or_else(|| String::from(endpoint.name())),
            }),
        }
    }
}

impl LocalRestClient for FakeRestClient {
    async fn get(&self, endpoint: &Endpoint, params: Params) -> Result<Option<Value>> {
        self.respond(HttpMethod::Get, endpoint, params)
    }

    async fn post(&self, endpoint: &Endpoint, data: Params) -> Result<Option<Value>> {
        self.respond(HttpMethod::Post, endpoint, data)
    }

    async fn put(&self, endpoint: &Endpoint, data: Params) -> Result<Option<Value>> {
        self.respond(HttpMethod::Put, endpoint, data)
    }

    async fn delete(&self, endpoint: &Endpoint, params: Params) -> Result<Option<Value>> {
        self.respond(HttpMethod::Delete, endpoint, params)
    }
}
