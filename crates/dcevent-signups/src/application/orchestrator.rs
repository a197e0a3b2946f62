//! Request orchestration for the signup context.
//!
//! Every logical request is keyed, and each key owns exactly one
//! [`Deferred`] for the orchestrator's lifetime: the first caller starts the
//! fetch, later callers attach to the same promise and get the cached outcome
//! replayed. Contest signups depend on the event's contest directory, so a
//! failed directory fails every contest request of that event with the same
//! reason.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dcevent_core::deferred::{Deferred, Promise};
use dcevent_core::endpoints::Endpoints;
use dcevent_core::error::{ApiError, TransportError};
use dcevent_core::fetch::JsonFetcher;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, error, warn};

use crate::domain::contest::{Contest, ContestDirectory};
use crate::domain::signup::{Signup, signups_from_json};

/// Promise of an event's contest directory.
pub type ContestsPromise = Promise<ContestDirectory, ApiError>;

/// Promise of a signup list.
pub type SignupsPromise = Promise<Vec<Signup>, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ContestSignupsKey {
    event_id: String,
    contest: String,
    selection: String,
}

#[derive(Default)]
struct RequestCache {
    event_contests: HashMap<String, ContestsPromise>,
    contest_signups: HashMap<ContestSignupsKey, SignupsPromise>,
    event_signups: HashMap<String, SignupsPromise>,
}

/// Starts fetches on the runtime and completes their deferreds.
#[derive(Clone)]
struct FetchSpawner {
    fetcher: Arc<dyn JsonFetcher>,
    runtime: Handle,
}

impl FetchSpawner {
    fn spawn<T, P>(
        &self,
        url: String,
        deferred: Deferred<T, ApiError>,
        parse: P,
        unavailable: fn(String, TransportError) -> ApiError,
    ) where
        T: Send + Sync + 'static,
        P: FnOnce(Value) -> Result<T, serde_json::Error> + Send + 'static,
    {
        let fetcher = Arc::clone(&self.fetcher);
        self.runtime.spawn(async move {
            debug!(%url, "fetching");
            match fetcher.fetch_json(&url).await {
                Ok(body) => match parse(body) {
                    Ok(value) => deferred.resolve(value),
                    Err(e) => {
                        warn!(%url, error = %e, "unexpected response shape");
                        deferred.reject(ApiError::MalformedResponse {
                            url,
                            message: e.to_string(),
                        });
                    }
                },
                Err(source) => {
                    warn!(%url, error = %source, "fetch failed");
                    deferred.reject(unavailable(url, source));
                }
            }
        });
    }
}

/// Builds a directory from a contests body.
///
/// The API answers with a list, but some events answer with an object keyed
/// by event id. Such an object yields the contests among its values and
/// ignores anything else.
fn directory_from_json(body: Value) -> Result<ContestDirectory, serde_json::Error> {
    let contests: Vec<Contest> = match body {
        Value::Object(entries) => entries
            .into_iter()
            .filter_map(|(key, value)| match serde_json::from_value(value) {
                Ok(contest) => Some(contest),
                Err(e) => {
                    debug!(%key, error = %e, "skipping non-contest entry");
                    None
                }
            })
            .collect(),
        body => serde_json::from_value(body)?,
    };
    Ok(ContestDirectory::new(contests))
}

/// Rejects identifiers that would not survive as a single URL path segment.
fn path_segment(value: &str) -> Result<&str, ApiError> {
    match value {
        "" | "." | ".." => Err(ApiError::InvalidIdentifier(value.to_owned())),
        _ => Ok(value),
    }
}

fn rejected<T>(reason: ApiError) -> Promise<T, ApiError>
where
    T: Send + Sync + 'static,
{
    warn!(error = %reason, "request not sent");
    let deferred = Deferred::new();
    deferred.reject(reason);
    deferred.promise()
}

fn contests_unavailable(url: String, source: TransportError) -> ApiError {
    ApiError::ContestsUnavailable { url, source }
}

fn contest_signups_unavailable(url: String, source: TransportError) -> ApiError {
    ApiError::ContestSignupsUnavailable { url, source }
}

fn event_signups_unavailable(url: String, source: TransportError) -> ApiError {
    ApiError::EventSignupsUnavailable { url, source }
}

fn deliver<F>(what: &str, outcome: Result<&Vec<Signup>, &ApiError>, callback: F)
where
    F: FnOnce(Result<&[Signup], &ApiError>),
{
    if let Err(e) = outcome {
        error!(error = %e, "API error: can't get {what}");
    }
    callback(outcome.map(Vec::as_slice));
}

struct Inner {
    endpoints: Endpoints,
    spawner: FetchSpawner,
    cache: Mutex<RequestCache>,
}

/// Single-flight, caching front of the event API.
///
/// Cloning is cheap and clones share one cache.
#[derive(Clone)]
pub struct RequestOrchestrator {
    inner: Arc<Inner>,
}

impl RequestOrchestrator {
    /// Creates an orchestrator with an empty cache. Fetches are spawned on
    /// `runtime`.
    #[must_use]
    pub fn new(endpoints: Endpoints, fetcher: Arc<dyn JsonFetcher>, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(Inner {
                endpoints,
                spawner: FetchSpawner { fetcher, runtime },
                cache: Mutex::new(RequestCache::default()),
            }),
        }
    }

    /// The endpoints this orchestrator resolves keys against.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.inner.endpoints
    }

    // The cache only ever holds promises; no user code runs under this lock.
    fn cache(&self) -> MutexGuard<'_, RequestCache> {
        self.inner
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Requests the contest directory of `event_id`, once.
    pub fn event_contests(&self, event_id: &str) -> ContestsPromise {
        if let Err(e) = path_segment(event_id) {
            return rejected(e);
        }
        let deferred = {
            let mut cache = self.cache();
            if let Some(promise) = cache.event_contests.get(event_id) {
                debug!(event_id, "contest directory requested before, reusing");
                return promise.clone();
            }
            let deferred = Deferred::new();
            cache
                .event_contests
                .insert(event_id.to_owned(), deferred.promise());
            deferred
        };

        let promise = deferred.promise();
        self.inner.spawner.spawn(
            self.inner.endpoints.event_contests(event_id),
            deferred,
            directory_from_json,
            contests_unavailable,
        );
        promise
    }

    /// Requests the signups of `contest` (a name or id) filtered by
    /// `selection`, once per `(event_id, contest, selection)`.
    ///
    /// The contest is resolved against the event's contest directory first.
    /// An unknown contest rejects with [`ApiError::NoSuchContest`] without any
    /// further fetch; a failed directory rejects with the directory's reason.
    pub fn contest_signups(
        &self,
        event_id: &str,
        contest: &str,
        selection: &str,
    ) -> SignupsPromise {
        if let Err(e) = path_segment(event_id).and(path_segment(selection)) {
            return rejected(e);
        }
        let key = ContestSignupsKey {
            event_id: event_id.to_owned(),
            contest: contest.to_owned(),
            selection: selection.to_owned(),
        };
        let deferred = {
            let mut cache = self.cache();
            if let Some(promise) = cache.contest_signups.get(&key) {
                debug!(
                    event_id,
                    contest,
                    selection,
                    "contest signups requested before, reusing"
                );
                return promise.clone();
            }
            let deferred = Deferred::new();
            cache.contest_signups.insert(key, deferred.promise());
            deferred
        };

        let promise = deferred.promise();
        let endpoints = self.inner.endpoints.clone();
        let spawner = self.inner.spawner.clone();
        let contest = contest.to_owned();
        let selection = selection.to_owned();
        self.event_contests(event_id)
            .always(move |directory| match directory {
                Ok(directory) => match directory.get(&contest) {
                    Some(found) => match path_segment(&found.id) {
                        Ok(id) => spawner.spawn(
                            endpoints.contest_signups(id, &selection),
                            deferred,
                            signups_from_json,
                            contest_signups_unavailable,
                        ),
                        Err(e) => deferred.reject(e),
                    },
                    None => {
                        warn!(contest = %contest, "contest not found in directory");
                        deferred.reject(ApiError::NoSuchContest(contest));
                    }
                },
                Err(reason) => deferred.reject(reason.clone()),
            });
        promise
    }

    /// Requests every signup of `event_id`, once.
    pub fn event_signups(&self, event_id: &str) -> SignupsPromise {
        if let Err(e) = path_segment(event_id) {
            return rejected(e);
        }
        let deferred = {
            let mut cache = self.cache();
            if let Some(promise) = cache.event_signups.get(event_id) {
                debug!(event_id, "event signups requested before, reusing");
                return promise.clone();
            }
            let deferred = Deferred::new();
            cache
                .event_signups
                .insert(event_id.to_owned(), deferred.promise());
            deferred
        };

        let promise = deferred.promise();
        self.inner.spawner.spawn(
            self.inner.endpoints.event_signups(event_id),
            deferred,
            signups_from_json,
            event_signups_unavailable,
        );
        promise
    }

    /// Hands the contest signups to `callback` once they are available.
    ///
    /// Runs synchronously if the request has already completed. A rejection
    /// is final: it is logged and passed to `callback`, and never retried.
    pub fn get_contest_signups<F>(
        &self,
        event_id: &str,
        contest: &str,
        selection: &str,
        callback: F,
    ) where
        F: FnOnce(Result<&[Signup], &ApiError>) + Send + 'static,
    {
        self.contest_signups(event_id, contest, selection)
            .always(move |outcome| deliver("contest signups", outcome, callback));
    }

    /// Hands every signup of the event to `callback` once available.
    ///
    /// Same replay and failure semantics as [`Self::get_contest_signups`].
    pub fn get_event_signups<F>(&self, event_id: &str, callback: F)
    where
        F: FnOnce(Result<&[Signup], &ApiError>) + Send + 'static,
    {
        self.event_signups(event_id)
            .always(move |outcome| deliver("event signups", outcome, callback));
    }

    /// Awaits the contest signups.
    ///
    /// # Errors
    ///
    /// Returns the cached rejection reason of the request.
    pub async fn fetch_contest_signups(
        &self,
        event_id: &str,
        contest: &str,
        selection: &str,
    ) -> Result<Arc<Vec<Signup>>, ApiError> {
        self.contest_signups(event_id, contest, selection)
            .settled()
            .await
            .map_err(|e| ApiError::clone(&e))
    }

    /// Awaits every signup of the event.
    ///
    /// # Errors
    ///
    /// Returns the cached rejection reason of the request.
    pub async fn fetch_event_signups(&self, event_id: &str) -> Result<Arc<Vec<Signup>>, ApiError> {
        self.event_signups(event_id)
            .settled()
            .await
            .map_err(|e| ApiError::clone(&e))
    }

    /// Awaits the contest directory.
    ///
    /// # Errors
    ///
    /// Returns the cached rejection reason of the request.
    pub async fn fetch_event_contests(
        &self,
        event_id: &str,
    ) -> Result<Arc<ContestDirectory>, ApiError> {
        self.event_contests(event_id)
            .settled()
            .await
            .map_err(|e| ApiError::clone(&e))
    }
}

impl fmt::Debug for RequestOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOrchestrator")
            .field("endpoints", &self.inner.endpoints)
            .finish_non_exhaustive()
    }
}
