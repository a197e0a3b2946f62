//! Error types.

use thiserror::Error;

/// Failure reported by a [`JsonFetcher`](crate::fetch::JsonFetcher).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The request could not be sent or the connection failed.
    #[error("request failed: {0}")]
    Request(String),

    /// The response body was not valid JSON.
    #[error("invalid JSON body: {0}")]
    Decode(String),
}

/// The configured API base URL cannot be used to build request URLs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid API base URL {url:?}: {reason}")]
pub struct InvalidBaseUrl {
    /// The rejected value.
    pub url: String,
    /// Why it was rejected.
    pub reason: String,
}

/// Rejection reason of every orchestrated request.
///
/// Cloneable so that a single cached rejection can be handed to every
/// request depending on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The contest directory of an event could not be fetched.
    #[error("unable to load contests list: failed to load {url}: {source}")]
    ContestsUnavailable {
        /// The URL that failed.
        url: String,
        /// The underlying transport failure.
        source: TransportError,
    },

    /// The signups of a single contest could not be fetched.
    #[error("unable to load contest signups: failed to load {url}: {source}")]
    ContestSignupsUnavailable {
        /// The URL that failed.
        url: String,
        /// The underlying transport failure.
        source: TransportError,
    },

    /// The signups of a whole event could not be fetched.
    #[error("unable to load event signups: failed to load {url}: {source}")]
    EventSignupsUnavailable {
        /// The URL that failed.
        url: String,
        /// The underlying transport failure.
        source: TransportError,
    },

    /// The contest directory was fetched but has no such contest.
    #[error("no such contest: {0}")]
    NoSuchContest(String),

    /// An event id, selection or contest id cannot be used as a URL path
    /// segment.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// The response decoded as JSON but not into the expected shape.
    #[error("unexpected response from {url}: {message}")]
    MalformedResponse {
        /// The URL whose body was rejected.
        url: String,
        /// Deserialization diagnostic.
        message: String,
    },
}

impl ApiError {
    /// Returns `true` for failures caused by the remote side or the network,
    /// as opposed to lookups that failed locally.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        !matches!(self, Self::NoSuchContest(_) | Self::InvalidIdentifier(_))
    }
}
