//! HTTP implementation of the `JsonFetcher` transport contract.

pub mod http_fetcher;
