//! Blocking retrieval of model artifacts from remote object storage.
//!
//! This crate owns the network side of artifact loading: a single blocking
//! GET with a per-request timeout, retried according to a [`FetchPolicy`].
//! The HTTPS client is only compiled with the `http` feature.

pub mod fetcher;
pub mod transport;

pub use fetcher::*;
pub use transport::*;
