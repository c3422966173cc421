//! Registry endpoint access
//!
//! The registry is a single opaque endpoint that answers form-encoded POSTs
//! with pre-rendered HTML. This module owns the request shapes, the transport
//! trait and the reqwest client behind it.

pub mod client;
pub mod error;
pub mod request;

pub use client::{
    post_with_retry, ClientSettings, LookupOutcome, RegistryClient, RegistryTransport,
    RetryPolicy, SharedTransport,
};
pub use error::RegistryError;
pub use request::{LookupRequest, SEARCH_ALL};
