//! Elasticsearch implementation of the key-management API.

mod client;

pub use client::EsSecurityClient;
