//! HTTP client shared by the REST transports and the search store

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
