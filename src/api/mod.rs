//! HTTP API Module
//!
//! Read-only REST API exposing host identity facts to fleet tooling.

mod http;

pub use http::HttpServer;
