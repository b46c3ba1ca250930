//! Per-request context
//!
//! Created when a request enters the pipeline and dropped when it leaves.
//! It is passed by reference down the chain instead of living in an
//! extension map or thread-local, so nothing leaks across requests.

use axum::http::request::Parts;
use axum::http::{header, Method};
use std::collections::HashMap;
use uuid::Uuid;

/// Key under which the instrumentation stage publishes the captured body
pub const BODY_KEY: &str = "request.body";

/// Request metadata plus a key/value bag for early stages to hand data to
/// later ones
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    method: Method,
    path: String,
    url: String,
    query: Option<String>,
    values: HashMap<String, String>,
}

impl RequestContext {
    pub fn new(method: Method, url: impl Into<String>, path: impl Into<String>, query: Option<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            method,
            path: path.into(),
            url: url.into(),
            query,
            values: HashMap::new(),
        }
    }

    /// Build from request head. The URL is `scheme://host/path` without the
    /// query; scheme comes from `X-Forwarded-Proto`, default `http`.
    pub fn from_parts(parts: &Parts) -> Self {
        let path = parts.uri.path().to_string();
        let query = parts.uri.query().map(str::to_string);

        let host = parts
            .uri
            .authority()
            .map(|a| a.as_str().to_string())
            .or_else(|| {
                parts
                    .headers
                    .get(header::HOST)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            });
        let scheme = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .or_else(|| parts.uri.scheme_str())
            .unwrap_or("http");

        let url = match host {
            Some(host) => format!("{}://{}{}", scheme, host, path),
            None => path.clone(),
        };

        Self::new(parts.method.clone(), url, path, query)
    }

    /// Set or overwrite `key`
    pub fn publish(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Last value published under `key`
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URI path, used as the envelope `path`
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
}
