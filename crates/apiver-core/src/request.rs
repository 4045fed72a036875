//! Request abstraction consumed by version readers
//!
//! [`RouteRequest`] is the engine-facing view of an incoming request: method,
//! URI, headers, and the path parameters the host's route matcher already
//! extracted. The host binding builds one per request; the negotiation core
//! never touches the body or the network.

use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use std::collections::HashMap;

/// Read-only request view for version negotiation.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    path_params: HashMap<String, String>,
    query_params: Vec<(String, String)>,
}

impl RouteRequest {
    /// Start building a request view.
    pub fn builder() -> RouteRequestBuilder {
        RouteRequestBuilder::new()
    }

    /// Get the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Get the request path.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Get the raw query string.
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Get the first query parameter with the given name, if any.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Get the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the first value of a header as a string, if present and valid
    /// UTF-8.
    pub fn header_str(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get a matched route-template parameter.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }
}

/// Builder for [`RouteRequest`].
#[derive(Debug, Default)]
pub struct RouteRequestBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    path_params: HashMap<String, String>,
}

impl RouteRequestBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Set the HTTP method (defaults to GET).
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the request URI.
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Set the URI from a path-and-query string, e.g.
    /// `/users?api-version=1.0`.
    pub fn path(self, path_and_query: &str) -> Result<Self, http::uri::InvalidUri> {
        let uri = Uri::try_from(path_and_query)?;
        Ok(self.uri(uri))
    }

    /// Append a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Record a matched route-template parameter.
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// Finish building the request view.
    pub fn build(self) -> RouteRequest {
        let uri = self.uri.unwrap_or_else(|| Uri::from_static("/"));
        let query_params = parse_query(uri.query().unwrap_or_default());
        RouteRequest {
            method: self.method.unwrap_or(Method::GET),
            uri,
            headers: self.headers,
            path_params: self.path_params,
            query_params,
        }
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}
