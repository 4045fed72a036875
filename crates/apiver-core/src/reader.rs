//! Version readers
//!
//! A [`VersionReader`] extracts the raw requested-version token from one
//! location on a request. Built-in readers cover the query string, one or
//! more headers, a route-template path segment, and a media-type parameter
//! (`application/json;v=2.0`).
//!
//! Readers are combined as an ordered list. Order is a precedence over
//! *absence* only: when two different locations carry two different tokens
//! for the same request, that is an ambiguity the resolution engine reports,
//! never something a reader silently settles.

use crate::request::RouteRequest;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::HeaderName;
use smallvec::SmallVec;

/// Default query-string parameter name.
pub const DEFAULT_QUERY_PARAMETER: &str = "api-version";

/// Default route-template parameter name.
pub const DEFAULT_PATH_PARAMETER: &str = "version";

/// Default media-type parameter name.
pub const DEFAULT_MEDIA_TYPE_PARAMETER: &str = "v";

/// Strategy for reading a raw version token from a request.
///
/// Returns `None` when the location this reader inspects carries no token.
/// Readers never parse; malformed text is classified downstream so the raw
/// value survives for diagnostics.
pub trait VersionReader: Send + Sync {
    /// Read the raw token, if present and non-empty.
    fn read(&self, request: &RouteRequest) -> Option<String>;
}

/// Reads the version from a query-string parameter (default `api-version`).
#[derive(Debug, Clone)]
pub struct QueryStringReader {
    param: String,
}

impl QueryStringReader {
    /// Create a reader for the default `api-version` parameter.
    pub fn new() -> Self {
        Self::with_param(DEFAULT_QUERY_PARAMETER)
    }

    /// Create a reader for a custom parameter name.
    pub fn with_param(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
        }
    }
}

impl Default for QueryStringReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionReader for QueryStringReader {
    fn read(&self, request: &RouteRequest) -> Option<String> {
        request
            .query_param(&self.param)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    }
}

/// Reads the version from one or more HTTP headers, first non-empty wins,
/// checked in the configured order.
#[derive(Debug, Clone)]
pub struct HeaderReader {
    names: Vec<HeaderName>,
}

impl HeaderReader {
    /// Create a reader for a single header.
    pub fn new(name: HeaderName) -> Self {
        Self { names: vec![name] }
    }

    /// Create a reader that checks several headers in order.
    pub fn with_names(names: impl IntoIterator<Item = HeaderName>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }
}

impl VersionReader for HeaderReader {
    fn read(&self, request: &RouteRequest) -> Option<String> {
        self.names.iter().find_map(|name| {
            request
                .header_str(name)
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
        })
    }
}

/// Reads the version from a matched route-template parameter
/// (default `version`), e.g. the `{version}` in `/v{version}/orders`.
#[derive(Debug, Clone)]
pub struct PathSegmentReader {
    param: String,
}

impl PathSegmentReader {
    /// Create a reader for the default `version` parameter.
    pub fn new() -> Self {
        Self::with_param(DEFAULT_PATH_PARAMETER)
    }

    /// Create a reader for a custom route-template parameter name.
    pub fn with_param(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
        }
    }
}

impl Default for PathSegmentReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionReader for PathSegmentReader {
    fn read(&self, request: &RouteRequest) -> Option<String> {
        request
            .path_param(&self.param)
            .map(|token| token.trim_start_matches(['v', 'V']).trim())
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    }
}

/// Reads the version from a media-type parameter (default `v`), e.g.
/// `Content-Type: application/json;v=2.0`. Checks `Content-Type` first,
/// then every media type listed in `Accept`.
#[derive(Debug, Clone)]
pub struct MediaTypeReader {
    param: String,
}

impl MediaTypeReader {
    /// Create a reader for the default `v` parameter.
    pub fn new() -> Self {
        Self::with_param(DEFAULT_MEDIA_TYPE_PARAMETER)
    }

    /// Create a reader for a custom media-type parameter name.
    pub fn with_param(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
        }
    }

    fn read_media_type(&self, media_type: &str) -> Option<String> {
        // First `;`-piece is the type itself, the rest are parameters.
        media_type.split(';').skip(1).find_map(|param| {
            let (name, value) = param.split_once('=')?;
            if !name.trim().eq_ignore_ascii_case(&self.param) {
                return None;
            }
            let value = value.trim().trim_matches('"').trim();
            (!value.is_empty()).then(|| value.to_string())
        })
    }
}

impl Default for MediaTypeReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionReader for MediaTypeReader {
    fn read(&self, request: &RouteRequest) -> Option<String> {
        if let Some(content_type) = request.header_str(&CONTENT_TYPE) {
            if let Some(token) = self.read_media_type(content_type) {
                return Some(token);
            }
        }
        request.header_str(&ACCEPT).and_then(|accept| {
            accept
                .split(',')
                .find_map(|media_type| self.read_media_type(media_type.trim()))
        })
    }
}

/// Evaluate readers in order and collect the distinct non-empty tokens they
/// produce, preserving first-seen order.
///
/// One entry means an unambiguous token; more than one means conflicting
/// locations and the engine classifies the request as ambiguous.
pub fn collect_raw_tokens(
    readers: &[Box<dyn VersionReader>],
    request: &RouteRequest,
) -> SmallVec<[String; 2]> {
    let mut tokens: SmallVec<[String; 2]> = SmallVec::new();
    for reader in readers {
        if let Some(token) = reader.read(request) {
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
    }
    tokens
}
