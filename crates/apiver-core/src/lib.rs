//! # ApiVer Core
//!
//! Core library providing the version value type, request readers, metadata
//! model, conventions, and the resolution engine for ApiVer.
//!
//! This crate is not meant to be used directly. Use `apiver` instead.

pub mod conventions;
mod engine;
mod model;
mod reader;
mod report;
mod request;
mod selector;
mod version;

// Public API
pub use engine::{
    ActionId, CandidateAction, ResolutionResult, VersionResolver, VersionResolverBuilder,
};
pub use model::ApiVersionModel;
pub use reader::{
    collect_raw_tokens, HeaderReader, MediaTypeReader, PathSegmentReader, QueryStringReader,
    VersionReader, DEFAULT_MEDIA_TYPE_PARAMETER, DEFAULT_PATH_PARAMETER, DEFAULT_QUERY_PARAMETER,
};
pub use report::{
    LinkHeaderValue, SunsetPolicy, VersionReport, VersionReporter, API_DEPRECATED_VERSIONS,
    API_SUPPORTED_VERSIONS, LINK, SUNSET,
};
pub use request::{RouteRequest, RouteRequestBuilder};
pub use selector::{
    ConstantVersionSelector, CurrentCalendarSelector, HighestImplementedSelector,
    LowestImplementedSelector, VersionSelector,
};
pub use version::{ApiVersion, VersionParseError};
