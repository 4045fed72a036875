//! # ApiVer
//!
//! API version negotiation for Rust web services.
//!
//! ApiVer decides which implementation of an endpoint should serve a request
//! based on the API version the client asked for. It reads the version from
//! the query string, headers, path, or media type, matches it against the
//! version metadata declared by conventions, and answers with a single
//! selected action or a precise failure the host can turn into a 400 or 404.
//!
//! ## Quick Start
//!
//! ```rust
//! use apiver::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut conventions = VersionConventions::new();
//! conventions
//!     .controller("orders")
//!     .has_api_version(ApiVersion::new(1, 0))
//!     .has_api_version(ApiVersion::new(2, 0));
//! let model = conventions.build()?;
//!
//! let info = model.action("orders", "get").unwrap();
//! let v1 = CandidateAction::from_conventions(ActionId(1), &info);
//! let resolver = VersionResolver::builder().build();
//!
//! let request = RouteRequest::builder()
//!     .path("/orders?api-version=2.0")?
//!     .build();
//! let outcome = resolver.resolve(&request, &[v1]);
//! assert!(matches!(outcome, ResolutionResult::Resolved { .. }));
//! # Ok(())
//! # }
//! ```
//!
//! ## Components
//!
//! - **Readers**: where the version comes from (`QueryStringReader`,
//!   `HeaderReader`, `PathSegmentReader`, `MediaTypeReader`)
//! - **Conventions**: which versions each controller and action implements
//!   (`VersionConventions`, `NamespaceConvention`)
//! - **Resolution**: matching request to action (`VersionResolver`)
//! - **Reporting**: advertising versions back to clients (`VersionReporter`)

// Re-export core functionality
pub use apiver_core::*;

// Re-export the vocabulary crates consumers need to construct header names
// and calendar group dates
pub use chrono;
pub use http;

/// Prelude module - import everything you need with `use apiver::prelude::*`
pub mod prelude {
    pub use apiver_core::{
        conventions::{
            ConventionError, ConventionModel, MetadataSources, NamespaceConvention,
            VersionConventions, VersionMetadataSource,
        },
        // Version value type
        ApiVersion,
        ApiVersionModel,
        // Resolution
        ActionId,
        CandidateAction,
        ResolutionResult,
        VersionResolver,
        // Readers
        HeaderReader,
        MediaTypeReader,
        PathSegmentReader,
        QueryStringReader,
        VersionReader,
        // Request abstraction
        RouteRequest,
        // Default selection
        ConstantVersionSelector,
        CurrentCalendarSelector,
        HighestImplementedSelector,
        LowestImplementedSelector,
        VersionSelector,
        // Reporting
        LinkHeaderValue,
        SunsetPolicy,
        VersionReport,
        VersionReporter,
    };

    // Re-export commonly used external types
    pub use serde::{Deserialize, Serialize};
    pub use tracing::{debug, error, info, trace, warn};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_imports_work() {
        let version: ApiVersion = "1.0".parse().unwrap();
        assert_eq!(version, ApiVersion::new(1, 0));
    }
}
