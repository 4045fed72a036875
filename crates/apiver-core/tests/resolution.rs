//! End-to-end negotiation: conventions feed the resolver, the resolver's
//! outcome feeds the reporter, the way a host framework wires the pieces.

use apiver_core::conventions::{MetadataSources, NamespaceConvention, VersionConventions};
use apiver_core::{
    ActionId, ApiVersion, ApiVersionModel, CandidateAction, HeaderReader, MediaTypeReader,
    PathSegmentReader, QueryStringReader, ResolutionResult, RouteRequest, VersionReporter,
    VersionResolver,
};
use http::{HeaderName, HeaderValue};

fn v(major: u64, minor: u64) -> ApiVersion {
    ApiVersion::new(major, minor)
}

fn orders_conventions() -> VersionConventions {
    let mut conventions = VersionConventions::new();
    {
        let orders = conventions.controller("orders");
        orders
            .has_api_version(v(2, 0))
            .has_api_version(v(3, 0))
            .has_deprecated_api_version(v(1, 0))
            .advertises_api_version(v(4, 0));
        orders.action("get").map_to_api_version(v(3, 0));
    }
    conventions
}

fn candidates(conventions: VersionConventions) -> Vec<CandidateAction> {
    let model = conventions.build().unwrap();
    let get = model.action("orders", "get").unwrap();
    let list = model.action("orders", "list").unwrap();
    vec![
        CandidateAction::from_conventions(ActionId(1), &get),
        CandidateAction::from_conventions(ActionId(2), &list),
    ]
}

fn query_request(path_and_query: &str) -> RouteRequest {
    RouteRequest::builder().path(path_and_query).unwrap().build()
}

#[test]
fn query_string_round_trip() {
    let resolver = VersionResolver::builder().build();
    let candidates = candidates(orders_conventions());

    let result = resolver.resolve(&query_request("/orders?api-version=3.0"), &candidates);
    // "get" is explicitly mapped to 3.0, so it beats its inheriting sibling.
    assert_eq!(
        result,
        ResolutionResult::Resolved {
            action: ActionId(1),
            version: Some(v(3, 0)),
            deprecated: false,
        }
    );
}

#[test]
fn mapped_action_does_not_answer_other_versions() {
    let resolver = VersionResolver::builder().build();
    let candidates = candidates(orders_conventions());

    // "get" is restricted to 3.0 by its mapping, so 2.0 goes to "list" alone.
    let result = resolver.resolve(&query_request("/orders?api-version=2.0"), &candidates);
    assert_eq!(
        result,
        ResolutionResult::Resolved {
            action: ActionId(2),
            version: Some(v(2, 0)),
            deprecated: false,
        }
    );
}

#[test]
fn equal_inherited_claims_are_ambiguous() {
    let mut conventions = VersionConventions::new();
    {
        let orders = conventions.controller("orders");
        orders.has_api_version(v(2, 0));
        orders.action("get");
        orders.action("list");
    }
    let model = conventions.build().unwrap();
    let get = model.action("orders", "get").unwrap();
    let list = model.action("orders", "list").unwrap();
    let candidates = [
        CandidateAction::from_conventions(ActionId(1), &get),
        CandidateAction::from_conventions(ActionId(2), &list),
    ];

    let resolver = VersionResolver::builder().build();
    let result = resolver.resolve(&query_request("/orders?api-version=2.0"), &candidates);
    assert_eq!(
        result,
        ResolutionResult::AmbiguousAction {
            actions: vec![ActionId(1), ActionId(2)],
        }
    );
}

#[test]
fn deprecated_version_still_serves_with_the_flag_set() {
    let mut conventions = VersionConventions::new();
    {
        let orders = conventions.controller("orders");
        orders
            .has_api_version(v(2, 0))
            .has_deprecated_api_version(v(1, 0));
    }
    let model = conventions.build().unwrap();
    let get = model.action("orders", "get").unwrap();
    let candidates = [CandidateAction::from_conventions(ActionId(1), &get)];

    let resolver = VersionResolver::builder().build();
    let result = resolver.resolve(&query_request("/orders?api-version=1.0"), &candidates);
    assert_eq!(
        result,
        ResolutionResult::Resolved {
            action: ActionId(1),
            version: Some(v(1, 0)),
            deprecated: true,
        }
    );
}

#[test]
fn unsupported_version_reports_advertised_alternatives() {
    let resolver = VersionResolver::builder().build();
    let candidates = candidates(orders_conventions());

    let result = resolver.resolve(&query_request("/orders?api-version=9.0"), &candidates);
    assert_eq!(
        result,
        ResolutionResult::Unsupported {
            requested: v(9, 0),
            supported: vec![v(2, 0), v(3, 0), v(4, 0)],
        }
    );
}

#[test]
fn header_reader_end_to_end() {
    let resolver = VersionResolver::builder()
        .reader(HeaderReader::new(HeaderName::from_static("x-api-version")))
        .build();
    let candidates = candidates(orders_conventions());

    let request = RouteRequest::builder()
        .path("/orders")
        .unwrap()
        .header(
            HeaderName::from_static("x-api-version"),
            HeaderValue::from_static("3.0"),
        )
        .build();
    assert!(resolver.resolve(&request, &candidates).is_resolved());
}

#[test]
fn path_segment_reader_end_to_end() {
    let resolver = VersionResolver::builder()
        .reader(PathSegmentReader::new())
        .build();
    let candidates = candidates(orders_conventions());

    let request = RouteRequest::builder()
        .path("/v3/orders")
        .unwrap()
        .path_param("version", "v3")
        .build();
    let result = resolver.resolve(&request, &candidates);
    assert_eq!(
        result,
        ResolutionResult::Resolved {
            action: ActionId(1),
            version: Some(v(3, 0)),
            deprecated: false,
        }
    );
}

#[test]
fn media_type_reader_end_to_end() {
    let resolver = VersionResolver::builder()
        .reader(MediaTypeReader::new())
        .build();
    let candidates = candidates(orders_conventions());

    let request = RouteRequest::builder()
        .path("/orders")
        .unwrap()
        .header(
            HeaderName::from_static("accept"),
            HeaderValue::from_static("application/json;v=3.0"),
        )
        .build();
    assert!(resolver.resolve(&request, &candidates).is_resolved());
}

#[test]
fn disagreeing_readers_surface_both_tokens() {
    let resolver = VersionResolver::builder()
        .reader(QueryStringReader::new())
        .reader(HeaderReader::new(HeaderName::from_static("x-api-version")))
        .build();
    let candidates = candidates(orders_conventions());

    let request = RouteRequest::builder()
        .path("/orders?api-version=2.0")
        .unwrap()
        .header(
            HeaderName::from_static("x-api-version"),
            HeaderValue::from_static("3.0"),
        )
        .build();
    assert_eq!(
        resolver.resolve(&request, &candidates),
        ResolutionResult::AmbiguousVersion {
            tokens: vec!["2.0".to_string(), "3.0".to_string()],
        }
    );
}

#[test]
fn namespace_convention_feeds_the_resolver() {
    let mut sources = MetadataSources::new();
    sources.push(Box::new(NamespaceConvention::new()));

    let info = sources.discover("shop::v2::Orders").unwrap().unwrap();
    let get = info.action("get");
    let candidates = [CandidateAction::from_conventions(ActionId(1), &get)];

    let resolver = VersionResolver::builder().build();
    let result = resolver.resolve(&query_request("/orders?api-version=2.0"), &candidates);
    assert!(result.is_resolved());
}

#[test]
fn doubly_configured_controller_is_rejected() {
    let mut sources = MetadataSources::new();
    sources.push(Box::new(NamespaceConvention::new()));

    let mut conventions = VersionConventions::new();
    conventions
        .controller("shop::v2::Orders")
        .has_api_version(v(2, 0));
    sources.push(Box::new(conventions.build().unwrap()));

    assert!(sources.discover("shop::v2::Orders").is_err());
}

#[test]
fn resolver_outcome_drives_the_reported_headers() {
    let resolver = VersionResolver::builder().build();
    let model = orders_conventions().build().unwrap();
    let candidates = candidates(orders_conventions());

    let result = resolver.resolve(&query_request("/orders?api-version=3.0"), &candidates);
    let resolved = match &result {
        ResolutionResult::Resolved { version, .. } => version.as_ref(),
        other => panic!("expected resolution, got {other:?}"),
    };

    // Headers reflect the whole controller, not just the selected action.
    let controller = model.controller("orders").unwrap();
    let report = VersionReporter::new().report([controller.model().as_ref()], resolved);
    assert_eq!(
        report.supported_header_value().as_deref(),
        Some("2.0, 3.0, 4.0")
    );
    assert_eq!(report.deprecated_header_value().as_deref(), Some("1.0"));
}

#[test]
fn neutral_controller_serves_unversioned_requests() {
    let mut conventions = VersionConventions::new();
    conventions.controller("status").is_api_version_neutral();
    let model = conventions.build().unwrap();
    let ping = model.action("status", "ping").unwrap();
    let candidates = [CandidateAction::from_conventions(ActionId(9), &ping)];

    let resolver = VersionResolver::builder().build();
    let result = resolver.resolve(&query_request("/status"), &candidates);
    assert_eq!(
        result,
        ResolutionResult::Resolved {
            action: ActionId(9),
            version: None,
            deprecated: false,
        }
    );
}

#[test]
fn empty_candidate_metadata_is_unsupported() {
    let candidates = [CandidateAction::new(
        ActionId(1),
        std::sync::Arc::new(ApiVersionModel::default()),
    )];
    let resolver = VersionResolver::builder().build();
    let result = resolver.resolve(&query_request("/orders?api-version=1.0"), &candidates);
    assert_eq!(
        result,
        ResolutionResult::Unsupported {
            requested: v(1, 0),
            supported: vec![],
        }
    );
}
