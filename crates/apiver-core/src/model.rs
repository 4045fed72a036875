//! Version metadata model
//!
//! An [`ApiVersionModel`] records which versions one controller or action
//! declares, supports, deprecates, or merely advertises. Models are built
//! once when conventions are applied, frozen behind `Arc`, and read
//! concurrently without synchronization for the lifetime of the route table.

use crate::version::ApiVersion;
use serde::Serialize;
use std::sync::{Arc, OnceLock};

/// Per-controller or per-action version metadata.
///
/// All collections are sorted ascending and deduplicated. A version-neutral
/// model is a terminal special state with every collection empty; use
/// [`ApiVersionModel::neutral`] to obtain the shared instance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ApiVersionModel {
    neutral: bool,
    declared: Vec<ApiVersion>,
    supported: Vec<ApiVersion>,
    deprecated: Vec<ApiVersion>,
    advertised: Vec<ApiVersion>,
    deprecated_advertised: Vec<ApiVersion>,
}

impl ApiVersionModel {
    /// Build a model from declared, deprecated, and advertised versions.
    ///
    /// Supported versions are derived: declared minus deprecated. Deprecated
    /// versions are implicitly declared.
    pub fn new(
        declared: impl IntoIterator<Item = ApiVersion>,
        deprecated: impl IntoIterator<Item = ApiVersion>,
        advertised: impl IntoIterator<Item = ApiVersion>,
        deprecated_advertised: impl IntoIterator<Item = ApiVersion>,
    ) -> Self {
        let deprecated = sorted_dedup(deprecated);
        let mut declared = sorted_dedup(declared.into_iter().chain(deprecated.iter().cloned()));
        declared.dedup();
        let supported = declared
            .iter()
            .filter(|version| !deprecated.contains(version))
            .cloned()
            .collect();
        Self {
            neutral: false,
            declared,
            supported,
            deprecated,
            advertised: sorted_dedup(advertised),
            deprecated_advertised: sorted_dedup(deprecated_advertised),
        }
    }

    /// The shared version-neutral model.
    ///
    /// Neutrality is a distinct state, not just empty collections: a neutral
    /// subject matches every resolution attempt and is excluded from
    /// supported/deprecated reporting.
    pub fn neutral() -> Arc<ApiVersionModel> {
        static NEUTRAL: OnceLock<Arc<ApiVersionModel>> = OnceLock::new();
        NEUTRAL
            .get_or_init(|| {
                Arc::new(ApiVersionModel {
                    neutral: true,
                    ..ApiVersionModel::default()
                })
            })
            .clone()
    }

    /// Whether this is the version-neutral model.
    pub fn is_neutral(&self) -> bool {
        self.neutral
    }

    /// Versions explicitly attached here, supported or deprecated.
    pub fn declared_versions(&self) -> &[ApiVersion] {
        &self.declared
    }

    /// Declared versions that are not deprecated.
    pub fn supported_versions(&self) -> &[ApiVersion] {
        &self.supported
    }

    /// Declared versions marked deprecated.
    pub fn deprecated_versions(&self) -> &[ApiVersion] {
        &self.deprecated
    }

    /// Versions available elsewhere in the service but not implemented here.
    pub fn advertised_versions(&self) -> &[ApiVersion] {
        &self.advertised
    }

    /// Advertised versions that are deprecated elsewhere.
    pub fn deprecated_advertised_versions(&self) -> &[ApiVersion] {
        &self.deprecated_advertised
    }

    /// Whether the given version is live (supported) here.
    pub fn supports(&self, version: &ApiVersion) -> bool {
        self.supported.binary_search(version).is_ok()
    }

    /// Whether the given version is declared here but deprecated.
    pub fn is_deprecated(&self, version: &ApiVersion) -> bool {
        self.deprecated.binary_search(version).is_ok()
    }

    /// Union a set of models into one service-wide view.
    ///
    /// Neutral models contribute nothing. The result is what version
    /// selectors and unsupported-version reporting operate on.
    pub fn aggregate<'a>(models: impl IntoIterator<Item = &'a ApiVersionModel>) -> ApiVersionModel {
        let mut declared = Vec::new();
        let mut live = Vec::new();
        let mut deprecated = Vec::new();
        let mut advertised = Vec::new();
        let mut deprecated_advertised = Vec::new();
        for model in models {
            if model.is_neutral() {
                continue;
            }
            declared.extend(model.declared.iter().cloned());
            live.extend(model.supported.iter().cloned());
            deprecated.extend(model.deprecated.iter().cloned());
            advertised.extend(model.advertised.iter().cloned());
            deprecated_advertised.extend(model.deprecated_advertised.iter().cloned());
        }
        // A version deprecated in one action but live in another is live for
        // the service as a whole.
        deprecated.retain(|v| !live.contains(v));
        ApiVersionModel::new(declared, deprecated, advertised, deprecated_advertised)
    }
}

fn sorted_dedup(versions: impl IntoIterator<Item = ApiVersion>) -> Vec<ApiVersion> {
    let mut versions: Vec<ApiVersion> = versions.into_iter().collect();
    versions.sort();
    versions.dedup();
    versions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(major: u64, minor: u64) -> ApiVersion {
        ApiVersion::new(major, minor)
    }

    #[test]
    fn supported_is_declared_minus_deprecated() {
        let model = ApiVersionModel::new(
            [v(1, 0), v(2, 0), v(3, 0)],
            [v(1, 0)],
            [],
            [],
        );
        assert_eq!(model.supported_versions(), [v(2, 0), v(3, 0)]);
        assert_eq!(model.deprecated_versions(), [v(1, 0)]);
        assert_eq!(model.declared_versions(), [v(1, 0), v(2, 0), v(3, 0)]);
        assert!(model.supports(&v(2, 0)));
        assert!(!model.supports(&v(1, 0)));
        assert!(model.is_deprecated(&v(1, 0)));
    }

    #[test]
    fn deprecated_versions_are_implicitly_declared() {
        let model = ApiVersionModel::new([v(2, 0)], [v(1, 0)], [], []);
        assert_eq!(model.declared_versions(), [v(1, 0), v(2, 0)]);
    }

    #[test]
    fn collections_are_sorted_and_deduplicated() {
        let model = ApiVersionModel::new(
            [v(3, 0), v(1, 0), v(3, 0), v(2, 0)],
            [],
            [v(9, 0), v(4, 0), v(9, 0)],
            [],
        );
        assert_eq!(model.declared_versions(), [v(1, 0), v(2, 0), v(3, 0)]);
        assert_eq!(model.advertised_versions(), [v(4, 0), v(9, 0)]);
    }

    #[test]
    fn neutral_is_a_shared_singleton() {
        let a = ApiVersionModel::neutral();
        let b = ApiVersionModel::neutral();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.is_neutral());
        assert!(a.declared_versions().is_empty());
        assert!(a.supported_versions().is_empty());
    }

    #[test]
    fn neutral_differs_from_merely_empty() {
        let empty = ApiVersionModel::default();
        assert!(!empty.is_neutral());
        assert_ne!(&empty, ApiVersionModel::neutral().as_ref());
    }

    #[test]
    fn aggregate_unions_and_skips_neutral() {
        let a = ApiVersionModel::new([v(1, 0)], [], [], []);
        let b = ApiVersionModel::new([v(2, 0)], [v(1, 0)], [], []);
        let neutral = ApiVersionModel::neutral();
        let aggregate = ApiVersionModel::aggregate([&a, &b, neutral.as_ref()]);
        // 1.0 is live in `a`, so it stays supported service-wide.
        assert_eq!(aggregate.supported_versions(), [v(1, 0), v(2, 0)]);
        assert!(aggregate.deprecated_versions().is_empty());
    }

    #[test]
    fn aggregate_keeps_fully_deprecated_versions_deprecated() {
        let a = ApiVersionModel::new([v(2, 0)], [v(1, 0)], [], []);
        let b = ApiVersionModel::new([v(2, 0)], [v(1, 0)], [], []);
        let aggregate = ApiVersionModel::aggregate([&a, &b]);
        assert_eq!(aggregate.deprecated_versions(), [v(1, 0)]);
        assert_eq!(aggregate.supported_versions(), [v(2, 0)]);
    }
}
