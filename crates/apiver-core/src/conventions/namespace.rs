//! Namespace-derived version conventions
//!
//! Derives an action's version purely from a version token embedded in its
//! controller's module path, e.g. `shop::v2::Orders` declares `2.0` without
//! any explicit convention. The recognized token is a trailing-or-embedded
//! segment of the form `v{major}` or `v{major}_{minor}`.

use super::{ControllerVersionInfo, VersionMetadataSource};
use crate::model::ApiVersionModel;
use crate::version::ApiVersion;
use std::collections::HashMap;
use std::sync::Arc;

/// Automatic convention that reads the version from the controller's
/// namespace.
///
/// Controller identifiers are module-path-like strings (`::` or `.`
/// separated). The version segment closest to the controller name wins:
/// `shop::v2::orders::v3::Orders` declares `3.0`.
#[derive(Debug, Clone, Default)]
pub struct NamespaceConvention;

impl NamespaceConvention {
    /// Create the namespace convention.
    pub fn new() -> Self {
        Self
    }

    /// Parse the version declared by a namespace, if any segment carries
    /// one.
    pub fn version_of(namespace: &str) -> Option<ApiVersion> {
        namespace
            .split(|c| c == ':' || c == '.')
            .filter(|segment| !segment.is_empty())
            .rev()
            .find_map(parse_version_segment)
    }
}

impl VersionMetadataSource for NamespaceConvention {
    fn discover(&self, controller: &str) -> Option<ControllerVersionInfo> {
        let version = Self::version_of(controller)?;
        let model = Arc::new(ApiVersionModel::new([version], [], [], []));
        Some(ControllerVersionInfo {
            model,
            actions: HashMap::new(),
        })
    }
}

// `v2` -> 2.0, `v2_1` -> 2.1; anything else is not a version segment.
fn parse_version_segment(segment: &str) -> Option<ApiVersion> {
    let digits = segment.strip_prefix(['v', 'V'])?;
    if digits.is_empty() {
        return None;
    }
    let (major, minor) = match digits.split_once('_') {
        Some((major, minor)) => (major, Some(minor)),
        None => (digits, None),
    };
    if !is_number(major) {
        return None;
    }
    let major: u64 = major.parse().ok()?;
    match minor {
        Some(minor) if is_number(minor) => Some(ApiVersion::new(major, minor.parse().ok()?)),
        Some(_) => None,
        None => Some(ApiVersion::new(major, 0)),
    }
}

fn is_number(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}
