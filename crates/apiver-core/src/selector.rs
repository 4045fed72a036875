//! Version selection policies
//!
//! A [`VersionSelector`] picks a concrete version when a request declines to
//! specify one and default assumption is enabled. Selectors are pure
//! functions of the aggregate metadata model: no I/O, no clocks, no side
//! effects, so every policy is deterministic and trivially unit-testable.

use crate::model::ApiVersionModel;
use crate::version::ApiVersion;
use chrono::NaiveDate;

/// Policy for choosing a version when the request omitted one.
pub trait VersionSelector: Send + Sync {
    /// Select a version from the service-wide aggregate model, or `None`
    /// when the policy cannot produce one.
    fn select(&self, model: &ApiVersionModel) -> Option<ApiVersion>;
}

/// Always selects one configured version.
#[derive(Debug, Clone)]
pub struct ConstantVersionSelector {
    version: ApiVersion,
}

impl ConstantVersionSelector {
    /// Create a selector that always answers with `version`.
    pub fn new(version: ApiVersion) -> Self {
        Self { version }
    }
}

impl VersionSelector for ConstantVersionSelector {
    fn select(&self, _model: &ApiVersionModel) -> Option<ApiVersion> {
        Some(self.version.clone())
    }
}

/// Selects the lowest version implemented anywhere in the service,
/// deprecated or not.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestImplementedSelector;

impl VersionSelector for LowestImplementedSelector {
    fn select(&self, model: &ApiVersionModel) -> Option<ApiVersion> {
        model.declared_versions().first().cloned()
    }
}

/// Selects the highest non-deprecated version implemented anywhere in the
/// service.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighestImplementedSelector;

impl VersionSelector for HighestImplementedSelector {
    fn select(&self, model: &ApiVersionModel) -> Option<ApiVersion> {
        model.supported_versions().last().cloned()
    }
}

/// Selects the calendar version nearest to (not after) a reference date.
///
/// The reference date is fixed at construction so selection stays a pure
/// function; hosts that want "today" capture it once per configuration
/// reload.
#[derive(Debug, Clone, Copy)]
pub struct CurrentCalendarSelector {
    reference: NaiveDate,
}

impl CurrentCalendarSelector {
    /// Create a selector anchored at the given reference date.
    pub fn new(reference: NaiveDate) -> Self {
        Self { reference }
    }
}

impl VersionSelector for CurrentCalendarSelector {
    fn select(&self, model: &ApiVersionModel) -> Option<ApiVersion> {
        model
            .declared_versions()
            .iter()
            .filter(|version| {
                version
                    .group()
                    .is_some_and(|group| group <= self.reference)
            })
            .next_back()
            .cloned()
    }
}
