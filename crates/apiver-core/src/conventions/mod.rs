//! Declarative version conventions
//!
//! Conventions attach version metadata to controllers and actions without
//! annotating every handler. Two producers emit the same shape:
//!
//! - the fluent [`VersionConventions`] builder tree, and
//! - the automatic [`NamespaceConvention`], which derives a version from a
//!   trailing `v{major}[_{minor}]` segment of a controller's module path.
//!
//! Both are applied once at startup and frozen into an immutable
//! [`ConventionModel`] snapshot; there is no runtime mutation path. A
//! controller declared through more than one producer is a configuration
//! error rejected at build time, not silently prioritized.

mod builder;
mod namespace;

pub use builder::{
    ActionConventionBuilder, ControllerConventionBuilder, VersionConventions,
};
pub use namespace::NamespaceConvention;

use crate::model::ApiVersionModel;
use crate::version::ApiVersion;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Frozen convention output for one controller.
#[derive(Debug, Clone)]
pub struct ControllerVersionInfo {
    pub(crate) model: Arc<ApiVersionModel>,
    pub(crate) actions: HashMap<String, ActionVersionInfo>,
}

impl ControllerVersionInfo {
    /// The controller-level model.
    pub fn model(&self) -> &Arc<ApiVersionModel> {
        &self.model
    }

    /// The effective model for one action. Actions without their own
    /// declarations inherit every version the controller declares.
    pub fn action(&self, name: &str) -> ActionVersionInfo {
        self.actions.get(name).cloned().unwrap_or_else(|| ActionVersionInfo {
            model: self.model.clone(),
            mapped: BTreeSet::new(),
        })
    }
}

/// Frozen convention output for one action: its effective model and the
/// versions it was explicitly mapped to, used for tie-breaking.
#[derive(Debug, Clone)]
pub struct ActionVersionInfo {
    pub(crate) model: Arc<ApiVersionModel>,
    pub(crate) mapped: BTreeSet<ApiVersion>,
}

impl ActionVersionInfo {
    /// The action's effective model.
    pub fn model(&self) -> &Arc<ApiVersionModel> {
        &self.model
    }

    /// Versions this action was explicitly mapped to via
    /// `map_to_api_version`, if any.
    pub fn mapped_versions(&self) -> &BTreeSet<ApiVersion> {
        &self.mapped
    }
}

/// Immutable snapshot produced by applying conventions at startup.
#[derive(Debug, Clone, Default)]
pub struct ConventionModel {
    pub(crate) controllers: HashMap<String, ControllerVersionInfo>,
}

impl ConventionModel {
    /// Look up a controller's frozen info.
    pub fn controller(&self, name: &str) -> Option<&ControllerVersionInfo> {
        self.controllers.get(name)
    }

    /// The effective info for one action, if its controller is known.
    pub fn action(&self, controller: &str, action: &str) -> Option<ActionVersionInfo> {
        self.controller(controller).map(|info| info.action(action))
    }

    /// Names of every configured controller.
    pub fn controllers(&self) -> impl Iterator<Item = &str> {
        self.controllers.keys().map(String::as_str)
    }

    /// Service-wide aggregate of every controller model.
    pub fn aggregate(&self) -> ApiVersionModel {
        ApiVersionModel::aggregate(self.controllers.values().map(|info| info.model.as_ref()))
    }
}

/// A pure producer of version metadata for controllers.
///
/// Implemented by the fluent builder output and by [`NamespaceConvention`];
/// both emit the same [`ControllerVersionInfo`] shape so the engine never
/// cares which one configured a controller.
pub trait VersionMetadataSource: Send + Sync {
    /// Discover version metadata for the named controller, if this source
    /// configures it.
    fn discover(&self, controller: &str) -> Option<ControllerVersionInfo>;
}

impl VersionMetadataSource for ConventionModel {
    fn discover(&self, controller: &str) -> Option<ControllerVersionInfo> {
        self.controller(controller).cloned()
    }
}

/// Ordered set of metadata sources with exclusivity checking.
#[derive(Default)]
pub struct MetadataSources {
    sources: Vec<Box<dyn VersionMetadataSource>>,
}

impl MetadataSources {
    /// Create an empty source set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source.
    pub fn push(&mut self, source: Box<dyn VersionMetadataSource>) -> &mut Self {
        self.sources.push(source);
        self
    }

    /// Discover metadata for a controller across all sources.
    ///
    /// Exactly one source may claim a controller; two claims are a
    /// configuration defect surfaced as [`ConventionError::MixedSources`].
    pub fn discover(
        &self,
        controller: &str,
    ) -> Result<Option<ControllerVersionInfo>, ConventionError> {
        let mut found: Option<ControllerVersionInfo> = None;
        for source in &self.sources {
            if let Some(info) = source.discover(controller) {
                if found.is_some() {
                    return Err(ConventionError::MixedSources {
                        controller: controller.to_string(),
                    });
                }
                found = Some(info);
            }
        }
        Ok(found)
    }
}

/// Configuration defects detected while applying conventions at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConventionError {
    /// An action was mapped to a version its controller never declared.
    #[error(
        "action {action:?} on controller {controller:?} maps to version {version}, \
         which the controller does not declare"
    )]
    UnmappedVersion {
        /// Owning controller.
        controller: String,
        /// Offending action.
        action: String,
        /// The mapped version missing from the controller's declarations.
        version: ApiVersion,
    },
    /// A controller was configured by more than one metadata source.
    #[error("controller {controller:?} is configured by more than one convention source")]
    MixedSources {
        /// The doubly-configured controller.
        controller: String,
    },
    /// A controller was marked version-neutral and given versions.
    #[error("controller {controller:?} is version-neutral but declares versions")]
    NeutralWithVersions {
        /// The contradictory controller.
        controller: String,
    },
}
