//! Fluent convention builders
//!
//! A [`VersionConventions`] tree accumulates controller- and action-level
//! declarations and freezes them into a [`ConventionModel`]. Builders are
//! only reachable before [`VersionConventions::build`]; the snapshot it
//! returns is immutable.

use super::{ActionVersionInfo, ControllerVersionInfo, ConventionError, ConventionModel};
use crate::model::ApiVersionModel;
use crate::version::ApiVersion;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Root of the fluent convention tree.
///
/// ```
/// use apiver_core::conventions::VersionConventions;
/// use apiver_core::ApiVersion;
///
/// let mut conventions = VersionConventions::new();
/// let orders = conventions.controller("Orders");
/// orders
///     .has_api_version(ApiVersion::new(1, 0))
///     .has_api_version(ApiVersion::new(2, 0));
/// orders
///     .action("get_by_id")
///     .map_to_api_version(ApiVersion::new(2, 0));
/// let model = conventions.build().unwrap();
/// ```
#[derive(Debug, Default)]
pub struct VersionConventions {
    controllers: BTreeMap<String, ControllerConventionBuilder>,
}

impl VersionConventions {
    /// Create an empty convention tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the builder for one controller.
    pub fn controller(&mut self, name: impl Into<String>) -> &mut ControllerConventionBuilder {
        self.controllers
            .entry(name.into())
            .or_default()
    }

    /// Freeze the tree into an immutable snapshot, validating every
    /// declaration.
    pub fn build(self) -> Result<ConventionModel, ConventionError> {
        let mut controllers = HashMap::with_capacity(self.controllers.len());
        for (name, builder) in self.controllers {
            let info = builder.freeze(&name)?;
            controllers.insert(name, info);
        }
        Ok(ConventionModel { controllers })
    }
}

/// Accumulates version declarations for one controller.
#[derive(Debug, Default)]
pub struct ControllerConventionBuilder {
    neutral: bool,
    declared: BTreeSet<ApiVersion>,
    deprecated: BTreeSet<ApiVersion>,
    advertised: BTreeSet<ApiVersion>,
    deprecated_advertised: BTreeSet<ApiVersion>,
    actions: BTreeMap<String, ActionConventionBuilder>,
}

impl ControllerConventionBuilder {
    /// Declare a supported version.
    pub fn has_api_version(&mut self, version: ApiVersion) -> &mut Self {
        self.declared.insert(version);
        self
    }

    /// Declare a deprecated version. Deprecated versions still resolve, but
    /// responses are flagged for deprecation reporting.
    pub fn has_deprecated_api_version(&mut self, version: ApiVersion) -> &mut Self {
        self.deprecated.insert(version);
        self
    }

    /// Advertise a version implemented elsewhere in the service.
    pub fn advertises_api_version(&mut self, version: ApiVersion) -> &mut Self {
        self.advertised.insert(version);
        self
    }

    /// Advertise a version that is deprecated elsewhere in the service.
    pub fn advertises_deprecated_api_version(&mut self, version: ApiVersion) -> &mut Self {
        self.deprecated_advertised.insert(version);
        self
    }

    /// Opt this controller out of versioning entirely.
    pub fn is_api_version_neutral(&mut self) -> &mut Self {
        self.neutral = true;
        self
    }

    /// Get or create the sub-builder for one action.
    pub fn action(&mut self, name: impl Into<String>) -> &mut ActionConventionBuilder {
        self.actions.entry(name.into()).or_default()
    }

    fn freeze(self, controller: &str) -> Result<ControllerVersionInfo, ConventionError> {
        if self.neutral {
            if !self.declared.is_empty() || !self.deprecated.is_empty() {
                return Err(ConventionError::NeutralWithVersions {
                    controller: controller.to_string(),
                });
            }
            let mut actions = HashMap::with_capacity(self.actions.len());
            for (name, _) in self.actions {
                actions.insert(
                    name,
                    ActionVersionInfo {
                        model: ApiVersionModel::neutral(),
                        mapped: BTreeSet::new(),
                    },
                );
            }
            return Ok(ControllerVersionInfo {
                model: ApiVersionModel::neutral(),
                actions,
            });
        }

        let controller_model = Arc::new(ApiVersionModel::new(
            self.declared.iter().cloned(),
            self.deprecated.iter().cloned(),
            self.advertised.iter().cloned(),
            self.deprecated_advertised.iter().cloned(),
        ));

        let mut actions = HashMap::with_capacity(self.actions.len());
        for (name, action) in self.actions {
            let info = action.freeze(controller, &name, &self.declared, &controller_model)?;
            actions.insert(name, info);
        }

        Ok(ControllerVersionInfo {
            model: controller_model,
            actions,
        })
    }
}

/// Accumulates version declarations for one action.
#[derive(Debug, Default)]
pub struct ActionConventionBuilder {
    neutral: bool,
    declared: BTreeSet<ApiVersion>,
    deprecated: BTreeSet<ApiVersion>,
    advertised: BTreeSet<ApiVersion>,
    deprecated_advertised: BTreeSet<ApiVersion>,
    mapped: BTreeSet<ApiVersion>,
}

impl ActionConventionBuilder {
    /// Declare a supported version, replacing the controller's set for this
    /// action.
    pub fn has_api_version(&mut self, version: ApiVersion) -> &mut Self {
        self.declared.insert(version);
        self
    }

    /// Declare a deprecated version for this action.
    pub fn has_deprecated_api_version(&mut self, version: ApiVersion) -> &mut Self {
        self.deprecated.insert(version);
        self
    }

    /// Advertise a version implemented elsewhere.
    pub fn advertises_api_version(&mut self, version: ApiVersion) -> &mut Self {
        self.advertised.insert(version);
        self
    }

    /// Advertise a version deprecated elsewhere.
    pub fn advertises_deprecated_api_version(&mut self, version: ApiVersion) -> &mut Self {
        self.deprecated_advertised.insert(version);
        self
    }

    /// Opt this action out of versioning entirely.
    pub fn is_api_version_neutral(&mut self) -> &mut Self {
        self.neutral = true;
        self
    }

    /// Restrict an otherwise-unversioned action to exactly the given
    /// version, which must be declared by the owning controller.
    ///
    /// Mapped actions outrank sibling actions that merely inherit the same
    /// version from the controller when both match a route.
    pub fn map_to_api_version(&mut self, version: ApiVersion) -> &mut Self {
        self.mapped.insert(version);
        self
    }

    fn freeze(
        self,
        controller: &str,
        action: &str,
        controller_declared: &BTreeSet<ApiVersion>,
        controller_model: &Arc<ApiVersionModel>,
    ) -> Result<ActionVersionInfo, ConventionError> {
        if self.neutral {
            return Ok(ActionVersionInfo {
                model: ApiVersionModel::neutral(),
                mapped: BTreeSet::new(),
            });
        }

        // Own declarations replace the controller's sets wholesale.
        if !self.declared.is_empty() || !self.deprecated.is_empty() {
            let model = Arc::new(ApiVersionModel::new(
                self.declared,
                self.deprecated,
                self.advertised,
                self.deprecated_advertised,
            ));
            return Ok(ActionVersionInfo {
                model,
                mapped: self.mapped,
            });
        }

        // A bare mapping intersects with the controller's declarations; a
        // mapped version the controller never declared is a defect.
        if !self.mapped.is_empty() {
            for version in &self.mapped {
                if !controller_declared.contains(version)
                    && !controller_model.is_deprecated(version)
                {
                    return Err(ConventionError::UnmappedVersion {
                        controller: controller.to_string(),
                        action: action.to_string(),
                        version: version.clone(),
                    });
                }
            }
            let deprecated: Vec<ApiVersion> = self
                .mapped
                .iter()
                .filter(|version| controller_model.is_deprecated(version))
                .cloned()
                .collect();
            let model = Arc::new(ApiVersionModel::new(
                self.mapped.iter().cloned(),
                deprecated,
                self.advertised,
                self.deprecated_advertised,
            ));
            return Ok(ActionVersionInfo {
                model,
                mapped: self.mapped,
            });
        }

        // No declarations at all: inherit every controller version.
        Ok(ActionVersionInfo {
            model: controller_model.clone(),
            mapped: BTreeSet::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(major: u64, minor: u64) -> ApiVersion {
        ApiVersion::new(major, minor)
    }

    fn two_version_controller() -> VersionConventions {
        let mut conventions = VersionConventions::new();
        conventions
            .controller("Orders")
            .has_api_version(v(1, 0))
            .has_api_version(v(2, 0));
        conventions
    }

    #[test]
    fn unmapped_action_inherits_controller_versions() {
        let model = two_version_controller().build().unwrap();
        let action = model.action("Orders", "list").unwrap();
        assert!(action.model().supports(&v(1, 0)));
        assert!(action.model().supports(&v(2, 0)));
        assert!(action.mapped_versions().is_empty());
    }

    #[test]
    fn mapped_action_restricts_to_one_version() {
        let mut conventions = two_version_controller();
        conventions
            .controller("Orders")
            .action("get_by_id")
            .map_to_api_version(v(2, 0));
        let model = conventions.build().unwrap();

        let mapped = model.action("Orders", "get_by_id").unwrap();
        assert!(!mapped.model().supports(&v(1, 0)));
        assert!(mapped.model().supports(&v(2, 0)));
        assert!(mapped.mapped_versions().contains(&v(2, 0)));

        // A sibling without a mapping still answers every version.
        let sibling = model.action("Orders", "list").unwrap();
        assert!(sibling.model().supports(&v(1, 0)));
    }

    #[test]
    fn mapping_to_undeclared_version_is_an_error() {
        let mut conventions = two_version_controller();
        conventions
            .controller("Orders")
            .action("get_by_id")
            .map_to_api_version(v(9, 0));
        let err = conventions.build().unwrap_err();
        assert_eq!(
            err,
            ConventionError::UnmappedVersion {
                controller: "Orders".to_string(),
                action: "get_by_id".to_string(),
                version: v(9, 0),
            }
        );
    }

    #[test]
    fn mapping_to_deprecated_controller_version_stays_deprecated() {
        let mut conventions = VersionConventions::new();
        let orders = conventions.controller("Orders");
        orders
            .has_api_version(v(2, 0))
            .has_deprecated_api_version(v(1, 0));
        orders.action("legacy").map_to_api_version(v(1, 0));
        let model = conventions.build().unwrap();

        let legacy = model.action("Orders", "legacy").unwrap();
        assert!(legacy.model().is_deprecated(&v(1, 0)));
        assert!(!legacy.model().supports(&v(1, 0)));
    }

    #[test]
    fn action_declarations_replace_controller_sets() {
        let mut conventions = two_version_controller();
        conventions
            .controller("Orders")
            .action("preview")
            .has_api_version(v(3, 0));
        let model = conventions.build().unwrap();

        let preview = model.action("Orders", "preview").unwrap();
        assert!(preview.model().supports(&v(3, 0)));
        assert!(!preview.model().supports(&v(1, 0)));
        assert!(!preview.model().supports(&v(2, 0)));
    }

    #[test]
    fn neutral_controller_yields_neutral_actions() {
        let mut conventions = VersionConventions::new();
        conventions.controller("Health").is_api_version_neutral();
        let model = conventions.build().unwrap();

        let info = model.controller("Health").unwrap();
        assert!(info.model().is_neutral());
        assert!(info.action("ping").model().is_neutral());
    }

    #[test]
    fn neutral_with_versions_is_an_error() {
        let mut conventions = VersionConventions::new();
        conventions
            .controller("Health")
            .is_api_version_neutral()
            .has_api_version(v(1, 0));
        assert_eq!(
            conventions.build().unwrap_err(),
            ConventionError::NeutralWithVersions {
                controller: "Health".to_string(),
            }
        );
    }

    #[test]
    fn advertised_versions_survive_freezing() {
        let mut conventions = VersionConventions::new();
        conventions
            .controller("Orders")
            .has_api_version(v(2, 0))
            .advertises_api_version(v(3, 0))
            .advertises_deprecated_api_version(v(1, 0));
        let model = conventions.build().unwrap();

        let info = model.controller("Orders").unwrap();
        assert_eq!(info.model().advertised_versions(), [v(3, 0)]);
        assert_eq!(info.model().deprecated_advertised_versions(), [v(1, 0)]);
    }
}
