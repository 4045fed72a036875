//! Version reporting
//!
//! Computes the `api-supported-versions` / `api-deprecated-versions` header
//! values and sunset-policy metadata from the metadata models of the actions
//! in scope for a route. Reporting is a pure projection, independent of the
//! selection outcome; the host binding writes the values to the response.

use crate::model::ApiVersionModel;
use crate::version::ApiVersion;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

/// Response header listing supported versions, ascending.
pub const API_SUPPORTED_VERSIONS: &str = "api-supported-versions";

/// Response header listing deprecated versions, ascending.
pub const API_DEPRECATED_VERSIONS: &str = "api-deprecated-versions";

/// Standard `Sunset` response header.
pub const SUNSET: &str = "sunset";

/// Standard `Link` response header.
pub const LINK: &str = "link";

/// One RFC 8288 web link attached to a sunset policy, e.g. a pointer to the
/// deprecation announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkHeaderValue {
    url: String,
    rel: String,
    title: Option<String>,
    media_type: Option<String>,
}

impl LinkHeaderValue {
    /// Create a link with the conventional `sunset` relation.
    pub fn sunset(url: impl Into<String>) -> Self {
        Self::new(url, "sunset")
    }

    /// Create a link with an arbitrary relation.
    pub fn new(url: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            rel: rel.into(),
            title: None,
            media_type: None,
        }
    }

    /// Attach a human-readable title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach the linked document's media type.
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// The link target.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for LinkHeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>; rel=\"{}\"", self.url, self.rel)?;
        if let Some(title) = &self.title {
            write!(f, "; title=\"{title}\"")?;
        }
        if let Some(media_type) = &self.media_type {
            write!(f, "; type=\"{media_type}\"")?;
        }
        Ok(())
    }
}

/// When a deprecated version stops being served, and where clients can read
/// about it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SunsetPolicy {
    date: Option<DateTime<Utc>>,
    links: Vec<LinkHeaderValue>,
}

impl SunsetPolicy {
    /// Create an empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sunset instant.
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Attach a policy link.
    pub fn with_link(mut self, link: LinkHeaderValue) -> Self {
        self.links.push(link);
        self
    }

    /// The sunset instant, if declared.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.date
    }

    /// The attached links.
    pub fn links(&self) -> &[LinkHeaderValue] {
        &self.links
    }

    /// The `Sunset` header value (an HTTP-date), if a date is declared.
    pub fn sunset_header_value(&self) -> Option<String> {
        self.date
            .map(|date| date.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
    }

    /// One `Link` header value per attached link.
    pub fn link_header_values(&self) -> Vec<String> {
        self.links.iter().map(LinkHeaderValue::to_string).collect()
    }
}

/// Computed version report for one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReport {
    /// Supported (including advertised, non-deprecated) versions, ascending.
    pub supported: Vec<ApiVersion>,
    /// Deprecated (including advertised-deprecated) versions, ascending.
    pub deprecated: Vec<ApiVersion>,
    /// The sunset policy attached to the resolved version, if any.
    pub sunset: Option<SunsetPolicy>,
}

impl VersionReport {
    /// The `api-supported-versions` value, or `None` when nothing is
    /// supported.
    pub fn supported_header_value(&self) -> Option<String> {
        join_versions(&self.supported)
    }

    /// The `api-deprecated-versions` value, or `None` when nothing is
    /// deprecated.
    pub fn deprecated_header_value(&self) -> Option<String> {
        join_versions(&self.deprecated)
    }
}

fn join_versions(versions: &[ApiVersion]) -> Option<String> {
    if versions.is_empty() {
        return None;
    }
    Some(
        versions
            .iter()
            .map(ApiVersion::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Projects version metadata into reportable header values.
#[derive(Debug, Clone, Default)]
pub struct VersionReporter {
    policies: HashMap<ApiVersion, SunsetPolicy>,
}

impl VersionReporter {
    /// Create a reporter with no sunset policies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a sunset policy to one version.
    pub fn sunset(mut self, version: ApiVersion, policy: SunsetPolicy) -> Self {
        self.policies.insert(version, policy);
        self
    }

    /// Compute the report for the models in scope for a route.
    ///
    /// Version-neutral models contribute nothing. `resolved` is the version
    /// the request resolved to, used to look up a sunset policy.
    pub fn report<'a>(
        &self,
        models: impl IntoIterator<Item = &'a ApiVersionModel>,
        resolved: Option<&ApiVersion>,
    ) -> VersionReport {
        let aggregate = ApiVersionModel::aggregate(models);

        let mut supported: Vec<ApiVersion> = aggregate
            .supported_versions()
            .iter()
            .chain(aggregate.advertised_versions())
            .cloned()
            .collect();
        supported.sort();
        supported.dedup();

        let mut deprecated: Vec<ApiVersion> = aggregate
            .deprecated_versions()
            .iter()
            .chain(aggregate.deprecated_advertised_versions())
            .cloned()
            .collect();
        deprecated.sort();
        deprecated.dedup();

        let sunset = resolved.and_then(|version| self.policies.get(version).cloned());

        VersionReport {
            supported,
            deprecated,
            sunset,
        }
    }
}
