//! Action selection and version resolution
//!
//! The [`VersionResolver`] is the heart of the library: given a request and
//! the candidate actions that already matched the route template, it reads
//! the raw version token, parses it, filters candidates by their metadata,
//! breaks ties, and classifies every failure mode as a typed
//! [`ResolutionResult`] variant.
//!
//! Resolution is stateless, synchronous, and purely in-memory: the engine
//! only reads the frozen metadata models behind `Arc`, so any number of
//! requests resolve concurrently without locks.

use crate::conventions::ActionVersionInfo;
use crate::model::ApiVersionModel;
use crate::reader::{self, QueryStringReader, VersionReader};
use crate::request::RouteRequest;
use crate::selector::{LowestImplementedSelector, VersionSelector};
use crate::version::ApiVersion;
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Opaque handle for a candidate action.
///
/// The engine never interprets it beyond equality and diagnostics; the host
/// maps it back to its own action descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionId(pub u64);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action#{}", self.0)
    }
}

/// One action that matched the route template, minus the version constraint.
#[derive(Debug, Clone)]
pub struct CandidateAction {
    id: ActionId,
    model: Arc<ApiVersionModel>,
    mapped: BTreeSet<ApiVersion>,
}

impl CandidateAction {
    /// Create a candidate with the given effective model.
    pub fn new(id: ActionId, model: Arc<ApiVersionModel>) -> Self {
        Self {
            id,
            model,
            mapped: BTreeSet::new(),
        }
    }

    /// Create a version-neutral candidate.
    pub fn neutral(id: ActionId) -> Self {
        Self::new(id, ApiVersionModel::neutral())
    }

    /// Create a candidate from frozen convention output.
    pub fn from_conventions(id: ActionId, info: &ActionVersionInfo) -> Self {
        Self {
            id,
            model: info.model().clone(),
            mapped: info.mapped_versions().clone(),
        }
    }

    /// Record the versions this action was explicitly mapped to.
    pub fn with_mapped(mut self, mapped: impl IntoIterator<Item = ApiVersion>) -> Self {
        self.mapped = mapped.into_iter().collect();
        self
    }

    /// The opaque action handle.
    pub fn id(&self) -> ActionId {
        self.id
    }

    /// The action's effective version model.
    pub fn model(&self) -> &Arc<ApiVersionModel> {
        &self.model
    }

    fn is_mapped_to(&self, version: &ApiVersion) -> bool {
        self.mapped.contains(version)
    }
}

/// Outcome of one resolution attempt.
///
/// Every failure is a distinct, terminal classification the host translates
/// into its own error response; the engine never retries and never raises
/// for normal negotiation flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    /// Exactly one action implements the requested (or assumed) version.
    ///
    /// `version` is `None` only when a version-neutral action short-circuited
    /// an unversioned request. `deprecated` flags a successful resolution to
    /// a deprecated version; it is not a failure.
    Resolved {
        /// The selected action.
        action: ActionId,
        /// The version the request resolved to, if any was negotiated.
        version: Option<ApiVersion>,
        /// Whether the resolved version is deprecated for that action.
        deprecated: bool,
    },
    /// No reader produced a token and no default assumption is configured.
    Unspecified,
    /// A token was present but failed to parse; carries the raw text.
    Malformed {
        /// The offending token, for diagnostics.
        raw: String,
    },
    /// Different readers produced different non-empty tokens.
    AmbiguousVersion {
        /// Every distinct token, in reader order.
        tokens: Vec<String>,
    },
    /// The version parsed but no live candidate implements it.
    Unsupported {
        /// The requested version.
        requested: ApiVersion,
        /// Every version the candidates do support or advertise, ascending.
        supported: Vec<ApiVersion>,
    },
    /// More than one otherwise-equal candidate claims the resolved version —
    /// a defect in the owning service's route table.
    AmbiguousAction {
        /// Every conflicting candidate.
        actions: Vec<ActionId>,
    },
}

impl ResolutionResult {
    /// Whether this outcome selected an action.
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionResult::Resolved { .. })
    }
}

/// Builder for [`VersionResolver`].
#[derive(Default)]
pub struct VersionResolverBuilder {
    readers: Vec<Box<dyn VersionReader>>,
    assume_default: bool,
    selector: Option<Box<dyn VersionSelector>>,
}

impl VersionResolverBuilder {
    /// Add a version reader. Readers are evaluated in registration order.
    pub fn reader(mut self, reader: impl VersionReader + 'static) -> Self {
        self.readers.push(Box::new(reader));
        self
    }

    /// When the request omits a version, assume one via the configured
    /// selector instead of failing with `Unspecified`.
    pub fn assume_default_when_unspecified(mut self, assume: bool) -> Self {
        self.assume_default = assume;
        self
    }

    /// Set the selection policy used for assumed defaults (defaults to the
    /// lowest implemented version).
    pub fn select_with(mut self, selector: impl VersionSelector + 'static) -> Self {
        self.selector = Some(Box::new(selector));
        self
    }

    /// Finish the resolver. With no readers configured, the default
    /// query-string reader (`api-version`) is used.
    pub fn build(self) -> VersionResolver {
        let mut readers = self.readers;
        if readers.is_empty() {
            readers.push(Box::new(QueryStringReader::new()));
        }
        VersionResolver {
            readers,
            assume_default: self.assume_default,
            selector: self
                .selector
                .unwrap_or_else(|| Box::new(LowestImplementedSelector)),
        }
    }
}

/// The version negotiation engine.
pub struct VersionResolver {
    readers: Vec<Box<dyn VersionReader>>,
    assume_default: bool,
    selector: Box<dyn VersionSelector>,
}

impl VersionResolver {
    /// Start configuring a resolver.
    pub fn builder() -> VersionResolverBuilder {
        VersionResolverBuilder::default()
    }

    /// Resolve the request against the candidate set.
    pub fn resolve(
        &self,
        request: &RouteRequest,
        candidates: &[CandidateAction],
    ) -> ResolutionResult {
        let tokens = reader::collect_raw_tokens(&self.readers, request);
        if tokens.len() > 1 {
            // A neutral candidate answers regardless of what the readers
            // disagreed about.
            if let Some(result) = resolve_neutral(candidates) {
                return result;
            }
            tracing::debug!(?tokens, "conflicting version tokens from readers");
            return ResolutionResult::AmbiguousVersion {
                tokens: tokens.into_vec(),
            };
        }

        let requested = match tokens.into_iter().next() {
            Some(raw) => match raw.parse::<ApiVersion>() {
                Ok(version) => version,
                Err(error) => {
                    // Neutral candidates match every attempt, malformed
                    // tokens included.
                    if let Some(result) = resolve_neutral(candidates) {
                        return result;
                    }
                    tracing::debug!(%raw, %error, "malformed version token");
                    return ResolutionResult::Malformed { raw };
                }
            },
            None => {
                // An unversioned request is answered by a neutral candidate
                // outright, before any default kicks in.
                if let Some(result) = resolve_neutral(candidates) {
                    return result;
                }

                if !self.assume_default {
                    return ResolutionResult::Unspecified;
                }
                let aggregate = ApiVersionModel::aggregate(
                    candidates.iter().map(|candidate| candidate.model.as_ref()),
                );
                match self.selector.select(&aggregate) {
                    Some(version) => {
                        tracing::debug!(%version, "assumed default version");
                        version
                    }
                    None => return ResolutionResult::Unspecified,
                }
            }
        };

        self.resolve_version(&requested, candidates)
    }

    fn resolve_version(
        &self,
        requested: &ApiVersion,
        candidates: &[CandidateAction],
    ) -> ResolutionResult {
        let matched: SmallVec<[&CandidateAction; 4]> = candidates
            .iter()
            .filter(|candidate| {
                candidate.model.is_neutral() || candidate.model.supports(requested)
            })
            .collect();

        if matched.is_empty() {
            return self.resolve_unmatched(requested, candidates);
        }

        match disambiguate(&matched, requested) {
            Ok(winner) => {
                tracing::debug!(action = %winner.id, version = %requested, "resolved");
                ResolutionResult::Resolved {
                    action: winner.id,
                    version: Some(requested.clone()),
                    deprecated: false,
                }
            }
            Err(actions) => {
                tracing::debug!(version = %requested, ?actions, "ambiguous action match");
                ResolutionResult::AmbiguousAction { actions }
            }
        }
    }

    // No live candidate implements the version: either rescue a deprecated
    // implementation or report what is supported instead.
    fn resolve_unmatched(
        &self,
        requested: &ApiVersion,
        candidates: &[CandidateAction],
    ) -> ResolutionResult {
        let deprecated: SmallVec<[&CandidateAction; 2]> = candidates
            .iter()
            .filter(|candidate| candidate.model.is_deprecated(requested))
            .collect();

        if !deprecated.is_empty() {
            return match disambiguate(&deprecated, requested) {
                Ok(winner) => {
                    tracing::debug!(
                        action = %winner.id,
                        version = %requested,
                        "resolved to deprecated version"
                    );
                    ResolutionResult::Resolved {
                        action: winner.id,
                        version: Some(requested.clone()),
                        deprecated: true,
                    }
                }
                Err(actions) => ResolutionResult::AmbiguousAction { actions },
            };
        }

        let aggregate =
            ApiVersionModel::aggregate(candidates.iter().map(|candidate| candidate.model.as_ref()));
        let mut supported: Vec<ApiVersion> = aggregate
            .supported_versions()
            .iter()
            .chain(aggregate.advertised_versions())
            .cloned()
            .collect();
        supported.sort();
        supported.dedup();
        tracing::debug!(version = %requested, ?supported, "unsupported version");
        ResolutionResult::Unsupported {
            requested: requested.clone(),
            supported,
        }
    }
}

// A version-neutral candidate answers any request that did not resolve a
// concrete version: absent, malformed, or conflicting tokens. Two neutral
// candidates on one route are a route-table defect.
fn resolve_neutral(candidates: &[CandidateAction]) -> Option<ResolutionResult> {
    let neutrals: SmallVec<[&CandidateAction; 2]> = candidates
        .iter()
        .filter(|candidate| candidate.model.is_neutral())
        .collect();
    match neutrals.as_slice() {
        [] => None,
        [only] => {
            tracing::debug!(action = %only.id, "resolved to version-neutral action");
            Some(ResolutionResult::Resolved {
                action: only.id,
                version: None,
                deprecated: false,
            })
        }
        many => Some(ResolutionResult::AmbiguousAction {
            actions: many.iter().map(|candidate| candidate.id).collect(),
        }),
    }
}

// An action explicitly mapped to the requested version outranks siblings
// that merely inherit it from their controller; an irreducible tie is a
// route-table defect.
fn disambiguate<'a>(
    matched: &[&'a CandidateAction],
    requested: &ApiVersion,
) -> Result<&'a CandidateAction, Vec<ActionId>> {
    if let [only] = matched {
        return Ok(*only);
    }
    let mapped: SmallVec<[&'a CandidateAction; 2]> = matched
        .iter()
        .copied()
        .filter(|candidate| candidate.is_mapped_to(requested))
        .collect();
    match mapped.as_slice() {
        [only] => Ok(*only),
        [] => Err(matched.iter().map(|candidate| candidate.id).collect()),
        many => Err(many.iter().map(|candidate| candidate.id).collect()),
    }
}
