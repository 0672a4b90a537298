//! Route builder: [`Mapping`] → [`CompiledRoute`].
//!
//! Each mapping yields exactly one route (a weighted split is still one route
//! with a weighted action) or none at all, with diagnostics explaining why.
//!
//! # Ordering
//!
//! The proxy evaluates routes top to bottom and takes the first match, so
//! route order is part of routing behaviour. Within a virtual host routes
//! sort by:
//!
//! 1. explicit `priority`, higher first
//! 2. path kind, exact before regex before prefix
//! 3. path length, longer first
//! 4. number of header constraints, more first
//! 5. declaration index, earlier first
//!
//! The declaration index only decides between routes that tie on everything
//! else.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use regex::Regex;
use serde::Serialize;

use crate::{
    dedup_header_names, normalize_headers, ClusterTarget, CompileError, CorsPolicy,
    DiagnosticKind, EffectiveDefaults, HeaderMatchValue, HeaderRule, Mapping, ProxyDuration,
    RetryPolicy, WILDCARD_DOMAIN,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Match
// ═══════════════════════════════════════════════════════════════════════════════

/// How the request path is matched. Serializes as `prefix`, `exact` or `regex`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSpecifier {
    Prefix(String),
    Exact(String),
    Regex(String),
}

impl PathSpecifier {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Prefix(p) | Self::Exact(p) | Self::Regex(p) => p,
        }
    }

    /// Specificity of the match kind; higher sorts earlier.
    const fn rank(&self) -> u8 {
        match self {
            Self::Exact(_) => 2,
            Self::Regex(_) => 1,
            Self::Prefix(_) => 0,
        }
    }
}

/// The match predicate of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    #[serde(flatten)]
    pub path: PathSpecifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
    /// All constraints must hold.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<HeaderMatcher>,
}

/// A constraint on one request header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderMatcher {
    pub name: String,
    #[serde(flatten)]
    pub spec: HeaderMatchSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMatchSpec {
    ExactMatch(String),
    PresentMatch(bool),
    SafeRegexMatch(RegexMatcher),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegexMatcher {
    pub regex: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Action
// ═══════════════════════════════════════════════════════════════════════════════

/// Upstream target. Serializes as `cluster` or `weighted_clusters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterSpecifier {
    Cluster(String),
    WeightedClusters(WeightedClusters),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeightedClusters {
    pub clusters: Vec<ClusterWeight>,
}

/// A weighted split member. The weight is the user's, never renormalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterWeight {
    pub name: String,
    pub weight: u32,
}

/// What the proxy does with a matched request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteAction {
    #[serde(flatten)]
    pub target: ClusterSpecifier,
    /// Always resolved; see [`EffectiveDefaults::request_timeout`].
    pub timeout: ProxyDuration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_rewrite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_rewrite_literal: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub request_headers_to_add: Vec<HeaderRule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub request_headers_to_remove: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub response_headers_to_add: Vec<HeaderRule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub response_headers_to_remove: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsPolicy>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CompiledRoute
// ═══════════════════════════════════════════════════════════════════════════════

/// One route entry, ready for a virtual host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledRoute {
    /// Name of the mapping this route came from.
    pub name: String,
    #[serde(rename = "match")]
    pub route_match: RouteMatch,
    pub route: RouteAction,
    #[serde(skip)]
    order: RouteOrder,
}

impl CompiledRoute {
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.order.priority
    }

    /// Position of the source mapping in the snapshot.
    #[must_use]
    pub fn declaration_index(&self) -> usize {
        self.order.index
    }

    /// Route evaluation order: `Less` means `self` must come first.
    #[must_use]
    pub fn evaluation_order(&self, other: &Self) -> Ordering {
        self.order.cmp(&other.order)
    }
}

/// Sort key of a route. Ascending order is evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RouteOrder {
    priority: i32,
    path_rank: u8,
    path_len: usize,
    header_count: usize,
    index: usize,
}

impl Ord for RouteOrder {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.path_rank.cmp(&self.path_rank))
            .then_with(|| other.path_len.cmp(&self.path_len))
            .then_with(|| other.header_count.cmp(&self.header_count))
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for RouteOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of building one mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBuild {
    /// Virtual host domain the route belongs to.
    pub domain: String,
    /// `None` when an excluding diagnostic was raised.
    pub route: Option<CompiledRoute>,
    /// Everything wrong with the mapping, excluding or not.
    pub diagnostics: Vec<DiagnosticKind>,
}

/// Builds routes against one compile cycle's defaults and cluster catalog.
#[derive(Debug, Clone)]
pub struct RouteBuilder<'a> {
    defaults: EffectiveDefaults<'a>,
    clusters: BTreeSet<&'a str>,
}

impl<'a> RouteBuilder<'a> {
    pub fn new(defaults: EffectiveDefaults<'a>, clusters: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            defaults,
            clusters: clusters.into_iter().collect(),
        }
    }

    /// Build the route for the mapping at `index` in the snapshot.
    ///
    /// Problems local to the mapping come back as diagnostics on the
    /// [`RouteBuild`]; all of them are collected, not just the first.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::MissingDefault`] if the timeout cannot be
    /// resolved at any precedence level.
    pub fn build(&self, index: usize, mapping: &Mapping) -> Result<RouteBuild, CompileError> {
        let timeout = self.defaults.request_timeout(mapping)?;
        let mut diagnostics = Vec::new();

        let path = match path_specifier(mapping) {
            Ok(path) => Some(path),
            Err(kind) => {
                diagnostics.push(kind);
                None
            }
        };
        let headers = header_matchers(mapping, &mut diagnostics);
        let target = match self.cluster_specifier(&mapping.cluster) {
            Ok(target) => Some(target),
            Err(kinds) => {
                diagnostics.extend(kinds);
                None
            }
        };

        let request_headers = normalize_headers(&mapping.headers_to_add);
        let response_headers = normalize_headers(&mapping.add_response_headers);
        diagnostics.extend(request_headers.errors);
        diagnostics.extend(response_headers.errors);

        let domain = mapping
            .host
            .as_deref()
            .filter(|host| !host.is_empty())
            .unwrap_or(WILDCARD_DOMAIN)
            .to_owned();

        let excluded = diagnostics.iter().any(DiagnosticKind::excludes_route);
        let route = match (path, target) {
            (Some(path), Some(target)) if !excluded => {
                let order = RouteOrder {
                    priority: mapping.priority.unwrap_or(0),
                    path_rank: path.rank(),
                    path_len: path.as_str().len(),
                    header_count: headers.len(),
                    index,
                };
                Some(CompiledRoute {
                    name: mapping.name.clone(),
                    route_match: RouteMatch {
                        path,
                        case_sensitive: mapping.case_sensitive,
                        headers,
                    },
                    route: RouteAction {
                        target,
                        timeout,
                        prefix_rewrite: mapping.prefix_rewrite.clone(),
                        host_rewrite_literal: mapping.host_rewrite.clone(),
                        request_headers_to_add: request_headers.rules,
                        request_headers_to_remove: dedup_header_names(
                            &mapping.remove_request_headers,
                        ),
                        response_headers_to_add: response_headers.rules,
                        response_headers_to_remove: dedup_header_names(
                            &mapping.remove_response_headers,
                        ),
                        retry_policy: self.defaults.retry_policy(mapping).map(RetryPolicy::from),
                        cors: self.defaults.cors(mapping).map(CorsPolicy::from),
                    },
                    order,
                })
            }
            _ => None,
        };

        Ok(RouteBuild {
            domain,
            route,
            diagnostics,
        })
    }

    fn knows(&self, cluster: &str) -> bool {
        self.clusters.contains(cluster)
    }

    fn cluster_specifier(
        &self,
        target: &ClusterTarget,
    ) -> Result<ClusterSpecifier, Vec<DiagnosticKind>> {
        match target {
            ClusterTarget::Single(name) => {
                if self.knows(name) {
                    Ok(ClusterSpecifier::Cluster(name.clone()))
                } else {
                    Err(vec![DiagnosticKind::UnknownCluster {
                        cluster: name.clone(),
                    }])
                }
            }
            ClusterTarget::Weighted(targets) => {
                if targets.is_empty() {
                    return Err(vec![DiagnosticKind::EmptyClusterList]);
                }

                let unknown: Vec<DiagnosticKind> = targets
                    .iter()
                    .filter(|t| !self.knows(&t.cluster))
                    .map(|t| DiagnosticKind::UnknownCluster {
                        cluster: t.cluster.clone(),
                    })
                    .collect();
                if !unknown.is_empty() {
                    return Err(unknown);
                }

                Ok(ClusterSpecifier::WeightedClusters(WeightedClusters {
                    clusters: targets
                        .iter()
                        .map(|t| ClusterWeight {
                            name: t.cluster.clone(),
                            weight: t.weight,
                        })
                        .collect(),
                }))
            }
        }
    }
}

fn path_specifier(mapping: &Mapping) -> Result<PathSpecifier, DiagnosticKind> {
    match (mapping.prefix_regex, mapping.prefix_exact) {
        (true, true) => Err(DiagnosticKind::ConflictingPathMatch),
        (true, false) => {
            check_regex(&mapping.prefix)?;
            Ok(PathSpecifier::Regex(mapping.prefix.clone()))
        }
        (false, true) => Ok(PathSpecifier::Exact(mapping.prefix.clone())),
        (false, false) => Ok(PathSpecifier::Prefix(mapping.prefix.clone())),
    }
}

/// Exact/presence constraints first, then regex constraints, each in
/// declaration order. Invalid regexes are reported and skipped.
fn header_matchers(mapping: &Mapping, diagnostics: &mut Vec<DiagnosticKind>) -> Vec<HeaderMatcher> {
    let mut matchers = Vec::with_capacity(mapping.headers.len() + mapping.regex_headers.len());

    for (name, value) in mapping.headers.iter() {
        let spec = match value {
            HeaderMatchValue::Exact(v) => HeaderMatchSpec::ExactMatch(v.clone()),
            HeaderMatchValue::Present(present) => HeaderMatchSpec::PresentMatch(*present),
        };
        matchers.push(HeaderMatcher {
            name: name.to_owned(),
            spec,
        });
    }

    for (name, pattern) in mapping.regex_headers.iter() {
        match check_regex(pattern) {
            Ok(()) => matchers.push(HeaderMatcher {
                name: name.to_owned(),
                spec: HeaderMatchSpec::SafeRegexMatch(RegexMatcher {
                    regex: pattern.clone(),
                }),
            }),
            Err(kind) => diagnostics.push(kind),
        }
    }

    matchers
}

fn check_regex(pattern: &str) -> Result<(), DiagnosticKind> {
    Regex::new(pattern)
        .map(drop)
        .map_err(|e| DiagnosticKind::InvalidRegex {
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })
}
