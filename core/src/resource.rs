//! Typed routing resources consumed by the compiler.
//!
//! These types are handed over already parsed and validated by whatever
//! watches the resource store. They derive `Deserialize` so that collaborator
//! can produce them from JSON/YAML; unknown fields are ignored.
//!
//! | Resource | Role |
//! |----------|------|
//! | [`Module`] | Process-wide defaults (at most one effective per compile) |
//! | [`Mapping`] | One route intent: path match → cluster(s), plus overrides |
//! | [`ListenerSpec`] | A listener that receives the compiled route table |
//! | [`ResourceSnapshot`] | Everything one compile cycle sees, immutable for its duration |

use serde::{Deserialize, Deserializer};

use crate::OrderedMap;

// ═══════════════════════════════════════════════════════════════════════════════
// Module
// ═══════════════════════════════════════════════════════════════════════════════

/// Process-wide default settings that mappings may override.
///
/// When several modules are supplied, [`select_module`](crate::select_module)
/// picks the effective one: highest `priority`, then smallest `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Module {
    /// Resource name, used for selection tie-breaks and diagnostics.
    pub name: String,

    /// Selection priority among competing modules (absent = 0).
    pub priority: Option<i32>,

    /// Default request timeout for every route, in milliseconds.
    pub cluster_request_timeout_ms: Option<u64>,

    /// Retry policy for mappings that do not declare one.
    pub retry_policy: Option<RetryPolicySpec>,

    /// CORS policy for mappings that do not declare one.
    pub cors: Option<CorsSpec>,
}

impl Module {
    /// Create a module with no overrides.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Mapping
// ═══════════════════════════════════════════════════════════════════════════════

/// One declarative route intent.
///
/// `prefix` is always required. `prefix_regex` and `prefix_exact` change how
/// it is interpreted; setting both is rejected at compile time.
///
/// ```
/// use routegen::Mapping;
///
/// let mapping = Mapping {
///     timeout_ms: Some(1234),
///     priority: Some(10),
///     ..Mapping::new("qotm", "/qotm/", "qotm-cluster")
/// };
/// assert_eq!(mapping.prefix, "/qotm/");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Mapping {
    /// Resource name; becomes the route name in the output.
    pub name: String,

    /// Path to match. A prefix unless one of the flags below says otherwise.
    pub prefix: String,

    /// Treat `prefix` as a regular expression.
    #[serde(default)]
    pub prefix_regex: bool,

    /// Treat `prefix` as an exact path.
    #[serde(default)]
    pub prefix_exact: bool,

    /// Case sensitivity of the path match; the proxy default applies when unset.
    #[serde(default)]
    pub case_sensitive: Option<bool>,

    /// Target cluster, or a weighted set of clusters.
    pub cluster: ClusterTarget,

    /// Host domain the route is served under (`*` when unset).
    #[serde(default)]
    pub host: Option<String>,

    /// Ordering hint; higher sorts earlier within a virtual host.
    #[serde(default)]
    pub priority: Option<i32>,

    /// Request timeout override in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Header constraints: a string requires that exact value, a boolean
    /// requires presence (`true`) or absence (`false`).
    #[serde(default)]
    pub headers: OrderedMap<HeaderMatchValue>,

    /// Header constraints matched by regular expression.
    #[serde(default)]
    pub regex_headers: OrderedMap<String>,

    /// Request headers to add, in declaration order.
    #[serde(default)]
    pub headers_to_add: OrderedMap<HeaderSpec>,

    /// Request header names to strip before forwarding.
    #[serde(default)]
    pub remove_request_headers: Vec<String>,

    /// Response headers to add, in declaration order.
    #[serde(default)]
    pub add_response_headers: OrderedMap<HeaderSpec>,

    /// Response header names to strip before returning downstream.
    #[serde(default)]
    pub remove_response_headers: Vec<String>,

    /// Replacement for the matched prefix when forwarding upstream.
    #[serde(default)]
    pub prefix_rewrite: Option<String>,

    /// Literal `Host` header sent upstream.
    #[serde(default)]
    pub host_rewrite: Option<String>,

    /// Retry policy; replaces the module's whole policy when set.
    #[serde(default)]
    pub retry_policy: Option<RetryPolicySpec>,

    /// CORS policy; replaces the module's whole policy when set.
    #[serde(default)]
    pub cors: Option<CorsSpec>,
}

impl Mapping {
    /// Create a prefix mapping with no overrides.
    pub fn new(
        name: impl Into<String>,
        prefix: impl Into<String>,
        cluster: impl Into<ClusterTarget>,
    ) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            prefix_regex: false,
            prefix_exact: false,
            case_sensitive: None,
            cluster: cluster.into(),
            host: None,
            priority: None,
            timeout_ms: None,
            headers: OrderedMap::new(),
            regex_headers: OrderedMap::new(),
            headers_to_add: OrderedMap::new(),
            remove_request_headers: Vec::new(),
            add_response_headers: OrderedMap::new(),
            remove_response_headers: Vec::new(),
            prefix_rewrite: None,
            host_rewrite: None,
            retry_policy: None,
            cors: None,
        }
    }
}

/// Where a mapping sends traffic.
///
/// Deserializes from either a cluster name or a list of `{cluster, weight}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ClusterTarget {
    /// A single named cluster.
    Single(String),
    /// Traffic split across clusters. Weights are carried through unmodified.
    Weighted(Vec<WeightedTarget>),
}

impl From<&str> for ClusterTarget {
    fn from(cluster: &str) -> Self {
        Self::Single(cluster.to_owned())
    }
}

impl From<String> for ClusterTarget {
    fn from(cluster: String) -> Self {
        Self::Single(cluster)
    }
}

impl From<Vec<WeightedTarget>> for ClusterTarget {
    fn from(targets: Vec<WeightedTarget>) -> Self {
        Self::Weighted(targets)
    }
}

/// One member of a weighted traffic split.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WeightedTarget {
    pub cluster: String,
    pub weight: u32,
}

impl WeightedTarget {
    pub fn new(cluster: impl Into<String>, weight: u32) -> Self {
        Self {
            cluster: cluster.into(),
            weight,
        }
    }
}

/// A user-authored header addition, before normalization.
///
/// The closed set of shapes a header spec may take. Anything that is neither
/// a string nor an object with a string `value` lands in [`Malformed`](Self::Malformed)
/// and is rejected by [`normalize_headers`](crate::normalize_headers) with a
/// diagnostic.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HeaderSpec {
    /// `x-header: value`, appends.
    Plain(String),
    /// `x-header: { value: ..., append: ... }`; `append` defaults to `true`.
    Object {
        value: String,
        #[serde(default)]
        append: Option<bool>,
    },
    /// Any other shape, kept verbatim for the diagnostic.
    Malformed(serde_json::Value),
}

impl From<&str> for HeaderSpec {
    fn from(value: &str) -> Self {
        Self::Plain(value.to_owned())
    }
}

/// Value side of a header match constraint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum HeaderMatchValue {
    /// `true` requires the header to be present, `false` requires it absent.
    Present(bool),
    /// The header must carry exactly this value.
    Exact(String),
}

/// Retry behaviour for a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicySpec {
    /// Proxy retry condition list, e.g. `"5xx"` or `"gateway-error,reset"`.
    pub retry_on: Option<String>,
    pub num_retries: Option<u32>,
    pub per_try_timeout_ms: Option<u64>,
}

/// Cross-origin resource sharing policy for a route.
///
/// List fields accept either a YAML/JSON list or a single comma-separated string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CorsSpec {
    #[serde(deserialize_with = "string_or_list")]
    pub origins: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub methods: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub headers: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub exposed_headers: Vec<String>,
    pub credentials: Option<bool>,
    /// Preflight cache lifetime in seconds, passed through as a string.
    pub max_age: Option<String>,
}

fn string_or_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::One(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
        StringOrList::Many(items) => items,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Listener & snapshot
// ═══════════════════════════════════════════════════════════════════════════════

/// A listener that receives one route table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListenerSpec {
    pub name: String,
    /// Stats prefix for the listener's connection manager.
    #[serde(default)]
    pub stat_prefix: Option<String>,
}

impl ListenerSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stat_prefix: None,
        }
    }
}

/// The complete, immutable input of one compile cycle.
///
/// `clusters` lists the cluster names known to the data plane; a mapping that
/// targets any other name is excluded with a diagnostic.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResourceSnapshot {
    pub modules: Vec<Module>,
    /// Mappings in declaration order. Position is the final route-ordering tie-break.
    pub mappings: Vec<Mapping>,
    pub clusters: Vec<String>,
    pub listeners: Vec<ListenerSpec>,
}

impl ResourceSnapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    #[must_use]
    pub fn with_mapping(mut self, mapping: Mapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    #[must_use]
    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.clusters.push(cluster.into());
        self
    }

    #[must_use]
    pub fn with_listener(mut self, listener: ListenerSpec) -> Self {
        self.listeners.push(listener);
        self
    }
}
