//! routegen - compiles routing resources into proxy route configuration
//!
//! Many small declarative resources, authored independently and possibly in
//! conflict, are merged into one deterministic route table that a reverse
//! proxy data plane can load verbatim.
//!
//! # Pipeline
//!
//! Data flows strictly forward, each stage a pure function of its inputs:
//!
//! - [`ResourceSnapshot`]: typed [`Module`] (defaults) and [`Mapping`] (route intent) resources
//! - [`EffectiveDefaults`]: precedence chain: mapping → module → [`SystemDefaults`]
//! - [`normalize_headers`]: polymorphic header specs → ordered [`HeaderRule`]s
//! - [`RouteBuilder`]: one [`CompiledRoute`] per mapping (match + action)
//! - [`assemble`]: routes → [`VirtualHost`]s → one [`RouteTable`] per listener
//!
//! # Error model
//!
//! Problems with a single resource become [`Diagnostic`]s attached to the
//! [`Compilation`]; the rest of the snapshot still compiles. Only an internal
//! consistency fault ([`CompileError`]) aborts the cycle.
//!
//! # Example
//!
//! ```
//! use routegen::prelude::*;
//!
//! let snapshot = ResourceSnapshot::new()
//!     .with_cluster("httpbin")
//!     .with_mapping(Mapping::new("httpbin", "/httpbin/", "httpbin"));
//!
//! let compilation = Compiler::new().compile(&snapshot).unwrap();
//! let table = compilation.route_table("listener-8080").unwrap();
//! let route = &table.virtual_hosts[0].routes[0];
//! assert_eq!(route.route.timeout.to_string(), "3.000s");
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod assembler;
mod compiler;
mod defaults;
mod diagnostic;
mod duration;
mod header_rule;
mod ordered_map;
mod policy;
mod resource;
mod route;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Resource model
pub use ordered_map::OrderedMap;
pub use resource::{
    ClusterTarget, CorsSpec, HeaderMatchValue, HeaderSpec, ListenerSpec, Mapping, Module,
    ResourceSnapshot, RetryPolicySpec, WeightedTarget,
};

// Stages
pub use assembler::{assemble, group_virtual_hosts, HttpConnectionManager, RouteTable, VirtualHost};
pub use compiler::{Compilation, Compiler, CompilerOptions};
pub use defaults::{resolve, select_module, EffectiveDefaults, ModuleSelection, Setting, SystemDefaults};
pub use header_rule::{dedup_header_names, normalize_headers, HeaderRule, NormalizedHeaders};
pub use route::{
    ClusterSpecifier, ClusterWeight, CompiledRoute, HeaderMatchSpec, HeaderMatcher,
    PathSpecifier, RegexMatcher, RouteAction, RouteBuild, RouteBuilder, RouteMatch,
    WeightedClusters,
};

// Output leaves
pub use duration::ProxyDuration;
pub use policy::{CorsPolicy, ExactStringMatch, RetryPolicy};

// Errors
pub use diagnostic::{CompileError, Diagnostic, DiagnosticKind, ResourceKind, ResourceRef};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use routegen::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Entry point
        Compilation,
        CompileError,
        CompiledRoute,
        Compiler,
        CompilerOptions,
        // Diagnostics
        Diagnostic,
        DiagnosticKind,
        // Resources
        ClusterTarget,
        HeaderRule,
        HeaderSpec,
        Mapping,
        Module,
        OrderedMap,
        ProxyDuration,
        ResourceRef,
        ResourceSnapshot,
        RouteTable,
        SystemDefaults,
        VirtualHost,
        WeightedTarget,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Request timeout used when neither the mapping nor the module sets one.
pub const DEFAULT_CLUSTER_REQUEST_TIMEOUT_MS: u64 = 3000;

/// Domain a mapping is served under when it does not name a host.
pub const WILDCARD_DOMAIN: &str = "*";
