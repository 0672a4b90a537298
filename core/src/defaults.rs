//! Defaults resolution: mapping → module → system default.
//!
//! Every scalar setting a route needs is resolved by walking the same fixed
//! precedence chain. The first level that has a value wins.
//!
//! ```text
//! Mapping.timeout_ms ─┐
//! Module.cluster_request_timeout_ms ─┼─► first present ─► ProxyDuration
//! SystemDefaults.cluster_request_timeout_ms ─┘
//! ```
//!
//! Settings with a system default must always resolve. If the system table is
//! missing one, resolution fails with [`CompileError::MissingDefault`] and the
//! compile cycle aborts: that is a bug in the compiler's tables, not in user
//! input.

use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;

use crate::{
    CompileError, CorsSpec, Mapping, Module, ProxyDuration, RetryPolicySpec,
    DEFAULT_CLUSTER_REQUEST_TIMEOUT_MS,
};

/// A setting resolved through the precedence chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Setting {
    /// Per-route request timeout.
    ClusterRequestTimeout,
}

impl Setting {
    /// The module-level field name for this setting.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::ClusterRequestTimeout => "cluster_request_timeout_ms",
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Hard-coded last level of every precedence chain.
///
/// Fields are optional only so a broken table is representable; the
/// [`Default`] table fills every one of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SystemDefaults {
    pub cluster_request_timeout_ms: Option<u64>,
}

impl Default for SystemDefaults {
    fn default() -> Self {
        Self {
            cluster_request_timeout_ms: Some(DEFAULT_CLUSTER_REQUEST_TIMEOUT_MS),
        }
    }
}

/// Return the first present value of `mapping`, `module`, `system`.
///
/// # Errors
///
/// Returns [`CompileError::MissingDefault`] when all three are absent.
///
/// ```
/// use routegen::{resolve, Setting};
///
/// let timeout = resolve(Setting::ClusterRequestTimeout, None, Some(4000), Some(3000));
/// assert_eq!(timeout, Ok(4000));
/// ```
pub fn resolve<T>(
    setting: Setting,
    mapping: Option<T>,
    module: Option<T>,
    system: Option<T>,
) -> Result<T, CompileError> {
    mapping
        .or(module)
        .or(system)
        .ok_or(CompileError::MissingDefault { setting })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Module selection
// ═══════════════════════════════════════════════════════════════════════════════

/// Outcome of choosing the effective module among those supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSelection<'a> {
    /// The module whose settings apply, if any were supplied.
    pub effective: Option<&'a Module>,
    /// Every other module, in input order.
    pub ignored: Vec<&'a Module>,
}

/// Choose the effective module.
///
/// Highest `priority` wins (absent = 0); ties go to the lexicographically
/// smallest `name`. The result does not depend on input order unless two
/// modules share both priority and name, in which case the later one wins.
///
/// ```
/// use routegen::{select_module, Module};
///
/// let modules = vec![Module::new("zeta"), Module::new("alpha")];
/// let selection = select_module(&modules);
/// assert_eq!(selection.effective.map(|m| m.name.as_str()), Some("alpha"));
/// assert_eq!(selection.ignored.len(), 1);
/// ```
#[must_use]
pub fn select_module(modules: &[Module]) -> ModuleSelection<'_> {
    let Some((winner, effective)) = modules
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| module_rank(a, b))
    else {
        return ModuleSelection::default();
    };

    let ignored = modules
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != winner)
        .map(|(_, module)| module)
        .collect();

    ModuleSelection {
        effective: Some(effective),
        ignored,
    }
}

/// `Greater` means `a` is preferred over `b`.
fn module_rank(a: &Module, b: &Module) -> Ordering {
    a.priority
        .unwrap_or(0)
        .cmp(&b.priority.unwrap_or(0))
        .then_with(|| b.name.cmp(&a.name))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Effective defaults
// ═══════════════════════════════════════════════════════════════════════════════

/// The module and system levels of the precedence chain for one compile cycle.
///
/// Passed explicitly to the route builder; there is no shared default state.
#[derive(Debug, Clone, Copy)]
pub struct EffectiveDefaults<'a> {
    module: Option<&'a Module>,
    system: &'a SystemDefaults,
}

impl<'a> EffectiveDefaults<'a> {
    #[must_use]
    pub fn new(module: Option<&'a Module>, system: &'a SystemDefaults) -> Self {
        Self { module, system }
    }

    /// Resolved request timeout for a mapping.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::MissingDefault`] if no level has a timeout.
    pub fn request_timeout(&self, mapping: &Mapping) -> Result<ProxyDuration, CompileError> {
        resolve(
            Setting::ClusterRequestTimeout,
            mapping.timeout_ms,
            self.module.and_then(|m| m.cluster_request_timeout_ms),
            self.system.cluster_request_timeout_ms,
        )
        .map(ProxyDuration::from_millis)
    }

    /// Mapping retry policy, else the module's. No system default.
    #[must_use]
    pub fn retry_policy<'m>(&self, mapping: &'m Mapping) -> Option<&'m RetryPolicySpec>
    where
        'a: 'm,
    {
        mapping
            .retry_policy
            .as_ref()
            .or_else(|| self.module.and_then(|m| m.retry_policy.as_ref()))
    }

    /// Mapping CORS policy, else the module's. No system default.
    #[must_use]
    pub fn cors<'m>(&self, mapping: &'m Mapping) -> Option<&'m CorsSpec>
    where
        'a: 'm,
    {
        mapping
            .cors
            .as_ref()
            .or_else(|| self.module.and_then(|m| m.cors.as_ref()))
    }
}
