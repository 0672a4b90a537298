//! Diagnostics and fatal compile errors.
//!
//! Two classes:
//!
//! - [`Diagnostic`]: something wrong with one resource. Collected on the
//!   [`Compilation`](crate::Compilation); everything else still compiles.
//! - [`CompileError`]: the compiler's own tables are inconsistent. Aborts the
//!   whole cycle.

use std::fmt;

use thiserror::Error;

use crate::Setting;

/// Which kind of resource a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Module,
    Mapping,
}

impl ResourceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Module => "Module",
            Self::Mapping => "Mapping",
        }
    }
}

/// Names the resource a diagnostic refers to. Displays as `Kind/name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub name: String,
}

impl ResourceRef {
    pub fn module(name: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Module,
            name: name.into(),
        }
    }

    pub fn mapping(name: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Mapping,
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.as_str(), self.name)
    }
}

/// What is wrong with a resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    /// A header spec is neither a string nor an object with a string `value`.
    /// Only that header is dropped.
    #[error("header \"{header}\" is {found}; expected a string or an object with a string `value`")]
    MalformedHeaderSpec {
        header: String,
        /// Short description of the shape that was supplied.
        found: String,
    },

    /// The mapping targets a cluster the data plane does not know.
    #[error("unknown cluster \"{cluster}\"")]
    UnknownCluster { cluster: String },

    /// The mapping's weighted cluster list has no entries.
    #[error("weighted cluster list is empty")]
    EmptyClusterList,

    /// A path or header regex does not compile.
    #[error("invalid regex \"{pattern}\": {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("prefix_regex and prefix_exact cannot both be set")]
    ConflictingPathMatch,

    /// Another module won selection; this one contributes nothing.
    #[error("ignored in favor of module \"{effective}\"")]
    IgnoredModule { effective: String },
}

impl DiagnosticKind {
    /// Whether this diagnostic removes the mapping's route from the output.
    #[must_use]
    pub fn excludes_route(&self) -> bool {
        match self {
            Self::UnknownCluster { .. }
            | Self::EmptyClusterList
            | Self::InvalidRegex { .. }
            | Self::ConflictingPathMatch => true,
            Self::MalformedHeaderSpec { .. } | Self::IgnoredModule { .. } => false,
        }
    }
}

/// A per-resource problem, reported alongside the best-effort output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{resource}: {kind}")]
pub struct Diagnostic {
    pub resource: ResourceRef,
    pub kind: DiagnosticKind,
}

/// Fatal errors: the compile cycle produces no output.
///
/// These indicate a fault in the compiler's own configuration tables, never
/// bad user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// No precedence level yielded a value for a setting that must always resolve.
    #[error("no value for `{setting}` at any precedence level: the system default table is missing it")]
    MissingDefault { setting: Setting },

    /// The assembler produced a virtual host with no routes.
    #[error("virtual host \"{domain}\" has no routes")]
    EmptyVirtualHost { domain: String },
}

/// Collects diagnostics in report order, logging each one.
#[derive(Debug, Default)]
pub(crate) struct DiagnosticSink {
    entries: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub(crate) fn report(&mut self, resource: &ResourceRef, kind: DiagnosticKind) {
        tracing::warn!(resource = %resource, kind = %kind, "resource diagnostic");
        self.entries.push(Diagnostic {
            resource: resource.clone(),
            kind,
        });
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
