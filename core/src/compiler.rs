//! Compiler entry point: [`ResourceSnapshot`] → [`Compilation`].

use serde::Deserialize;

use crate::diagnostic::DiagnosticSink;
use crate::{
    assemble, group_virtual_hosts, select_module, CompileError, Diagnostic, DiagnosticKind,
    EffectiveDefaults, HttpConnectionManager, ListenerSpec, ResourceRef, ResourceSnapshot,
    RouteBuilder, RouteTable, SystemDefaults,
};

/// Compiler-level settings that are not part of any resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Listener used when the snapshot declares none.
    pub default_listener: String,
    /// Stats prefix for listeners that do not set their own.
    pub stat_prefix: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            default_listener: "listener-8080".to_string(),
            stat_prefix: "ingress_http".to_string(),
        }
    }
}

/// Compiles resource snapshots.
///
/// Holds only immutable tables, so one compiler can serve any number of
/// independent compile cycles.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    system: SystemDefaults,
    options: CompilerOptions,
}

impl Compiler {
    /// Create a compiler with the built-in system defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the system default table (builder pattern).
    #[must_use]
    pub fn with_system_defaults(mut self, system: SystemDefaults) -> Self {
        self.system = system;
        self
    }

    /// Replace the compiler options (builder pattern).
    #[must_use]
    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    /// Compile a full snapshot.
    ///
    /// Per-resource problems are returned as [`Compilation::diagnostics`]
    /// next to a route table built from everything else.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] when the compiler's own tables are
    /// inconsistent. No partial output is produced in that case.
    pub fn compile(&self, snapshot: &ResourceSnapshot) -> Result<Compilation, CompileError> {
        let span = tracing::debug_span!(
            "compile",
            modules = snapshot.modules.len(),
            mappings = snapshot.mappings.len()
        );
        let _entered = span.enter();

        self.compile_inner(snapshot).inspect_err(|err| {
            tracing::error!(error = %err, "compile aborted");
        })
    }

    fn compile_inner(&self, snapshot: &ResourceSnapshot) -> Result<Compilation, CompileError> {
        let mut sink = DiagnosticSink::default();

        let selection = select_module(&snapshot.modules);
        if let Some(effective) = selection.effective {
            for module in &selection.ignored {
                sink.report(
                    &ResourceRef::module(&module.name),
                    DiagnosticKind::IgnoredModule {
                        effective: effective.name.clone(),
                    },
                );
            }
        }

        let defaults = EffectiveDefaults::new(selection.effective, &self.system);
        let builder = RouteBuilder::new(defaults, snapshot.clusters.iter().map(String::as_str));

        let mut routes = Vec::with_capacity(snapshot.mappings.len());
        for (index, mapping) in snapshot.mappings.iter().enumerate() {
            let build = builder.build(index, mapping)?;
            let resource = ResourceRef::mapping(&mapping.name);
            for kind in build.diagnostics {
                sink.report(&resource, kind);
            }
            if let Some(route) = build.route {
                routes.push((build.domain, route));
            }
        }

        let route_count = routes.len();
        let virtual_hosts = group_virtual_hosts(routes);

        let default_listener;
        let listeners = if snapshot.listeners.is_empty() {
            default_listener = [ListenerSpec::new(&self.options.default_listener)];
            &default_listener[..]
        } else {
            &snapshot.listeners[..]
        };
        let listeners = assemble(listeners, &self.options.stat_prefix, &virtual_hosts)?;

        let diagnostics = sink.into_vec();
        tracing::debug!(
            listeners = listeners.len(),
            virtual_hosts = virtual_hosts.len(),
            routes = route_count,
            diagnostics = diagnostics.len(),
            "compile finished"
        );

        Ok(Compilation {
            listeners,
            diagnostics,
        })
    }
}

/// Output of one compile cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compilation {
    /// One connection-manager config per listener, in listener order.
    pub listeners: Vec<HttpConnectionManager>,
    /// Per-resource problems, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    /// Route table installed on `listener`.
    #[must_use]
    pub fn route_table(&self, listener: &str) -> Option<&RouteTable> {
        self.listeners
            .iter()
            .find(|m| m.listener == listener)
            .map(|m| &m.route_config)
    }

    /// `true` when no resource raised a diagnostic.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics raised by one resource.
    pub fn diagnostics_for<'a>(
        &'a self,
        resource: &'a ResourceRef,
    ) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics
            .iter()
            .filter(move |d| &d.resource == resource)
    }
}
