//! Compile fixture model and checker.

use routegen::{Compiler, CompilerOptions, ResourceSnapshot, SystemDefaults};
use serde::Deserialize;

/// A complete compile fixture.
#[derive(Debug, Deserialize)]
pub struct CompileFixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Overrides the built-in system default table.
    #[serde(default)]
    pub system_defaults: Option<SystemDefaults>,
    #[serde(default)]
    pub options: Option<CompilerOptions>,
    pub snapshot: ResourceSnapshot,
    pub expect: Expectation,
}

/// What compiling the snapshot must yield.
#[derive(Debug, Deserialize)]
pub struct Expectation {
    /// Listener whose route table is compared. Defaults to the compiler's
    /// default listener.
    #[serde(default)]
    pub listener: Option<String>,
    /// Expected `route_config`, compared structurally as JSON.
    #[serde(default)]
    pub route_config: Option<serde_json::Value>,
    /// Expected diagnostics, in report order. Compared only when present.
    #[serde(default)]
    pub diagnostics: Option<Vec<ExpectedDiagnostic>>,
    /// Substring of the fatal error message. The compile must fail when set.
    #[serde(default)]
    pub error: Option<String>,
}

/// One expected diagnostic.
#[derive(Debug, Deserialize)]
pub struct ExpectedDiagnostic {
    /// `Kind/name`, e.g. `Mapping/httpbin`.
    pub resource: String,
    /// Substring of the diagnostic message.
    pub contains: String,
}

impl CompileFixture {
    /// Parse a single fixture from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators.
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Build the compiler this fixture runs against.
    #[must_use]
    pub fn compiler(&self) -> Compiler {
        let mut compiler = Compiler::new();
        if let Some(system) = &self.system_defaults {
            compiler = compiler.with_system_defaults(system.clone());
        }
        if let Some(options) = &self.options {
            compiler = compiler.with_options(options.clone());
        }
        compiler
    }

    /// Compile the snapshot and compare against the expectation.
    ///
    /// # Errors
    ///
    /// Returns a description of the first mismatch.
    pub fn check(&self) -> Result<(), String> {
        let compiler = self.compiler();
        let result = compiler.compile(&self.snapshot);

        let compilation = match (result, &self.expect.error) {
            (Err(err), Some(expected)) => {
                let message = err.to_string();
                return if message.contains(expected.as_str()) {
                    Ok(())
                } else {
                    Err(format!("error \"{message}\" does not contain \"{expected}\""))
                };
            }
            (Err(err), None) => return Err(format!("unexpected compile error: {err}")),
            (Ok(_), Some(expected)) => {
                return Err(format!("expected error containing \"{expected}\", compile succeeded"))
            }
            (Ok(compilation), None) => compilation,
        };

        if let Some(expected) = &self.expect.route_config {
            let default_listener = CompilerOptions::default().default_listener;
            let listener = self
                .expect
                .listener
                .as_deref()
                .or(self.options.as_ref().map(|o| o.default_listener.as_str()))
                .unwrap_or(&default_listener);
            let table = compilation
                .route_table(listener)
                .ok_or_else(|| format!("no route table for listener \"{listener}\""))?;
            let actual = serde_json::to_value(table).map_err(|e| e.to_string())?;
            if &actual != expected {
                return Err(format!(
                    "route_config mismatch\n  expected: {expected}\n  actual:   {actual}"
                ));
            }
        }

        if let Some(expected) = &self.expect.diagnostics {
            let actual: Vec<(String, String)> = compilation
                .diagnostics
                .iter()
                .map(|d| (d.resource.to_string(), d.kind.to_string()))
                .collect();
            if actual.len() != expected.len() {
                return Err(format!(
                    "expected {} diagnostics, got {}: {actual:?}",
                    expected.len(),
                    actual.len()
                ));
            }
            for (want, (resource, message)) in expected.iter().zip(&actual) {
                if &want.resource != resource || !message.contains(want.contains.as_str()) {
                    return Err(format!(
                        "diagnostic mismatch: expected {} containing \"{}\", got {resource}: {message}",
                        want.resource, want.contains
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_checks_inline_fixture() {
        let yaml = r#"
name: inline
snapshot:
  clusters: [httpbin]
  mappings:
    - name: httpbin
      prefix: /httpbin/
      cluster: httpbin
expect:
  route_config:
    name: listener-8080-routes
    virtual_hosts:
      - name: "*"
        domains: ["*"]
        routes:
          - name: httpbin
            match: { prefix: /httpbin/ }
            route: { cluster: httpbin, timeout: 3.000s }
"#;
        let fixture = CompileFixture::from_yaml(yaml).unwrap();
        fixture.check().unwrap();
    }

    #[test]
    fn mismatch_is_reported() {
        let yaml = r#"
name: wrong_timeout
snapshot:
  clusters: [c]
  mappings: [{ name: m, prefix: /, cluster: c }]
expect:
  route_config:
    name: listener-8080-routes
    virtual_hosts:
      - name: "*"
        domains: ["*"]
        routes:
          - name: m
            match: { prefix: / }
            route: { cluster: c, timeout: 9.000s }
"#;
        let err = CompileFixture::from_yaml(yaml).unwrap().check().unwrap_err();
        assert!(err.contains("route_config mismatch"));
    }

    #[test]
    fn multi_document() {
        let yaml = "name: a\nsnapshot: {}\nexpect: {}\n---\nname: b\nsnapshot: {}\nexpect: {}\n";
        let fixtures = CompileFixture::from_yaml_multi(yaml).unwrap();
        assert_eq!(fixtures.len(), 2);
        assert!(fixtures.iter().all(|f| f.check().is_ok()));
    }
}
