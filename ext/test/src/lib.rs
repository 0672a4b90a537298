//! routegen-test: conformance fixtures for the routegen compiler
//!
//! A fixture is one YAML document holding a resource snapshot and what the
//! compiler must produce for it: the route configuration of a listener, a set
//! of expected diagnostics, or a fatal error.
//!
//! ```yaml
//! name: timeout_ms_module
//! snapshot:
//!   modules: [{ name: ambassador, cluster_request_timeout_ms: 4000 }]
//!   clusters: [httpbin]
//!   mappings: [{ name: httpbin, prefix: /httpbin/, cluster: httpbin }]
//! expect:
//!   route_config:
//!     name: listener-8080-routes
//!     virtual_hosts: [...]
//! ```

pub mod fixture;

pub use fixture::{CompileFixture, ExpectedDiagnostic, Expectation};
