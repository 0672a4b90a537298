//! Retry and CORS policies in the proxy's route-action shape.

use serde::Serialize;

use crate::{CorsSpec, ProxyDuration, RetryPolicySpec};

/// Route retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_try_timeout: Option<ProxyDuration>,
}

impl From<&RetryPolicySpec> for RetryPolicy {
    fn from(spec: &RetryPolicySpec) -> Self {
        Self {
            retry_on: spec.retry_on.clone(),
            num_retries: spec.num_retries,
            per_try_timeout: spec.per_try_timeout_ms.map(ProxyDuration::from_millis),
        }
    }
}

/// Exact origin match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExactStringMatch {
    pub exact: String,
}

/// Route CORS policy. Header and method lists are joined with `", "`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorsPolicy {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_origin_string_match: Vec<ExactStringMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_methods: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_headers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expose_headers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_credentials: Option<bool>,
}

impl From<&CorsSpec> for CorsPolicy {
    fn from(spec: &CorsSpec) -> Self {
        Self {
            allow_origin_string_match: spec
                .origins
                .iter()
                .map(|origin| ExactStringMatch {
                    exact: origin.clone(),
                })
                .collect(),
            allow_methods: join(&spec.methods),
            allow_headers: join(&spec.headers),
            expose_headers: join(&spec.exposed_headers),
            max_age: spec.max_age.clone(),
            allow_credentials: spec.credentials,
        }
    }
}

fn join(items: &[String]) -> Option<String> {
    (!items.is_empty()).then(|| items.join(", "))
}
