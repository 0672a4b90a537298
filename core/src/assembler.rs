//! Config assembler: routes → virtual hosts → per-listener route tables.
//!
//! Routes declaring the same host domain are merged into one virtual host
//! and re-sorted; a repeated domain is never an error.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{CompileError, CompiledRoute, ListenerSpec, WILDCARD_DOMAIN};

/// Routes served for one host domain, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualHost {
    pub name: String,
    pub domains: Vec<String>,
    pub routes: Vec<CompiledRoute>,
}

/// All virtual hosts of one listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteTable {
    pub name: String,
    pub virtual_hosts: Vec<VirtualHost>,
}

impl RouteTable {
    /// Find the virtual host serving `domain`.
    #[must_use]
    pub fn virtual_host(&self, domain: &str) -> Option<&VirtualHost> {
        self.virtual_hosts
            .iter()
            .find(|vh| vh.domains.iter().any(|d| d == domain))
    }
}

/// Network-filter configuration for one listener, in the proxy's
/// connection-manager shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpConnectionManager {
    /// Listener this configuration is installed on. Not part of the filter shape.
    #[serde(skip)]
    pub listener: String,
    pub stat_prefix: String,
    pub route_config: RouteTable,
}

/// Group routes by domain into sorted virtual hosts.
///
/// Virtual hosts are ordered by domain with the wildcard last. Routes within
/// each are sorted by [`CompiledRoute::evaluation_order`].
#[must_use]
pub fn group_virtual_hosts(
    routes: impl IntoIterator<Item = (String, CompiledRoute)>,
) -> Vec<VirtualHost> {
    let mut by_domain: BTreeMap<String, Vec<CompiledRoute>> = BTreeMap::new();
    for (domain, route) in routes {
        by_domain.entry(domain).or_default().push(route);
    }

    let wildcard = by_domain.remove(WILDCARD_DOMAIN);
    by_domain
        .into_iter()
        .chain(wildcard.map(|routes| (WILDCARD_DOMAIN.to_owned(), routes)))
        .map(|(domain, mut routes)| {
            routes.sort_by(CompiledRoute::evaluation_order);
            VirtualHost {
                name: domain.clone(),
                domains: vec![domain],
                routes,
            }
        })
        .collect()
}

/// Wrap virtual hosts into one connection-manager config per listener.
///
/// Listeners are kept in input order; a repeated listener name is installed
/// once. Every listener receives the same virtual hosts.
///
/// # Errors
///
/// Returns [`CompileError::EmptyVirtualHost`] if any virtual host has no
/// routes.
pub fn assemble(
    listeners: &[ListenerSpec],
    default_stat_prefix: &str,
    virtual_hosts: &[VirtualHost],
) -> Result<Vec<HttpConnectionManager>, CompileError> {
    if let Some(empty) = virtual_hosts.iter().find(|vh| vh.routes.is_empty()) {
        return Err(CompileError::EmptyVirtualHost {
            domain: empty.name.clone(),
        });
    }

    let mut managers: Vec<HttpConnectionManager> = Vec::with_capacity(listeners.len());
    for listener in listeners {
        if managers.iter().any(|m| m.listener == listener.name) {
            continue;
        }
        managers.push(HttpConnectionManager {
            listener: listener.name.clone(),
            stat_prefix: listener
                .stat_prefix
                .clone()
                .unwrap_or_else(|| default_stat_prefix.to_owned()),
            route_config: RouteTable {
                name: format!("{}-routes", listener.name),
                virtual_hosts: virtual_hosts.to_vec(),
            },
        });
    }

    Ok(managers)
}
