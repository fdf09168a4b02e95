//! Startup ordering for the runtime's services.
//!
//! Services declare what they depend on; the dependency graph is sorted
//! topologically and [`crate::runtime::Runtime::assemble`] builds services in
//! that order.

use chainspawn_core::error::{CoreError, Result};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceName {
    Config,
    Metrics,
    BlockSource,
    Rng,
    Derivation,
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceName::Config => "config",
            ServiceName::Metrics => "metrics",
            ServiceName::BlockSource => "block_source",
            ServiceName::Rng => "rng",
            ServiceName::Derivation => "derivation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: ServiceName,
    pub depends_on: &'static [ServiceName],
}

/// Services of a standard runtime.
pub const SERVICES: &[ServiceSpec] = &[
    ServiceSpec {
        name: ServiceName::Derivation,
        depends_on: &[ServiceName::Rng, ServiceName::Metrics, ServiceName::Config],
    },
    ServiceSpec {
        name: ServiceName::Rng,
        depends_on: &[ServiceName::Config, ServiceName::BlockSource],
    },
    ServiceSpec {
        name: ServiceName::BlockSource,
        depends_on: &[ServiceName::Config],
    },
    ServiceSpec {
        name: ServiceName::Metrics,
        depends_on: &[],
    },
    ServiceSpec {
        name: ServiceName::Config,
        depends_on: &[],
    },
];

/// Orders `specs` so every service follows its dependencies.
///
/// Fails on duplicate names, dependencies that are not part of `specs`, and
/// cycles.
pub fn startup_order(specs: &[ServiceSpec]) -> Result<Vec<ServiceName>> {
    let mut graph = DiGraph::<ServiceName, ()>::new();
    let mut nodes: HashMap<ServiceName, NodeIndex> = HashMap::new();

    for spec in specs {
        if nodes.contains_key(&spec.name) {
            return Err(CoreError::startup(format!(
                "service {} registered twice",
                spec.name
            )));
        }
        nodes.insert(spec.name, graph.add_node(spec.name));
    }

    for spec in specs {
        let node = nodes[&spec.name];
        for dependency in spec.depends_on {
            let Some(&dep_node) = nodes.get(dependency) else {
                return Err(CoreError::startup(format!(
                    "service {} depends on unregistered {}",
                    spec.name, dependency
                )));
            };
            graph.add_edge(dep_node, node, ());
        }
    }

    let order = toposort(&graph, None).map_err(|cycle| {
        CoreError::startup(format!(
            "dependency cycle involving {}",
            graph[cycle.node_id()]
        ))
    })?;
    Ok(order.into_iter().map(|idx| graph[idx]).collect())
}
