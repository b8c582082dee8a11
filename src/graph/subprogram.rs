//! Registry of the subprograms defined in a tree.
//!
//! A subprogram is a group input node plus the group output that
//! references it. The registry is a cache; it is rebuilt through
//! [`GraphModel::refresh_subprograms`](super::GraphModel::refresh_subprograms)
//! after interface nodes change.

use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::types::*;

/// One parameter or return slot of a subprogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub data_type: DataType,
}

/// A callable unit defined by an interface node pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subprogram {
    pub identifier: Uuid,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub returns: Vec<Parameter>,
    /// Whether a group output references the input.
    pub has_output: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SubprogramRegistry {
    entries: Vec<Subprogram>,
    by_identifier: HashMap<Uuid, usize>,
}

impl SubprogramRegistry {
    pub(crate) fn rebuild(graph: &StableDiGraph<NodeData, LinkData>) -> Self {
        let mut returns: HashMap<Uuid, Vec<Parameter>> = HashMap::new();
        for node in graph.node_weights() {
            if let NodeKind::GroupOutput {
                group_input: Some(id),
            } = node.kind
            {
                returns
                    .entry(id)
                    .or_insert_with(|| parameters(&node.inputs));
            }
        }

        let mut registry = SubprogramRegistry::default();
        for node in graph.node_weights() {
            if let NodeKind::GroupInput { subprogram_name } = &node.kind {
                let own_returns = returns.get(&node.identifier);
                let entry = Subprogram {
                    identifier: node.identifier,
                    name: subprogram_name.clone(),
                    parameters: parameters(&node.outputs),
                    returns: own_returns.cloned().unwrap_or_default(),
                    has_output: own_returns.is_some(),
                };
                registry
                    .by_identifier
                    .insert(entry.identifier, registry.entries.len());
                registry.entries.push(entry);
            }
        }
        registry
    }

    pub fn get(&self, identifier: &Uuid) -> Option<&Subprogram> {
        self.by_identifier
            .get(identifier)
            .map(|&position| &self.entries[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subprogram> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parameters(sockets: &[Socket]) -> Vec<Parameter> {
    sockets
        .iter()
        .filter(|s| !s.is_extra)
        .map(|s| Parameter {
            name: s.display_name().to_string(),
            data_type: s.data_type.clone(),
        })
        .collect()
}
