//! Saving and loading node trees.
//!
//! A tree is written as a [`TreeDocument`]: the node list followed by links
//! addressed by node name and socket position. Files ending in `.bin` use
//! bincode, anything else pretty-printed JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::model::GraphModel;
use super::tree::NodeTree;
use super::types::*;
use crate::error::{GroupError, Result};

const DOCUMENT_VERSION: u32 = 1;

/// Serializable form of a node tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub nodes: Vec<NodeData>,
    /// Links in creation order.
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

/// A link addressed by node names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub from_node: String,
    pub from_socket: usize,
    pub to_node: String,
    pub to_socket: usize,
}

impl NodeTree {
    /// Snapshot the tree as a document.
    pub fn to_document(&self) -> TreeDocument {
        let graph = self.inner_graph();
        let links = self
            .links()
            .into_iter()
            .map(|link| LinkRecord {
                from_node: graph[link.from.node.0].name.clone(),
                from_socket: link.from.index,
                to_node: graph[link.to.node.0].name.clone(),
                to_socket: link.to.index,
            })
            .collect();
        TreeDocument {
            version: DOCUMENT_VERSION,
            nodes: graph.node_weights().cloned().collect(),
            links,
        }
    }

    /// Rebuild a tree from a document. The subprogram registry is refreshed.
    pub fn from_document(document: TreeDocument) -> Result<Self> {
        if document.version > DOCUMENT_VERSION {
            return Err(GroupError::Document(format!(
                "unsupported document version {}",
                document.version
            )));
        }

        let mut tree = NodeTree::new();
        for node in document.nodes {
            tree.insert_node_data(node)?;
        }

        for record in document.links {
            let from = tree
                .find(&record.from_node)
                .ok_or_else(|| GroupError::UnknownNode(record.from_node.clone()))?;
            let to = tree
                .find(&record.to_node)
                .ok_or_else(|| GroupError::UnknownNode(record.to_node.clone()))?;
            let to_socket = SocketRef::input(to, record.to_socket);
            if tree.origin(to_socket)?.is_some() {
                return Err(GroupError::Document(format!(
                    "input {} of {} has more than one origin",
                    record.to_socket, record.to_node
                )));
            }
            tree.link(SocketRef::output(from, record.from_socket), to_socket)?;
        }

        tree.refresh_subprograms();
        Ok(tree)
    }

    /// Save the tree to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let document = self.to_document();
        let bytes = if is_binary(path) {
            bincode::serialize(&document)?
        } else {
            serde_json::to_vec_pretty(&document)?
        };
        fs::write(path, bytes)?;
        debug!(path = %path.display(), nodes = document.nodes.len(), "tree saved");
        Ok(())
    }

    /// Load a tree from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let document: TreeDocument = if is_binary(path) {
            bincode::deserialize(&bytes)?
        } else {
            serde_json::from_slice(&bytes)?
        };
        let tree = Self::from_document(document)?;
        info!(
            path = %path.display(),
            nodes = tree.node_count(),
            links = tree.link_count(),
            "tree loaded"
        );
        Ok(tree)
    }
}

fn is_binary(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "bin")
}
