//! # nodegroup
//!
//! Subprogram extraction for node trees.
//!
//! A node tree is a dataflow graph of nodes with typed sockets. This crate
//! takes a selection of nodes and turns it into a subprogram: the selected
//! nodes get a group input and a group output, and their place in the
//! original network is taken by a single call node.
//!
//! ## Key Features
//!
//! - **Checked up front**: restricted nodes, incompatible networks and
//!   dependency cycles are rejected before anything is mutated
//! - **Stable interface**: parameter order follows selection, socket and
//!   link order
//! - **Rollback**: a rewrite that fails midway is undone
//! - **Persistent**: trees are saved as JSON or bincode
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nodegroup::{extract_subprogram, GroupConfig, NodeTree};
//! use std::path::Path;
//!
//! let mut tree = NodeTree::load(Path::new("tree.json")).unwrap();
//! let selection = tree.resolve_names(&["Noise", "Mix"]).unwrap();
//!
//! let extraction = extract_subprogram(&mut tree, &selection, &GroupConfig::default()).unwrap();
//! println!("new subprogram {}", extraction.subprogram);
//! tree.save(Path::new("tree.json")).unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod group;

// Re-exports for convenience
pub use config::GroupConfig;
pub use error::{GroupError, Rejection, Result};

// Graph re-exports
pub use graph::{GraphModel, NetworkKind, NewNode, NodeId, NodeKind, NodeTree, Socket, SocketRef};

// Extraction
pub use group::{check_selection, extract_selected, extract_subprogram, Boundary, Extraction};
