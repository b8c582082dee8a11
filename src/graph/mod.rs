//! Node graph module: the data model the extraction core works on.
//!
//! Provides the graph model trait, the in-memory node tree, network
//! analysis, the subprogram registry and persistence.

pub mod model;
pub mod network;
pub mod persistence;
pub mod subprogram;
pub mod tree;
pub mod types;

pub use model::GraphModel;
pub use network::NetworkIndex;
pub use persistence::{LinkRecord, TreeDocument};
pub use subprogram::{Parameter, Subprogram, SubprogramRegistry};
pub use tree::{NodeTree, TreeStats};
pub use types::{
    DataType, Link, LinkId, Network, NetworkId, NetworkKind, NewNode, NodeData, NodeId, NodeKind,
    Position, Restrictions, Socket, SocketDirection, SocketRef,
};
