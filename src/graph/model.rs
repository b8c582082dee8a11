//! The graph model seen by the extraction core.
//!
//! The core never touches storage directly; it reads and mutates the graph
//! through this trait. [`NodeTree`](super::NodeTree) is the in-memory
//! implementation.

use super::types::*;
use crate::error::Result;

/// Read/write view of a node graph.
pub trait GraphModel {
    /// Data of a node: kind, sockets, restrictions, position.
    fn node(&self, id: NodeId) -> Result<&NodeData>;

    /// The link feeding an input socket, if any.
    fn origin(&self, input: SocketRef) -> Result<Option<Link>>;

    /// Links leaving an output socket, in creation order.
    fn targets(&self, output: SocketRef) -> Result<Vec<Link>>;

    /// The network a node belongs to.
    fn network(&self, id: NodeId) -> Result<Network>;

    fn add_node(&mut self, node: NewNode) -> Result<NodeId>;

    /// Add a parameter socket to an interface or call node.
    ///
    /// On nodes with a trailing extra socket the new socket is inserted
    /// right before it.
    fn add_parameter(
        &mut self,
        node: NodeId,
        direction: SocketDirection,
        data_type: DataType,
        name: &str,
    ) -> Result<SocketRef>;

    /// Link an output socket to an input socket. An existing origin of
    /// the input is replaced.
    fn link(&mut self, from: SocketRef, to: SocketRef) -> Result<LinkId>;

    fn unlink(&mut self, link: LinkId) -> Result<Link>;

    fn remove_node(&mut self, id: NodeId) -> Result<()>;

    fn selected_nodes(&self) -> Vec<NodeId>;

    /// Select exactly these nodes, deselecting everything else.
    fn select_only(&mut self, nodes: &[NodeId]);

    /// Mark nodes for highlighting in the editor.
    fn highlight(&mut self, nodes: &[NodeId]);

    /// Rebuild cached subprogram information after interface nodes changed.
    fn refresh_subprograms(&mut self);

    fn node_count(&self) -> usize;

    fn link_count(&self) -> usize;
}
