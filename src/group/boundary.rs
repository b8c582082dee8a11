//! Boundary classification: which links cross the selection and in which
//! direction.

use std::collections::HashSet;

use crate::error::Result;
use crate::graph::{GraphModel, LinkId, NodeId, SocketDirection, SocketRef};

/// A link crossing the selection boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Socket on the selected node.
    pub inner: SocketRef,
    /// Socket on the node outside the selection.
    pub outer: SocketRef,
    /// The crossing link, superseded by extraction.
    pub link: LinkId,
}

/// Crossing links of a selection, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Boundary {
    /// External origin feeding a selected input.
    pub inputs: Vec<Connection>,
    /// Selected output feeding an external input.
    pub outputs: Vec<Connection>,
}

impl Boundary {
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inputs.len() + self.outputs.len()
    }
}

/// Classify the links crossing the selection.
///
/// Order is selection order, then socket order, then fan-out order; it
/// fixes the parameter order of the extracted subprogram. Non data-flow
/// nodes are skipped and links between selected nodes are ignored.
pub fn classify_boundary<G: GraphModel + ?Sized>(graph: &G, nodes: &[NodeId]) -> Result<Boundary> {
    let selected: HashSet<NodeId> = nodes.iter().copied().collect();
    let mut boundary = Boundary::default();

    for &node in nodes {
        let data = graph.node(node)?;
        if !data.kind.is_data_flow() {
            continue;
        }

        for index in 0..data.sockets(SocketDirection::Input).len() {
            let inner = SocketRef::input(node, index);
            if let Some(link) = graph.origin(inner)? {
                if !selected.contains(&link.from.node) {
                    boundary.inputs.push(Connection {
                        inner,
                        outer: link.from,
                        link: link.id,
                    });
                }
            }
        }

        for index in 0..data.sockets(SocketDirection::Output).len() {
            let inner = SocketRef::output(node, index);
            for link in graph.targets(inner)? {
                if !selected.contains(&link.to.node) {
                    boundary.outputs.push(Connection {
                        inner,
                        outer: link.to,
                        link: link.id,
                    });
                }
            }
        }
    }

    Ok(boundary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NewNode, NodeTree, Socket};
    use crate::group::testing::{connect, float_node};

    #[test]
    fn test_internal_links_are_ignored() {
        let mut tree = NodeTree::new();
        let a = float_node(&mut tree, "A");
        let b = float_node(&mut tree, "B");
        let c = float_node(&mut tree, "C");
        let d = float_node(&mut tree, "D");
        connect(&mut tree, a, b);
        let inner = connect(&mut tree, b, c);
        connect(&mut tree, c, d);

        let boundary = classify_boundary(&tree, &[b, c]).unwrap();
        assert_eq!(boundary.inputs.len(), 1);
        assert_eq!(boundary.outputs.len(), 1);
        assert_eq!(boundary.inputs[0].inner, SocketRef::input(b, 0));
        assert_eq!(boundary.inputs[0].outer, SocketRef::output(a, 0));
        assert_eq!(boundary.outputs[0].inner, SocketRef::output(c, 0));
        assert_eq!(boundary.outputs[0].outer, SocketRef::input(d, 0));
        assert!(boundary
            .inputs
            .iter()
            .chain(&boundary.outputs)
            .all(|conn| conn.link != inner));
    }

    #[test]
    fn test_fan_out_contributes_one_entry_per_external_target() {
        let mut tree = NodeTree::new();
        let x = float_node(&mut tree, "X");
        let b = float_node(&mut tree, "B");
        let c = float_node(&mut tree, "C");
        let y = float_node(&mut tree, "Y");
        connect(&mut tree, x, b);
        connect(&mut tree, x, y);
        connect(&mut tree, x, c);

        let boundary = classify_boundary(&tree, &[x, y]).unwrap();
        let outer: Vec<NodeId> = boundary.outputs.iter().map(|c| c.outer.node).collect();
        assert_eq!(outer, vec![b, c]);
        assert!(boundary.inputs.is_empty());
    }

    #[test]
    fn test_order_follows_selection_then_sockets() {
        let mut tree = NodeTree::new();
        let src = float_node(&mut tree, "Source");
        let wide = tree
            .add_node(
                NewNode::function("an_VectorFromValuesNode")
                    .named("Combine")
                    .input(Socket::new("X", "Float"))
                    .input(Socket::new("Y", "Float"))
                    .input(Socket::new("Z", "Float"))
                    .output(Socket::new("Vector", "Vector")),
            )
            .unwrap();
        let other = float_node(&mut tree, "Other");
        tree.link(SocketRef::output(src, 0), SocketRef::input(wide, 2))
            .unwrap();
        tree.link(SocketRef::output(src, 0), SocketRef::input(other, 0))
            .unwrap();
        tree.link(SocketRef::output(src, 0), SocketRef::input(wide, 0))
            .unwrap();

        let boundary = classify_boundary(&tree, &[other, wide]).unwrap();
        let inner: Vec<SocketRef> = boundary.inputs.iter().map(|c| c.inner).collect();
        assert_eq!(
            inner,
            vec![
                SocketRef::input(other, 0),
                SocketRef::input(wide, 0),
                SocketRef::input(wide, 2),
            ]
        );
    }

    #[test]
    fn test_frames_are_skipped() {
        let mut tree = NodeTree::new();
        let frame = tree
            .add_node(NewNode::new(crate::graph::NodeKind::Frame))
            .unwrap();
        let boundary = classify_boundary(&tree, &[frame]).unwrap();
        assert!(boundary.is_empty());
    }
}
