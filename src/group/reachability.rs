//! Reachability over links.
//!
//! The tree may hold cycles while the user is editing, so traversal keeps a
//! visited set instead of relying on a topological order.

use std::collections::{HashSet, VecDeque};

use crate::error::Result;
use crate::graph::{GraphModel, NodeId, SocketDirection, SocketRef};

/// Which way to follow links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Downstream: from outputs to the inputs they feed.
    Forward,
    /// Upstream: from inputs to the outputs feeding them.
    Backward,
}

/// All nodes reachable from `seeds`, seeds included.
pub fn reachable_from<G: GraphModel + ?Sized>(
    graph: &G,
    seeds: &[NodeId],
    direction: Direction,
) -> Result<HashSet<NodeId>> {
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut queue: VecDeque<NodeId> = VecDeque::new();

    for &seed in seeds {
        if visited.insert(seed) {
            queue.push_back(seed);
        }
    }

    while let Some(current) = queue.pop_front() {
        for next in neighbours(graph, current, direction)? {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    Ok(visited)
}

/// Nodes one link away from `node` in the given direction.
fn neighbours<G: GraphModel + ?Sized>(
    graph: &G,
    node: NodeId,
    direction: Direction,
) -> Result<Vec<NodeId>> {
    let data = graph.node(node)?;
    let mut found = Vec::new();
    match direction {
        Direction::Forward => {
            for index in 0..data.sockets(SocketDirection::Output).len() {
                for link in graph.targets(SocketRef::output(node, index))? {
                    found.push(link.to.node);
                }
            }
        }
        Direction::Backward => {
            for index in 0..data.sockets(SocketDirection::Input).len() {
                if let Some(link) = graph.origin(SocketRef::input(node, index))? {
                    found.push(link.from.node);
                }
            }
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::testing::{connect, float_node};
    use crate::graph::NodeTree;

    #[test]
    fn test_forward_and_backward() {
        let mut tree = NodeTree::new();
        let a = float_node(&mut tree, "A");
        let b = float_node(&mut tree, "B");
        let c = float_node(&mut tree, "C");
        let d = float_node(&mut tree, "D");
        connect(&mut tree, a, b);
        connect(&mut tree, b, c);

        let forward = reachable_from(&tree, &[b], Direction::Forward).unwrap();
        assert_eq!(forward, HashSet::from([b, c]));

        let backward = reachable_from(&tree, &[b], Direction::Backward).unwrap();
        assert_eq!(backward, HashSet::from([a, b]));

        let isolated = reachable_from(&tree, &[d], Direction::Forward).unwrap();
        assert_eq!(isolated, HashSet::from([d]));
    }

    #[test]
    fn test_terminates_on_cycle() {
        let mut tree = NodeTree::new();
        let a = float_node(&mut tree, "A");
        let b = float_node(&mut tree, "B");
        let c = float_node(&mut tree, "C");
        connect(&mut tree, a, b);
        connect(&mut tree, b, c);
        connect(&mut tree, c, a);

        let forward = reachable_from(&tree, &[a], Direction::Forward).unwrap();
        assert_eq!(forward.len(), 3);
        let backward = reachable_from(&tree, &[c], Direction::Backward).unwrap();
        assert_eq!(backward.len(), 3);
    }

    #[test]
    fn test_fan_out_is_followed() {
        let mut tree = NodeTree::new();
        let source = float_node(&mut tree, "Source");
        let left = float_node(&mut tree, "Left");
        let right = float_node(&mut tree, "Right");
        connect(&mut tree, source, left);
        connect(&mut tree, source, right);

        let forward = reachable_from(&tree, &[source], Direction::Forward).unwrap();
        assert_eq!(forward, HashSet::from([source, left, right]));
    }

    #[test]
    fn test_unknown_seed_is_an_error() {
        let mut tree = NodeTree::new();
        let a = float_node(&mut tree, "A");
        tree.remove_node(a).unwrap();
        assert!(reachable_from(&tree, &[a], Direction::Forward).is_err());
    }
}
