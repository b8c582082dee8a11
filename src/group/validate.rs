//! Selection validation: decides whether a selection may become a
//! subprogram before anything is mutated.

use std::collections::HashSet;
use tracing::debug;

use super::reachability::{reachable_from, Direction};
use crate::error::{Rejection, Result};
use crate::graph::{GraphModel, NetworkKind, NodeId};

/// Run the selection checks in order; the first failing one is reported.
///
/// 1. no selected node carries the "no subprogram" restriction;
/// 2. the touched networks are compatible;
/// 3. no unselected node is both upstream and downstream of the selection.
///
/// The check for external links needs the boundary and is done by
/// [`extract_subprogram`](super::extract_subprogram).
pub fn validate_selection<G: GraphModel + ?Sized>(graph: &G, nodes: &[NodeId]) -> Result<()> {
    check_eligibility(graph, nodes)?;
    check_networks(graph, nodes)?;
    check_dependencies(graph, nodes)?;
    Ok(())
}

pub fn check_eligibility<G: GraphModel + ?Sized>(graph: &G, nodes: &[NodeId]) -> Result<()> {
    for &node in nodes {
        if graph.node(node)?.restrictions.no_subprogram {
            return Err(Rejection::IneligibleNode { node }.into());
        }
    }
    Ok(())
}

/// Networks are compatible when they are all main networks, or when they
/// are all the same subnetwork.
pub fn check_networks<G: GraphModel + ?Sized>(graph: &G, nodes: &[NodeId]) -> Result<()> {
    let mut networks = HashSet::new();
    for &node in nodes {
        if graph.node(node)?.kind.is_data_flow() {
            networks.insert(graph.network(node)?);
        }
    }

    let mut main_count = 0;
    let mut subnetworks = HashSet::new();
    for network in &networks {
        match network.kind {
            NetworkKind::Invalid => {
                debug!(network = network.id.0, "selection touches an invalid network");
                return Err(Rejection::IncompatibleNetworks.into());
            }
            NetworkKind::Main => main_count += 1,
            NetworkKind::Subnetwork(id) => {
                subnetworks.insert(id);
            }
        }
    }

    if main_count == networks.len() || (subnetworks.len() == 1 && main_count == 0) {
        Ok(())
    } else {
        Err(Rejection::IncompatibleNetworks.into())
    }
}

/// Reject selections whose extraction would create a dependency cycle
/// through the new call node.
pub fn check_dependencies<G: GraphModel + ?Sized>(graph: &G, nodes: &[NodeId]) -> Result<()> {
    let dependencies = reachable_from(graph, nodes, Direction::Backward)?;
    let dependents = reachable_from(graph, nodes, Direction::Forward)?;
    let selected: HashSet<NodeId> = nodes.iter().copied().collect();

    let mut invalid: Vec<NodeId> = dependencies
        .intersection(&dependents)
        .filter(|node| !selected.contains(node))
        .copied()
        .collect();

    if invalid.is_empty() {
        return Ok(());
    }
    invalid.sort();
    Err(Rejection::InvalidDependencyCycle { nodes: invalid }.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NewNode, NodeTree, SocketDirection, SocketRef};
    use crate::group::testing::{connect, float_node};

    fn rejection(result: Result<()>) -> Rejection {
        result.unwrap_err().rejection().cloned().unwrap()
    }

    #[test]
    fn test_restricted_node_is_ineligible() {
        let mut tree = NodeTree::new();
        let a = float_node(&mut tree, "A");
        let b = tree
            .add_node(NewNode::function("an_LoopInputNode").named("Loop").no_subprogram())
            .unwrap();

        assert_eq!(
            rejection(validate_selection(&tree, &[a, b])),
            Rejection::IneligibleNode { node: b }
        );
    }

    #[test]
    fn test_eligibility_is_checked_before_networks() {
        let mut tree = NodeTree::new();
        let input = tree.add_node(NewNode::group_input("Group")).unwrap();
        let dangling = tree
            .add_node(NewNode::group_output(uuid::Uuid::new_v4()))
            .unwrap();
        let err = rejection(validate_selection(&tree, &[dangling, input]));
        assert!(matches!(err, Rejection::IneligibleNode { node } if node == dangling));
    }

    #[test]
    fn test_main_networks_are_compatible() {
        let mut tree = NodeTree::new();
        let a = float_node(&mut tree, "A");
        let b = float_node(&mut tree, "B");
        // Two separate main networks.
        assert!(check_networks(&tree, &[a, b]).is_ok());
    }

    fn subnetwork(tree: &mut NodeTree, name: &str) -> (NodeId, NodeId) {
        let input = tree.add_node(NewNode::group_input(name)).unwrap();
        let param = tree
            .add_parameter(input, SocketDirection::Output, "Float".into(), "x")
            .unwrap();
        let body = float_node(tree, &format!("{} Body", name));
        let other = float_node(tree, &format!("{} Other", name));
        tree.link(param, SocketRef::input(body, 0)).unwrap();
        connect(tree, body, other);
        (body, other)
    }

    #[test]
    fn test_single_subnetwork_is_compatible() {
        let mut tree = NodeTree::new();
        let (body, other) = subnetwork(&mut tree, "One");
        assert!(check_networks(&tree, &[body, other]).is_ok());
    }

    #[test]
    fn test_two_subnetworks_are_incompatible() {
        let mut tree = NodeTree::new();
        let (first, _) = subnetwork(&mut tree, "One");
        let (second, _) = subnetwork(&mut tree, "Two");
        assert_eq!(
            rejection(check_networks(&tree, &[first, second])),
            Rejection::IncompatibleNetworks
        );
    }

    #[test]
    fn test_main_and_subnetwork_are_incompatible() {
        let mut tree = NodeTree::new();
        let (body, _) = subnetwork(&mut tree, "One");
        let main = float_node(&mut tree, "Main");
        assert_eq!(
            rejection(check_networks(&tree, &[body, main])),
            Rejection::IncompatibleNetworks
        );
    }

    #[test]
    fn test_invalid_network_is_refused() {
        let mut tree = NodeTree::new();
        let input = tree.add_node(NewNode::group_input("Group")).unwrap();
        let id = tree.node(input).unwrap().identifier;
        let call = tree.add_node(NewNode::group_call(id)).unwrap();
        let param = tree
            .add_parameter(input, SocketDirection::Output, "Float".into(), "x")
            .unwrap();
        let arg = tree
            .add_parameter(call, SocketDirection::Input, "Float".into(), "x")
            .unwrap();
        tree.link(param, arg).unwrap();

        assert_eq!(
            rejection(check_networks(&tree, &[call])),
            Rejection::IncompatibleNetworks
        );
    }

    #[test]
    fn test_node_between_selected_nodes_is_a_cycle() {
        // A -> D -> C with {A, C} selected: D would feed and consume the call.
        let mut tree = NodeTree::new();
        let a = float_node(&mut tree, "A");
        let d = float_node(&mut tree, "D");
        let c = float_node(&mut tree, "C");
        connect(&mut tree, a, d);
        connect(&mut tree, d, c);

        assert_eq!(
            rejection(check_dependencies(&tree, &[a, c])),
            Rejection::InvalidDependencyCycle { nodes: vec![d] }
        );
        assert!(check_dependencies(&tree, &[a, d, c]).is_ok());
    }

    #[test]
    fn test_transient_cycle_through_selection() {
        let mut tree = NodeTree::new();
        let a = float_node(&mut tree, "A");
        let b = float_node(&mut tree, "B");
        let c = float_node(&mut tree, "C");
        connect(&mut tree, a, b);
        connect(&mut tree, b, c);
        connect(&mut tree, c, a);

        let err = rejection(check_dependencies(&tree, &[b]));
        assert_eq!(err, Rejection::InvalidDependencyCycle { nodes: vec![a, c] });
    }

    #[test]
    fn test_plain_chain_has_no_invalid_dependencies() {
        let mut tree = NodeTree::new();
        let a = float_node(&mut tree, "A");
        let b = float_node(&mut tree, "B");
        let c = float_node(&mut tree, "C");
        connect(&mut tree, a, b);
        connect(&mut tree, b, c);
        assert!(check_dependencies(&tree, &[b]).is_ok());
    }
}
