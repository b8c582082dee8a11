//! Subprogram extraction.
//!
//! Turns a selection of nodes into a subprogram: the selection keeps its
//! nodes, gains a group input/output pair, and is replaced in its original
//! network by a single call node.
//!
//! ```text
//!  A ──▶ X ──▶ B         A ──▶ [Group] ──▶ B
//!                  =>
//!                        [Group Input] ──▶ X ──▶ [Group Output]
//! ```

pub mod boundary;
pub mod reachability;
pub mod rewrite;
pub mod validate;

pub use boundary::{classify_boundary, Boundary, Connection};
pub use reachability::{reachable_from, Direction};
pub use rewrite::{rewrite, Extraction, Journal, Layout};
pub use validate::{check_dependencies, check_eligibility, check_networks, validate_selection};

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::config::GroupConfig;
use crate::error::{Rejection, Result};
use crate::graph::{GraphModel, NodeId};

/// Check a selection without mutating the graph.
///
/// Returns the boundary the extraction would rewire. Duplicate entries in
/// `selection` are ignored.
pub fn check_selection<G: GraphModel + ?Sized>(graph: &G, selection: &[NodeId]) -> Result<Boundary> {
    let nodes = dedup(selection);
    validate_selection(graph, &nodes)?;
    let boundary = classify_boundary(graph, &nodes)?;
    if boundary.is_empty() {
        return Err(Rejection::NoExternalLinks.into());
    }
    Ok(boundary)
}

/// Extract `selection` into a new subprogram.
///
/// The graph is left untouched when the selection is rejected.
pub fn extract_subprogram<G: GraphModel + ?Sized>(
    graph: &mut G,
    selection: &[NodeId],
    config: &GroupConfig,
) -> Result<Extraction> {
    let nodes = dedup(selection);
    debug!(nodes = nodes.len(), "extracting subprogram");

    let boundary = match check_selection(&*graph, &nodes) {
        Ok(boundary) => boundary,
        Err(e) => {
            if let Some(rejection) = e.rejection() {
                warn!(reason = %rejection, "selection rejected");
            }
            return Err(e);
        }
    };

    let extraction = rewrite(graph, &nodes, &boundary, config)?;
    info!(
        nodes = nodes.len(),
        parameters = extraction.boundary.inputs.len(),
        outgoing = extraction.boundary.outputs.len(),
        subprogram = %extraction.subprogram,
        "subprogram extracted"
    );
    Ok(extraction)
}

/// Extract the nodes currently selected in the graph.
pub fn extract_selected<G: GraphModel + ?Sized>(
    graph: &mut G,
    config: &GroupConfig,
) -> Result<Extraction> {
    let selection = graph.selected_nodes();
    extract_subprogram(graph, &selection, config)
}

fn dedup(selection: &[NodeId]) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    selection
        .iter()
        .copied()
        .filter(|node| seen.insert(*node))
        .collect()
}


#[cfg(test)]
mod tests {
    use super::testing::{connect, float_node};
    use super::*;
    use crate::graph::NodeTree;

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut tree = NodeTree::new();
        let a = float_node(&mut tree, "A");
        let b = float_node(&mut tree, "B");
        assert_eq!(dedup(&[b, a, b, a]), vec![b, a]);
    }

    #[test]
    fn test_isolated_selection_has_no_external_links() {
        let mut tree = NodeTree::new();
        let a = float_node(&mut tree, "A");
        let b = float_node(&mut tree, "B");
        connect(&mut tree, a, b);

        let err = extract_subprogram(&mut tree, &[a, b], &GroupConfig::default()).unwrap_err();
        assert_eq!(err.rejection(), Some(&Rejection::NoExternalLinks));
        assert_eq!(tree.node_count(), 2);
        assert_eq!(tree.link_count(), 1);
    }

    #[test]
    fn test_extract_selected_uses_graph_selection() {
        let mut tree = NodeTree::new();
        let a = float_node(&mut tree, "A");
        let x = float_node(&mut tree, "X");
        connect(&mut tree, a, x);
        tree.set_selected(x, true).unwrap();

        let extraction = extract_selected(&mut tree, &GroupConfig::default()).unwrap();
        assert_eq!(extraction.boundary.inputs.len(), 1);
        assert!(extraction.boundary.outputs.is_empty());
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let mut tree = NodeTree::new();
        float_node(&mut tree, "A");
        let err = extract_selected(&mut tree, &GroupConfig::default()).unwrap_err();
        assert_eq!(err.rejection(), Some(&Rejection::NoExternalLinks));
    }
}
