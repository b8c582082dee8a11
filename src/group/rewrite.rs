//! The extraction rewrite.
//!
//! Creates the interface node pair and the call node, replaces every
//! boundary link with links through them and notifies the graph model.
//! Mutations are recorded in a [`Journal`] so a failing rewrite can be
//! undone.

use tracing::{debug, warn};
use uuid::Uuid;

use super::boundary::{Boundary, Connection};
use crate::config::GroupConfig;
use crate::error::{GroupError, Result};
use crate::graph::{
    GraphModel, Link, LinkId, NewNode, NodeId, Position, Socket, SocketDirection, SocketRef,
};

/// Nodes created by a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Group input defining the new subprogram.
    pub input_node: NodeId,
    pub output_node: NodeId,
    /// Call node that replaced the selection in its network.
    pub call_node: NodeId,
    /// Identifier of the new subprogram (the group input's identifier).
    pub subprogram: Uuid,
    /// The boundary that was rewired.
    pub boundary: Boundary,
}

/// A mutation applied during the rewrite.
#[derive(Debug, Clone)]
enum Action {
    AddedNode(NodeId),
    AddedLink(LinkId),
    RemovedLink(Link),
}

/// Ordered log of applied mutations, replayed backwards on failure.
#[derive(Debug, Default)]
pub struct Journal {
    actions: Vec<Action>,
}

impl Journal {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    fn add_node<G: GraphModel + ?Sized>(&mut self, graph: &mut G, node: NewNode) -> Result<NodeId> {
        let id = graph.add_node(node)?;
        self.actions.push(Action::AddedNode(id));
        Ok(id)
    }

    fn link<G: GraphModel + ?Sized>(
        &mut self,
        graph: &mut G,
        from: SocketRef,
        to: SocketRef,
    ) -> Result<LinkId> {
        // Linking replaces an existing origin; keep it so it can be restored.
        let replaced = graph.origin(to)?;
        let id = graph.link(from, to)?;
        if let Some(old) = replaced {
            self.actions.push(Action::RemovedLink(old));
        }
        self.actions.push(Action::AddedLink(id));
        Ok(id)
    }

    fn unlink<G: GraphModel + ?Sized>(&mut self, graph: &mut G, link: LinkId) -> Result<Link> {
        let removed = graph.unlink(link)?;
        self.actions.push(Action::RemovedLink(removed));
        Ok(removed)
    }

    /// Undo every recorded mutation, newest first.
    ///
    /// Restored links get new handles and are appended to the fan-out of
    /// their output socket.
    pub fn rollback<G: GraphModel + ?Sized>(self, graph: &mut G) {
        for action in self.actions.into_iter().rev() {
            let outcome = match action {
                Action::AddedLink(id) => graph.unlink(id).map(|_| ()),
                Action::RemovedLink(link) => graph.link(link.from, link.to).map(|_| ()),
                Action::AddedNode(id) => graph.remove_node(id),
            };
            if let Err(e) = outcome {
                warn!(error = %e, "rollback step failed");
            }
        }
    }
}

/// Selection placement used to position the new nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub centroid: Position,
    pub min_x: f32,
    pub max_x: f32,
}

impl Layout {
    /// Measure the data-flow nodes of `nodes`; frames and other layout-only
    /// nodes count only when nothing else is selected.
    pub fn measure<G: GraphModel + ?Sized>(graph: &G, nodes: &[NodeId]) -> Result<Self> {
        let mut flow = Vec::with_capacity(nodes.len());
        let mut other = Vec::new();
        for &node in nodes {
            let data = graph.node(node)?;
            if data.kind.is_data_flow() {
                flow.push(data.position);
            } else {
                other.push(data.position);
            }
        }
        let positions = if flow.is_empty() { other } else { flow };

        if positions.is_empty() {
            return Ok(Self {
                centroid: Position::default(),
                min_x: 0.0,
                max_x: 0.0,
            });
        }
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        for position in &positions {
            sum_x += position.x;
            sum_y += position.y;
            min_x = min_x.min(position.x);
            max_x = max_x.max(position.x);
        }
        let count = positions.len() as f32;
        Ok(Self {
            centroid: Position::new(sum_x / count, sum_y / count),
            min_x,
            max_x,
        })
    }
}

/// Perform the extraction on an accepted selection.
///
/// On failure the applied mutations are rolled back when
/// `extraction.rollback_on_failure` is set; otherwise they are left in
/// place and the error is returned as is.
pub fn rewrite<G: GraphModel + ?Sized>(
    graph: &mut G,
    nodes: &[NodeId],
    boundary: &Boundary,
    config: &GroupConfig,
) -> Result<Extraction> {
    let layout = Layout::measure(&*graph, nodes)?;
    let mut journal = Journal::default();

    let extraction = match apply(graph, boundary, config, &layout, &mut journal) {
        Ok(extraction) => extraction,
        Err(e) => {
            if config.extraction.rollback_on_failure {
                warn!(error = %e, steps = journal.len(), "rewrite failed, rolling back");
                journal.rollback(graph);
            } else {
                warn!(error = %e, steps = journal.len(), "rewrite failed, leaving partial state");
            }
            return Err(e);
        }
    };

    graph.highlight(nodes);
    if config.extraction.select_inserted {
        graph.select_only(&[
            extraction.input_node,
            extraction.output_node,
            extraction.call_node,
        ]);
    }
    graph.refresh_subprograms();
    Ok(extraction)
}

fn apply<G: GraphModel + ?Sized>(
    graph: &mut G,
    boundary: &Boundary,
    config: &GroupConfig,
    layout: &Layout,
    journal: &mut Journal,
) -> Result<Extraction> {
    let name = config.extraction.subprogram_name.as_str();
    let y = layout.centroid.y;

    let input_node = journal.add_node(
        graph,
        NewNode::group_input(name).at(layout.min_x - config.layout.input_offset, y),
    )?;
    let subprogram = graph.node(input_node)?.identifier;
    let mut parameters = Vec::with_capacity(boundary.inputs.len());
    for connection in &boundary.inputs {
        let data_type = socket(&*graph, connection.outer)?.data_type.clone();
        let label = socket(&*graph, connection.inner)?.display_name().to_string();
        parameters.push(graph.add_parameter(
            input_node,
            SocketDirection::Output,
            data_type,
            &label,
        )?);
    }

    let output_node = journal.add_node(
        graph,
        NewNode::group_output(subprogram).at(layout.max_x + config.layout.output_offset, y),
    )?;
    let returned = returned_sockets(&boundary.outputs);
    let mut returns = Vec::with_capacity(returned.len());
    for &slot in &returned {
        let inner = socket(&*graph, slot)?;
        let (data_type, label) = (inner.data_type.clone(), inner.display_name().to_string());
        returns.push(graph.add_parameter(
            output_node,
            SocketDirection::Input,
            data_type,
            &label,
        )?);
    }

    for connection in boundary.inputs.iter().chain(&boundary.outputs) {
        journal.unlink(graph, connection.link)?;
    }

    let call_node = journal.add_node(
        graph,
        NewNode::group_call(subprogram)
            .labeled(name)
            .at(layout.centroid.x, layout.centroid.y),
    )?;
    let arguments = mirror(graph, call_node, SocketDirection::Input, &parameters)?;
    let results = mirror(graph, call_node, SocketDirection::Output, &returns)?;

    wire_inputs(graph, journal, &boundary.inputs, &arguments, &parameters)?;
    wire_outputs(graph, journal, &boundary.outputs, &returned, &results, &returns)?;

    debug!(
        parameters = parameters.len(),
        returns = returns.len(),
        mutations = journal.len(),
        "rewrite applied"
    );

    Ok(Extraction {
        input_node,
        output_node,
        call_node,
        subprogram,
        boundary: boundary.clone(),
    })
}

/// Give the call node one socket per interface socket, same type and name.
fn mirror<G: GraphModel + ?Sized>(
    graph: &mut G,
    call_node: NodeId,
    direction: SocketDirection,
    interface: &[SocketRef],
) -> Result<Vec<SocketRef>> {
    let mut sockets = Vec::with_capacity(interface.len());
    for &slot in interface {
        let source = socket(&*graph, slot)?;
        let (data_type, label) = (source.data_type.clone(), source.name.clone());
        sockets.push(graph.add_parameter(call_node, direction, data_type, &label)?);
    }
    Ok(sockets)
}

fn wire_inputs<G: GraphModel + ?Sized>(
    graph: &mut G,
    journal: &mut Journal,
    connections: &[Connection],
    arguments: &[SocketRef],
    parameters: &[SocketRef],
) -> Result<()> {
    for ((connection, &argument), &parameter) in connections.iter().zip(arguments).zip(parameters) {
        journal.link(graph, connection.outer, argument)?;
        journal.link(graph, parameter, connection.inner)?;
    }
    Ok(())
}

/// Selected output sockets feeding the outside, each once, in boundary order.
///
/// A socket fanning out to several external targets becomes one return; the
/// call node output then fans out to the same targets.
fn returned_sockets(connections: &[Connection]) -> Vec<SocketRef> {
    let mut sockets: Vec<SocketRef> = Vec::new();
    for connection in connections {
        if !sockets.contains(&connection.inner) {
            sockets.push(connection.inner);
        }
    }
    sockets
}

fn wire_outputs<G: GraphModel + ?Sized>(
    graph: &mut G,
    journal: &mut Journal,
    connections: &[Connection],
    returned: &[SocketRef],
    results: &[SocketRef],
    returns: &[SocketRef],
) -> Result<()> {
    for ((&inner, &result), &ret) in returned.iter().zip(results).zip(returns) {
        journal.link(graph, inner, ret)?;
        for connection in connections.iter().filter(|c| c.inner == inner) {
            journal.link(graph, result, connection.outer)?;
        }
    }
    Ok(())
}

fn socket<G: GraphModel + ?Sized>(graph: &G, socket: SocketRef) -> Result<&Socket> {
    graph
        .node(socket.node)?
        .socket(socket.direction, socket.index)
        .ok_or(GroupError::SocketNotFound(socket))
}
