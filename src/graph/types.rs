//! Core types for the node tree.
//!
//! Defines node kinds, sockets, links, networks and the handles used to
//! address them.

use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Handle of a node inside a [`NodeTree`](super::NodeTree).
///
/// Handles stay valid while other nodes are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) NodeIndex);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0.index()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0.index())
    }
}

/// Handle of a link inside a node tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub(crate) EdgeIndex);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}", self.0.index())
    }
}

/// Which side of a node a socket sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketDirection {
    Input,
    Output,
}

impl fmt::Display for SocketDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketDirection::Input => write!(f, "in"),
            SocketDirection::Output => write!(f, "out"),
        }
    }
}

/// Address of a socket: owning node, side and position on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketRef {
    pub node: NodeId,
    pub direction: SocketDirection,
    pub index: usize,
}

impl SocketRef {
    pub fn input(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: SocketDirection::Input,
            index,
        }
    }

    pub fn output(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: SocketDirection::Output,
            index,
        }
    }
}

impl fmt::Display for SocketRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}[{}]", self.node, self.direction, self.index)
    }
}

/// Opaque data type tag of a socket (e.g. "Integer", "Vector").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataType(pub String);

impl DataType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DataType {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A socket on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Socket {
    /// Internal socket name.
    pub name: String,
    /// Optional text shown instead of the name.
    #[serde(default)]
    pub text: Option<String>,
    pub data_type: DataType,
    /// Trailing socket of interface nodes used to add new parameters.
    /// Extra sockets carry no links.
    #[serde(default)]
    pub is_extra: bool,
}

impl Socket {
    pub fn new(name: impl Into<String>, data_type: impl Into<DataType>) -> Self {
        Self {
            name: name.into(),
            text: None,
            data_type: data_type.into(),
            is_extra: false,
        }
    }

    pub(crate) fn extra() -> Self {
        Self {
            name: "New Parameter".to_string(),
            text: None,
            data_type: DataType::new("Generic"),
            is_extra: true,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// The name shown to the user.
    pub fn display_name(&self) -> &str {
        match &self.text {
            Some(text) if !text.is_empty() => text,
            _ => &self.name,
        }
    }
}

/// What a node is, used instead of probing for capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// An ordinary data-flow node.
    Function { type_name: String },
    /// Defines a subprogram and exposes its parameters.
    GroupInput { subprogram_name: String },
    /// Collects the returns of the subprogram whose input it references.
    GroupOutput { group_input: Option<Uuid> },
    /// Calls a subprogram.
    GroupCall { subprogram: Option<Uuid> },
    /// Layout frame; not part of the data flow.
    Frame,
}

impl NodeKind {
    pub fn function(type_name: impl Into<String>) -> Self {
        NodeKind::Function {
            type_name: type_name.into(),
        }
    }

    /// Whether the node takes part in data flow and network analysis.
    pub fn is_data_flow(&self) -> bool {
        !matches!(self, NodeKind::Frame)
    }

    /// Interface nodes keep a trailing extra socket on their parameter side.
    pub fn extra_side(&self) -> Option<SocketDirection> {
        match self {
            NodeKind::GroupInput { .. } => Some(SocketDirection::Output),
            NodeKind::GroupOutput { .. } => Some(SocketDirection::Input),
            _ => None,
        }
    }

    pub fn accepts_parameters(&self) -> bool {
        matches!(
            self,
            NodeKind::GroupInput { .. } | NodeKind::GroupOutput { .. } | NodeKind::GroupCall { .. }
        )
    }

    fn label(&self) -> &str {
        match self {
            NodeKind::Function { type_name } => type_name,
            NodeKind::GroupInput { .. } => "Group Input",
            NodeKind::GroupOutput { .. } => "Group Output",
            NodeKind::GroupCall { .. } => "Group",
            NodeKind::Frame => "Frame",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Restriction flags of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restrictions {
    /// The node cannot be placed inside a subprogram.
    #[serde(default)]
    pub no_subprogram: bool,
}

/// Location of a node in the editor. Layout only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Data stored in a tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Persistent identity, used for cross-node references.
    pub identifier: Uuid,
    /// Unique name within the tree.
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub kind: NodeKind,
    #[serde(default)]
    pub inputs: Vec<Socket>,
    #[serde(default)]
    pub outputs: Vec<Socket>,
    #[serde(default)]
    pub restrictions: Restrictions,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub select: bool,
    /// Set on nodes that were moved into a subprogram.
    #[serde(default)]
    pub highlight: bool,
}

impl NodeData {
    pub fn sockets(&self, direction: SocketDirection) -> &[Socket] {
        match direction {
            SocketDirection::Input => &self.inputs,
            SocketDirection::Output => &self.outputs,
        }
    }

    pub(crate) fn sockets_mut(&mut self, direction: SocketDirection) -> &mut Vec<Socket> {
        match direction {
            SocketDirection::Input => &mut self.inputs,
            SocketDirection::Output => &mut self.outputs,
        }
    }

    pub fn socket(&self, direction: SocketDirection, index: usize) -> Option<&Socket> {
        self.sockets(direction).get(index)
    }
}

/// Description of a node to create.
#[derive(Debug, Clone)]
pub struct NewNode {
    /// Requested name; a free name is derived when missing or taken.
    pub name: Option<String>,
    pub label: Option<String>,
    pub kind: NodeKind,
    pub position: Position,
    pub restrictions: Restrictions,
    pub inputs: Vec<Socket>,
    pub outputs: Vec<Socket>,
}

impl NewNode {
    pub fn new(kind: NodeKind) -> Self {
        let mut node = Self {
            name: None,
            label: None,
            kind,
            position: Position::default(),
            restrictions: Restrictions::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        };
        match node.kind.extra_side() {
            Some(SocketDirection::Input) => node.inputs.push(Socket::extra()),
            Some(SocketDirection::Output) => node.outputs.push(Socket::extra()),
            None => {}
        }
        node
    }

    pub fn function(type_name: impl Into<String>) -> Self {
        Self::new(NodeKind::function(type_name))
    }

    /// A group input node. Interface nodes cannot be nested in a subprogram.
    pub fn group_input(subprogram_name: impl Into<String>) -> Self {
        let mut node = Self::new(NodeKind::GroupInput {
            subprogram_name: subprogram_name.into(),
        });
        node.restrictions.no_subprogram = true;
        node
    }

    pub fn group_output(group_input: Uuid) -> Self {
        let mut node = Self::new(NodeKind::GroupOutput {
            group_input: Some(group_input),
        });
        node.restrictions.no_subprogram = true;
        node
    }

    pub fn group_call(subprogram: Uuid) -> Self {
        Self::new(NodeKind::GroupCall {
            subprogram: Some(subprogram),
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn input(mut self, socket: Socket) -> Self {
        self.inputs.push(socket);
        self
    }

    pub fn output(mut self, socket: Socket) -> Self {
        self.outputs.push(socket);
        self
    }

    pub fn no_subprogram(mut self) -> Self {
        self.restrictions.no_subprogram = true;
        self
    }
}

/// A link between an output socket and an input socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub id: LinkId,
    pub from: SocketRef,
    pub to: SocketRef,
}

/// Data stored on a tree edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LinkData {
    pub from_socket: usize,
    pub to_socket: usize,
    /// Creation order, used to order fan-out.
    pub serial: u64,
}

/// Identity of a network within one analysis of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetworkId(pub usize);

/// The type tag of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    Main,
    /// Body of the subprogram defined by the group input with this identifier.
    Subnetwork(Uuid),
    Invalid,
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkKind::Main => write!(f, "main"),
            NetworkKind::Subnetwork(id) => write!(f, "subnetwork({})", id),
            NetworkKind::Invalid => write!(f, "invalid"),
        }
    }
}

/// A connected component of data-flow nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Network {
    pub id: NetworkId,
    pub kind: NetworkKind,
}
