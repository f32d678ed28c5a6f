//! Entity types of a branching music graph.
//!
//! Nodes are identified by their position in [`ModelData::nodes`]; branches,
//! routers and `branchto` actions refer to them by that index. References are
//! allowed to dangle (placeholder data is common) and resolve to nothing.

mod action;
mod event;

use serde::{Deserialize, Serialize};

pub use action::{
    Action, ActionKind, ArithmeticOp, BranchTo, Calculate, Comparison, Condition, Conditional,
    ElseBlock, Fade, Operand, SetValue, WaitDuration, WaitTime,
};
pub use event::{event_id_from_name, Event, Walk};

/// Index of a node in the nodes sequence.
pub type NodeId = usize;

/// Reserved branch destination meaning "no destination".
pub const NO_DESTINATION: i64 = 65535;

/// Ordered list of destination node ids, addressed by `routerID - 1`.
pub type Router = Vec<i64>;

/// Resolves a raw node reference to an index into a sequence of `len` nodes.
pub fn resolve_node_ref(raw: i64, len: usize) -> Option<NodeId> {
    if raw == NO_DESTINATION || raw < 0 {
        return None;
    }
    let index = usize::try_from(raw).ok()?;
    (index < len).then_some(index)
}

/// A music stream and its sound bank parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub path: String,
    pub starting_sample: i64,
    pub num_subbanks: i64,
    pub purge_mode: i64,
    pub checksum: i64,
    pub max_aram: i64,
    pub max_mram: i64,
}

/// Conditional edge to another node, taken when the control value lies in
/// `[control_min, control_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub control_min: i64,
    pub control_max: i64,
    pub dst_node: i64,
}

impl Branch {
    pub fn new(control_min: i64, control_max: i64, dst_node: i64) -> Self {
        Self {
            control_min,
            control_max,
            dst_node,
        }
    }

    /// Destination index, or `None` for the sentinel and out of range values.
    pub fn destination(&self, node_count: usize) -> Option<NodeId> {
        resolve_node_ref(self.dst_node, node_count)
    }
}

/// A playable music segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub music_index: i64,
    pub track_id: i64,
    pub section_id: i64,
    pub repeat: i64,
    /// 1-based router id; 0 means the node uses no router.
    pub router_id: i64,
    pub beats: i64,
    pub bars: i64,
    pub part_id: i64,
    pub notes: i64,
    pub branches: Vec<Branch>,
}

impl Node {
    pub fn new(id: NodeId, music_index: i64, track_id: i64) -> Self {
        Self {
            id,
            music_index,
            track_id,
            ..Default::default()
        }
    }

    /// 0-based router slot, if the node references one.
    pub fn router_index(&self) -> Option<usize> {
        if self.router_id <= 0 {
            return None;
        }
        usize::try_from(self.router_id - 1).ok()
    }
}

/// Global variable readable and writable from event actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub value: i64,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// The five canonical collections of a loaded music directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelData {
    pub tracks: Vec<Track>,
    pub nodes: Vec<Node>,
    pub events: Vec<Event>,
    pub variables: Vec<Variable>,
    pub routers: Vec<Router>,
}

impl ModelData {
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
            && self.nodes.is_empty()
            && self.events.is_empty()
            && self.variables.is_empty()
            && self.routers.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Destination list of the router a node points at. Nodes without a
    /// router, or with a dangling router id, resolve to an empty list.
    pub fn router_destinations(&self, node: &Node) -> &[i64] {
        node.router_index()
            .and_then(|index| self.routers.get(index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
