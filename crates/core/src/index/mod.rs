//! Reverse lookups derived from a model snapshot.
//!
//! All maps are built together in one pass by [`ReverseIndex::build`]; the
//! store keeps the result until its next mutation.

use std::collections::HashMap;

use crate::{
    config::ModelConfig,
    model::{resolve_node_ref, Action, ModelData, NodeId},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseIndex {
    sources_by_branch: Vec<Vec<NodeId>>,
    sources_by_router: Vec<Vec<NodeId>>,
    events_by_node: Vec<Vec<usize>>,
    events_by_variable: HashMap<String, Vec<usize>>,
    events_by_special_value: HashMap<String, Vec<usize>>,
}

impl ReverseIndex {
    pub fn build(data: &ModelData, config: &ModelConfig) -> Self {
        let node_count = data.nodes.len();
        let mut index = Self {
            sources_by_branch: vec![Vec::new(); node_count],
            sources_by_router: vec![Vec::new(); node_count],
            events_by_node: vec![Vec::new(); node_count],
            ..Default::default()
        };

        for node in &data.nodes {
            for branch in &node.branches {
                if let Some(dst) = branch.destination(node_count) {
                    push_unique(&mut index.sources_by_branch[dst], node.id);
                }
            }
            for &raw in data.router_destinations(node) {
                if let Some(dst) = resolve_node_ref(raw, node_count) {
                    push_unique(&mut index.sources_by_router[dst], node.id);
                }
            }
        }

        for (position, event) in data.events.iter().enumerate() {
            for action in event.walk() {
                if let Action::BranchTo(branch) = action {
                    if let Some(dst) = resolve_node_ref(branch.node, node_count) {
                        push_unique(&mut index.events_by_node[dst], position);
                    }
                }
                for operand in action.operands() {
                    if let Some(name) = operand.variable_name() {
                        push_unique(
                            index.events_by_variable.entry(name.to_string()).or_default(),
                            position,
                        );
                    } else if let Some(name) = operand.constant_name() {
                        if config.is_special_value(name) {
                            push_unique(
                                index
                                    .events_by_special_value
                                    .entry(name.to_string())
                                    .or_default(),
                                position,
                            );
                        }
                    }
                }
            }
        }

        tracing::trace!(
            nodes = node_count,
            events = data.events.len(),
            variables = index.events_by_variable.len(),
            "rebuilt reverse index"
        );
        index
    }

    /// Nodes with a branch to `node`, in id order.
    pub fn source_nodes_by_branch(&self, node: NodeId) -> &[NodeId] {
        slot(&self.sources_by_branch, node)
    }

    /// Nodes whose router lists `node`, in id order.
    pub fn source_nodes_by_router(&self, node: NodeId) -> &[NodeId] {
        slot(&self.sources_by_router, node)
    }

    /// Positions of events that branch to `node` anywhere in their tree.
    pub fn events_by_node(&self, node: NodeId) -> &[usize] {
        slot(&self.events_by_node, node)
    }

    pub fn events_by_variable(&self, name: &str) -> &[usize] {
        self.events_by_variable
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn events_by_special_value(&self, name: &str) -> &[usize] {
        self.events_by_special_value
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn slot<T>(table: &[Vec<T>], index: usize) -> &[T] {
    table.get(index).map(Vec::as_slice).unwrap_or(&[])
}

// Sources are visited in ascending order, so checking the tail is enough.
fn push_unique(list: &mut Vec<usize>, value: usize) {
    if list.last() != Some(&value) {
        list.push(value);
    }
}
