//! Collapses linear runs of nodes into chains for display.

use crate::{
    model::{Node, NodeId},
    store::Model,
};

/// Partitions every node of `model` into chains: maximal runs where each
/// link has a single predecessor and a single successor, self-branches not
/// counted. Chains are listed in order of their first node id and each chain
/// runs from root to leaf.
pub fn group_chains(model: &Model) -> Vec<Vec<NodeId>> {
    let nodes = &model.data().nodes;
    let previous = |node: NodeId| -> Vec<NodeId> {
        model
            .get_source_nodes_by_branches(node)
            .into_iter()
            .map(|source| source.id)
            .filter(|&source| source != node)
            .collect()
    };
    let next = |node: NodeId| -> Vec<NodeId> {
        model
            .get_branch_destination_nodes(node)
            .into_iter()
            .map(|dst: &Node| dst.id)
            .filter(|&dst| dst != node)
            .collect()
    };

    let mut slots: Vec<Vec<NodeId>> = vec![Vec::new(); nodes.len()];
    let mut processed = vec![false; nodes.len()];

    for seed in 0..nodes.len() {
        if processed[seed] {
            continue;
        }
        processed[seed] = true;

        let mut chain = vec![seed];
        let mut before = previous(seed);
        while let [candidate] = before[..] {
            if processed[candidate] || next(candidate).len() > 1 {
                break;
            }
            processed[candidate] = true;
            chain.push(candidate);
            before = previous(candidate);
        }
        chain.reverse();

        let mut after = next(seed);
        while let [candidate] = after[..] {
            if processed[candidate] || previous(candidate).len() > 1 {
                break;
            }
            processed[candidate] = true;
            chain.push(candidate);
            after = next(candidate);
        }

        let first = chain[0];
        slots[first] = chain;
    }

    let chains: Vec<_> = slots.into_iter().filter(|chain| !chain.is_empty()).collect();
    tracing::debug!(nodes = nodes.len(), chains = chains.len(), "grouped node chains");
    chains
}
