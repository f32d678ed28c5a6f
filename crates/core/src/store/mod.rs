//! The editable music model.
//!
//! [`Model`] owns the canonical collections behind a read-only view. Every
//! write goes through a method that stores its own copy of the caller's data,
//! bumps the revision counter and drops the memoised [`ReverseIndex`].

use std::cell::OnceCell;

use crate::{
    config::ModelConfig,
    error::EntityKind,
    index::ReverseIndex,
    model::{Action, Event, ModelData, Node, NodeId, Router, Track, Variable},
    PathMusicError, Result,
};

/// Key accepted by [`Model::get_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKey<'a> {
    Id(i64),
    Name(&'a str),
}

impl From<i64> for EventKey<'_> {
    fn from(value: i64) -> Self {
        Self::Id(value)
    }
}

impl<'a> From<&'a str> for EventKey<'a> {
    fn from(value: &'a str) -> Self {
        Self::Name(value)
    }
}

#[derive(Debug, Default)]
pub struct Model {
    data: ModelData,
    config: ModelConfig,
    revision: u64,
    index: OnceCell<ReverseIndex>,
}

impl Model {
    pub fn new(
        tracks: Vec<Track>,
        nodes: Vec<Node>,
        events: Vec<Event>,
        variables: Vec<Variable>,
        routers: Vec<Router>,
    ) -> Self {
        Self::from_data(
            ModelData {
                tracks,
                nodes,
                events,
                variables,
                routers,
            },
            ModelConfig::default(),
        )
    }

    /// Node ids are re-derived from positions so identity and position agree.
    pub fn from_data(mut data: ModelData, config: ModelConfig) -> Self {
        for (position, node) in data.nodes.iter_mut().enumerate() {
            node.id = position;
        }
        Self {
            data,
            config,
            revision: 0,
            index: OnceCell::new(),
        }
    }

    pub fn data(&self) -> &ModelData {
        &self.data
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Number of mutations applied since construction.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.data.nodes.get(id)
    }

    /// Appends a node without branches and returns its id.
    pub fn add_node(&mut self, music_index: i64, track_id: i64) -> NodeId {
        let id = self.data.nodes.len();
        self.data.nodes.push(Node::new(id, music_index, track_id));
        self.touch("add_node");
        id
    }

    /// Replaces the node stored at `node.id` with a copy of `node`.
    pub fn set_node(&mut self, node: &Node) -> Result<&Node> {
        let slot = self
            .data
            .nodes
            .get_mut(node.id)
            .ok_or_else(|| PathMusicError::not_found(EntityKind::Node, node.id))?;
        *slot = node.clone();
        self.touch("set_node");
        Ok(&self.data.nodes[node.id])
    }

    /// Stores a copy of `event`. The id must be new and the action tree has
    /// to be dumpable (see [`Model::set_event`]).
    pub fn add_event(&mut self, event: &Event) -> Result<&Event> {
        if self.position_of_event(event.id).is_some() {
            return Err(PathMusicError::DuplicateEvent { id: event.id });
        }
        self.check_event(event)?;
        let position = self.data.events.len();
        self.data.events.push(event.clone());
        self.touch("add_event");
        Ok(&self.data.events[position])
    }

    pub fn get_event<'a>(&self, key: impl Into<EventKey<'a>>) -> Option<&Event> {
        match key.into() {
            EventKey::Id(id) => self.data.events.iter().find(|event| event.id == id),
            EventKey::Name(name) => self.data.events.iter().find(|event| event.name == name),
        }
    }

    /// Replaces the event with the same numeric id. Every `else if`/`else`
    /// must continue an `if` chain and every track index must exist, otherwise
    /// the event is rejected with [`PathMusicError::InvalidEvent`].
    pub fn set_event(&mut self, event: &Event) -> Result<&Event> {
        let position = self
            .position_of_event(event.id)
            .ok_or_else(|| PathMusicError::not_found(EntityKind::Event, event.id))?;
        self.check_event(event)?;
        self.data.events[position] = event.clone();
        self.touch("set_event");
        Ok(&self.data.events[position])
    }

    /// Replaces the variable table. Names are cut to the configured length.
    pub fn set_variables(&mut self, variables: &[Variable]) -> &[Variable] {
        let limit = self.config.max_variable_name_len;
        self.data.variables = variables
            .iter()
            .map(|var| Variable::new(var.name.chars().take(limit).collect::<String>(), var.value))
            .collect();
        self.touch("set_variables");
        &self.data.variables
    }

    pub fn add_track(&mut self, track: &Track) -> usize {
        let index = self.data.tracks.len();
        self.data.tracks.push(track.clone());
        self.touch("add_track");
        index
    }

    pub fn set_track(&mut self, index: usize, track: &Track) -> Result<&Track> {
        let slot = self
            .data
            .tracks
            .get_mut(index)
            .ok_or_else(|| PathMusicError::not_found(EntityKind::Track, index))?;
        *slot = track.clone();
        self.touch("set_track");
        Ok(&self.data.tracks[index])
    }

    /// Appends a router and returns its 1-based id, as stored in
    /// [`Node::router_id`].
    pub fn add_router(&mut self, destinations: &[i64]) -> i64 {
        self.data.routers.push(destinations.to_vec());
        self.touch("add_router");
        self.data.routers.len() as i64
    }

    pub fn set_router(&mut self, router_id: i64, destinations: &[i64]) -> Result<&[i64]> {
        let index = usize::try_from(router_id - 1)
            .ok()
            .filter(|&index| index < self.data.routers.len())
            .ok_or_else(|| PathMusicError::not_found(EntityKind::Router, router_id))?;
        self.data.routers[index] = destinations.to_vec();
        self.touch("set_router");
        Ok(&self.data.routers[index])
    }

    /// Reverse lookups for the current snapshot, rebuilt on first use after
    /// a mutation.
    pub fn index(&self) -> &ReverseIndex {
        self.index
            .get_or_init(|| ReverseIndex::build(&self.data, &self.config))
    }

    pub fn get_source_nodes_by_branches(&self, node: NodeId) -> Vec<&Node> {
        self.nodes_at(self.index().source_nodes_by_branch(node))
    }

    pub fn get_source_nodes_by_routers(&self, node: NodeId) -> Vec<&Node> {
        self.nodes_at(self.index().source_nodes_by_router(node))
    }

    /// Distinct, resolvable branch destinations of `node` in branch order.
    pub fn get_branch_destination_nodes(&self, node: NodeId) -> Vec<&Node> {
        let Some(source) = self.data.nodes.get(node) else {
            return Vec::new();
        };
        let count = self.data.nodes.len();
        let mut seen = Vec::new();
        for branch in &source.branches {
            if let Some(dst) = branch.destination(count) {
                if !seen.contains(&dst) {
                    seen.push(dst);
                }
            }
        }
        self.nodes_at(&seen)
    }

    /// Raw destination list of the router `node` uses.
    pub fn get_router_destinations(&self, node: NodeId) -> &[i64] {
        self.data
            .nodes
            .get(node)
            .map(|node| self.data.router_destinations(node))
            .unwrap_or(&[])
    }

    pub fn get_node_associated_events(&self, node: NodeId) -> Vec<&Event> {
        self.events_at(self.index().events_by_node(node))
    }

    pub fn get_variable_associated_events(&self, name: &str) -> Vec<&Event> {
        self.events_at(self.index().events_by_variable(name))
    }

    pub fn get_special_value_associated_events(&self, name: &str) -> Vec<&Event> {
        self.events_at(self.index().events_by_special_value(name))
    }

    fn nodes_at(&self, ids: &[NodeId]) -> Vec<&Node> {
        ids.iter().filter_map(|&id| self.data.nodes.get(id)).collect()
    }

    fn events_at(&self, positions: &[usize]) -> Vec<&Event> {
        positions
            .iter()
            .filter_map(|&position| self.data.events.get(position))
            .collect()
    }

    fn position_of_event(&self, id: i64) -> Option<usize> {
        self.data.events.iter().position(|event| event.id == id)
    }

    fn check_event(&self, event: &Event) -> Result<()> {
        check_actions(&event.actions, self.data.tracks.len()).map_err(|message| {
            PathMusicError::InvalidEvent {
                id: event.id,
                message,
            }
        })
    }

    fn touch(&mut self, operation: &'static str) {
        self.revision += 1;
        self.index.take();
        tracing::trace!(operation, revision = self.revision, "model mutated");
    }
}

/// Checks a sibling list and everything nested in it.
fn check_actions(actions: &[Action], track_count: usize) -> std::result::Result<(), String> {
    let mut chain_open = false;
    for action in actions {
        if action.continues_chain() && !chain_open {
            let link = match action {
                Action::Else(_) => "else",
                _ => "else if",
            };
            return Err(format!("{link} without a preceding if"));
        }
        chain_open = matches!(action, Action::If(_) | Action::ElseIf(_));
        if action.track() >= track_count {
            return Err(format!(
                "track {} out of range, the model has {track_count} tracks",
                action.track()
            ));
        }
        if let Some(children) = action.children() {
            check_actions(children, track_count)?;
        }
    }
    Ok(())
}

impl From<ModelData> for Model {
    fn from(data: ModelData) -> Self {
        Self::from_data(data, ModelConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Action, ActionKind, Branch, BranchTo, Comparison, Condition, Conditional, Operand,
        NO_DESTINATION,
    };

    fn empty() -> Model {
        Model::new(
            vec![Track::default()],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )
    }

    fn branch_to(node: i64) -> Action {
        Action::BranchTo(BranchTo {
            node,
            of_section: 0,
            immediate: false,
            track: 0,
        })
    }

    fn if_var(name: &str, value: i64, actions: Vec<Action>) -> Action {
        Action::If(Conditional {
            condition: Condition {
                left: Operand::variable(name),
                comparison: Comparison::Eq,
                right: Operand::Number(value),
            },
            actions,
            track: 0,
        })
    }

    #[test]
    fn node_lookup_follows_new_branches() {
        let mut model = empty();
        let id1 = model.add_node(0, 0);
        let id2 = model.add_node(0, 0);
        assert_eq!((id1, id2), (0, 1));
        assert_eq!(model.node(id2).unwrap().id, id2);

        let mut edited = model.node(id1).unwrap().clone();
        edited.branches.push(Branch::new(0, 127, id2 as i64));
        let stored = model.set_node(&edited).unwrap().clone();

        assert_eq!(model.node(id1).unwrap().branches[0].dst_node, id2 as i64);
        assert!(model.node(id2).unwrap().branches.is_empty());
        assert_eq!(model.get_source_nodes_by_branches(id2), vec![&stored]);
        assert_eq!(model.get_branch_destination_nodes(id1)[0].id, id2);
    }

    #[test]
    fn sentinel_branch_has_no_sources() {
        let mut model = empty();
        let id = model.add_node(0, 0);
        let mut edited = model.node(id).unwrap().clone();
        edited.branches.push(Branch::new(0, 127, NO_DESTINATION));
        model.set_node(&edited).unwrap();
        assert!(model.get_source_nodes_by_branches(id).is_empty());
        assert!(model.get_branch_destination_nodes(id).is_empty());
    }

    #[test]
    fn set_node_rejects_unseen_ids() {
        let mut model = empty();
        model.add_node(0, 0);
        let err = model.set_node(&Node::new(5, 0, 0)).unwrap_err();
        assert!(matches!(
            err,
            PathMusicError::NotFound {
                kind: EntityKind::Node,
                ..
            }
        ));
        assert_eq!(model.data().nodes.len(), 1);
    }

    #[test]
    fn stored_node_is_isolated_from_caller_edits() {
        let mut model = empty();
        let id = model.add_node(0, 0);
        let mut data = model.node(id).unwrap().clone();
        data.branches.push(Branch::new(0, 127, id as i64));
        model.set_node(&data).unwrap();

        data.branches[0].dst_node = NO_DESTINATION;
        assert_eq!(model.node(id).unwrap().branches[0].dst_node, id as i64);
        data.branches.clear();
        assert_eq!(model.node(id).unwrap().branches.len(), 1);
    }

    #[test]
    fn stored_event_is_isolated_from_caller_edits() {
        let mut model = empty();
        let id1 = model.add_node(0, 0) as i64;
        let id2 = model.add_node(0, 0) as i64;
        let mut data = Event::new(
            "Test_0x1",
            vec![
                branch_to(id1),
                if_var("x", 1, vec![if_var("y", 2, vec![branch_to(id2)])]),
            ],
        )
        .unwrap();
        model.add_event(&data).unwrap();

        if let Action::BranchTo(branch) = &mut data.actions[0] {
            branch.node = id2;
        }
        data.actions[1].children_mut().unwrap()[0]
            .children_mut()
            .unwrap()
            .clear();
        data.actions.clear();

        let stored = model.get_event(1_i64).unwrap();
        assert_eq!(stored.actions.len(), 2);
        assert_eq!(stored.actions[0], branch_to(id1));
        let nested = &stored.actions[1].children().unwrap()[0];
        assert_eq!(nested.children().unwrap(), &[branch_to(id2)]);
    }

    #[test]
    fn deeply_nested_branch_is_associated() {
        let mut model = empty();
        let target = model.add_node(0, 0);
        let event = Event::new(
            "Deep_0x7",
            vec![if_var(
                "a",
                1,
                vec![if_var("b", 2, vec![if_var("c", 3, vec![branch_to(target as i64)])])],
            )],
        )
        .unwrap();
        model.add_event(&event).unwrap();
        assert_eq!(model.get_node_associated_events(target), vec![&event]);
        assert_eq!(model.get_variable_associated_events("c"), vec![&event]);
    }

    #[test]
    fn sentinel_event_target_is_ignored() {
        let mut model = empty();
        let id = model.add_node(0, 0);
        model
            .add_event(
                &Event::new("Test_0x1", vec![branch_to(NO_DESTINATION), branch_to(id as i64)])
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(model.get_node_associated_events(id).len(), 1);
        assert!(model
            .get_node_associated_events(NO_DESTINATION as usize)
            .is_empty());
    }

    #[test]
    fn event_lookup_and_replacement() {
        let mut model = empty();
        let event = Event::new("PATH_EVENT_Start_0x10", Vec::new()).unwrap();
        model.add_event(&event).unwrap();
        assert!(matches!(
            model.add_event(&event),
            Err(PathMusicError::DuplicateEvent { id: 0x10 })
        ));

        assert_eq!(model.get_event("PATH_EVENT_Start_0x10").unwrap().id, 0x10);
        assert!(model.get_event(0x11_i64).is_none());
        assert!(model.get_event("missing").is_none());

        let mut edited = event.clone();
        edited.actions.push(branch_to(0));
        assert_eq!(model.set_event(&edited).unwrap().actions.len(), 1);

        let unknown = Event::new("Other_0x99", Vec::new()).unwrap();
        let err = model.set_event(&unknown).unwrap_err();
        assert_eq!(format!("{err}"), "event 153 not found");
        assert_eq!(model.data().events.len(), 1);
    }

    #[test]
    fn variables_are_truncated_and_copied() {
        let mut model = empty();
        let mut input = vec![
            Variable::new("a_very_long_variable_name", 3),
            Variable::new("player", 0),
        ];
        model.set_variables(&input);
        input[1].value = 9;

        let stored = &model.data().variables;
        assert_eq!(stored[0].name, "a_very_long_var");
        assert_eq!(stored[0].name.len(), 15);
        assert_eq!(stored[1], Variable::new("player", 0));
    }

    #[test]
    fn index_is_rebuilt_after_each_mutation() {
        let mut model = empty();
        let a = model.add_node(0, 0);
        let b = model.add_node(1, 0);
        assert!(model.get_source_nodes_by_branches(b).is_empty());

        let mut edited = model.node(a).unwrap().clone();
        edited.branches.push(Branch::new(0, 127, b as i64));
        let before = model.revision();
        model.set_node(&edited).unwrap();
        assert_eq!(model.revision(), before + 1);
        assert_eq!(model.get_source_nodes_by_branches(b).len(), 1);
    }

    #[test]
    fn routers_resolve_through_one_based_ids() {
        let mut model = empty();
        let a = model.add_node(0, 0);
        let b = model.add_node(1, 0);
        let router = model.add_router(&[b as i64, NO_DESTINATION]);
        assert_eq!(router, 1);

        let mut edited = model.node(a).unwrap().clone();
        edited.router_id = router;
        model.set_node(&edited).unwrap();
        assert_eq!(model.get_router_destinations(a), &[b as i64, NO_DESTINATION]);
        assert_eq!(model.get_source_nodes_by_routers(b)[0].id, a);

        model.set_router(router, &[]).unwrap();
        assert!(model.get_source_nodes_by_routers(b).is_empty());
        assert!(model.set_router(0, &[]).is_err());
        assert!(model.set_router(2, &[]).is_err());
    }

    #[test]
    fn tracks_are_replaced_positionally() {
        let mut model = empty();
        let index = model.add_track(&Track {
            path: "a.mus".to_string(),
            ..Default::default()
        });
        let replacement = Track {
            path: "b.mus".to_string(),
            max_aram: 4,
            ..Default::default()
        };
        assert_eq!(model.set_track(index, &replacement).unwrap().path, "b.mus");
        assert!(model.set_track(3, &replacement).is_err());
    }

    #[test]
    fn orphan_else_links_are_rejected() {
        let mut model = empty();
        let data = model.data().clone();
        let stray_else_if = Event::new(
            "Stray_0x5",
            vec![branch_to(0), Action::template(ActionKind::ElseIf, &data)],
        )
        .unwrap();
        let err = model.add_event(&stray_else_if).unwrap_err();
        assert!(matches!(err, PathMusicError::InvalidEvent { id: 5, .. }));
        assert!(format!("{err}").contains("else if without a preceding if"));
        assert!(model.data().events.is_empty());

        let nested_else_after_else = Event::new(
            "Nested_0x6",
            vec![if_var(
                "x",
                1,
                vec![
                    if_var("y", 2, Vec::new()),
                    Action::template(ActionKind::Else, &data),
                    Action::template(ActionKind::Else, &data),
                ],
            )],
        )
        .unwrap();
        assert!(model.add_event(&nested_else_after_else).is_err());

        let chained = Event::new(
            "Chained_0x7",
            vec![
                if_var("x", 1, Vec::new()),
                Action::template(ActionKind::ElseIf, &data),
                Action::template(ActionKind::Else, &data),
            ],
        )
        .unwrap();
        model.add_event(&chained).unwrap();
        let revision = model.revision();

        let mut broken = chained.clone();
        broken.actions.remove(0);
        assert!(matches!(
            model.set_event(&broken),
            Err(PathMusicError::InvalidEvent { id: 7, .. })
        ));
        assert_eq!(model.get_event(7_i64).unwrap(), &chained);
        assert_eq!(model.revision(), revision);
    }

    #[test]
    fn track_indices_must_exist() {
        let mut model = empty();
        let mut fade = Action::template(ActionKind::Fade, model.data());
        if let Action::Fade(inner) = &mut fade {
            inner.track = 4;
        }
        let event = Event::new("Loud_0x8", vec![if_var("x", 1, vec![fade])]).unwrap();
        let err = model.add_event(&event).unwrap_err();
        assert!(format!("{err}").contains("track 4 out of range"));

        for _ in 0..4 {
            model.add_track(&Track::default());
        }
        model.add_event(&event).unwrap();

        let mut moved = event.clone();
        moved.actions[0].children_mut().unwrap()[0] = branch_to(0);
        if let Action::If(conditional) = &mut moved.actions[0] {
            conditional.track = 5;
        }
        assert!(model.set_event(&moved).is_err());
    }

    #[test]
    fn construction_realigns_node_ids() {
        let model = Model::new(
            Vec::new(),
            vec![Node::new(7, 0, 0), Node::new(7, 1, 0)],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let ids: Vec<_> = model.data().nodes.iter().map(|node| node.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }
}
