use std::slice;

use serde::{Deserialize, Serialize};

use super::Action;

/// A named, externally triggered script of actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    /// Numeric id taken from the name's trailing `_0x…` suffix.
    pub id: i64,
    pub actions: Vec<Action>,
}

impl Event {
    /// Builds an event whose id is derived from `name`. Returns `None` when the
    /// name carries no numeric suffix.
    pub fn new(name: impl Into<String>, actions: Vec<Action>) -> Option<Self> {
        let name = name.into();
        let id = event_id_from_name(&name)?;
        Some(Self { name, id, actions })
    }

    /// Depth-first, pre-order traversal over every action of the tree.
    pub fn walk(&self) -> Walk<'_> {
        Walk::new(&self.actions)
    }
}

/// Parses the text after the last `_` of an event name, either as `0x` hex
/// or as a decimal integer.
pub fn event_id_from_name(name: &str) -> Option<i64> {
    let suffix = name.rsplit('_').next()?;
    match suffix
        .strip_prefix("0x")
        .or_else(|| suffix.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => suffix.parse().ok(),
    }
}

/// Iterator returned by [`Event::walk`].
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    stack: Vec<slice::Iter<'a, Action>>,
}

impl<'a> Walk<'a> {
    pub fn new(actions: &'a [Action]) -> Self {
        Self {
            stack: vec![actions.iter()],
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Action;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(action) => {
                    if let Some(children) = action.children() {
                        self.stack.push(children.iter());
                    }
                    return Some(action);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionKind, ModelData};

    #[test]
    fn derives_ids_from_name_suffix() {
        assert_eq!(
            event_id_from_name("PATH_EVENT_SetPlayerAllied_0xd9047"),
            Some(0xd9047)
        );
        assert_eq!(event_id_from_name("Test_0x1"), Some(1));
        assert_eq!(event_id_from_name("Plain_42"), Some(42));
        assert_eq!(event_id_from_name("NoSuffix"), None);
        assert!(Event::new("Broken_0xzz", Vec::new()).is_none());
    }

    #[test]
    fn walk_visits_nested_actions_in_document_order() {
        let data = ModelData::default();
        let mut inner = Action::template(ActionKind::If, &data);
        inner
            .children_mut()
            .unwrap()
            .push(Action::template(ActionKind::BranchTo, &data));
        let mut outer = Action::template(ActionKind::If, &data);
        outer.children_mut().unwrap().push(inner);
        let event = Event::new(
            "Nested_0x2",
            vec![outer, Action::template(ActionKind::Fade, &data)],
        )
        .unwrap();

        let kinds: Vec<_> = event.walk().map(Action::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::If,
                ActionKind::If,
                ActionKind::BranchTo,
                ActionKind::Fade
            ]
        );
    }
}
