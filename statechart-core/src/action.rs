//! Shared action functions and the per-kind registry that owns them.

use crate::error::ModelError;
use crate::id::ActionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an action function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Transition effect.
    Action,
    /// Transition guard.
    Guard,
    /// State entry action.
    Entry,
    /// State exit action.
    Exit,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Entry,
        ActionKind::Exit,
        ActionKind::Guard,
        ActionKind::Action,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Action => "action",
            ActionKind::Guard => "guard",
            ActionKind::Entry => "entry",
            ActionKind::Exit => "exit",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "action" => Ok(ActionKind::Action),
            "guard" => Ok(ActionKind::Guard),
            "entry" => Ok(ActionKind::Entry),
            "exit" => Ok(ActionKind::Exit),
            other => Err(ModelError::InvalidReference {
                reason: format!("unknown action kind '{}'", other),
            }),
        }
    }
}

/// A named action function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    id: ActionId,
    name: String,
    kind: ActionKind,
}

impl Action {
    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }
}

/// Non-owning link from a state or transition to a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionRef {
    pub action_id: ActionId,
}

impl ActionRef {
    pub fn new(action_id: ActionId) -> Self {
        Self { action_id }
    }
}

/// Owner of every action function of a model, one ordered list per kind.
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    entries: Vec<Action>,
    exits: Vec<Action>,
    guards: Vec<Action>,
    actions: Vec<Action>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&self, kind: ActionKind) -> &Vec<Action> {
        match kind {
            ActionKind::Entry => &self.entries,
            ActionKind::Exit => &self.exits,
            ActionKind::Guard => &self.guards,
            ActionKind::Action => &self.actions,
        }
    }

    fn list_mut(&mut self, kind: ActionKind) -> &mut Vec<Action> {
        match kind {
            ActionKind::Entry => &mut self.entries,
            ActionKind::Exit => &mut self.exits,
            ActionKind::Guard => &mut self.guards,
            ActionKind::Action => &mut self.actions,
        }
    }

    /// Adds a new action with a fresh identity.
    pub fn add(&mut self, kind: ActionKind, name: impl Into<String>) -> ActionId {
        let id = ActionId::new();
        self.list_mut(kind).push(Action {
            id,
            name: name.into(),
            kind,
        });
        id
    }

    /// Re-inserts an action with a known identity.
    ///
    /// Fails when the identity is already taken by an action of any kind.
    pub(crate) fn insert(
        &mut self,
        id: ActionId,
        kind: ActionKind,
        name: impl Into<String>,
    ) -> Result<(), ModelError> {
        if self.find(id).is_some() {
            return Err(ModelError::parse(format!("duplicate action id {}", id)));
        }
        self.list_mut(kind).push(Action {
            id,
            name: name.into(),
            kind,
        });
        Ok(())
    }

    /// Looks up an action in the list of the given kind.
    pub fn get(&self, id: ActionId, kind: ActionKind) -> Result<&Action, ModelError> {
        self.list(kind)
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| ModelError::ActionNotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            })
    }

    /// Returns true if `id` names an action of the given kind.
    pub fn contains(&self, id: ActionId, kind: ActionKind) -> bool {
        self.list(kind).iter().any(|a| a.id == id)
    }

    /// Looks up an action in any of the four lists.
    pub fn find(&self, id: ActionId) -> Option<&Action> {
        ActionKind::ALL
            .iter()
            .find_map(|k| self.list(*k).iter().find(|a| a.id == id))
    }

    /// Renames an action in place.
    pub fn rename(&mut self, id: ActionId, name: impl Into<String>) -> Result<(), ModelError> {
        for kind in ActionKind::ALL {
            if let Some(action) = self.list_mut(kind).iter_mut().find(|a| a.id == id) {
                action.name = name.into();
                return Ok(());
            }
        }
        Err(ModelError::ActionNotFound {
            kind: "any".to_string(),
            id: id.to_string(),
        })
    }

    /// Removes an action from whichever list holds it and returns it.
    pub(crate) fn remove(&mut self, id: ActionId) -> Option<Action> {
        for kind in ActionKind::ALL {
            let list = self.list_mut(kind);
            if let Some(pos) = list.iter().position(|a| a.id == id) {
                return Some(list.remove(pos));
            }
        }
        None
    }

    /// Returns the ordered actions of one kind.
    pub fn actions_of(&self, kind: ActionKind) -> &[Action] {
        self.list(kind)
    }

    /// Returns the total number of actions across all kinds.
    pub fn len(&self) -> usize {
        self.entries.len() + self.exits.len() + self.guards.len() + self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
