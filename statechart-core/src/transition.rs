//! Transitions between states.

use crate::action::ActionRef;
use crate::id::{RegionId, StateId, TransitionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a transition treats its source state's entry/exit behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    /// Exits and re-enters the source.
    #[default]
    External,
    /// No exit or entry.
    Internal,
    /// Partial exit/entry within a composite source.
    Local,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::External => "external",
            TransitionKind::Internal => "internal",
            TransitionKind::Local => "local",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed edge between two states.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub(crate) id: TransitionId,
    pub(crate) name: String,
    pub(crate) trigger_name: String,
    pub(crate) trigger_code: i64,
    pub(crate) kind: TransitionKind,
    pub(crate) source: StateId,
    pub(crate) dest: StateId,
    pub(crate) actions: Vec<ActionRef>,
    pub(crate) guards: Vec<ActionRef>,
    pub(crate) owning_region: RegionId,
}

impl Transition {
    pub(crate) fn new(
        id: TransitionId,
        owning_region: RegionId,
        source: StateId,
        dest: StateId,
    ) -> Self {
        Self {
            id,
            name: String::new(),
            trigger_name: String::new(),
            trigger_code: 0,
            kind: TransitionKind::External,
            source,
            dest,
            actions: Vec::new(),
            guards: Vec::new(),
            owning_region,
        }
    }

    pub fn id(&self) -> TransitionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Name of the triggering event.
    pub fn trigger_name(&self) -> &str {
        &self.trigger_name
    }

    /// Numeric code of the triggering event.
    pub fn trigger_code(&self) -> i64 {
        self.trigger_code
    }

    pub fn set_trigger(&mut self, name: impl Into<String>, code: i64) {
        self.trigger_name = name.into();
        self.trigger_code = code;
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: TransitionKind) {
        self.kind = kind;
    }

    pub fn source(&self) -> StateId {
        self.source
    }

    pub fn dest(&self) -> StateId {
        self.dest
    }

    /// Effect actions in execution order.
    pub fn actions(&self) -> &[ActionRef] {
        &self.actions
    }

    /// Guards in evaluation order.
    pub fn guards(&self) -> &[ActionRef] {
        &self.guards
    }

    pub fn owning_region(&self) -> RegionId {
        self.owning_region
    }

    /// True if the transition starts or ends at `state`.
    pub fn touches(&self, state: StateId) -> bool {
        self.source == state || self.dest == state
    }

    pub fn is_self_transition(&self) -> bool {
        self.source == self.dest
    }
}
