//! Regions: ordered containers of states and transitions.

use crate::id::{RegionId, StateId, TransitionId};

/// An ordered container of states and transitions.
///
/// A region belongs to exactly one state, or to the model when it is the root.
/// Several regions under one state form an orthogonal decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub(crate) id: RegionId,
    pub(crate) name: String,
    pub(crate) off_page: bool,
    pub(crate) height: f64,
    pub(crate) focus: bool,
    pub(crate) states: Vec<StateId>,
    pub(crate) transitions: Vec<TransitionId>,
    pub(crate) owning_state: Option<StateId>,
}

impl Region {
    pub(crate) fn new(id: RegionId, owning_state: Option<StateId>, off_page: bool) -> Self {
        Self {
            id,
            name: String::new(),
            off_page,
            height: 0.0,
            focus: false,
            states: Vec::new(),
            transitions: Vec::new(),
            owning_state,
        }
    }

    pub fn id(&self) -> RegionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Whether the region is drawn on its own page rather than inline.
    pub fn off_page(&self) -> bool {
        self.off_page
    }

    pub fn set_off_page(&mut self, off_page: bool) {
        self.off_page = off_page;
    }

    /// Stored height, set by layout collaborators.
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn set_height(&mut self, height: f64) {
        self.height = height;
    }

    pub fn focus(&self) -> bool {
        self.focus
    }

    pub fn set_focus(&mut self, focus: bool) {
        self.focus = focus;
    }

    /// States in append order.
    pub fn states(&self) -> &[StateId] {
        &self.states
    }

    /// Transitions in append order.
    pub fn transitions(&self) -> &[TransitionId] {
        &self.transitions
    }

    /// The state this region decomposes, or `None` for the root region.
    pub fn owning_state(&self) -> Option<StateId> {
        self.owning_state
    }

    pub fn is_root(&self) -> bool {
        self.owning_state.is_none()
    }
}
