//! States and pseudostates.

use crate::action::ActionRef;
use crate::error::ModelError;
use crate::id::{RegionId, StateId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Vertical space between the header divider and the first action label.
pub const ACTION_DIVIDER_HEIGHT: f64 = 20.0;

/// Vertical space taken by one `e/` or `x/` action label.
pub const ACTION_ROW_HEIGHT: f64 = 20.0;

/// Kind of a state node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StateKind {
    #[default]
    Simple,
    Init,
    Final,
    ShallowHistory,
    DeepHistory,
    EntryPoint,
    ExitPoint,
    Join,
    Fork,
    Choice,
    Junction,
    Terminate,
}

impl StateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKind::Simple => "simple",
            StateKind::Init => "init",
            StateKind::Final => "final",
            StateKind::ShallowHistory => "shallow-history",
            StateKind::DeepHistory => "deep-history",
            StateKind::EntryPoint => "entry-point",
            StateKind::ExitPoint => "exit-point",
            StateKind::Join => "join",
            StateKind::Fork => "fork",
            StateKind::Choice => "choice",
            StateKind::Junction => "junction",
            StateKind::Terminate => "terminate",
        }
    }

    /// Only simple states may be decomposed into regions.
    pub fn can_own_regions(&self) -> bool {
        matches!(self, StateKind::Simple)
    }

    pub fn is_pseudostate(&self) -> bool {
        !matches!(self, StateKind::Simple | StateKind::Final)
    }

    pub fn is_history(&self) -> bool {
        matches!(self, StateKind::ShallowHistory | StateKind::DeepHistory)
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state node, possibly composite.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub(crate) id: StateId,
    pub(crate) name: String,
    pub(crate) kind: StateKind,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) w: f64,
    pub(crate) h: f64,
    pub(crate) region_y_offset: f64,
    pub(crate) focus: bool,
    pub(crate) entries: Vec<ActionRef>,
    pub(crate) exits: Vec<ActionRef>,
    pub(crate) regions: Vec<RegionId>,
    pub(crate) owning_region: RegionId,
}

impl State {
    pub(crate) fn new(id: StateId, owning_region: RegionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: StateKind::Simple,
            x: 0.0,
            y: 0.0,
            w: 0.0,
            h: 0.0,
            region_y_offset: 0.0,
            focus: false,
            entries: Vec::new(),
            exits: Vec::new(),
            regions: Vec::new(),
            owning_region,
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> StateKind {
        self.kind
    }

    /// Changes the kind; a state that owns regions must stay simple.
    pub fn set_kind(&mut self, kind: StateKind) -> Result<(), ModelError> {
        if !kind.can_own_regions() && !self.regions.is_empty() {
            return Err(ModelError::invalid_operation(format!(
                "state {} owns {} region(s) and cannot become '{}'",
                self.id,
                self.regions.len(),
                kind
            )));
        }
        self.kind = kind;
        Ok(())
    }

    pub fn xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn set_xy(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    pub fn size(&self) -> (f64, f64) {
        (self.w, self.h)
    }

    pub fn set_size(&mut self, w: f64, h: f64) {
        self.w = w;
        self.h = h;
    }

    /// Moves the state by a relative offset.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    pub fn focus(&self) -> bool {
        self.focus
    }

    pub fn set_focus(&mut self, focus: bool) {
        self.focus = focus;
    }

    /// Space taken below the header by the action divider and labels.
    pub fn region_y_offset(&self) -> f64 {
        self.region_y_offset
    }

    pub fn entries(&self) -> &[ActionRef] {
        &self.entries
    }

    pub fn exits(&self) -> &[ActionRef] {
        &self.exits
    }

    /// Child regions in append order.
    pub fn regions(&self) -> &[RegionId] {
        &self.regions
    }

    pub fn owning_region(&self) -> RegionId {
        self.owning_region
    }

    pub fn is_composite(&self) -> bool {
        !self.regions.is_empty()
    }

    pub(crate) fn update_region_y_offset(&mut self) {
        let rows = self.entries.len() + self.exits.len();
        self.region_y_offset = if rows == 0 {
            0.0
        } else {
            ACTION_DIVIDER_HEIGHT + ACTION_ROW_HEIGHT * rows as f64
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ActionId;

    fn leaf() -> State {
        State::new(StateId::new(), RegionId::new(), "A")
    }

    #[test]
    fn test_defaults() {
        let s = leaf();
        assert_eq!(s.kind(), StateKind::Simple);
        assert_eq!(s.xy(), (0.0, 0.0));
        assert_eq!(s.region_y_offset(), 0.0);
        assert!(!s.is_composite());
    }

    #[test]
    fn test_geometry_is_not_validated() {
        let mut s = leaf();
        s.set_xy(-10.0, -20.0);
        s.set_size(-1.0, 0.0);
        assert_eq!(s.xy(), (-10.0, -20.0));
        assert_eq!(s.size(), (-1.0, 0.0));

        s.translate(15.0, 25.0);
        assert_eq!(s.xy(), (5.0, 5.0));
    }

    #[test]
    fn test_region_y_offset() {
        let mut s = leaf();
        s.entries.push(ActionRef::new(ActionId::new()));
        s.update_region_y_offset();
        assert_eq!(s.region_y_offset(), 40.0);

        s.exits.push(ActionRef::new(ActionId::new()));
        s.exits.push(ActionRef::new(ActionId::new()));
        s.update_region_y_offset();
        assert_eq!(s.region_y_offset(), 80.0);

        s.entries.clear();
        s.exits.clear();
        s.update_region_y_offset();
        assert_eq!(s.region_y_offset(), 0.0);
    }

    #[test]
    fn test_composite_must_stay_simple() {
        let mut s = leaf();
        s.regions.push(RegionId::new());

        let result = s.set_kind(StateKind::Init);
        assert!(matches!(result, Err(ModelError::InvalidOperation { .. })));
        assert_eq!(s.kind(), StateKind::Simple);

        s.regions.clear();
        s.set_kind(StateKind::Choice).unwrap();
        assert_eq!(s.kind(), StateKind::Choice);
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&StateKind::ShallowHistory).unwrap();
        assert_eq!(json, "\"shallow-history\"");
        let kind: StateKind = serde_json::from_str("\"entry-point\"").unwrap();
        assert_eq!(kind, StateKind::EntryPoint);
    }
}
