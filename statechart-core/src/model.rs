//! The model aggregate: owns the region/state/transition graph and the action registry.
//!
//! Entities live in per-kind indices keyed by identity. Containment is kept as
//! ordered identity lists on the container plus an identity back-reference on
//! the child, so the graph has a single owner and no reference cycles.

use crate::action::{Action, ActionKind, ActionRef, ActionRegistry};
use crate::error::ModelError;
use crate::id::{ActionId, RegionId, StateId, TransitionId};
use crate::region::Region;
use crate::state::State;
use crate::transition::Transition;
use std::collections::{HashMap, HashSet};

/// Document format version written by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// A statechart model.
#[derive(Debug, Clone)]
pub struct Model {
    pub(crate) name: String,
    pub(crate) version: u32,
    pub(crate) root: RegionId,
    pub(crate) regions: HashMap<RegionId, Region>,
    pub(crate) states: HashMap<StateId, State>,
    pub(crate) transitions: HashMap<TransitionId, Transition>,
    pub(crate) registry: ActionRegistry,
}

impl Model {
    /// Creates an empty model with a root region and empty action registries.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_root(name, FORMAT_VERSION, RegionId::new())
    }

    pub(crate) fn with_root(name: impl Into<String>, version: u32, root: RegionId) -> Self {
        let mut regions = HashMap::new();
        regions.insert(root, Region::new(root, None, false));
        Self {
            name: name.into(),
            version,
            root,
            regions,
            states: HashMap::new(),
            transitions: HashMap::new(),
            registry: ActionRegistry::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Identity of the top-level region.
    pub fn root(&self) -> RegionId {
        self.root
    }

    pub fn root_region(&self) -> &Region {
        // The root is inserted at construction and can never be deleted.
        &self.regions[&self.root]
    }

    pub fn root_region_mut(&mut self) -> &mut Region {
        self.regions
            .get_mut(&self.root)
            .expect("root region is always present")
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn region(&self, id: RegionId) -> Result<&Region, ModelError> {
        self.regions
            .get(&id)
            .ok_or_else(|| ModelError::RegionNotFound { id: id.to_string() })
    }

    pub fn region_mut(&mut self, id: RegionId) -> Result<&mut Region, ModelError> {
        self.regions
            .get_mut(&id)
            .ok_or_else(|| ModelError::RegionNotFound { id: id.to_string() })
    }

    pub fn state(&self, id: StateId) -> Result<&State, ModelError> {
        self.states
            .get(&id)
            .ok_or_else(|| ModelError::StateNotFound { id: id.to_string() })
    }

    pub fn state_mut(&mut self, id: StateId) -> Result<&mut State, ModelError> {
        self.states
            .get_mut(&id)
            .ok_or_else(|| ModelError::StateNotFound { id: id.to_string() })
    }

    pub fn transition(&self, id: TransitionId) -> Result<&Transition, ModelError> {
        self.transitions
            .get(&id)
            .ok_or_else(|| ModelError::TransitionNotFound { id: id.to_string() })
    }

    pub fn transition_mut(&mut self, id: TransitionId) -> Result<&mut Transition, ModelError> {
        self.transitions
            .get_mut(&id)
            .ok_or_else(|| ModelError::TransitionNotFound { id: id.to_string() })
    }

    /// All regions, in no particular order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// All states, in no particular order.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    /// All transitions, in no particular order.
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.values()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// Returns the first state with the given name, searching from the root downward.
    pub fn find_state_by_name(&self, name: &str) -> Option<&State> {
        let mut stack = vec![self.root];
        while let Some(rid) = stack.pop() {
            let region = self.regions.get(&rid)?;
            for sid in &region.states {
                let state = &self.states[sid];
                if state.name == name {
                    return Some(state);
                }
            }
            for sid in region.states.iter().rev() {
                stack.extend(self.states[sid].regions.iter().rev().copied());
            }
        }
        None
    }

    /// Transitions leaving `state`.
    pub fn transitions_from(&self, state: StateId) -> Vec<&Transition> {
        self.transitions
            .values()
            .filter(|t| t.source == state)
            .collect()
    }

    /// Transitions arriving at `state`.
    pub fn transitions_to(&self, state: StateId) -> Vec<&Transition> {
        self.transitions
            .values()
            .filter(|t| t.dest == state)
            .collect()
    }

    // =========================================================================
    // Action Registry
    // =========================================================================

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Registers a new action function.
    pub fn add_action(&mut self, kind: ActionKind, name: impl Into<String>) -> ActionId {
        let name = name.into();
        let id = self.registry.add(kind, name.clone());
        tracing::debug!("Added {} action '{}' ({})", kind, name, id);
        id
    }

    pub fn get_action(&self, id: ActionId, kind: ActionKind) -> Result<&Action, ModelError> {
        self.registry.get(id, kind)
    }

    /// Looks up an action regardless of kind.
    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.registry.find(id)
    }

    pub fn rename_action(&mut self, id: ActionId, name: impl Into<String>) -> Result<(), ModelError> {
        self.registry.rename(id, name)
    }

    /// Deletes an action and every reference to it.
    ///
    /// Unknown identities fail with `ActionNotFound` and leave the model unchanged.
    pub fn delete_action(&mut self, id: ActionId) -> Result<Action, ModelError> {
        let action = self
            .registry
            .remove(id)
            .ok_or_else(|| ModelError::ActionNotFound {
                kind: "any".to_string(),
                id: id.to_string(),
            })?;

        let mut refs_removed = 0;
        for state in self.states.values_mut() {
            let before = state.entries.len() + state.exits.len();
            state.entries.retain(|r| r.action_id != id);
            state.exits.retain(|r| r.action_id != id);
            let after = state.entries.len() + state.exits.len();
            if after != before {
                refs_removed += before - after;
                state.update_region_y_offset();
            }
        }
        for transition in self.transitions.values_mut() {
            let before = transition.actions.len() + transition.guards.len();
            transition.actions.retain(|r| r.action_id != id);
            transition.guards.retain(|r| r.action_id != id);
            refs_removed += before - (transition.actions.len() + transition.guards.len());
        }

        tracing::debug!(
            "Deleted {} action '{}' ({}), removed {} reference(s)",
            action.kind(),
            action.name(),
            id,
            refs_removed
        );

        Ok(action)
    }

    pub fn entries(&self) -> &[Action] {
        self.registry.actions_of(ActionKind::Entry)
    }

    pub fn exits(&self) -> &[Action] {
        self.registry.actions_of(ActionKind::Exit)
    }

    pub fn guards(&self) -> &[Action] {
        self.registry.actions_of(ActionKind::Guard)
    }

    pub fn actions(&self) -> &[Action] {
        self.registry.actions_of(ActionKind::Action)
    }

    fn resolve_refs(&self, refs: &[ActionRef], kind: ActionKind) -> Vec<&Action> {
        refs.iter()
            .filter_map(|r| self.registry.get(r.action_id, kind).ok())
            .collect()
    }

    // =========================================================================
    // Regions
    // =========================================================================

    /// Adds a child region to `state`, turning it into a composite state.
    pub fn add_region(&mut self, state: StateId, off_page: bool) -> Result<RegionId, ModelError> {
        let owner = self.state(state)?;
        if !owner.kind.can_own_regions() {
            return Err(ModelError::invalid_operation(format!(
                "{} state {} cannot own regions",
                owner.kind, state
            )));
        }

        let id = RegionId::new();
        self.regions.insert(id, Region::new(id, Some(state), off_page));
        let owner = self.state_mut(state)?;
        owner.regions.push(id);
        owner.update_region_y_offset();

        tracing::debug!("Added region {} to state {}", id, state);
        Ok(id)
    }

    /// Moves an existing non-root region to the end of `state`'s regions.
    pub fn append_region(&mut self, state: StateId, region: RegionId) -> Result<(), ModelError> {
        let target = self.state(state)?;
        let moved = self.region(region)?;
        let Some(old_owner) = moved.owning_state else {
            return Err(ModelError::invalid_operation("the root region cannot be moved"));
        };
        if !target.kind.can_own_regions() {
            return Err(ModelError::invalid_operation(format!(
                "{} state {} cannot own regions",
                target.kind, state
            )));
        }
        if self.state_within_region(state, region) {
            return Err(ModelError::invalid_operation(format!(
                "region {} contains state {}",
                region, state
            )));
        }

        let old = self.state_mut(old_owner)?;
        old.regions.retain(|r| *r != region);
        old.update_region_y_offset();

        let target = self.state_mut(state)?;
        target.regions.push(region);
        target.update_region_y_offset();

        self.region_mut(region)?.owning_state = Some(state);
        Ok(())
    }

    /// Deletes a region together with everything it contains.
    ///
    /// Rejected when any transition crosses the region boundary.
    pub fn delete_region(&mut self, region: RegionId) -> Result<(), ModelError> {
        let Some(owner) = self.region(region)?.owning_state else {
            return Err(ModelError::invalid_operation("the root region cannot be deleted"));
        };

        let subtree = self.region_subtree(region);
        self.ensure_unreferenced(&subtree, "region", &region.to_string())?;

        let state = self.state_mut(owner)?;
        state.regions.retain(|r| *r != region);
        state.update_region_y_offset();
        self.remove_subtree(&subtree);

        tracing::debug!(
            "Deleted region {} ({} state(s), {} transition(s))",
            region,
            subtree.states.len(),
            subtree.transitions.len()
        );
        Ok(())
    }

    // =========================================================================
    // States
    // =========================================================================

    /// Adds a simple state at the end of `region`.
    pub fn add_state(&mut self, region: RegionId, name: impl Into<String>) -> Result<StateId, ModelError> {
        let name = name.into();
        let id = StateId::new();
        self.region_mut(region)?.states.push(id);
        tracing::debug!("Added state '{}' ({}) to region {}", name, id, region);
        self.states.insert(id, State::new(id, region, name));
        Ok(id)
    }

    /// Moves an existing state, with its subtree, to the end of `region`.
    pub fn append_state(&mut self, region: RegionId, state: StateId) -> Result<(), ModelError> {
        self.region(region)?;
        let old_region = self.state(state)?.owning_region;
        if self.region_within_state(region, state) {
            return Err(ModelError::invalid_operation(format!(
                "state {} contains region {}",
                state, region
            )));
        }

        // Outgoing transitions stay owned by the source's region.
        let outgoing: Vec<TransitionId> = if old_region == region {
            Vec::new()
        } else {
            self.region(old_region)?
                .transitions
                .iter()
                .copied()
                .filter(|t| self.transitions.get(t).is_some_and(|t| t.source == state))
                .collect()
        };

        let old = self.region_mut(old_region)?;
        old.states.retain(|s| *s != state);
        old.transitions.retain(|t| !outgoing.contains(t));

        let target = self.region_mut(region)?;
        target.states.push(state);
        target.transitions.extend(outgoing.iter().copied());

        self.state_mut(state)?.owning_region = region;
        for id in &outgoing {
            self.transition_mut(*id)?.owning_region = region;
        }

        tracing::debug!(
            "Moved state {} to region {} ({} outgoing transition(s))",
            state,
            region,
            outgoing.len()
        );
        Ok(())
    }

    /// Deletes a state together with its child regions.
    ///
    /// Rejected when any transition connects the state, or a state nested
    /// inside it, with a state that survives the delete.
    pub fn delete_state(&mut self, state: StateId) -> Result<(), ModelError> {
        let owning_region = self.state(state)?.owning_region;

        let subtree = self.state_subtree(state);
        self.ensure_unreferenced(&subtree, "state", &state.to_string())?;

        self.region_mut(owning_region)?.states.retain(|s| *s != state);
        self.remove_subtree(&subtree);

        tracing::debug!(
            "Deleted state {} ({} nested state(s))",
            state,
            subtree.states.len() - 1
        );
        Ok(())
    }

    pub fn add_entry(&mut self, state: StateId, action: ActionId) -> Result<(), ModelError> {
        self.add_state_ref(state, ActionKind::Entry, action)
    }

    pub fn add_exit(&mut self, state: StateId, action: ActionId) -> Result<(), ModelError> {
        self.add_state_ref(state, ActionKind::Exit, action)
    }

    pub fn delete_entry(&mut self, state: StateId, action: ActionId) -> Result<(), ModelError> {
        self.delete_state_ref(state, ActionKind::Entry, action)
    }

    pub fn delete_exit(&mut self, state: StateId, action: ActionId) -> Result<(), ModelError> {
        self.delete_state_ref(state, ActionKind::Exit, action)
    }

    /// Entry actions of `state`, resolved through the registry.
    pub fn entry_actions(&self, state: StateId) -> Result<Vec<&Action>, ModelError> {
        Ok(self.resolve_refs(&self.state(state)?.entries, ActionKind::Entry))
    }

    /// Exit actions of `state`, resolved through the registry.
    pub fn exit_actions(&self, state: StateId) -> Result<Vec<&Action>, ModelError> {
        Ok(self.resolve_refs(&self.state(state)?.exits, ActionKind::Exit))
    }

    fn add_state_ref(
        &mut self,
        state: StateId,
        kind: ActionKind,
        action: ActionId,
    ) -> Result<(), ModelError> {
        self.state(state)?;
        self.registry.get(action, kind)?;

        let s = self.state_mut(state)?;
        let list = if kind == ActionKind::Entry {
            &mut s.entries
        } else {
            &mut s.exits
        };
        list.push(ActionRef::new(action));
        s.update_region_y_offset();
        Ok(())
    }

    fn delete_state_ref(
        &mut self,
        state: StateId,
        kind: ActionKind,
        action: ActionId,
    ) -> Result<(), ModelError> {
        let s = self.state_mut(state)?;
        let list = if kind == ActionKind::Entry {
            &mut s.entries
        } else {
            &mut s.exits
        };
        let pos = list
            .iter()
            .position(|r| r.action_id == action)
            .ok_or_else(|| ModelError::ActionRefNotFound {
                owner: format!("state {}", state),
                list: format!("{} list", kind),
                action: action.to_string(),
            })?;
        list.remove(pos);
        s.update_region_y_offset();
        Ok(())
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Adds an external transition, owned by the source's region.
    pub fn add_transition(
        &mut self,
        source: StateId,
        dest: StateId,
    ) -> Result<TransitionId, ModelError> {
        let region = self
            .states
            .get(&source)
            .map(|s| s.owning_region)
            .ok_or_else(|| ModelError::InvalidReference {
                reason: format!("transition source {} is not a state of this model", source),
            })?;
        if !self.states.contains_key(&dest) {
            return Err(ModelError::InvalidReference {
                reason: format!("transition destination {} is not a state of this model", dest),
            });
        }

        let id = TransitionId::new();
        self.region_mut(region)?.transitions.push(id);
        self.transitions
            .insert(id, Transition::new(id, region, source, dest));

        tracing::debug!("Added transition {} ({} -> {})", id, source, dest);
        Ok(id)
    }

    pub fn delete_transition(&mut self, transition: TransitionId) -> Result<(), ModelError> {
        let region = self.transition(transition)?.owning_region;
        self.region_mut(region)?
            .transitions
            .retain(|t| *t != transition);
        self.transitions.remove(&transition);
        tracing::debug!("Deleted transition {}", transition);
        Ok(())
    }

    pub fn add_guard(&mut self, transition: TransitionId, action: ActionId) -> Result<(), ModelError> {
        self.add_transition_ref(transition, ActionKind::Guard, action)
    }

    pub fn add_transition_action(
        &mut self,
        transition: TransitionId,
        action: ActionId,
    ) -> Result<(), ModelError> {
        self.add_transition_ref(transition, ActionKind::Action, action)
    }

    pub fn delete_guard(&mut self, transition: TransitionId, action: ActionId) -> Result<(), ModelError> {
        self.delete_transition_ref(transition, ActionKind::Guard, action)
    }

    pub fn delete_transition_action(
        &mut self,
        transition: TransitionId,
        action: ActionId,
    ) -> Result<(), ModelError> {
        self.delete_transition_ref(transition, ActionKind::Action, action)
    }

    /// Guards of `transition`, resolved through the registry.
    pub fn guard_actions(&self, transition: TransitionId) -> Result<Vec<&Action>, ModelError> {
        Ok(self.resolve_refs(&self.transition(transition)?.guards, ActionKind::Guard))
    }

    /// Effect actions of `transition`, resolved through the registry.
    pub fn transition_actions(&self, transition: TransitionId) -> Result<Vec<&Action>, ModelError> {
        Ok(self.resolve_refs(&self.transition(transition)?.actions, ActionKind::Action))
    }

    fn add_transition_ref(
        &mut self,
        transition: TransitionId,
        kind: ActionKind,
        action: ActionId,
    ) -> Result<(), ModelError> {
        self.transition(transition)?;
        self.registry.get(action, kind)?;

        let t = self.transition_mut(transition)?;
        let list = if kind == ActionKind::Guard {
            &mut t.guards
        } else {
            &mut t.actions
        };
        list.push(ActionRef::new(action));
        Ok(())
    }

    fn delete_transition_ref(
        &mut self,
        transition: TransitionId,
        kind: ActionKind,
        action: ActionId,
    ) -> Result<(), ModelError> {
        let t = self.transition_mut(transition)?;
        let list = if kind == ActionKind::Guard {
            &mut t.guards
        } else {
            &mut t.actions
        };
        let pos = list
            .iter()
            .position(|r| r.action_id == action)
            .ok_or_else(|| ModelError::ActionRefNotFound {
                owner: format!("transition {}", transition),
                list: format!("{} list", kind),
                action: action.to_string(),
            })?;
        list.remove(pos);
        Ok(())
    }

    // =========================================================================
    // Subtrees
    // =========================================================================

    /// True if `region` is one of `state`'s child regions or nested below one.
    fn region_within_state(&self, region: RegionId, state: StateId) -> bool {
        let mut current = region;
        loop {
            let Some(owner) = self.regions.get(&current).and_then(|r| r.owning_state) else {
                return false;
            };
            if owner == state {
                return true;
            }
            match self.states.get(&owner) {
                Some(s) => current = s.owning_region,
                None => return false,
            }
        }
    }

    /// True if `state` lies directly in `region` or nested below it.
    fn state_within_region(&self, state: StateId, region: RegionId) -> bool {
        let mut current = state;
        loop {
            let Some(s) = self.states.get(&current) else {
                return false;
            };
            if s.owning_region == region {
                return true;
            }
            match self.regions.get(&s.owning_region).and_then(|r| r.owning_state) {
                Some(owner) => current = owner,
                None => return false,
            }
        }
    }

    fn state_subtree(&self, state: StateId) -> Subtree {
        let mut subtree = Subtree::default();
        subtree.states.insert(state);
        if let Some(s) = self.states.get(&state) {
            for region in &s.regions {
                self.collect_region(*region, &mut subtree);
            }
        }
        subtree
    }

    fn region_subtree(&self, region: RegionId) -> Subtree {
        let mut subtree = Subtree::default();
        self.collect_region(region, &mut subtree);
        subtree
    }

    fn collect_region(&self, region: RegionId, subtree: &mut Subtree) {
        let mut stack = vec![region];
        while let Some(rid) = stack.pop() {
            let Some(r) = self.regions.get(&rid) else {
                continue;
            };
            subtree.regions.insert(rid);
            subtree.transitions.extend(r.transitions.iter().copied());
            for sid in &r.states {
                subtree.states.insert(*sid);
                if let Some(s) = self.states.get(sid) {
                    stack.extend(s.regions.iter().copied());
                }
            }
        }
    }

    fn ensure_unreferenced(
        &self,
        subtree: &Subtree,
        entity: &str,
        id: &str,
    ) -> Result<(), ModelError> {
        // Only transitions with both ends inside the subtree go with it.
        let blocker = self.transitions.values().find(|t| {
            let source_inside = subtree.states.contains(&t.source);
            let dest_inside = subtree.states.contains(&t.dest);
            if subtree.transitions.contains(&t.id) {
                !(source_inside && dest_inside)
            } else {
                source_inside || dest_inside
            }
        });
        match blocker {
            Some(t) => Err(ModelError::InUse {
                entity: entity.to_string(),
                id: id.to_string(),
                transition: t.id.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn remove_subtree(&mut self, subtree: &Subtree) {
        for id in &subtree.transitions {
            self.transitions.remove(id);
        }
        for id in &subtree.states {
            self.states.remove(id);
        }
        for id in &subtree.regions {
            self.regions.remove(id);
        }
    }

    // =========================================================================
    // Integrity
    // =========================================================================

    /// Audits the structural and referential invariants of the graph.
    ///
    /// Returns the list of problems found; empty means the model is consistent.
    pub fn integrity_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let mut seen_regions = HashSet::new();
        let mut seen_states = HashSet::new();
        let mut seen_transitions = HashSet::new();

        match self.regions.get(&self.root) {
            Some(r) if r.owning_state.is_some() => {
                issues.push(format!("root region {} has an owning state", self.root))
            }
            None => issues.push(format!("root region {} is missing", self.root)),
            _ => {}
        }

        let mut stack = vec![(self.root, None)];
        while let Some((rid, parent)) = stack.pop() {
            if !seen_regions.insert(rid) {
                issues.push(format!("region {} is listed more than once", rid));
                continue;
            }
            let Some(region) = self.regions.get(&rid) else {
                issues.push(format!("region {} is listed but not present", rid));
                continue;
            };
            if region.owning_state != parent {
                issues.push(format!("region {} has a stale owning state", rid));
            }

            for tid in &region.transitions {
                if !seen_transitions.insert(*tid) {
                    issues.push(format!("transition {} is listed more than once", tid));
                    continue;
                }
                match self.transitions.get(tid) {
                    Some(t) if t.owning_region != rid => {
                        issues.push(format!("transition {} has a stale owning region", tid))
                    }
                    None => issues.push(format!("transition {} is listed but not present", tid)),
                    _ => {}
                }
            }

            for sid in &region.states {
                if !seen_states.insert(*sid) {
                    issues.push(format!("state {} is listed more than once", sid));
                    continue;
                }
                let Some(state) = self.states.get(sid) else {
                    issues.push(format!("state {} is listed but not present", sid));
                    continue;
                };
                if state.owning_region != rid {
                    issues.push(format!("state {} has a stale owning region", sid));
                }
                if !state.kind.can_own_regions() && !state.regions.is_empty() {
                    issues.push(format!("{} state {} owns regions", state.kind, sid));
                }
                self.audit_refs(&mut issues, &format!("state {}", sid), &state.entries, ActionKind::Entry);
                self.audit_refs(&mut issues, &format!("state {}", sid), &state.exits, ActionKind::Exit);

                let mut expected = state.clone();
                expected.update_region_y_offset();
                if expected.region_y_offset != state.region_y_offset {
                    issues.push(format!("state {} has a stale region offset", sid));
                }

                for child in &state.regions {
                    stack.push((*child, Some(*sid)));
                }
            }
        }

        for t in self.transitions.values() {
            match self.states.get(&t.source) {
                Some(s) if s.owning_region != t.owning_region => issues.push(format!(
                    "transition {} is not owned by the region of its source {}",
                    t.id, t.source
                )),
                Some(_) => {}
                None => issues.push(format!(
                    "transition {} has a dangling source {}",
                    t.id, t.source
                )),
            }
            if !self.states.contains_key(&t.dest) {
                issues.push(format!("transition {} has a dangling destination {}", t.id, t.dest));
            }
            let owner = format!("transition {}", t.id);
            self.audit_refs(&mut issues, &owner, &t.guards, ActionKind::Guard);
            self.audit_refs(&mut issues, &owner, &t.actions, ActionKind::Action);
        }

        if seen_regions.len() != self.regions.len() {
            issues.push(format!(
                "{} region(s) unreachable from the root",
                self.regions.len().saturating_sub(seen_regions.len())
            ));
        }
        if seen_states.len() != self.states.len() {
            issues.push(format!(
                "{} state(s) unreachable from the root",
                self.states.len().saturating_sub(seen_states.len())
            ));
        }
        if seen_transitions.len() != self.transitions.len() {
            issues.push(format!(
                "{} transition(s) not owned by any region",
                self.transitions.len().saturating_sub(seen_transitions.len())
            ));
        }

        issues
    }

    /// Fails with the first integrity problem, if any.
    pub fn check_integrity(&self) -> Result<(), ModelError> {
        match self.integrity_issues().into_iter().next() {
            Some(reason) => Err(ModelError::InvalidReference { reason }),
            None => Ok(()),
        }
    }

    fn audit_refs(&self, issues: &mut Vec<String>, owner: &str, refs: &[ActionRef], kind: ActionKind) {
        for r in refs {
            if !self.registry.contains(r.action_id, kind) {
                issues.push(format!(
                    "{} refers to unknown {} action {}",
                    owner, kind, r.action_id
                ));
            }
        }
    }
}

/// Entities contained in a region or state subtree.
#[derive(Debug, Default)]
struct Subtree {
    regions: HashSet<RegionId>,
    states: HashSet<StateId>,
    transitions: HashSet<TransitionId>,
}
