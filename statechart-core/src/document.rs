//! Document tree and its mapping to and from the live graph.
//!
//! Documents are JSON:
//!
//! ```json
//! {
//!   "version": 1,
//!   "name": "Blinky",
//!   "entries": [{"id": "2f1c…", "name": "led_on"}],
//!   "exits": [], "guards": [], "actions": [],
//!   "root": {
//!     "id": "9a0e…", "name": "Root region", "off_page": false, "h": 0.0, "focus": false,
//!     "states": [
//!       {"id": "c4d2…", "name": "On", "kind": "simple",
//!        "x": 10.0, "y": 10.0, "w": 100.0, "h": 50.0,
//!        "entries": ["2f1c…"], "exits": [], "regions": []}
//!     ],
//!     "transitions": []
//!   }
//! }
//! ```
//!
//! Actions are written once at the document root; states and transitions
//! refer to them by identity only.

use crate::action::{ActionKind, ActionRef};
use crate::error::ModelError;
use crate::id::{ActionId, RegionId, StateId, TransitionId};
use crate::model::{Model, FORMAT_VERSION};
use crate::region::Region;
use crate::state::{State, StateKind};
use crate::transition::{Transition, TransitionKind};
use serde::{Deserialize, Serialize};

/// Persisted model document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Raw JSON number; any value other than [`FORMAT_VERSION`] fails the
    /// load as a version mismatch.
    pub version: serde_json::Number,
    pub name: String,
    #[serde(default)]
    pub entries: Vec<ActionDoc>,
    #[serde(default)]
    pub exits: Vec<ActionDoc>,
    #[serde(default)]
    pub guards: Vec<ActionDoc>,
    #[serde(default)]
    pub actions: Vec<ActionDoc>,
    pub root: RegionDoc,
}

/// Persisted action function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDoc {
    pub id: ActionId,
    pub name: String,
}

/// Persisted region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDoc {
    pub id: RegionId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub off_page: bool,
    #[serde(default)]
    pub h: f64,
    #[serde(default)]
    pub focus: bool,
    #[serde(default)]
    pub states: Vec<StateDoc>,
    #[serde(default)]
    pub transitions: Vec<TransitionDoc>,
}

/// Persisted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDoc {
    pub id: StateId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: StateKind,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub w: f64,
    #[serde(default)]
    pub h: f64,
    #[serde(default)]
    pub entries: Vec<ActionId>,
    #[serde(default)]
    pub exits: Vec<ActionId>,
    #[serde(default)]
    pub regions: Vec<RegionDoc>,
}

/// Persisted transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDoc {
    pub id: TransitionId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub trigger: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub trigger_code: i64,
    #[serde(default)]
    pub kind: TransitionKind,
    pub source: StateId,
    pub dest: StateId,
    #[serde(default)]
    pub actions: Vec<ActionId>,
    #[serde(default)]
    pub guards: Vec<ActionId>,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

fn ensure_finite_region(region: &RegionDoc) -> Result<(), ModelError> {
    if !region.h.is_finite() {
        return Err(ModelError::invalid_operation(format!(
            "region {} has non-finite height {}",
            region.id, region.h
        )));
    }
    for state in &region.states {
        for (field, value) in [("x", state.x), ("y", state.y), ("w", state.w), ("h", state.h)] {
            if !value.is_finite() {
                return Err(ModelError::invalid_operation(format!(
                    "state {} has non-finite {} {}",
                    state.id, field, value
                )));
            }
        }
        for child in &state.regions {
            ensure_finite_region(child)?;
        }
    }
    Ok(())
}

impl Document {
    /// Parses a document from JSON bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, ModelError> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Parses a document from a JSON value.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ModelError> {
        Ok(serde_json::from_value(json.clone())?)
    }

    pub fn to_json(&self) -> Result<serde_json::Value, ModelError> {
        self.ensure_finite()?;
        Ok(serde_json::to_value(self)?)
    }

    /// Fails on geometry JSON cannot represent (NaN or infinity).
    pub fn ensure_finite(&self) -> Result<(), ModelError> {
        ensure_finite_region(&self.root)
    }

    fn action_list(&self, kind: ActionKind) -> &[ActionDoc] {
        match kind {
            ActionKind::Entry => &self.entries,
            ActionKind::Exit => &self.exits,
            ActionKind::Guard => &self.guards,
            ActionKind::Action => &self.actions,
        }
    }
}

// =============================================================================
// Write path
// =============================================================================

impl Model {
    /// Builds the document tree for this model.
    pub fn to_document(&self) -> Document {
        let actions_of = |kind: ActionKind| -> Vec<ActionDoc> {
            self.registry
                .actions_of(kind)
                .iter()
                .map(|a| ActionDoc {
                    id: a.id(),
                    name: a.name().to_string(),
                })
                .collect()
        };

        Document {
            version: self.version.into(),
            name: self.name.clone(),
            entries: actions_of(ActionKind::Entry),
            exits: actions_of(ActionKind::Exit),
            guards: actions_of(ActionKind::Guard),
            actions: actions_of(ActionKind::Action),
            root: self.region_doc(self.root_region()),
        }
    }

    fn region_doc(&self, region: &Region) -> RegionDoc {
        RegionDoc {
            id: region.id,
            name: region.name.clone(),
            off_page: region.off_page,
            h: region.height,
            focus: region.focus,
            states: region
                .states
                .iter()
                .filter_map(|id| self.states.get(id))
                .map(|s| self.state_doc(s))
                .collect(),
            transitions: region
                .transitions
                .iter()
                .filter_map(|id| self.transitions.get(id))
                .map(transition_doc)
                .collect(),
        }
    }

    fn state_doc(&self, state: &State) -> StateDoc {
        StateDoc {
            id: state.id,
            name: state.name.clone(),
            kind: state.kind,
            x: state.x,
            y: state.y,
            w: state.w,
            h: state.h,
            entries: ref_ids(&state.entries),
            exits: ref_ids(&state.exits),
            regions: state
                .regions
                .iter()
                .filter_map(|id| self.regions.get(id))
                .map(|r| self.region_doc(r))
                .collect(),
        }
    }

    /// Serializes the model to a JSON value.
    pub fn to_json(&self) -> Result<serde_json::Value, ModelError> {
        self.to_document().to_json()
    }
}

fn transition_doc(t: &Transition) -> TransitionDoc {
    TransitionDoc {
        id: t.id,
        name: t.name.clone(),
        trigger: t.trigger_name.clone(),
        trigger_code: t.trigger_code,
        kind: t.kind,
        source: t.source,
        dest: t.dest,
        actions: ref_ids(&t.actions),
        guards: ref_ids(&t.guards),
    }
}

fn ref_ids(refs: &[ActionRef]) -> Vec<ActionId> {
    refs.iter().map(|r| r.action_id).collect()
}

// =============================================================================
// Load path
// =============================================================================

impl Model {
    /// Rebuilds a model from a document, preserving every identity.
    ///
    /// Actions are materialized first, then regions and states top-down, and
    /// transitions last, once every state in the document is known. Any
    /// unresolvable or duplicate identity fails the whole load.
    pub fn from_document(doc: &Document) -> Result<Self, ModelError> {
        if doc.version.as_u64() != Some(u64::from(FORMAT_VERSION)) {
            return Err(ModelError::UnsupportedVersion {
                found: doc.version.to_string(),
                supported: FORMAT_VERSION,
            });
        }

        let mut model = Model::with_root(doc.name.clone(), FORMAT_VERSION, doc.root.id);

        for kind in ActionKind::ALL {
            for action in doc.action_list(kind) {
                model.registry.insert(action.id, kind, action.name.clone())?;
            }
        }

        let mut pending = Vec::new();
        let mut stack = vec![(&doc.root, None)];
        while let Some((region_doc, owner)) = stack.pop() {
            model.load_region(region_doc, owner, &mut pending, &mut stack)?;
        }

        for (region, t) in pending {
            model.link_transition(region, t)?;
        }

        Ok(model)
    }

    /// Parses and rebuilds a model from a JSON value.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ModelError> {
        Self::from_document(&Document::from_json(json)?)
    }

    fn load_region<'d>(
        &mut self,
        doc: &'d RegionDoc,
        owner: Option<StateId>,
        pending: &mut Vec<(RegionId, &'d TransitionDoc)>,
        stack: &mut Vec<(&'d RegionDoc, Option<StateId>)>,
    ) -> Result<(), ModelError> {
        // The root region is created with the model itself.
        if owner.is_some() && self.regions.contains_key(&doc.id) {
            return Err(ModelError::parse(format!("duplicate region id {}", doc.id)));
        }

        let mut region = Region::new(doc.id, owner, doc.off_page);
        region.name = doc.name.clone();
        region.height = doc.h;
        region.focus = doc.focus;

        for state_doc in &doc.states {
            let state = self.load_state(state_doc, doc.id)?;
            region.states.push(state);
            // Children are pushed in reverse so they pop in document order.
            for child in state_doc.regions.iter().rev() {
                stack.push((child, Some(state)));
            }
        }
        for t in &doc.transitions {
            pending.push((doc.id, t));
        }

        self.regions.insert(doc.id, region);
        Ok(())
    }

    fn load_state(&mut self, doc: &StateDoc, region: RegionId) -> Result<StateId, ModelError> {
        if self.states.contains_key(&doc.id) {
            return Err(ModelError::parse(format!("duplicate state id {}", doc.id)));
        }
        if !doc.kind.can_own_regions() && !doc.regions.is_empty() {
            return Err(ModelError::parse(format!(
                "{} state {} owns regions",
                doc.kind, doc.id
            )));
        }

        let mut state = State::new(doc.id, region, doc.name.clone());
        state.kind = doc.kind;
        state.set_xy(doc.x, doc.y);
        state.set_size(doc.w, doc.h);
        state.entries = self.resolve_ids(&doc.entries, ActionKind::Entry, "state", doc.id)?;
        state.exits = self.resolve_ids(&doc.exits, ActionKind::Exit, "state", doc.id)?;
        state.regions = doc.regions.iter().map(|r| r.id).collect();
        state.update_region_y_offset();

        self.states.insert(doc.id, state);
        Ok(doc.id)
    }

    fn link_transition(&mut self, region: RegionId, doc: &TransitionDoc) -> Result<(), ModelError> {
        if self.transitions.contains_key(&doc.id) {
            return Err(ModelError::parse(format!("duplicate transition id {}", doc.id)));
        }
        for (end, id) in [("source", doc.source), ("destination", doc.dest)] {
            if !self.states.contains_key(&id) {
                return Err(ModelError::parse(format!(
                    "transition {} has unknown {} state {}",
                    doc.id, end, id
                )));
            }
        }
        if self.states.get(&doc.source).map(|s| s.owning_region) != Some(region) {
            return Err(ModelError::parse(format!(
                "transition {} is stored outside the region of its source {}",
                doc.id, doc.source
            )));
        }

        let mut t = Transition::new(doc.id, region, doc.source, doc.dest);
        t.name = doc.name.clone();
        t.set_trigger(doc.trigger.clone(), doc.trigger_code);
        t.kind = doc.kind;
        t.actions = self.resolve_ids(&doc.actions, ActionKind::Action, "transition", doc.id)?;
        t.guards = self.resolve_ids(&doc.guards, ActionKind::Guard, "transition", doc.id)?;

        if let Some(r) = self.regions.get_mut(&region) {
            r.transitions.push(doc.id);
        }
        self.transitions.insert(doc.id, t);
        Ok(())
    }

    fn resolve_ids(
        &self,
        ids: &[ActionId],
        kind: ActionKind,
        owner: &str,
        owner_id: impl std::fmt::Display,
    ) -> Result<Vec<ActionRef>, ModelError> {
        ids.iter()
            .map(|id| {
                if self.registry.contains(*id, kind) {
                    Ok(ActionRef::new(*id))
                } else {
                    Err(ModelError::parse(format!(
                        "{} {} refers to unknown {} action {}",
                        owner, owner_id, kind, id
                    )))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_model() -> Model {
        let mut model = Model::new("Test");
        let root = model.root();
        model.root_region_mut().set_name("Root region");

        let a = model.add_state(root, "A").unwrap();
        let b = model.add_state(root, "B").unwrap();
        model.state_mut(a).unwrap().set_xy(10.0, 20.0);
        model.state_mut(a).unwrap().set_size(200.0, 150.0);

        let r = model.add_region(a, false).unwrap();
        model.region_mut(r).unwrap().set_height(120.0);
        let a1 = model.add_state(r, "A1").unwrap();
        let init = model.add_state(r, "init").unwrap();
        model
            .state_mut(init)
            .unwrap()
            .set_kind(StateKind::Init)
            .unwrap();

        let entry = model.add_action(ActionKind::Entry, "led_on");
        let exit = model.add_action(ActionKind::Exit, "led_off");
        let guard = model.add_action(ActionKind::Guard, "is_ready");
        let effect = model.add_action(ActionKind::Action, "notify");
        model.add_entry(a, entry).unwrap();
        model.add_exit(a1, exit).unwrap();

        model.add_transition(init, a1).unwrap();
        let t = model.add_transition(a1, b).unwrap();
        model.transition_mut(t).unwrap().set_trigger("eTimeout", 7);
        model
            .transition_mut(t)
            .unwrap()
            .set_kind(TransitionKind::Local);
        model.add_guard(t, guard).unwrap();
        model.add_transition_action(t, effect).unwrap();

        model
    }

    #[test]
    fn test_document_roundtrip() {
        let model = sample_model();
        let doc = model.to_document();
        let loaded = Model::from_document(&doc).unwrap();

        assert_eq!(loaded.to_document(), doc);
        assert_eq!(loaded.root(), model.root());
        assert_eq!(loaded.state_count(), 4);
        assert_eq!(loaded.transition_count(), 2);
        assert!(loaded.integrity_issues().is_empty());

        let a = loaded.find_state_by_name("A").unwrap();
        assert_eq!(a.xy(), (10.0, 20.0));
        assert_eq!(a.size(), (200.0, 150.0));
        assert_eq!(a.region_y_offset(), 40.0);
        assert_eq!(
            loaded.entry_actions(a.id()).unwrap()[0].name(),
            "led_on"
        );
    }

    #[test]
    fn test_actions_written_once() {
        let mut model = Model::new("Shared");
        let root = model.root();
        let entry = model.add_action(ActionKind::Entry, "shared");
        for name in ["A", "B", "C"] {
            let s = model.add_state(root, name).unwrap();
            model.add_entry(s, entry).unwrap();
        }

        let json = model.to_json().unwrap();
        assert_eq!(json["entries"].as_array().unwrap().len(), 1);
        for state in json["root"]["states"].as_array().unwrap() {
            assert_eq!(state["entries"], json!([entry.to_string()]));
        }
    }

    #[test]
    fn test_schema_field_names() {
        let json = sample_model().to_json().unwrap();
        let root = &json["root"];
        assert_eq!(root["name"], "Root region");
        assert!(root["off_page"].is_boolean());
        assert!(root["h"].is_number());

        let a = &root["states"][0];
        assert_eq!(a["kind"], "simple");
        let inner = &a["regions"][0];
        assert_eq!(inner["h"], 120.0);
        assert_eq!(inner["states"][1]["kind"], "init");

        let t = &inner["transitions"][1];
        assert_eq!(t["trigger"], "eTimeout");
        assert_eq!(t["trigger_code"], 7);
        assert_eq!(t["kind"], "local");
        assert!(inner["transitions"][0].get("trigger_code").is_none());
    }

    #[test]
    fn test_transition_to_later_region() {
        // Source in the root region, destination in a region visited later.
        let json = json!({
            "version": 1,
            "name": "Forward",
            "entries": [], "exits": [], "guards": [], "actions": [],
            "root": {
                "id": "00000000-0000-4000-8000-000000000001",
                "name": "", "off_page": false, "h": 0.0, "focus": false,
                "states": [
                    {"id": "00000000-0000-4000-8000-000000000002", "name": "A", "kind": "simple",
                     "x": 0.0, "y": 0.0, "w": 0.0, "h": 0.0, "entries": [], "exits": [], "regions": []},
                    {"id": "00000000-0000-4000-8000-000000000003", "name": "B", "kind": "simple",
                     "x": 0.0, "y": 0.0, "w": 0.0, "h": 0.0, "entries": [], "exits": [],
                     "regions": [{
                        "id": "00000000-0000-4000-8000-000000000004",
                        "name": "", "off_page": true, "h": 0.0, "focus": false,
                        "states": [
                            {"id": "00000000-0000-4000-8000-000000000005", "name": "B1", "kind": "final",
                             "x": 0.0, "y": 0.0, "w": 0.0, "h": 0.0, "entries": [], "exits": [], "regions": []}
                        ],
                        "transitions": []
                     }]}
                ],
                "transitions": [
                    {"id": "00000000-0000-4000-8000-000000000006", "name": "", "trigger": "go",
                     "kind": "external",
                     "source": "00000000-0000-4000-8000-000000000002",
                     "dest": "00000000-0000-4000-8000-000000000005",
                     "actions": [], "guards": []}
                ]
            }
        });

        let model = Model::from_json(&json).unwrap();
        let b1 = model.find_state_by_name("B1").unwrap();
        assert_eq!(b1.kind(), StateKind::Final);
        assert_eq!(model.transitions_to(b1.id()).len(), 1);
        assert!(model.integrity_issues().is_empty());
    }

    #[test]
    fn test_dangling_action_reference() {
        let mut json = sample_model().to_json().unwrap();
        json["entries"] = json!([]);

        let result = Model::from_json(&json);
        assert!(matches!(result, Err(ModelError::Parse { .. })));
    }

    #[test]
    fn test_dangling_guard_reference() {
        let mut json = sample_model().to_json().unwrap();
        json["guards"] = json!([]);

        let result = Model::from_json(&json);
        assert!(matches!(result, Err(ModelError::Parse { .. })));
    }

    #[test]
    fn test_wrong_kind_reference() {
        // An exit action listed among a state's entries does not resolve.
        let mut json = sample_model().to_json().unwrap();
        let exit_id = json["exits"][0]["id"].clone();
        json["root"]["states"][1]["entries"] = json!([exit_id]);

        let result = Model::from_json(&json);
        assert!(matches!(result, Err(ModelError::Parse { .. })));
    }

    #[test]
    fn test_unknown_transition_endpoint() {
        let mut json = sample_model().to_json().unwrap();
        json["root"]["states"][0]["regions"][0]["transitions"][0]["dest"] =
            json!(StateId::new().to_string());

        let result = Model::from_json(&json);
        assert!(matches!(result, Err(ModelError::Parse { .. })));
    }

    #[test]
    fn test_duplicate_state_id() {
        let mut json = sample_model().to_json().unwrap();
        let a_id = json["root"]["states"][0]["id"].clone();
        json["root"]["states"][1]["id"] = a_id;

        let result = Model::from_json(&json);
        assert!(matches!(result, Err(ModelError::Parse { .. })));
    }

    #[test]
    fn test_leaf_state_with_regions_rejected() {
        let mut json = sample_model().to_json().unwrap();
        json["root"]["states"][0]["kind"] = json!("choice");

        let result = Model::from_json(&json);
        assert!(matches!(result, Err(ModelError::Parse { .. })));
    }

    #[test]
    fn test_unsupported_version() {
        let mut json = sample_model().to_json().unwrap();
        json["version"] = json!(FORMAT_VERSION + 1);

        let result = Model::from_json(&json);
        assert!(matches!(
            result,
            Err(ModelError::UnsupportedVersion { ref found, .. }) if found == "2"
        ));
    }

    #[test]
    fn test_non_integer_version() {
        for version in [json!(-1), json!(1.5), json!(4294967297u64)] {
            let mut json = sample_model().to_json().unwrap();
            json["version"] = version.clone();

            let err = Model::from_json(&json).unwrap_err();
            assert_eq!(err.error_code(), "VERSION_ERROR", "version {}", version);
        }

        let mut json = sample_model().to_json().unwrap();
        json["version"] = json!("1");
        assert_eq!(Model::from_json(&json).unwrap_err().error_code(), "PARSE_ERROR");
    }

    #[test]
    fn test_non_finite_geometry_rejected() {
        let mut model = sample_model();
        let a = model.find_state_by_name("A").unwrap().id();
        model.state_mut(a).unwrap().set_xy(f64::NAN, 1.0);

        let err = model.to_json().unwrap_err();
        assert!(matches!(err, ModelError::InvalidOperation { .. }));

        model.state_mut(a).unwrap().set_xy(1.0, 1.0);
        model.to_json().unwrap();

        let r = model.state(a).unwrap().regions()[0];
        model.region_mut(r).unwrap().set_height(f64::INFINITY);
        assert!(model.to_document().ensure_finite().is_err());

        model.region_mut(r).unwrap().set_height(f64::NEG_INFINITY);
        assert!(model.to_json().is_err());
    }

    #[test]
    fn test_transition_outside_source_region_rejected() {
        let mut json = sample_model().to_json().unwrap();
        let inner = &mut json["root"]["states"][0]["regions"][0]["transitions"];
        let t = inner.as_array_mut().unwrap().remove(0);
        json["root"]["transitions"].as_array_mut().unwrap().push(t);

        let result = Model::from_json(&json);
        assert!(matches!(result, Err(ModelError::Parse { .. })));
    }

    #[test]
    fn test_malformed_document() {
        let result = Document::from_slice(b"{\"version\": 1, \"name\": 5}");
        assert!(matches!(result, Err(ModelError::Json(_))));

        let json = json!({"version": 1, "name": "x", "root": {"id": "not-a-uuid"}});
        assert!(Model::from_json(&json).is_err());
    }

    #[test]
    fn test_minimal_document_defaults() {
        let json = json!({
            "version": 1,
            "name": "Empty",
            "root": {"id": "00000000-0000-4000-8000-0000000000aa"}
        });
        let model = Model::from_json(&json).unwrap();
        assert_eq!(model.name(), "Empty");
        assert!(model.registry().is_empty());
        assert!(model.root_region().states().is_empty());
    }
}
