//! # statechart-core
//!
//! In-memory model of a hierarchical state machine (statechart).
//!
//! This crate provides:
//! - Typed, UUID-backed identities for every entity
//! - The per-kind action registry and non-owning action references
//! - Regions, states and transitions owned by a single `Model`
//! - Lossless mapping between the model and its JSON document tree

#![recursion_limit = "256"]

pub mod action;
pub mod document;
pub mod error;
pub mod id;
pub mod model;
pub mod region;
pub mod state;
pub mod transition;

pub use action::{Action, ActionKind, ActionRef, ActionRegistry};
pub use document::Document;
pub use error::ModelError;
pub use id::{ActionId, RegionId, StateId, TransitionId};
pub use model::{Model, FORMAT_VERSION};
pub use region::Region;
pub use state::{State, StateKind};
pub use transition::{Transition, TransitionKind};
