//! Core library for the PathMusic editor.
//!
//! The crate holds the branching music graph of an adaptive soundtrack and
//! the text formats it is stored in. Each module owns one concern (entity
//! types, the editable store, reverse lookups, the text codec and chain
//! grouping) so a front end only needs [`codec::load_model`] to get a
//! [`Model`] it can query and edit.

pub mod codec;
pub mod config;
pub mod error;
pub mod grouping;
pub mod index;
pub mod model;
pub mod store;

pub use codec::{dump_model, load_model, DumpedFiles, EventDocument, NodeDocument};
pub use config::{EditorConfig, FileLayout, ModelConfig};
pub use error::{EntityKind, PathMusicError, Result};
pub use grouping::group_chains;
pub use index::ReverseIndex;
pub use model::{Action, ActionKind, Branch, Event, ModelData, Node, NodeId, Track, Variable};
pub use store::{EventKey, Model};
