//! Text formats of a music directory.
//!
//! Three grammars share this module: the tracks list, the nodes list (node
//! records, their trailing branch records and the router arrays) and the
//! line-oriented events file. Every `dump_*` function is the exact inverse of
//! its `parse_*` counterpart for text the dumper produced.

pub mod events;
pub mod literal;
pub mod nodes;
pub mod tracks;

use serde::{Deserialize, Serialize};

use crate::{config::ModelConfig, model::ModelData, store::Model, Result};

pub use events::{dump_events, parse_events, EventDocument};
pub use nodes::{dump_nodes_and_routers, parse_nodes_and_routers, NodeDocument};
pub use tracks::{dump_tracks, parse_tracks};

/// Canonical text of the three files of a music directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpedFiles {
    pub tracks: String,
    pub nodes: String,
    pub events: String,
}

/// Parses a whole directory's worth of text into a [`Model`]. Tracks come
/// first because the events grammar validates its `#<track>` comments against
/// them. Nothing is built unless all three parse.
pub fn load_model(tracks: &str, nodes: &str, events: &str, config: &ModelConfig) -> Result<Model> {
    let tracks = parse_tracks(tracks)?;
    let NodeDocument { nodes, routers } = parse_nodes_and_routers(nodes)?;
    let EventDocument { variables, events } = parse_events(events, &tracks)?;
    let data = ModelData {
        tracks,
        nodes,
        events,
        variables,
        routers,
    };
    tracing::debug!(
        tracks = data.tracks.len(),
        nodes = data.nodes.len(),
        events = data.events.len(),
        "model loaded"
    );
    Ok(Model::from_data(data, config.clone()))
}

pub fn dump_model(model: &Model) -> DumpedFiles {
    let data = model.data();
    DumpedFiles {
        tracks: dump_tracks(&data.tracks),
        nodes: dump_nodes_and_routers(&data.nodes, &data.routers),
        events: dump_events(&data.variables, &data.events),
    }
}

/// Raw text of 1-based `line`, without its line terminator.
pub(crate) fn source_line(source: &str, line: usize) -> &str {
    source
        .split('\n')
        .nth(line.saturating_sub(1))
        .unwrap_or_default()
        .trim_end_matches('\r')
}
