use crate::{model::Track, Result};

use super::literal::{parse_list, RecordFields};

/// Parses the tracks file: a bracketed list of seven-field records.
pub fn parse_tracks(source: &str) -> Result<Vec<Track>> {
    let mut tracks = Vec::new();
    for element in parse_list(source)? {
        let mut fields = RecordFields::new(source, element)?;
        let track = Track {
            path: fields.string("path")?,
            starting_sample: fields.int("startingsample")?,
            num_subbanks: fields.int("numsubbanks")?,
            purge_mode: fields.int("purgemode")?,
            checksum: fields.int("muschecksum")?,
            max_aram: fields.int("maxaram")?,
            max_mram: fields.int("maxmram")?,
        };
        fields.finish()?;
        tracks.push(track);
    }
    tracing::debug!(tracks = tracks.len(), "parsed tracks");
    Ok(tracks)
}

pub fn dump_tracks(tracks: &[Track]) -> String {
    let mut lines = Vec::with_capacity(tracks.len() + 2);
    lines.push("[".to_string());
    for track in tracks {
        let path = serde_json::Value::String(track.path.clone());
        lines.push(format!(
            "\t{{ path: {path}, startingsample: {}, numsubbanks: {}, purgemode: {}, muschecksum: {}, maxaram: {}, maxmram: {}}},",
            track.starting_sample,
            track.num_subbanks,
            track.purge_mode,
            track.checksum,
            track.max_aram,
            track.max_mram,
        ));
    }
    lines.push("]\n".to_string());
    lines.join("\n")
}
