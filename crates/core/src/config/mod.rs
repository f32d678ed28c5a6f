use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub files: FileLayout,
    pub model: ModelConfig,
}

impl EditorConfig {
    /// Parses a JSON document. Fields that are left out keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// File names of the three documents that make up a music directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLayout {
    pub tracks: String,
    pub nodes: String,
    pub events: String,
}

impl Default for FileLayout {
    fn default() -> Self {
        Self {
            tracks: "tracks.txt".to_string(),
            nodes: "nodes.txt".to_string(),
            events: "events.txt".to_string(),
        }
    }
}

/// Settings the model consults when indexing and rewriting data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Operands starting with this prefix are engine-reserved constants.
    pub special_value_prefix: String,
    /// Variable names are cut to this many characters by `set_variables`.
    pub max_variable_name_len: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            special_value_prefix: "PATH_".to_string(),
            max_variable_name_len: 15,
        }
    }
}

impl ModelConfig {
    pub fn is_special_value(&self, name: &str) -> bool {
        !self.special_value_prefix.is_empty() && name.starts_with(&self.special_value_prefix)
    }
}
