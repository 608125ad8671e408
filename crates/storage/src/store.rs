//! Terminal record persistence

use crate::error::{Result, StorageError};
use greenstone_scripting::SaveData;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Deepest JSON nesting a state file may have
///
/// Reading is done without serde_json's own recursion limit, which is far
/// lower than what saved programs and lists reach. This bound keeps reading
/// within the stack instead.
pub const MAX_STATE_DEPTH: usize = 512;

/// Deepest nesting of arrays and objects in JSON text
fn json_depth(json: &str) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for byte in json.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                max = max.max(depth);
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

fn check_depth(json: &str) -> Result<()> {
    let depth = json_depth(json);
    if depth > MAX_STATE_DEPTH {
        return Err(StorageError::TooDeep {
            depth,
            limit: MAX_STATE_DEPTH,
        });
    }
    Ok(())
}

/// Everything a terminal needs to resume where it left off
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TerminalSaveData {
    /// Scrollback text
    #[serde(default)]
    pub logs: String,

    /// Terminal filesystem, file name to contents
    #[serde(default)]
    pub files: BTreeMap<String, String>,

    /// Interpreter variables and stack
    #[serde(default)]
    pub context: SaveData,
}

/// JSON file holding a [`TerminalSaveData`]
///
/// # Purpose
/// Loads the record on startup and writes it back after jobs and on exit.
///
/// # File Format
/// Pretty-printed JSON:
/// ```text
/// {
///   "logs": ">1 2 add\n",
///   "files": { "hello": "\"hi\" print" },
///   "context": { "vars": {}, "stack": [{ "type": "int", "value": 3 }] }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Create a store for the record at `path`
    ///
    /// # Arguments
    /// * `path` - Location of the JSON file; it does not need to exist yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record
    ///
    /// # Returns
    /// `None` if no record has been saved yet, otherwise the decoded record
    pub fn load(&self) -> Result<Option<TerminalSaveData>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No saved state at {:?}", self.path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        check_depth(&content)?;

        let mut deserializer = serde_json::Deserializer::from_str(&content);
        deserializer.disable_recursion_limit();
        let data = TerminalSaveData::deserialize(&mut deserializer)
            .and_then(|data| deserializer.end().map(|()| data))
            .map_err(|source| StorageError::Corrupted {
                path: self.path.display().to_string(),
                source,
            })?;

        info!(
            "Loaded terminal state from {:?} ({} files, {} vars)",
            self.path,
            data.files.len(),
            data.context.vars.len()
        );
        Ok(Some(data))
    }

    /// Save the record
    ///
    /// # Behavior
    /// 1. Encodes the record as pretty JSON
    /// 2. Refuses records nested deeper than [`MAX_STATE_DEPTH`], which could
    ///    not be read back
    /// 3. Writes it to a temporary file next to the target
    /// 4. Renames the temporary file over the target
    ///
    /// An interrupted or refused save leaves the previous record intact.
    pub fn save(&self, data: &TerminalSaveData) -> Result<()> {
        let json = serde_json::to_string_pretty(data).map_err(StorageError::Encode)?;
        check_depth(&json)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.temp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Saved terminal state to {:?}", self.path);
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("state"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
