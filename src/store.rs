//! Durable storage for the loop state document.
//!
//! One JSON file under the project's `.taskloop/` directory, rewritten on
//! every status-changing operation. Writes publish atomically (temp file then
//! rename) so a concurrent or interrupted reader never sees a torn document.
//! Reads are lenient: anything short of a valid, current-or-older document is
//! reported as "no state" rather than an error.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::LoopError;
use crate::state::{LoopState, SCHEMA_VERSION};

/// Hidden project-relative directory holding all tracker files.
pub const STATE_DIR: &str = ".taskloop";
const STATE_FILE: &str = "state.json";
const PLANS_DIR: &str = "plans";

/// Resolved file locations for one project root. Injected into every
/// operation so tests can point the tracker at a temp directory.
#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new(project_root: &Path) -> Self {
        Self {
            root: project_root.join(STATE_DIR),
        }
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.join(STATE_FILE)
    }

    pub fn plans_dir(&self) -> PathBuf {
        self.root.join(PLANS_DIR)
    }

    /// Resolve a plan source identifier to a file inside the plans
    /// directory. Absolute paths and any non-plain path component are
    /// rejected so the identifier cannot escape the storage boundary.
    pub fn resolve_plan(&self, source: &str) -> Result<PathBuf, LoopError> {
        let invalid = || LoopError::InvalidSource {
            plan_source: source.to_string(),
        };
        if source.is_empty() || source.contains('\\') {
            return Err(invalid());
        }
        let path = Path::new(source);
        if path.is_absolute()
            || !path.components().all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(invalid());
        }
        Ok(self.plans_dir().join(path))
    }
}

/// Load the persisted loop state, or `None` when no usable state exists.
///
/// Missing file, malformed JSON, a non-object root, missing required fields,
/// and a schema version newer than [`SCHEMA_VERSION`] all read as `None`.
/// Only the surrounding I/O (an unreadable file that does exist) is an error.
pub fn load(path: &Path) -> anyhow::Result<Option<LoopState>> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("read loop state {}", path.display()));
        }
    };

    let Ok(value) = serde_json::from_str::<Value>(&contents) else {
        warn!(path = %path.display(), "loop state is not valid JSON, treating as absent");
        return Ok(None);
    };

    let Some(value) = migrate(value) else {
        warn!(path = %path.display(), "loop state failed validation, treating as absent");
        return Ok(None);
    };

    match serde_json::from_value::<LoopState>(value) {
        Ok(state) => {
            debug!(path = %path.display(), tasks = state.tasks.len(), "loop state loaded");
            Ok(Some(state))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "loop state did not deserialize, treating as absent");
            Ok(None)
        }
    }
}

/// Atomically write the loop state: temp file in the same directory, then
/// rename over the target. A failed write never leaves a partial document
/// or a stray temp file behind.
pub fn save(path: &Path, state: &LoopState) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("state path {} has no parent directory", path.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("create state directory {}", parent.display()))?;

    let mut buf = serde_json::to_string_pretty(state)?;
    buf.push('\n');

    let tmp = path.with_extension("json.tmp");
    if let Err(e) = fs::write(&tmp, &buf) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("write temp state {}", tmp.display()));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("publish loop state {}", path.display()));
    }
    debug!(path = %path.display(), "loop state written");
    Ok(())
}

/// Validate and upgrade a raw document to the current schema shape.
///
/// A document with no `schemaVersion` is assumed to be v0 and upgraded in
/// place. A version newer than this build understands, a non-object root,
/// or any missing required field yields `None`.
fn migrate(value: Value) -> Option<Value> {
    let Value::Object(mut doc) = value else {
        return None;
    };

    let version = match doc.get("schemaVersion") {
        None => 0,
        Some(v) => v.as_u64()?,
    };
    if version > u64::from(SCHEMA_VERSION) {
        warn!(version, current = SCHEMA_VERSION, "loop state schema is newer than this build");
        return None;
    }
    doc.insert("schemaVersion".to_string(), Value::from(SCHEMA_VERSION));

    for field in ["planSource", "startedAt", "maxRetries", "cursor"] {
        if !doc.contains_key(field) {
            return None;
        }
    }
    let tasks = doc.get_mut("tasks")?.as_array_mut()?;
    for task in tasks {
        let obj = task.as_object_mut()?;
        obj.entry("acceptanceCriteria")
            .or_insert_with(|| Value::Array(Vec::new()));
    }

    Some(Value::Object(doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ParsedTask;
    use crate::state::CommandSet;
    use chrono::Utc;

    fn sample_state() -> LoopState {
        LoopState::new(
            "plan.md",
            vec![ParsedTask {
                description: "write the parser".to_string(),
                acceptance_criteria: vec!["handles empty input".to_string()],
            }],
            CommandSet {
                build: Some("cargo build".to_string()),
                test: Some("cargo test".to_string()),
                lint: None,
            },
            3,
            Utc::now(),
        )
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(".taskloop/state.json");
        let state = sample_state();
        save(&path, &state).expect("save");
        let loaded = load(&path).expect("load").expect("state present");
        assert_eq!(loaded, state);
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state.json");
        save(&path, &sample_state()).expect("save");
        assert!(!temp.path().join("state.json.tmp").exists());
    }

    #[test]
    fn missing_file_loads_as_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let loaded = load(&temp.path().join("state.json")).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn malformed_json_loads_as_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state.json");
        fs::write(&path, "{not json").expect("write");
        assert!(load(&path).expect("load").is_none());
    }

    #[test]
    fn non_object_root_loads_as_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state.json");
        fs::write(&path, "[1, 2, 3]").expect("write");
        assert!(load(&path).expect("load").is_none());
    }

    #[test]
    fn newer_schema_version_loads_as_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state.json");
        let mut value = serde_json::to_value(sample_state()).expect("to value");
        value["schemaVersion"] = Value::from(SCHEMA_VERSION + 1);
        fs::write(&path, value.to_string()).expect("write");
        assert!(load(&path).expect("load").is_none());
    }

    #[test]
    fn missing_version_is_assumed_v0_and_upgraded() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state.json");
        let mut value = serde_json::to_value(sample_state()).expect("to value");
        value.as_object_mut().expect("object").remove("schemaVersion");
        fs::write(&path, value.to_string()).expect("write");
        let loaded = load(&path).expect("load").expect("state present");
        assert_eq!(loaded.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn missing_required_field_loads_as_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state.json");
        for field in ["planSource", "startedAt", "maxRetries", "cursor", "tasks"] {
            let mut value = serde_json::to_value(sample_state()).expect("to value");
            value.as_object_mut().expect("object").remove(field);
            fs::write(&path, value.to_string()).expect("write");
            assert!(
                load(&path).expect("load").is_none(),
                "document without {field} should read as absent"
            );
        }
    }

    #[test]
    fn missing_acceptance_criteria_defaults_to_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state.json");
        let mut value = serde_json::to_value(sample_state()).expect("to value");
        value["tasks"][0]
            .as_object_mut()
            .expect("task object")
            .remove("acceptanceCriteria");
        fs::write(&path, value.to_string()).expect("write");
        let loaded = load(&path).expect("load").expect("state present");
        assert!(loaded.tasks[0].acceptance_criteria.is_empty());
    }

    #[test]
    fn plan_resolution_rejects_escapes() {
        let paths = Paths::new(Path::new("/project"));
        assert!(paths.resolve_plan("plan.md").is_ok());
        assert!(paths.resolve_plan("sprint/plan.md").is_ok());
        for bad in ["", "../plan.md", "/etc/passwd", "a/../../b.md", "..", "a\\b.md"] {
            assert!(
                matches!(paths.resolve_plan(bad), Err(LoopError::InvalidSource { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn resolved_plan_lives_under_plans_dir() {
        let paths = Paths::new(Path::new("/project"));
        let resolved = paths.resolve_plan("plan.md").expect("resolve");
        assert_eq!(resolved, Path::new("/project/.taskloop/plans/plan.md"));
    }
}
