//! Project configuration.
//!
//! Engine thresholds live in `.punch/config.toml` under the project root;
//! a missing file yields the defaults, and partial files are filled in
//! field by field.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine thresholds. Defaults match the reference remediation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuning {
    /// Minimum lead, in seconds, a due or deferred date must keep ahead of
    /// `now` before a record may enter pending or deferred (23 hours).
    #[serde(default = "default_pending_lead_secs")]
    pub pending_lead_secs: i64,
    /// Calendar-day horizon at or beyond which a record entering pending
    /// will owe a progress note before it may complete.
    #[serde(default = "default_progress_note_min_days")]
    pub progress_note_min_days: i64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            pending_lead_secs: default_pending_lead_secs(),
            progress_note_min_days: default_progress_note_min_days(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub engine: Tuning,
}

/// Load `.punch/config.toml` from the project root.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".punch/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_pending_lead_secs() -> i64 {
    23 * 60 * 60
}

const fn default_progress_note_min_days() -> i64 {
    5
}

#[cfg(test)]
mod tests {
    use super::{ProjectConfig, Tuning, load_project_config};

    #[test]
    fn missing_config_uses_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let cfg = load_project_config(dir.path()).expect("load should succeed");
        assert_eq!(cfg.engine.pending_lead_secs, 82_800);
        assert_eq!(cfg.engine.progress_note_min_days, 5);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let punch_dir = dir.path().join(".punch");
        std::fs::create_dir_all(&punch_dir).expect("create .punch");
        std::fs::write(
            punch_dir.join("config.toml"),
            "[engine]\npending_lead_secs = 3600\n",
        )
        .expect("write config");

        let cfg = load_project_config(dir.path()).expect("load should succeed");
        assert_eq!(cfg.engine.pending_lead_secs, 3_600);
        assert_eq!(cfg.engine.progress_note_min_days, 5);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let punch_dir = dir.path().join(".punch");
        std::fs::create_dir_all(&punch_dir).expect("create .punch");
        std::fs::write(punch_dir.join("config.toml"), "[engine\n").expect("write config");

        let err = load_project_config(dir.path()).expect_err("must fail");
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn tuning_default_matches_serde_defaults() {
        let parsed: Tuning = toml::from_str("").expect("parse empty");
        assert_eq!(parsed, Tuning::default());

        let full: ProjectConfig = toml::from_str("").expect("parse empty");
        assert_eq!(full, ProjectConfig::default());
    }
}
