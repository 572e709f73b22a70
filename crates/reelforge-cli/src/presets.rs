//! Criteria preset storage for `rank --preset <id>` (§6).
//!
//! `reelforge-core` defines `CriteriaPreset` and `CoreError::PresetNotFound`, but owns no
//! persistence for presets — naming and storing them is an operator concern, not a CR
//! concern. The CLI is the only consumer of `rank --preset`, so it owns a flat JSON array
//! of presets instead of inventing a second config layer inside the core.

use std::fs;
use std::path::{Path, PathBuf};

use reelforge_core::config::CoreConfig;
use reelforge_core::errors::CoreError;
use reelforge_core::model::CriteriaPreset;

pub const PRESETS_FILENAME: &str = "presets.json";

/// `~/.reelforge/presets.json`, mirroring `CoreConfig::default_path`'s layout.
pub fn default_path() -> Option<PathBuf> {
    CoreConfig::default_dir().map(|dir| dir.join(PRESETS_FILENAME))
}

pub fn load_all(path: &Path) -> Result<Vec<CriteriaPreset>, CoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path)?;
    let presets: Vec<CriteriaPreset> = serde_json::from_str(&text)?;
    Ok(presets)
}

pub fn find(path: &Path, id: &str) -> Result<CriteriaPreset, CoreError> {
    load_all(path)?
        .into_iter()
        .find(|preset| preset.id == id)
        .ok_or_else(|| CoreError::PresetNotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelforge_core::cr::CriteriaConfig;

    #[test]
    fn missing_file_yields_empty_list() {
        let presets = load_all(Path::new("/nonexistent/presets.json")).unwrap();
        assert!(presets.is_empty());
    }

    #[test]
    fn find_missing_preset_is_preset_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        fs::write(&path, "[]").unwrap();
        let err = find(&path, "cozy-night").unwrap_err();
        assert!(matches!(err, CoreError::PresetNotFound(id) if id == "cozy-night"));
    }

    #[test]
    fn find_locates_preset_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        let presets = vec![CriteriaPreset {
            id: "cozy-night".to_string(),
            name: "Cozy night in".to_string(),
            config: CriteriaConfig::default(),
        }];
        fs::write(&path, serde_json::to_string(&presets).unwrap()).unwrap();
        let found = find(&path, "cozy-night").unwrap();
        assert_eq!(found.name, "Cozy night in");
    }
}
