use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{MiningConfig, QuickCommand};
use crate::logger;
use crate::vision::MaterialProfile;

/// Everything the front end persists between sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub config: MiningConfig,
    /// Last successful material calibration, if any.
    pub material: Option<MaterialProfile>,
    pub quick_commands: Vec<QuickCommand>,
}

impl Settings {
    /// Missing or unreadable file yields defaults.
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    logger::warn(&format!("saving {} failed: {}", path.display(), e));
                }
            }
            Err(e) => logger::warn(&format!("serializing settings failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternKind;
    use crate::types::Rgb;

    #[test]
    fn test_missing_file_gives_defaults() {
        let s = Settings::load(Path::new("/nonexistent/automine/settings.json"));
        assert_eq!(s.config, MiningConfig::default());
        assert!(s.material.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("automine-settings-{}.json", std::process::id()));
        let mut s = Settings::default();
        s.config.pattern = PatternKind::FloorMining;
        s.material = Some(MaterialProfile { reference: Rgb::new(1, 2, 3), tolerance: 25 });
        s.quick_commands.push(QuickCommand::default());
        s.save(&path);

        let loaded = Settings::load(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.config.pattern, PatternKind::FloorMining);
        assert_eq!(loaded.material.unwrap().reference, Rgb::new(1, 2, 3));
        assert_eq!(loaded.quick_commands.len(), 1);
    }
}
