use serde::{Deserialize, Serialize};
use vcfg_types::ConfigPath;

/// Engine configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Suffix token appended to a logical path to form the storage path
    /// of its pointer-file stream. The suffix is the only on-the-wire
    /// signal that a stream holds pointer records instead of content, so
    /// it must never be empty and must stay fixed for the lifetime of a
    /// store.
    pub annex_suffix: String,
}

impl EngineSettings {
    /// The storage path holding pointer records for an annex-backed file.
    pub fn pointer_path(&self, path: &ConfigPath) -> ConfigPath {
        path.with_suffix(&self.annex_suffix)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            annex_suffix: ".annex".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let s = EngineSettings::default();
        assert_eq!(s.annex_suffix, ".annex");
    }

    #[test]
    fn pointer_path_appends_suffix() {
        let s = EngineSettings::default();
        let p = ConfigPath::new("/test.conf").unwrap();
        assert_eq!(s.pointer_path(&p).as_str(), "test.conf.annex");
    }

    #[test]
    fn serde_round_trip() {
        let s = EngineSettings {
            annex_suffix: ".blob".into(),
        };
        let json = serde_json::to_string(&s).unwrap();
        let back: EngineSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.annex_suffix, ".blob");
    }
}
