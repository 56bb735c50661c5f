use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
    time::Duration,
};

use crate::engine::EngineConfig;
use crate::player::SessionOptions;
use crate::session::PlaybackRequest;

pub const DEBUG_ENV: &str = "RITCHER_DEBUG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerSettings {
    pub stitcher_url: String,
    pub origin_url: String,
    pub volume: f32,
    pub resume_delay_ms: u64,
    pub engine: EngineConfig,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            stitcher_url: "http://localhost:3000".into(),
            origin_url: String::new(),
            volume: 0.5,
            resume_delay_ms: 2_000,
            engine: EngineConfig::default(),
        }
    }
}

impl PlayerSettings {
    pub fn request(&self) -> PlaybackRequest {
        PlaybackRequest::new(self.stitcher_url.clone(), Some(self.origin_url.clone()))
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            engine: self.engine.clone(),
            resume_delay: Duration::from_millis(self.resume_delay_ms),
            volume: self.volume,
        }
    }

    fn apply_env(&mut self, debug: Option<String>) {
        if debug_flag(debug.as_deref()) {
            self.engine.debug = true;
        }
    }
}

fn debug_flag(value: Option<&str>) -> bool {
    value.is_some_and(|value| value == "1" || value.eq_ignore_ascii_case("true"))
}

/// Read-only view over an optional JSON settings file.
pub struct SettingsStore {
    path: Option<PathBuf>,
    data: RwLock<PlayerSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = read_settings(&path)?;
        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    /// Defaults plus environment overrides, no backing file.
    pub fn defaults() -> Self {
        let mut data = PlayerSettings::default();
        data.apply_env(std::env::var(DEBUG_ENV).ok());
        Self {
            path: None,
            data: RwLock::new(data),
        }
    }

    pub fn settings(&self) -> PlayerSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn reload(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let data = read_settings(path)?;
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = data;
        Ok(())
    }
}

fn read_settings(path: &Path) -> Result<PlayerSettings> {
    let mut data = if path.exists() {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        match serde_json::from_str(&contents) {
            Ok(data) => data,
            Err(err) => {
                warn!(
                    "Ignoring malformed settings in {}: {}; using defaults",
                    path.display(),
                    err
                );
                PlayerSettings::default()
            }
        }
    } else {
        PlayerSettings::default()
    };
    data.apply_env(std::env::var(DEBUG_ENV).ok());
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SettingsStore::new(dir.path().join("settings.json")).expect("store");
        let settings = store.settings();
        assert_eq!(settings.stitcher_url, "http://localhost:3000");
        assert_eq!(settings.volume, 0.5);
        assert_eq!(settings.resume_delay_ms, 2_000);
        assert!(settings.engine.enable_worker);
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"stitcherUrl": "https://stitch.example.com/", "resumeDelayMs": 500, "engine": {"lowLatencyMode": true}}"#,
        )
        .expect("write");

        let settings = SettingsStore::new(path).expect("store").settings();
        assert_eq!(settings.stitcher_url, "https://stitch.example.com/");
        assert_eq!(settings.resume_delay_ms, 500);
        assert!(settings.engine.low_latency_mode);
        assert!(settings.engine.enable_worker);
        assert_eq!(settings.volume, 0.5);
        assert_eq!(
            settings.session_options().resume_delay,
            Duration::from_millis(500)
        );
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").expect("write");
        let settings = SettingsStore::new(path).expect("store").settings();
        assert_eq!(settings.stitcher_url, PlayerSettings::default().stitcher_url);
    }

    #[test]
    fn reload_picks_up_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"volume": 0.2}"#).expect("write");
        let store = SettingsStore::new(path.clone()).expect("store");
        assert_eq!(store.settings().volume, 0.2);

        fs::write(&path, r#"{"volume": 0.9, "originUrl": "https://cdn.example.com/a.m3u8"}"#)
            .expect("write");
        store.reload().expect("reload");
        let settings = store.settings();
        assert_eq!(settings.volume, 0.9);
        assert_eq!(
            settings.request().effective_origin(),
            "https://cdn.example.com/a.m3u8"
        );
    }

    #[test]
    fn debug_flag_accepts_one_or_true() {
        assert!(debug_flag(Some("1")));
        assert!(debug_flag(Some("TRUE")));
        assert!(!debug_flag(Some("0")));
        assert!(!debug_flag(Some("")));
        assert!(!debug_flag(None));

        let mut settings = PlayerSettings::default();
        settings.apply_env(Some("true".to_string()));
        assert!(settings.engine.debug);
    }
}
