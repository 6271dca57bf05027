use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct Settings {
    pub(crate) fps_cap: u32,
    pub(crate) star_count: usize,
    pub(crate) star_spread: f32,
    pub(crate) star_seed: u64,
    pub(crate) show_labels: bool,
    pub(crate) show_orbits: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 30,
            star_count: 200,
            star_spread: 100.0,
            star_seed: 0x50_1A_D5_EED,
            show_labels: true,
            show_orbits: true,
        }
    }
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
    pub(crate) themes_dir: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "solarsystem", "Solarsystem")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir).ok();
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        themes_dir: dir.join("themes"),
    })
}

pub(crate) fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        if let Ok(v) = serde_json::from_str::<Settings>(&s) {
            return v;
        }
    }
    Settings::default()
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data)?;
    if path.exists() {
        let _ = fs::remove_file(path);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_roundtrip() {
        let mut s = Settings::default();
        s.fps_cap = 60;
        s.show_labels = false;

        let dir = std::env::temp_dir().join("solarsystem-test-settings");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");

        save_settings_atomic(&path, &s).unwrap();
        let back = load_settings(&path);
        assert_eq!(back.fps_cap, 60);
        assert!(!back.show_labels);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_or_garbage_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("solarsystem-test-settings");
        fs::create_dir_all(&dir).unwrap();

        let missing = dir.join("no-such-settings.json");
        assert_eq!(load_settings(&missing).fps_cap, Settings::default().fps_cap);

        let garbage = dir.join("garbage.json");
        fs::write(&garbage, b"{not json").unwrap();
        assert_eq!(
            load_settings(&garbage).star_count,
            Settings::default().star_count
        );
        fs::remove_file(&garbage).ok();
    }
}
