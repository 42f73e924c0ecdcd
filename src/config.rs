use crate::tuning::Tuning;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::warn;

pub const DEV_MODE_ENV: &str = "SHROOMLING_DEV_MODE";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevMode {
    #[default]
    Off,
    Fast,
    Tutorial,
}

impl DevMode {
    pub fn parse(raw: &str) -> DevMode {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fast" => DevMode::Fast,
            "tutorial" => DevMode::Tutorial,
            _ => DevMode::Off,
        }
    }

    pub fn from_env() -> Option<DevMode> {
        std::env::var(DEV_MODE_ENV).ok().map(|v| DevMode::parse(&v))
    }

    /// Fast mode speeds everything up for playtesting; tutorial mode slows the meters down.
    pub fn apply(self, tuning: &mut Tuning) {
        match self {
            DevMode::Off => {}
            DevMode::Fast => {
                tuning.stats.rate_multiplier *= 10.0;
                tuning.thresholds.feeds_to_stage2 = 1;
                tuning.thresholds.mists_to_stage3 = 2;
            }
            DevMode::Tutorial => {
                tuning.stats.rate_multiplier *= 0.2;
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub fps_cap: u32,
    pub enable_color: bool,
    pub seed: u64,
    #[serde(default)]
    pub dev_mode: DevMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 60,
            enable_color: true,
            seed: 0x5EED_F00D_u64,
            dev_mode: DevMode::Off,
        }
    }
}

pub struct Paths {
    pub data_dir: PathBuf,
    pub settings_path: PathBuf,
    pub tuning_path: PathBuf,
    pub records_path: PathBuf,
    pub log_path: PathBuf,
}

pub fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "shroomling", "Shroomling")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir).ok();
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        tuning_path: dir.join("tuning.json"),
        records_path: dir.join("records.json"),
        log_path: dir.join("shroomling.log"),
        data_dir: dir,
    })
}

pub fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        match serde_json::from_str::<Settings>(&s) {
            Ok(v) => return v,
            Err(e) => warn!(error = %e, path = %path.display(), "ignoring unreadable settings"),
        }
    }
    Settings::default()
}

pub fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let data = serde_json::to_vec_pretty(s)?;
    write_atomic(path, &data)?;
    Ok(())
}

/// Reads `tuning.json` if present; a missing file means defaults.
pub fn load_tuning(path: &Path) -> Tuning {
    match fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<Tuning>(&s) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "ignoring unreadable tuning file");
                Tuning::default()
            }
        },
        Err(_) => Tuning::default(),
    }
}

pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)
}

pub(crate) fn atomic_rename(from: &Path, to: &Path) -> io::Result<()> {
    // rename-over-existing is not atomic on Windows
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_mode_parse_is_lenient() {
        assert_eq!(DevMode::parse(" FAST "), DevMode::Fast);
        assert_eq!(DevMode::parse("tutorial"), DevMode::Tutorial);
        assert_eq!(DevMode::parse("nonsense"), DevMode::Off);
    }

    #[test]
    fn fast_mode_shortens_stages() {
        let mut t = Tuning::default();
        DevMode::Fast.apply(&mut t);
        assert_eq!(t.stats.rate_multiplier, 10.0);
        assert_eq!(t.thresholds.feeds_to_stage2, 1);
        assert_eq!(t.thresholds.mists_to_stage3, 2);
    }

    #[test]
    fn settings_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let s = Settings {
            fps_cap: 30,
            dev_mode: DevMode::Tutorial,
            ..Settings::default()
        };
        save_settings_atomic(&path, &s).unwrap();
        let back = load_settings(&path);
        assert_eq!(back.fps_cap, 30);
        assert_eq!(back.dev_mode, DevMode::Tutorial);
    }

    #[test]
    fn missing_tuning_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let t = load_tuning(&dir.path().join("nope.json"));
        assert_eq!(t.thresholds.feeds_to_stage2, 4);
    }
}
