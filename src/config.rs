use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::settings::Settings;

pub const DEFAULT_BOARD_FILE: &str = "board.md";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub board: BoardConfig,
    /// Frontmatter written by `init`. Falls back to [`Settings::defaults`].
    pub settings: Option<Settings>,
    #[serde(default)]
    pub watch: WatchConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardConfig {
    pub file: Option<PathBuf>,
    pub default_lanes: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    pub poll_interval: Option<u64>,
}

impl Config {
    /// Load config from `$MDKANBAN_CONFIG`, or `~/.mdkanban/config.toml`.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = match std::env::var_os("MDKANBAN_CONFIG") {
            Some(p) => PathBuf::from(p),
            None => {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
                Path::new(&home).join(".mdkanban").join("config.toml")
            }
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        };
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(settings) = &self.settings {
            let unknown = settings.unknown_keys();
            if !unknown.is_empty() {
                bail!(
                    "failed to parse {}: unknown setting(s): {}",
                    path.display(),
                    unknown.join(", ")
                );
            }
        }
        for lane in self.board.default_lanes.iter().flatten() {
            if lane.trim().is_empty() || lane.trim() != lane || lane.contains(['\n', '\r']) {
                bail!(
                    "failed to parse {}: invalid lane name {:?} in board.default_lanes",
                    path.display(),
                    lane
                );
            }
        }
        if self.watch.poll_interval == Some(0) {
            bail!(
                "failed to parse {}: watch.poll_interval must be positive",
                path.display()
            );
        }
        Ok(())
    }

    pub fn board_file(&self) -> PathBuf {
        self.board
            .file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BOARD_FILE))
    }

    pub fn default_lanes(&self) -> Vec<String> {
        self.board
            .default_lanes
            .clone()
            .unwrap_or_else(|| vec!["To Do".into(), "Doing".into(), "Done".into()])
    }

    pub fn init_settings(&self) -> Settings {
        self.settings.clone().unwrap_or_else(Settings::defaults)
    }

    pub fn poll_interval(&self) -> u64 {
        self.watch.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL_MS)
    }
}
