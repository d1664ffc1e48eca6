//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory (or CWD).
//! Falls back to defaults if the file is missing, incomplete, or invalid.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::rules::{MergeRules, DEFAULT_MAX_TIER, DEFAULT_MILESTONE};
use crate::domain::spawn::{SpawnPolicy, DEFAULT_DOUBLER_CHANCE, DEFAULT_HALVER_CHANCE};

pub const MAX_BOARD_SIDE: usize = 16;

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub board_width: usize,
    pub board_height: usize,
    pub turn: TurnConfig,
    pub spawn: SpawnPolicy,
    pub initial_tiles: usize,
    /// Fixed RNG seed; None draws from OS entropy.
    pub seed: Option<u64>,
    pub rules: MergeRules,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TurnConfig {
    pub tick_rate_ms: u64,
    /// Input is ignored for this long after a move that changed the board.
    pub settle_delay_ms: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    board: TomlBoard,
    #[serde(default)]
    turn: TomlTurn,
    #[serde(default)]
    spawn: TomlSpawn,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlBoard {
    #[serde(default = "default_side")]
    width: usize,
    #[serde(default = "default_side")]
    height: usize,
}

#[derive(Deserialize, Debug)]
struct TomlTurn {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_settle_delay")]
    settle_delay_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlSpawn {
    #[serde(default = "default_initial_tiles")]
    initial_tiles: usize,
    #[serde(default = "default_doubler_chance")]
    doubler_chance: f64,
    #[serde(default = "default_halver_chance")]
    halver_chance: f64,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_milestone")]
    milestone: u32,
    #[serde(default = "default_max_tier")]
    max_tier: u8,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

// ── Defaults ──

fn default_side() -> usize { 4 }
fn default_tick_rate() -> u64 { 16 }        // ~60 fps redraw
fn default_settle_delay() -> u64 { 100 }
fn default_initial_tiles() -> usize { 2 }
fn default_doubler_chance() -> f64 { DEFAULT_DOUBLER_CHANCE }
fn default_halver_chance() -> f64 { DEFAULT_HALVER_CHANCE }
fn default_milestone() -> u32 { DEFAULT_MILESTONE }
fn default_max_tier() -> u8 { DEFAULT_MAX_TIER }

fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlBoard {
    fn default() -> Self {
        TomlBoard { width: default_side(), height: default_side() }
    }
}

impl Default for TomlTurn {
    fn default() -> Self {
        TomlTurn {
            tick_rate_ms: default_tick_rate(),
            settle_delay_ms: default_settle_delay(),
        }
    }
}

impl Default for TomlSpawn {
    fn default() -> Self {
        TomlSpawn {
            initial_tiles: default_initial_tiles(),
            doubler_chance: default_doubler_chance(),
            halver_chance: default_halver_chance(),
            seed: None,
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules { milestone: default_milestone(), max_tier: default_max_tier() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad { confirm: default_confirm(), cancel: default_cancel() }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_schema(TomlConfig::default())
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: exe directory, CWD, XDG data home, system data dir.
    /// Missing file or missing keys gracefully fall back to defaults;
    /// unreadable, malformed, or out-of-range files warn on stderr.
    pub fn load() -> Self {
        for dir in candidate_dirs() {
            let path = dir.join("config.toml");
            if !path.exists() {
                continue;
            }
            match GameConfig::from_file(&path) {
                Ok(cfg) => return cfg,
                Err(e @ ConfigError::Read { .. }) => {
                    eprintln!("Warning: {e}");
                }
                Err(e) => {
                    eprintln!("Warning: {e}");
                    eprintln!("Using default settings.");
                    return GameConfig::default();
                }
            }
        }
        GameConfig::default()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        GameConfig::from_toml_str(&text)
    }

    /// Parse and validate a config document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let schema: TomlConfig = toml::from_str(text)?;
        let cfg = GameConfig::from_schema(schema);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_schema(t: TomlConfig) -> Self {
        GameConfig {
            board_width: t.board.width,
            board_height: t.board.height,
            turn: TurnConfig {
                tick_rate_ms: t.turn.tick_rate_ms,
                settle_delay_ms: t.turn.settle_delay_ms,
            },
            spawn: SpawnPolicy {
                doubler_chance: t.spawn.doubler_chance,
                halver_chance: t.spawn.halver_chance,
            },
            initial_tiles: t.spawn.initial_tiles,
            seed: t.spawn.seed,
            rules: MergeRules {
                milestone: t.rules.milestone,
                max_tier: t.rules.max_tier,
            },
            gamepad: GamepadConfig {
                confirm: t.gamepad.confirm,
                cancel: t.gamepad.cancel,
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, side) in [("board.width", self.board_width), ("board.height", self.board_height)] {
            if side == 0 || side > MAX_BOARD_SIDE {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("{side} is outside 1..={MAX_BOARD_SIDE}"),
                });
            }
        }
        for (key, p) in [
            ("spawn.doubler_chance", self.spawn.doubler_chance),
            ("spawn.halver_chance", self.spawn.halver_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid { key, reason: format!("{p} is not a probability") });
            }
        }
        let total = self.spawn.doubler_chance + self.spawn.halver_chance;
        if total > 1.0 {
            return Err(ConfigError::Invalid {
                key: "spawn",
                reason: format!("modifier chances sum to {total}, above 1"),
            });
        }
        if self.rules.milestone < 4 {
            return Err(ConfigError::Invalid {
                key: "rules.milestone",
                reason: format!("{} is below the smallest merge result 4", self.rules.milestone),
            });
        }
        let capacity = self.board_width * self.board_height;
        if self.initial_tiles > capacity {
            return Err(ConfigError::Invalid {
                key: "spawn.initial_tiles",
                reason: format!("{} exceeds board capacity {capacity}", self.initial_tiles),
            });
        }
        Ok(())
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/tilemerge)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/tilemerge");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/tilemerge");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, GameConfig::default());
        assert_eq!((cfg.board_width, cfg.board_height), (4, 4));
        assert_eq!(cfg.turn.settle_delay_ms, 100);
        assert_eq!(cfg.initial_tiles, 2);
        assert_eq!(cfg.rules, MergeRules::default());
        assert_eq!(cfg.spawn, SpawnPolicy::default());
        assert_eq!(cfg.seed, None);
        assert_eq!(cfg.gamepad.confirm, vec!["Start".to_string()]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[board]\nwidth = 5\n\n[spawn]\nseed = 7\nhalver_chance = 0.0\n",
        )
        .unwrap();
        assert_eq!((cfg.board_width, cfg.board_height), (5, 4));
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.spawn.halver_chance, 0.0);
        assert_eq!(cfg.spawn.doubler_chance, DEFAULT_DOUBLER_CHANCE);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = GameConfig::from_toml_str("[board\nwidth = 4").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cases = [
            ("[board]\nwidth = 0", "board.width"),
            ("[board]\nheight = 17", "board.height"),
            ("[spawn]\ndoubler_chance = 1.5", "spawn.doubler_chance"),
            ("[spawn]\ndoubler_chance = 0.6\nhalver_chance = 0.6", "spawn"),
            ("[rules]\nmilestone = 2", "rules.milestone"),
            ("[board]\nwidth = 1\nheight = 1\n[spawn]\ninitial_tiles = 2", "spawn.initial_tiles"),
        ];
        for (text, expected) in cases {
            match GameConfig::from_toml_str(text) {
                Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, expected, "{text}"),
                other => panic!("{text}: expected Invalid, got {other:?}"),
            }
        }
    }
}
