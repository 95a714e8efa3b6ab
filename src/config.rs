/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::geom::Vec2;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub timing: TimingConfig,
    pub map: MapConfig,
    pub display: DisplayConfig,
    pub sound: bool,
}

/// Movement tuning. Speeds are pixels per second, accelerations pixels
/// per second squared. Positive y is down.
#[derive(Clone, Debug)]
pub struct PhysicsConfig {
    pub base_speed: f64,
    pub gravity: f64,
    pub jump_impulse: f64,
    pub terminal_velocity: f64,
    pub player_width: f64,
    pub player_height: f64,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_interval_ms: u64,
}

#[derive(Clone, Debug)]
pub struct MapConfig {
    /// `None` = the built-in map.
    pub path: Option<PathBuf>,
    pub tile_size: u32,
    pub spawn: Vec2,
    pub reset_point: Vec2, // where the reset key teleports to
}

/// How many world pixels one terminal cell covers.
#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub pixels_per_column: u32,
    pub pixels_per_row: u32,
}

impl TimingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Seconds per tick, the integration step.
    pub fn dt(&self) -> f64 {
        self.tick_interval().as_secs_f64()
    }
}

impl PhysicsConfig {
    pub fn player_size(&self) -> Vec2 {
        Vec2::new(self.player_width, self.player_height)
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    map: TomlMap,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_base_speed")]
    base_speed: f64,
    #[serde(default = "default_gravity")]
    gravity: f64,
    #[serde(default = "default_jump_impulse")]
    jump_impulse: f64,
    #[serde(default = "default_terminal_velocity")]
    terminal_velocity: f64,
    #[serde(default = "default_player_size")]
    player_width: f64,
    #[serde(default = "default_player_size")]
    player_height: f64,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_interval")]
    tick_interval_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlMap {
    #[serde(default)]
    path: Option<String>,
    #[serde(default = "default_tile_size")]
    tile_size: u32,
    #[serde(default = "default_spawn_x")]
    spawn_x: f64,
    #[serde(default = "default_spawn_y")]
    spawn_y: f64,
    #[serde(default = "default_reset_x")]
    reset_x: f64,
    #[serde(default = "default_reset_y")]
    reset_y: f64,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_pixels_per_column")]
    pixels_per_column: u32,
    #[serde(default = "default_pixels_per_row")]
    pixels_per_row: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_sound")]
    sound: bool,
}

// ── Defaults ──

fn default_base_speed() -> f64 { 150.0 }
fn default_gravity() -> f64 { 1800.0 }
fn default_jump_impulse() -> f64 { 600.0 }   // peak ~100 px = two tiles
fn default_terminal_velocity() -> f64 { 900.0 }
fn default_player_size() -> f64 { 22.0 }
fn default_tick_interval() -> u64 { 15 }     // ~66 ticks per second
fn default_tile_size() -> u32 { 50 }
fn default_spawn_x() -> f64 { 150.0 }
fn default_spawn_y() -> f64 { 150.0 }
fn default_reset_x() -> f64 { 600.0 }
fn default_reset_y() -> f64 { 70.0 }
fn default_pixels_per_column() -> u32 { 10 }
fn default_pixels_per_row() -> u32 { 20 }    // terminal cells are ~2:1
fn default_sound() -> bool { true }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            base_speed: default_base_speed(),
            gravity: default_gravity(),
            jump_impulse: default_jump_impulse(),
            terminal_velocity: default_terminal_velocity(),
            player_width: default_player_size(),
            player_height: default_player_size(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming { tick_interval_ms: default_tick_interval() }
    }
}

impl Default for TomlMap {
    fn default() -> Self {
        TomlMap {
            path: None,
            tile_size: default_tile_size(),
            spawn_x: default_spawn_x(),
            spawn_y: default_spawn_y(),
            reset_x: default_reset_x(),
            reset_y: default_reset_y(),
        }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay {
            pixels_per_column: default_pixels_per_column(),
            pixels_per_row: default_pixels_per_row(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            sound: default_sound(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text directly. Relative map paths are kept as written.
    #[allow(dead_code)]
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(cfg, &[]))
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let map_path = toml_cfg
            .map
            .path
            .as_deref()
            .map(|p| resolve_path(p, search_dirs));

        GameConfig {
            physics: PhysicsConfig {
                base_speed: toml_cfg.physics.base_speed,
                gravity: toml_cfg.physics.gravity,
                jump_impulse: toml_cfg.physics.jump_impulse,
                terminal_velocity: toml_cfg.physics.terminal_velocity,
                player_width: toml_cfg.physics.player_width.max(1.0),
                player_height: toml_cfg.physics.player_height.max(1.0),
            },
            timing: TimingConfig {
                tick_interval_ms: toml_cfg.timing.tick_interval_ms,
            },
            map: MapConfig {
                path: map_path,
                tile_size: toml_cfg.map.tile_size.max(1),
                spawn: Vec2::new(toml_cfg.map.spawn_x, toml_cfg.map.spawn_y),
                reset_point: Vec2::new(toml_cfg.map.reset_x, toml_cfg.map.reset_y),
            },
            display: DisplayConfig {
                pixels_per_column: toml_cfg.display.pixels_per_column.max(1),
                pixels_per_row: toml_cfg.display.pixels_per_row.max(1),
            },
            sound: toml_cfg.general.sound,
        }
    }
}

/// Absolute paths as-is; relative paths are looked up in the search dirs
/// and default to CWD-relative when not found.
fn resolve_path(raw: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    search_dirs
        .iter()
        .map(|d| d.join(path))
        .find(|p| p.is_file())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
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

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "config.toml parse error, using defaults");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not read config.toml");
                }
            }
        }
    }
    tracing::debug!("no config.toml found, using defaults");
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_layout() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.timing.tick_interval_ms, 15);
        assert_eq!(cfg.map.tile_size, 50);
        assert_eq!(cfg.map.spawn, Vec2::new(150.0, 150.0));
        assert_eq!(cfg.map.reset_point, Vec2::new(600.0, 70.0));
        assert_eq!(cfg.physics.player_size(), Vec2::new(22.0, 22.0));
        assert!(cfg.map.path.is_none());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[physics]\ngravity = 1000.0\n\n[map]\npath = \"/tmp/level.txt\"\ntile_size = 32\n",
        )
        .unwrap();
        assert_eq!(cfg.physics.gravity, 1000.0);
        assert_eq!(cfg.physics.base_speed, 150.0);
        assert_eq!(cfg.map.tile_size, 32);
        assert_eq!(cfg.map.path, Some(PathBuf::from("/tmp/level.txt")));
        assert_eq!(cfg.timing.tick_interval_ms, 15);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.physics.jump_impulse, 600.0);
        assert!(cfg.sound);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(GameConfig::from_toml_str("[physics]\ngravity = \"heavy\"\n").is_err());
    }

    #[test]
    fn tick_interval_to_dt() {
        let t = TimingConfig { tick_interval_ms: 15 };
        assert_eq!(t.tick_interval(), Duration::from_millis(15));
        assert!((t.dt() - 0.015).abs() < 1e-12);
        // Zero would spin; clamp to 1 ms.
        let z = TimingConfig { tick_interval_ms: 0 };
        assert_eq!(z.tick_interval(), Duration::from_millis(1));
    }

    #[test]
    fn zero_display_scale_is_clamped() {
        let cfg = GameConfig::from_toml_str("[display]\npixels_per_column = 0\n").unwrap();
        assert_eq!(cfg.display.pixels_per_column, 1);
    }
}
