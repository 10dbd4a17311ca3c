use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "ItemTrace.toml";
pub const DEFAULT_INPUT: &str = "data.csv";
pub const DEFAULT_OUTPUT: &str = "output.txt";
pub const DEFAULT_DIMENSION: &str = "主世界";
pub const DEFAULT_X: (f64, f64) = (-2000.0, 2000.0);
pub const DEFAULT_Y: (f64, f64) = (-60.0, 300.0);
pub const DEFAULT_Z: (f64, f64) = (-4000.0, 4000.0);
pub const DEFAULT_SINCE: &str = "2025-11-14 19:12:30";
pub const DEFAULT_UNTIL: &str = "2025-11-15 21:14:00";
pub const DEFAULT_TARGETS: &[&str] = &["shulker_box"];

/// How per-target substring hits are combined into `has_target_item`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Any,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnsiColor { Black, Red, Green, Yellow, Blue, Magenta, Cyan, White }

impl AnsiColor {
    pub fn code(self) -> &'static str {
        match self {
            AnsiColor::Black => "30",
            AnsiColor::Red => "31",
            AnsiColor::Green => "32",
            AnsiColor::Yellow => "33",
            AnsiColor::Blue => "34",
            AnsiColor::Magenta => "35",
            AnsiColor::Cyan => "36",
            AnsiColor::White => "37",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub matched: AnsiColor,
    pub unmatched: AnsiColor,
}

impl Default for Palette {
    fn default() -> Self { Self { matched: AnsiColor::Red, unmatched: AnsiColor::Blue } }
}

/// Closed interval: both `min` and `max` belong to the range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy + std::fmt::Debug> Range<T> {
    pub fn new(name: &str, min: T, max: T) -> Result<Self> {
        if min > max { bail!("invalid {} range: min {:?} is greater than max {:?}", name, min, max); }
        Ok(Self { min, max })
    }

    pub fn contains(&self, v: T) -> bool { self.min <= v && v <= self.max }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub dimension: String,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub z_range: Range<f64>,
    pub time_range: Range<NaiveDateTime>,
    /// Already lowercased.
    pub target_items: Vec<String>,
    pub match_mode: MatchMode,
    pub palette: Palette,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let since = parse_bound(DEFAULT_SINCE).unwrap_or_default();
        let until = parse_bound(DEFAULT_UNTIL).unwrap_or_default();
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            dimension: DEFAULT_DIMENSION.to_string(),
            x_range: Range { min: DEFAULT_X.0, max: DEFAULT_X.1 },
            y_range: Range { min: DEFAULT_Y.0, max: DEFAULT_Y.1 },
            z_range: Range { min: DEFAULT_Z.0, max: DEFAULT_Z.1 },
            time_range: Range { min: since, max: until },
            target_items: normalize_targets(DEFAULT_TARGETS.iter().map(|s| s.to_string())),
            match_mode: MatchMode::Any,
            palette: Palette::default(),
        }
    }
}

/// Lowercases targets and drops empty ones. Whitespace is part of the
/// literal and kept; order is kept.
pub fn normalize_targets(items: impl IntoIterator<Item = String>) -> Vec<String> {
    items.into_iter().map(|s| s.to_lowercase()).filter(|s| !s.is_empty()).collect()
}

/// Parses a time-window bound. Accepts `YYYY-MM-DD HH:MM:SS`, the `T`-separated
/// form, or a bare date (midnight).
pub fn parse_bound(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") { return Some(dt); }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") { return Some(dt); }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn parse_bound_field(name: &str, s: &str) -> Result<NaiveDateTime> {
    parse_bound(s).with_context(|| format!("invalid {} timestamp '{}': expected YYYY-MM-DD HH:MM:SS", name, s))
}

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat { Text, Json }

/// On-disk TOML configuration. Every key is optional; CLI flags win.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub dimension: Option<String>,
    pub x_min: Option<f64>,
    pub x_max: Option<f64>,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
    pub z_min: Option<f64>,
    pub z_max: Option<f64>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub targets: Option<Vec<String>>,
    pub match_mode: Option<MatchMode>,
    pub matched_color: Option<AnsiColor>,
    pub unmatched_color: Option<AnsiColor>,
    pub csv_path: Option<PathBuf>,
    pub ndjson_path: Option<PathBuf>,
    pub log_format: Option<LogFormat>,
    pub log_path: Option<String>,
}

pub fn read_file_config(path: &Path) -> Result<FileConfig> {
    let s = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str::<FileConfig>(&s).with_context(|| format!("parsing config {}", path.display()))
}

/// An explicit path must load. The implicit default file is optional; if it
/// exists but cannot be used, defaults apply and the reason is handed back so
/// it can be logged once logging is up.
pub fn load_file_config(explicit: Option<&Path>) -> Result<(FileConfig, Option<String>)> {
    if let Some(p) = explicit { return Ok((read_file_config(p)?, None)); }
    let def = Path::new(DEFAULT_CONFIG_FILE);
    if !def.exists() { return Ok((FileConfig::default(), None)); }
    match read_file_config(def) {
        Ok(cfg) => Ok((cfg, None)),
        Err(e) => Ok((FileConfig::default(), Some(format!("Ignoring {}: {:#}", DEFAULT_CONFIG_FILE, e)))),
    }
}
