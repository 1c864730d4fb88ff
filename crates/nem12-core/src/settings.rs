use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Nem12Error, Result};
use crate::models::{SectionCategory, DEFAULT_WINDOW_DAYS};

/// Input file used when none is given on the command line.
pub const DEFAULT_INPUT_FILE: &str = "nem12data.csv";

/// Output file used when `--output` is not given.
pub const DEFAULT_OUTPUT_FILE: &str = "nem12_hourly_summary.csv";

/// Largest accepted `--window-days`.
pub const MAX_WINDOW_DAYS: u32 = 36500;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Convert NEM12 5-minute interval data into hourly energy and power aggregates
#[derive(Parser, Debug, Clone)]
#[command(
    name = "nem12-hourly",
    about = "Convert NEM12 5-minute interval data into hourly energy and power aggregates",
    version
)]
pub struct Settings {
    /// NEM12 file to process
    #[arg(default_value = DEFAULT_INPUT_FILE)]
    pub input: PathBuf,

    /// Where to write the hourly CSV
    #[arg(long, short, default_value = DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Days of history kept before the latest date in the file
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS, value_parser = clap::value_parser!(u32).range(1..=MAX_WINDOW_DAYS as i64))]
    pub window_days: u32,

    /// Skip writing the hourly CSV
    #[arg(long)]
    pub no_export: bool,

    /// Section to show an hour-of-day profile for (Import, Export, "Controlled Load", "Not Mapped")
    #[arg(long)]
    pub profile_section: Option<String>,

    /// Year to restrict the hour-of-day profile to
    #[arg(long)]
    pub profile_year: Option<i32>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.nem12-hourly/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_days: Option<u32>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".nem12-hourly").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    ///
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load_from(path) {
            Ok(params) => params,
            Err(e) => {
                tracing::debug!("Ignoring saved settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load persisted params, surfacing read and parse failures.
    pub fn try_load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Nem12Error::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        // Write to a temp file then rename.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation; accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("Failed to clear saved settings: {}", e);
            }
            return Self::apply_overrides(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // NOTE: clap stores the arg id using the field name (underscores).
        if !is_arg_explicitly_set(&matches, "input") {
            if let Some(v) = last.input {
                settings.input = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "output") {
            if let Some(v) = last.output {
                settings.output = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "window_days") {
            if let Some(v) = last.window_days.filter(|d| (1..=MAX_WINDOW_DAYS).contains(d)) {
                settings.window_days = v;
            }
        }

        settings = Self::apply_overrides(settings);

        if let Err(e) = LastUsedParams::from(&settings).save_to(config_path) {
            tracing::warn!("Failed to persist settings: {}", e);
        }

        settings
    }

    /// Resolve `--profile-section` into a category.
    pub fn profile_section(&self) -> Result<Option<SectionCategory>> {
        match &self.profile_section {
            None => Ok(None),
            Some(name) => SectionCategory::from_name(name)
                .map(Some)
                .ok_or_else(|| Nem12Error::InvalidSection(name.clone())),
        }
    }

    /// `--debug` overrides the log level.
    fn apply_overrides(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            input: Some(s.input.clone()),
            output: Some(s.output.clone()),
            window_days: Some(s.window_days),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
