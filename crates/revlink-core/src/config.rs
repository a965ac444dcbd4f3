use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::address::{DEFAULT_ABBREV_LENGTH, EncodeOptions};
use crate::error::ConfigError;
use crate::format::LinkFormat;
use crate::patterns::builtin_table;
use crate::resolver::RemoteUrlPattern;

pub const DEFAULT_CONFIG_FILE: &str = "$HOME/.config/revlink/config.toml";

pub const CONFIG_FILE_ENV: &str = "REVLINK_CONFIG";
pub const ABBREVIATE_ENV: &str = "REVLINK_ABBREVIATE";
pub const FORMAT_ENV: &str = "REVLINK_FORMAT";
const HOME_ENV: &str = "HOME";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub abbreviate_revision: Option<bool>,
    #[serde(default)]
    pub abbrev_length: Option<usize>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub replace_builtin_patterns: bool,
    #[serde(default)]
    pub patterns: Vec<PatternConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternConfig {
    pub pattern: String,
    pub template: String,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub home: String,
    pub encode: EncodeOptions,
    pub format: LinkFormat,
    pub patterns: Vec<RemoteUrlPattern>,
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_pairs(std::env::vars())
    }

    /// Environment values beat the config file, which beats the defaults.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env_map: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let home = env_map.get(HOME_ENV).cloned().unwrap_or_default();

        let file = load_file_config(&env_map, &home)?;
        let patterns = build_pattern_table(&file)?;

        let abbreviate_revision = match non_empty(&env_map, ABBREVIATE_ENV) {
            Some(raw) => parse_bool(raw),
            None => file.abbreviate_revision.unwrap_or(false),
        };
        let format = match non_empty(&env_map, FORMAT_ENV).or(file.format.as_deref()) {
            Some(raw) => LinkFormat::parse(raw)?,
            None => LinkFormat::default(),
        };

        Ok(Self {
            home,
            encode: EncodeOptions {
                abbreviate_revision,
                abbrev_length: file.abbrev_length.unwrap_or(DEFAULT_ABBREV_LENGTH),
            },
            format,
            patterns,
        })
    }

    /// Maps a stored repository identifier back to a filesystem path.
    pub fn repository_path(&self, repository: &str) -> PathBuf {
        PathBuf::from(expand_home_tokens(repository, &self.home))
    }

    /// Inverse of [`Self::repository_path`]: the identifier written into
    /// new addresses.
    pub fn repository_identifier(&self, path: &Path) -> String {
        abbreviate_home(&path.to_string_lossy(), &self.home)
    }
}

fn load_file_config(
    env_map: &HashMap<String, String>,
    home: &str,
) -> Result<FileConfig, ConfigError> {
    let explicit = non_empty(env_map, CONFIG_FILE_ENV);
    let path = PathBuf::from(expand_home_tokens(
        explicit.unwrap_or(DEFAULT_CONFIG_FILE),
        home,
    ));

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(error) if error.kind() == ErrorKind::NotFound && explicit.is_none() => {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(FileConfig::default());
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
}

/// User patterns go first so they can shadow a built-in host.
pub fn build_pattern_table(file: &FileConfig) -> Result<Vec<RemoteUrlPattern>, ConfigError> {
    let mut table = file
        .patterns
        .iter()
        .map(|entry| RemoteUrlPattern::new(&entry.pattern, &entry.template))
        .collect::<Result<Vec<_>, _>>()?;

    if file.replace_builtin_patterns {
        if table.is_empty() {
            warn!("replace_builtin_patterns is set but no patterns are configured");
        }
    } else {
        table.extend(builtin_table()?);
    }

    Ok(table)
}

fn non_empty<'a>(env_map: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    env_map
        .get(key)
        .map(String::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

pub fn expand_home_tokens(raw: &str, home: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut expanded = trimmed.replace("$HOME", home);

    if expanded == "~" {
        expanded = home.to_string();
    } else if let Some(rest) = expanded.strip_prefix("~/") {
        expanded = format!("{home}/{rest}");
    }

    expanded
}

pub fn abbreviate_home(path: &str, home: &str) -> String {
    let home = home.trim_end_matches('/');
    if home.is_empty() {
        return path.to_string();
    }

    if path == home {
        "~".to_string()
    } else if let Some(rest) = path.strip_prefix(home).and_then(|rest| rest.strip_prefix('/')) {
        format!("~/{rest}")
    } else {
        path.to_string()
    }
}
