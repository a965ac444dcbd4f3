use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::{ConfigError, ResolveError};

pub const PLACEHOLDER_REMOTE: char = 'n';
pub const PLACEHOLDER_REVISION: char = 'r';
pub const PLACEHOLDER_FILE: char = 'f';

/// One hosting-service shape: a regex run against a remote URL whose first
/// capture group feeds `%n`, and the web URL template it maps to.
#[derive(Debug, Clone)]
pub struct RemoteUrlPattern {
    regex: Regex,
    template: String,
}

impl RemoteUrlPattern {
    pub fn new(pattern: &str, template: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|error| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            message: error.to_string(),
        })?;

        // captures_len counts the implicit whole-match group.
        if regex.captures_len() < 2 {
            return Err(ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                message: "pattern needs a capture group for %n".to_string(),
            });
        }

        Ok(Self {
            regex,
            template: template.to_string(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    fn capture<'a>(&self, remote_url: &'a str) -> Option<&'a str> {
        self.regex
            .captures(remote_url)
            .map(|captures| captures.get(1).map_or("", |group| group.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PatternEntry {
    pub pattern: String,
    pub template: String,
}

impl From<&RemoteUrlPattern> for PatternEntry {
    fn from(value: &RemoteUrlPattern) -> Self {
        Self {
            pattern: value.pattern().to_string(),
            template: value.template().to_string(),
        }
    }
}

/// Turns a revision and file path into a web URL.
///
/// An override template always wins. Otherwise the remote URL is matched
/// against `table` in order and the first hit's template is filled in.
pub fn resolve_url(
    revision: &str,
    file_path: &str,
    override_template: Option<&str>,
    remote_url: Option<&str>,
    table: &[RemoteUrlPattern],
) -> Result<String, ResolveError> {
    let no_url = || ResolveError::NoUrlDeterminable {
        revision: revision.to_string(),
        file_path: file_path.to_string(),
    };

    if let Some(template) = override_template {
        debug!(template, "using override template");
        return Ok(substitute(template, None, revision, file_path));
    }

    let remote_url = remote_url.ok_or_else(no_url)?;

    for entry in table {
        if let Some(capture) = entry.capture(remote_url) {
            debug!(pattern = entry.pattern(), capture, "remote URL matched");
            return Ok(substitute(
                entry.template(),
                Some(capture),
                revision,
                file_path,
            ));
        }
    }

    debug!(remote_url, "no pattern matched remote URL");
    Err(no_url())
}

/// Fills `%n`, `%r` and `%f` in a single left-to-right pass.
///
/// Substituted text is never rescanned, so a value containing `%r` stays
/// literal. Other `%` sequences, and `%n` when there is no capture, are
/// copied as-is.
pub fn substitute(template: &str, remote: Option<&str>, revision: &str, file_path: &str) -> String {
    let mut output = String::with_capacity(template.len() + revision.len() + file_path.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            output.push(ch);
            continue;
        }

        let value = match chars.peek() {
            Some(&PLACEHOLDER_REMOTE) => remote,
            Some(&PLACEHOLDER_REVISION) => Some(revision),
            Some(&PLACEHOLDER_FILE) => Some(file_path),
            _ => None,
        };

        match value {
            Some(value) => {
                output.push_str(value);
                chars.next();
            }
            None => output.push('%'),
        }
    }

    output
}
