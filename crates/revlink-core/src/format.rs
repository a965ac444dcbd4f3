use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Serialize;

use crate::error::ConfigError;

/// Bytes that would end or split a Markdown link destination.
const MARKDOWN_DESTINATION: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'(')
    .add(b')')
    .add(b'<')
    .add(b'>');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkFormat {
    #[default]
    Plain,
    Html,
    Markdown,
    Org,
    Latex,
    Texinfo,
    Ascii,
}

impl LinkFormat {
    pub const ALL: [LinkFormat; 7] = [
        Self::Plain,
        Self::Html,
        Self::Markdown,
        Self::Org,
        Self::Latex,
        Self::Texinfo,
        Self::Ascii,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Html => "html",
            Self::Markdown => "markdown",
            Self::Org => "org",
            Self::Latex => "latex",
            Self::Texinfo => "texinfo",
            Self::Ascii => "ascii",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "plain" | "url" => Ok(Self::Plain),
            "html" => Ok(Self::Html),
            "markdown" | "md" => Ok(Self::Markdown),
            "org" => Ok(Self::Org),
            "latex" | "tex" => Ok(Self::Latex),
            "texinfo" | "texi" => Ok(Self::Texinfo),
            "ascii" | "text" => Ok(Self::Ascii),
            _ => Err(ConfigError::UnknownFormat(raw.to_string())),
        }
    }

    /// Renders `url` as a hyperlink; without a description the URL doubles
    /// as the link text.
    pub fn render(self, url: &str, description: Option<&str>) -> String {
        let description = description.unwrap_or(url);
        match self {
            Self::Plain => url.to_string(),
            Self::Html => format!(
                "<a href=\"{}\">{}</a>",
                escape_html(url),
                escape_html(description)
            ),
            Self::Markdown => format!(
                "[{}]({})",
                escape_markdown_text(description),
                utf8_percent_encode(url, MARKDOWN_DESTINATION)
            ),
            Self::Org => format!(
                "[[{}][{}]]",
                escape_org_target(url),
                escape_org_description(description)
            ),
            Self::Latex => format!("\\href{{{}}}{{{}}}", url.replace('%', "\\%"), description),
            Self::Texinfo => format!("@uref{{{},{}}}", url, description.replace(',', "@comma{}")),
            Self::Ascii if description == url => url.to_string(),
            Self::Ascii => format!("{description} ({url})"),
        }
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn escape_markdown_text(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Org link targets escape brackets with a backslash; backslashes that
/// would otherwise read as such an escape (before a bracket or at the end)
/// are doubled.
fn escape_org_target(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    let mut pending_backslashes = 0;
    for ch in raw.chars() {
        match ch {
            '\\' => {
                pending_backslashes += 1;
                continue;
            }
            '[' | ']' => {
                push_backslashes(&mut escaped, pending_backslashes * 2 + 1);
            }
            _ => push_backslashes(&mut escaped, pending_backslashes),
        }
        pending_backslashes = 0;
        escaped.push(ch);
    }
    push_backslashes(&mut escaped, pending_backslashes * 2);
    escaped
}

fn push_backslashes(out: &mut String, count: usize) {
    out.extend(std::iter::repeat_n('\\', count));
}

/// Brackets can't be escaped inside an Org description, so they become
/// braces.
fn escape_org_description(raw: &str) -> String {
    raw.replace('[', "{").replace(']', "}")
}
