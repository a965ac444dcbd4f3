//! Built-in hosting-service table.
//!
//! Order matters: the resolver stops at the first match, so narrower
//! patterns have to sit above broader ones.

use crate::error::ConfigError;
use crate::resolver::RemoteUrlPattern;

pub const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    (
        r"github\.com[:/](.+?)(?:\.git)?/?$",
        "https://github.com/%n/blob/%r/%f",
    ),
    (
        r"gitlab\.com[:/](.+?)(?:\.git)?/?$",
        "https://gitlab.com/%n/-/blob/%r/%f",
    ),
    (
        r"bitbucket\.org[:/](.+?)(?:\.git)?/?$",
        "https://bitbucket.org/%n/src/%r/%f",
    ),
    (
        r"codeberg\.org[:/](.+?)(?:\.git)?/?$",
        "https://codeberg.org/%n/src/commit/%r/%f",
    ),
    (
        r"git\.sr\.ht[:/](~[^/]+/.+?)(?:\.git)?/?$",
        "https://git.sr.ht/%n/tree/%r/item/%f",
    ),
    (
        r"git\.kernel\.org/pub/scm/(.+?)/?$",
        "https://git.kernel.org/pub/scm/%n/tree/%f?id=%r",
    ),
    (
        r"git\.(?:savannah|sv)\.(?:non)?gnu\.org[:/](?:git/|srv/git/)?(.+?)(?:\.git)?/?$",
        "https://git.savannah.gnu.org/cgit/%n.git/tree/%f?id=%r",
    ),
];

pub fn builtin_table() -> Result<Vec<RemoteUrlPattern>, ConfigError> {
    BUILTIN_PATTERNS
        .iter()
        .map(|(pattern, template)| RemoteUrlPattern::new(pattern, template))
        .collect()
}
