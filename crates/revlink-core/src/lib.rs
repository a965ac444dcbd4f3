//! Revision-pinned file links.
//!
//! - `address`: `repo::rev::file[::search]` encode/decode.
//! - `remote`: deterministic remote selection.
//! - `resolver`: override/pattern-table URL resolution and substitution.
//! - `patterns`: built-in hosting-service table.
//! - `repo`: repository facts (`RepoFacts`) and the `git` adapter.
//! - `link`: store/navigate/export pipeline.
//! - `format`: hyperlink rendering per output format.
//! - `config`: environment + TOML runtime config.
//! - `output_contract`: CLI output modes and JSON envelopes.

pub mod address;
pub mod config;
pub mod error;
pub mod format;
pub mod link;
pub mod output_contract;
pub mod patterns;
pub mod remote;
pub mod repo;
pub mod resolver;

pub use address::{Address, DELIMITER, EncodeOptions, decode, encode};
pub use config::{RuntimeConfig, abbreviate_home, expand_home_tokens};
pub use error::{ConfigError, GitError, LinkError, ResolveError};
pub use format::LinkFormat;
pub use link::{ExportedLink, NavigationTarget, export_link, navigate, store_address};
pub use output_contract::{
    OutputMode, build_error_details, build_error_envelope, build_success_envelope,
    redact_sensitive,
};
pub use patterns::{BUILTIN_PATTERNS, builtin_table};
pub use remote::{DEFAULT_REMOTE, select_remote};
pub use repo::{GitRepo, RepoFacts, StaticRepoFacts};
pub use resolver::{PatternEntry, RemoteUrlPattern, resolve_url, substitute};
