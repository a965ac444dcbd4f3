use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use revlink_core::{
    ConfigError, EncodeOptions, GitError, GitRepo, LinkError, LinkFormat, OutputMode,
    PatternEntry, ResolveError, RuntimeConfig, build_error_details, build_error_envelope,
    build_success_envelope, export_link, navigate, redact_sensitive, store_address,
};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "REVLINK_LOG";

#[derive(Debug, Parser)]
#[command(author, version, about = "Revision-pinned file links")]
struct Cli {
    /// Output mode (`human`, `json`).
    #[arg(long, global = true, value_enum)]
    output: Option<OutputModeArg>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encode an address for a file at a revision.
    Store {
        /// File inside a git working tree.
        #[arg(long)]
        path: PathBuf,
        /// Revision to pin; defaults to HEAD.
        #[arg(long)]
        rev: Option<String>,
        /// Abbreviate full object ids.
        #[arg(long)]
        abbrev: bool,
    },
    /// Decode an address into a navigation target.
    Open {
        /// Stored address (`repo::rev::file[::search]`).
        #[arg(long)]
        address: String,
        /// Also print the file contents at that revision.
        #[arg(long)]
        print: bool,
    },
    /// Resolve an address to a web URL and render it as a link.
    Export {
        /// Stored address (`repo::rev::file[::search]`).
        #[arg(long)]
        address: String,
        /// Link text.
        #[arg(long)]
        description: Option<String>,
        /// Link format; defaults to REVLINK_FORMAT or the config file.
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
    /// List the remote URL pattern table in match order.
    Patterns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputModeArg {
    Human,
    Json,
}

impl From<OutputModeArg> for OutputMode {
    fn from(value: OutputModeArg) -> Self {
        match value {
            OutputModeArg::Human => OutputMode::Human,
            OutputModeArg::Json => OutputMode::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Plain,
    Html,
    Markdown,
    Org,
    Latex,
    Texinfo,
    Ascii,
}

impl From<FormatArg> for LinkFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Plain => LinkFormat::Plain,
            FormatArg::Html => LinkFormat::Html,
            FormatArg::Markdown => LinkFormat::Markdown,
            FormatArg::Org => LinkFormat::Org,
            FormatArg::Latex => LinkFormat::Latex,
            FormatArg::Texinfo => LinkFormat::Texinfo,
            FormatArg::Ascii => LinkFormat::Ascii,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorKind {
    User,
    Runtime,
}

/// What a command writes to stdout on success.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CommandOutput {
    /// Printed followed by a newline.
    Text(String),
    /// Written verbatim, e.g. file contents at a revision.
    Bytes(Vec<u8>),
}

#[derive(Debug)]
struct AppError {
    kind: ErrorKind,
    code: &'static str,
    message: String,
}

impl AppError {
    fn user(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::User,
            code,
            message: message.into(),
        }
    }

    fn runtime(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Runtime,
            code,
            message: message.into(),
        }
    }

    fn exit_code(&self) -> i32 {
        match self.kind {
            ErrorKind::User => 2,
            ErrorKind::Runtime => 1,
        }
    }
}

const ERROR_CODE_USER_INVALID_PATH: &str = "user.invalid_path";
const ERROR_CODE_USER_INVALID_CONFIG: &str = "user.invalid_config";
const ERROR_CODE_USER_MALFORMED_ADDRESS: &str = "user.malformed_address";
const ERROR_CODE_USER_INVALID_FIELD: &str = "user.invalid_field";
const ERROR_CODE_LINK_NO_REMOTE: &str = "link.no_remote";
const ERROR_CODE_LINK_NO_URL: &str = "link.no_url";
const ERROR_CODE_RUNTIME_GIT: &str = "runtime.git_failed";
const ERROR_CODE_RUNTIME_SERIALIZE: &str = "runtime.serialize_failed";

impl Cli {
    fn command_name(&self) -> &'static str {
        match &self.command {
            Commands::Store { .. } => "revlink.store",
            Commands::Open { .. } => "revlink.open",
            Commands::Export { .. } => "revlink.export",
            Commands::Patterns => "revlink.patterns",
        }
    }

    fn output_mode(&self) -> OutputMode {
        self.output.map(OutputMode::from).unwrap_or_default()
    }
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let command = cli.command_name();
    let output_mode = cli.output_mode();

    match run(cli) {
        Ok(CommandOutput::Text(stdout)) => {
            println!("{stdout}");
        }
        Ok(CommandOutput::Bytes(bytes)) => {
            let mut stdout = std::io::stdout().lock();
            if stdout.write_all(&bytes).and_then(|()| stdout.flush()).is_err() {
                std::process::exit(1);
            }
        }
        Err(err) => {
            emit_error(command, output_mode, &err);
            std::process::exit(err.exit_code());
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // Only fails when a global subscriber is already set.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<CommandOutput, AppError> {
    let config = RuntimeConfig::from_env().map_err(map_config_error)?;
    run_with_config(cli, &config)
}

fn run_with_config(cli: Cli, config: &RuntimeConfig) -> Result<CommandOutput, AppError> {
    let command = cli.command_name();
    let output_mode = cli.output_mode();
    debug!(command, mode = output_mode.as_str(), "running command");

    match cli.command {
        Commands::Store { path, rev, abbrev } => {
            let repo = GitRepo::discover(&path).map_err(map_git_error)?;
            let revision = match rev {
                Some(rev) => rev,
                None => repo.head_revision().map_err(map_git_error)?,
            };
            let file_path = repo.relative_path(&path).map_err(map_git_error)?;
            let repository = config.repository_identifier(repo.path());
            let options = EncodeOptions {
                abbreviate_revision: abbrev || config.encode.abbreviate_revision,
                ..config.encode
            };
            let address = store_address(&repository, &revision, &file_path, options)
                .map_err(map_link_error)?;

            match output_mode {
                OutputMode::Human => Ok(CommandOutput::Text(address)),
                OutputMode::Json => envelope(
                    command,
                    &json!({
                        "address": address,
                        "repository": repository,
                        "file_path": file_path,
                    }),
                ),
            }
        }
        Commands::Open { address, print } => {
            let target = navigate(&address).map_err(map_link_error)?;
            let content = if print {
                let repo = GitRepo::open(&config.repository_path(&target.repository))
                    .map_err(map_git_error)?;
                Some(
                    repo.show_file(&target.revision, &target.file_path)
                        .map_err(map_git_error)?,
                )
            } else {
                None
            };

            match output_mode {
                OutputMode::Human => {
                    let mut lines = vec![
                        format!("repository: {}", target.repository),
                        format!("revision: {}", target.revision),
                        format!("file: {}", target.file_path),
                    ];
                    if let Some(search) = &target.search_option {
                        lines.push(format!("search: {search}"));
                    }
                    match content {
                        Some(content) => {
                            let mut bytes = lines.join("\n").into_bytes();
                            bytes.extend_from_slice(b"\n\n");
                            bytes.extend_from_slice(&content);
                            Ok(CommandOutput::Bytes(bytes))
                        }
                        None => Ok(CommandOutput::Text(lines.join("\n"))),
                    }
                }
                OutputMode::Json => {
                    let text = content
                        .as_deref()
                        .map(|content| String::from_utf8_lossy(content).into_owned());
                    let content_is_utf8 = content
                        .as_deref()
                        .map(|content| std::str::from_utf8(content).is_ok());
                    envelope(
                        command,
                        &json!({
                            "path": config.repository_path(&target.repository),
                            "target": &target,
                            "content": text,
                            "content_is_utf8": content_is_utf8,
                        }),
                    )
                }
            }
        }
        Commands::Export {
            address,
            description,
            format,
        } => {
            let target = navigate(&address).map_err(map_link_error)?;
            let repo = GitRepo::open(&config.repository_path(&target.repository))
                .map_err(map_git_error)?;
            let link = export_link(&address, description.as_deref(), &repo, &config.patterns)
                .map_err(map_link_error)?;
            let format = format.map(LinkFormat::from).unwrap_or(config.format);
            let rendered = format.render(&link.url, link.description.as_deref());

            match output_mode {
                OutputMode::Human => Ok(CommandOutput::Text(rendered)),
                OutputMode::Json => envelope(
                    command,
                    &json!({
                        "link": link,
                        "format": format,
                        "rendered": rendered,
                    }),
                ),
            }
        }
        Commands::Patterns => {
            let entries: Vec<PatternEntry> =
                config.patterns.iter().map(PatternEntry::from).collect();

            match output_mode {
                OutputMode::Human => Ok(CommandOutput::Text(
                    entries
                        .iter()
                        .map(|entry| format!("{} -> {}", entry.pattern, entry.template))
                        .collect::<Vec<_>>()
                        .join("\n"),
                )),
                OutputMode::Json => envelope(command, &json!({ "patterns": entries })),
            }
        }
    }
}

fn envelope(command: &str, result: &serde_json::Value) -> Result<CommandOutput, AppError> {
    build_success_envelope(command, result)
        .map(CommandOutput::Text)
        .map_err(|error| {
            AppError::runtime(
                ERROR_CODE_RUNTIME_SERIALIZE,
                format!("failed to serialize output: {error}"),
            )
        })
}

fn emit_error(command: &str, output_mode: OutputMode, error: &AppError) {
    match output_mode {
        OutputMode::Json => {
            let details = build_error_details(error_kind_label(error.kind), error.exit_code());
            println!(
                "{}",
                build_error_envelope(command, error.code, &error.message, Some(details))
            );
        }
        OutputMode::Human => {
            eprintln!(
                "error[{}]: {}",
                error.code,
                redact_sensitive(&error.message),
            );
        }
    }
}

fn error_kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::User => "user",
        ErrorKind::Runtime => "runtime",
    }
}

fn map_link_error(error: LinkError) -> AppError {
    let message = error.to_string();
    match error {
        LinkError::Broken { source, .. } => match source {
            ResolveError::MalformedAddress(_) => {
                AppError::user(ERROR_CODE_USER_MALFORMED_ADDRESS, message)
            }
            ResolveError::DelimiterInField { .. } => {
                AppError::user(ERROR_CODE_USER_INVALID_FIELD, message)
            }
            ResolveError::NoRemoteDeterminable { .. } => {
                AppError::runtime(ERROR_CODE_LINK_NO_REMOTE, message)
            }
            ResolveError::NoUrlDeterminable { .. } => {
                AppError::runtime(ERROR_CODE_LINK_NO_URL, message)
            }
        },
        LinkError::Git(error) => map_git_error(error),
    }
}

fn map_git_error(error: GitError) -> AppError {
    let message = error.to_string();
    match error {
        GitError::MissingPath(_) | GitError::NotDirectory(_) | GitError::NotRepository(_) => {
            AppError::user(ERROR_CODE_USER_INVALID_PATH, message)
        }
        GitError::GitCommand { .. } | GitError::GitStatus { .. } => {
            AppError::runtime(ERROR_CODE_RUNTIME_GIT, message)
        }
    }
}

fn map_config_error(error: ConfigError) -> AppError {
    AppError::user(ERROR_CODE_USER_INVALID_CONFIG, error.to_string())
}
