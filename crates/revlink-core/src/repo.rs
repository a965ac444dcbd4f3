use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use crate::error::GitError;

pub const CONFIG_NAMESPACE: &str = "revlink";
pub const PREFERRED_REMOTE_KEY: &str = "remote";
pub const OVERRIDE_TEMPLATE_KEY: &str = "file";

/// `git config --get` exit status for an unset key.
const CONFIG_KEY_UNSET: i32 = 1;
/// `git remote get-url` exit status for an unknown remote.
const REMOTE_UNKNOWN: i32 = 2;
/// `git rev-parse` exit status outside a work tree.
const NOT_A_REPOSITORY: i32 = 128;

/// Repository facts the resolver needs; it never talks to git directly.
pub trait RepoFacts {
    fn list_remotes(&self) -> Result<Vec<String>, GitError>;
    fn get_config(&self, namespace: &str, key: &str) -> Result<Option<String>, GitError>;
    fn get_remote_url(&self, remote: &str) -> Result<Option<String>, GitError>;
}

/// [`RepoFacts`] backed by the `git` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    pub fn open(path: &Path) -> Result<Self, GitError> {
        if !path.exists() {
            return Err(GitError::MissingPath(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(GitError::NotDirectory(path.to_path_buf()));
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Opens the repository containing `path`, which may be a file.
    pub fn discover(path: &Path) -> Result<Self, GitError> {
        let dir = if path.is_dir() {
            path
        } else {
            path.parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
        };
        let start = Self::open(dir)?;

        let toplevel = start
            .run_optional(&["rev-parse", "--show-toplevel"], &[NOT_A_REPOSITORY])?
            .ok_or_else(|| GitError::NotRepository(dir.to_path_buf()))?;

        Ok(Self {
            path: PathBuf::from(toplevel),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn head_revision(&self) -> Result<String, GitError> {
        self.run(&["rev-parse", "HEAD"])
    }

    /// Contents of `file_path` as recorded at `revision`, byte for byte.
    pub fn show_file(&self, revision: &str, file_path: &str) -> Result<Vec<u8>, GitError> {
        self.run_raw(&["show", &format!("{revision}:{file_path}")])
    }

    /// Path of `file` relative to the repository root, with `/` separators.
    pub fn relative_path(&self, file: &Path) -> Result<String, GitError> {
        let root = canonical(&self.path)?;
        let file = match (file.parent(), file.file_name()) {
            (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
                canonical(parent)?.join(name)
            }
            _ => canonical(Path::new("."))?.join(file),
        };

        let relative = file
            .strip_prefix(&root)
            .map_err(|_| GitError::NotRepository(file.clone()))?;

        Ok(relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"))
    }

    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let stdout = self.run_raw(args)?;
        Ok(String::from_utf8_lossy(&stdout).trim_end().to_string())
    }

    fn run_raw(&self, args: &[&str]) -> Result<Vec<u8>, GitError> {
        let output = self.command(args)?;
        if !output.status.success() {
            return Err(self.status_error(args, &output));
        }

        Ok(output.stdout)
    }

    /// Like [`Self::run`], but an exit status listed in `absent` or empty
    /// output means "no value". Any other failure is still an error.
    fn run_optional(&self, args: &[&str], absent: &[i32]) -> Result<Option<String>, GitError> {
        let output = self.command(args)?;
        if !output.status.success() {
            if output.status.code().is_some_and(|code| absent.contains(&code)) {
                return Ok(None);
            }
            return Err(self.status_error(args, &output));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() {
            Ok(None)
        } else {
            Ok(Some(stdout))
        }
    }

    fn status_error(&self, args: &[&str], output: &Output) -> GitError {
        GitError::GitStatus {
            path: self.path.clone(),
            args: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    fn command(&self, args: &[&str]) -> Result<Output, GitError> {
        debug!(path = %self.path.display(), ?args, "running git");
        Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .args(args)
            .output()
            .map_err(|error| GitError::GitCommand {
                path: self.path.clone(),
                message: error.to_string(),
            })
    }
}

impl RepoFacts for GitRepo {
    fn list_remotes(&self) -> Result<Vec<String>, GitError> {
        let stdout = self.run(&["remote"])?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn get_config(&self, namespace: &str, key: &str) -> Result<Option<String>, GitError> {
        self.run_optional(
            &["config", "--get", &format!("{namespace}.{key}")],
            &[CONFIG_KEY_UNSET],
        )
    }

    fn get_remote_url(&self, remote: &str) -> Result<Option<String>, GitError> {
        self.run_optional(&["remote", "get-url", remote], &[REMOTE_UNKNOWN])
    }
}

fn canonical(path: &Path) -> Result<PathBuf, GitError> {
    path.canonicalize()
        .map_err(|_| GitError::MissingPath(path.to_path_buf()))
}

/// In-memory [`RepoFacts`] for callers that already know the answers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRepoFacts {
    pub remotes: Vec<(String, Option<String>)>,
    pub config: HashMap<String, String>,
}

impl StaticRepoFacts {
    pub fn with_remote(mut self, name: &str, url: Option<&str>) -> Self {
        self.remotes
            .push((name.to_string(), url.map(str::to_string)));
        self
    }

    pub fn with_config(mut self, namespace: &str, key: &str, value: &str) -> Self {
        self.config
            .insert(format!("{namespace}.{key}"), value.to_string());
        self
    }
}

impl RepoFacts for StaticRepoFacts {
    fn list_remotes(&self) -> Result<Vec<String>, GitError> {
        Ok(self.remotes.iter().map(|(name, _)| name.clone()).collect())
    }

    fn get_config(&self, namespace: &str, key: &str) -> Result<Option<String>, GitError> {
        Ok(self.config.get(&format!("{namespace}.{key}")).cloned())
    }

    fn get_remote_url(&self, remote: &str) -> Result<Option<String>, GitError> {
        Ok(self
            .remotes
            .iter()
            .find(|(name, _)| name == remote)
            .and_then(|(_, url)| url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn git(repo: &Path, args: &[&str]) {
        let status = Command::new("git")
            .arg("-C")
            .arg(repo)
            .args(args)
            .status()
            .expect("run git");
        assert!(status.success(), "git {args:?} should succeed");
    }

    fn init_repo(path: &Path) {
        fs::create_dir_all(path).expect("create repo dir");
        let status = Command::new("git")
            .arg("init")
            .arg("-q")
            .arg(path)
            .status()
            .expect("run git init");
        assert!(status.success(), "git init should succeed");
    }

    #[test]
    fn git_repo_reports_remotes_urls_and_config() {
        let temp = tempdir().expect("create temp dir");
        let repo_path = temp.path().join("repo");
        init_repo(&repo_path);
        git(&repo_path, &["remote", "add", "origin", "git@github.com:o/r.git"]);
        git(&repo_path, &["remote", "add", "fork", "https://gitlab.com/me/r"]);
        git(&repo_path, &["config", "revlink.remote", "fork"]);

        let repo = GitRepo::open(&repo_path).expect("open repo");
        let mut remotes = repo.list_remotes().expect("list remotes");
        remotes.sort();
        assert_eq!(remotes, vec!["fork".to_string(), "origin".to_string()]);
        assert_eq!(
            repo.get_remote_url("origin").expect("remote url").as_deref(),
            Some("git@github.com:o/r.git")
        );
        assert_eq!(repo.get_remote_url("missing").expect("remote url"), None);
        assert_eq!(
            repo.get_config(CONFIG_NAMESPACE, PREFERRED_REMOTE_KEY)
                .expect("config")
                .as_deref(),
            Some("fork")
        );
        assert_eq!(
            repo.get_config(CONFIG_NAMESPACE, OVERRIDE_TEMPLATE_KEY)
                .expect("config"),
            None
        );
    }

    #[test]
    fn get_config_surfaces_unreadable_config() {
        let temp = tempdir().expect("create temp dir");
        let repo_path = temp.path().join("repo");
        init_repo(&repo_path);
        let config_path = repo_path.join(".git/config");
        let mut config = fs::read_to_string(&config_path).expect("read git config");
        config.push_str("[revlink\n");
        fs::write(&config_path, config).expect("corrupt git config");

        let repo = GitRepo::open(&repo_path).expect("open repo");
        let err = repo
            .get_config(CONFIG_NAMESPACE, OVERRIDE_TEMPLATE_KEY)
            .expect_err("broken config should not read as unset");
        assert!(matches!(err, GitError::GitStatus { .. }));
    }

    #[test]
    fn show_file_returns_committed_bytes_untouched() {
        let temp = tempdir().expect("create temp dir");
        let repo_path = temp.path().join("repo");
        init_repo(&repo_path);
        let contents: &[u8] = b"  indented\n\xff\xfe binary\ntrailing  \n\n\n";
        fs::write(repo_path.join("data.bin"), contents).expect("write file");
        git(&repo_path, &["add", "data.bin"]);
        git(
            &repo_path,
            &[
                "-c",
                "user.name=Revlink Test",
                "-c",
                "user.email=test@example.com",
                "commit",
                "-q",
                "-m",
                "add data",
            ],
        );

        let repo = GitRepo::open(&repo_path).expect("open repo");
        assert_eq!(
            repo.show_file("HEAD", "data.bin").expect("show file"),
            contents
        );
        assert!(matches!(
            repo.show_file("HEAD", "missing.txt"),
            Err(GitError::GitStatus { .. })
        ));
    }

    #[test]
    fn discover_finds_toplevel_and_relative_path() {
        let temp = tempdir().expect("create temp dir");
        let repo_path = temp.path().join("repo");
        init_repo(&repo_path);
        let nested = repo_path.join("src/bin");
        fs::create_dir_all(&nested).expect("create nested dir");
        let file = nested.join("tool.rs");
        fs::write(&file, "fn main() {}\n").expect("write file");

        let repo = GitRepo::discover(&file).expect("discover repo");
        assert_eq!(
            canonical(repo.path()).expect("canonical root"),
            canonical(&repo_path).expect("canonical repo")
        );
        assert_eq!(
            repo.relative_path(&file).expect("relative path"),
            "src/bin/tool.rs"
        );
    }

    #[test]
    fn open_rejects_missing_and_file_paths() {
        let temp = tempdir().expect("create temp dir");
        let missing = temp.path().join("missing");
        assert!(matches!(
            GitRepo::open(&missing),
            Err(GitError::MissingPath(_))
        ));

        let file = temp.path().join("file.txt");
        fs::write(&file, "x").expect("write file");
        assert!(matches!(GitRepo::open(&file), Err(GitError::NotDirectory(_))));
    }

    #[test]
    fn static_facts_answer_from_memory() {
        let facts = StaticRepoFacts::default()
            .with_remote("origin", Some("git@github.com:o/r.git"))
            .with_remote("bare", None)
            .with_config(CONFIG_NAMESPACE, PREFERRED_REMOTE_KEY, "bare");

        assert_eq!(
            facts.list_remotes().expect("remotes"),
            vec!["origin".to_string(), "bare".to_string()]
        );
        assert_eq!(facts.get_remote_url("bare").expect("url"), None);
        assert_eq!(
            facts
                .get_config(CONFIG_NAMESPACE, PREFERRED_REMOTE_KEY)
                .expect("config")
                .as_deref(),
            Some("bare")
        );
    }
}
