//! One-shot shallow checkout of a remote theme repository

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use tokio::process::Command;

use super::remote_url::normalize_remote_url;
use super::sandbox::{resolve_within, FsResolver};
use crate::config::FetchConfig;
use crate::{Error, Result};

/// Prefix of every scratch checkout directory
const SCRATCH_PREFIX: &str = "rtheme_remote_";

/// State owned by one fetcher for the duration of one import or resync
#[derive(Debug, Clone)]
pub struct FetchSession {
    /// Normalized remote URL
    pub url: String,
    /// Process-unique scratch directory the checkout lands in
    pub scratch_dir: PathBuf,
    /// Revision of the checkout, set once the fetch succeeded
    pub revision: Option<String>,
}

/// Sandboxed, read-only view of one revision of a remote repository
///
/// The scratch directory is removed by [`Fetcher::cleanup`] and again on
/// drop, so no exit path leaves a checkout behind.
#[derive(Debug)]
pub struct Fetcher {
    session: FetchSession,
    git_path: String,
    timeout: std::time::Duration,
}

impl Fetcher {
    /// Create a fetcher for `url`
    ///
    /// Normalizes the URL and picks a scratch path. Touches neither the
    /// filesystem nor the network.
    pub fn new(url: &str, config: &FetchConfig) -> Result<Self> {
        let url = normalize_remote_url(url)?;
        let scratch_dir = config
            .scratch_root()
            .join(format!("{}{}", SCRATCH_PREFIX, uuid::Uuid::new_v4().simple()));

        Ok(Self {
            session: FetchSession {
                url,
                scratch_dir,
                revision: None,
            },
            git_path: config.git_path.clone(),
            timeout: config.timeout,
        })
    }

    /// Normalized remote URL
    pub fn url(&self) -> &str {
        &self.session.url
    }

    /// Scratch directory the checkout lives in
    pub fn scratch_dir(&self) -> &Path {
        &self.session.scratch_dir
    }

    /// Current session state
    pub fn session(&self) -> &FetchSession {
        &self.session
    }

    /// Shallow-clone the remote into the scratch directory and resolve its revision
    pub async fn fetch(&mut self) -> Result<()> {
        if self.session.revision.is_some() {
            return Err(Error::State(format!(
                "{} has already been fetched",
                self.session.url
            )));
        }

        tracing::debug!(
            url = %self.session.url,
            dir = %self.session.scratch_dir.display(),
            "Cloning remote theme"
        );

        let mut clone = self.git();
        clone
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg("--")
            .arg(&self.session.url)
            .arg(&self.session.scratch_dir);

        let output = self.run(clone, "clone").await?;
        if !output.status.success() {
            return Err(classify_clone_failure(
                &self.session.url,
                &String::from_utf8_lossy(&output.stderr),
            ));
        }

        let mut rev_parse = self.git();
        rev_parse
            .arg("rev-parse")
            .arg("HEAD")
            .current_dir(&self.session.scratch_dir);

        let output = self.run(rev_parse, "rev-parse").await?;
        if !output.status.success() {
            return Err(Error::Fetch(format!(
                "git rev-parse failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let revision = parse_revision(&output.stdout)?;
        tracing::info!(url = %self.session.url, revision = %revision, "Fetched remote theme");
        self.session.revision = Some(revision);

        Ok(())
    }

    /// Revision of the fetched checkout
    pub fn revision(&self) -> Result<&str> {
        self.session.revision.as_deref().ok_or_else(|| {
            Error::State(format!(
                "Revision of {} requested before a successful fetch",
                self.session.url
            ))
        })
    }

    /// Read a file from the checkout
    ///
    /// Returns `Ok(None)` when the file is missing, is not a regular file, or
    /// resolves outside the checkout. Only reading before a successful fetch
    /// is an error.
    pub fn read(&self, relative_path: &str) -> Result<Option<Vec<u8>>> {
        if self.session.revision.is_none() {
            return Err(Error::State(format!(
                "Read of {} before a successful fetch",
                relative_path
            )));
        }

        let Some(path) = resolve_within(&self.session.scratch_dir, relative_path, &FsResolver)
        else {
            return Ok(None);
        };

        if !path.is_file() {
            return Ok(None);
        }

        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) => {
                tracing::warn!(path = %relative_path, error = %e, "Failed to read checkout file");
                Ok(None)
            }
        }
    }

    /// Remove the scratch directory
    ///
    /// Safe to call repeatedly and after a failed fetch. Failures are logged
    /// and never returned.
    pub fn cleanup(&self) {
        let dir = &self.session.scratch_dir;
        if std::fs::symlink_metadata(dir).is_err() {
            return;
        }

        match std::fs::remove_dir_all(dir) {
            Ok(()) => tracing::debug!(dir = %dir.display(), "Removed scratch checkout"),
            Err(e) => tracing::warn!(
                dir = %dir.display(),
                error = %e,
                "Failed to clean up scratch checkout"
            ),
        }
    }

    fn git(&self) -> Command {
        let mut cmd = Command::new(&self.git_path);
        cmd.env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run(&self, mut cmd: Command, what: &str) -> Result<Output> {
        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Fetch(format!("git executable not found at '{}'", self.git_path))
            } else {
                Error::Fetch(format!("Failed to run git {}: {}", what, e))
            }
        })?;

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => {
                output.map_err(|e| Error::Fetch(format!("Failed to run git {}: {}", what, e)))
            }
            Err(_) => Err(Error::Fetch(format!(
                "git {} of {} timed out after {:?}",
                what, self.session.url, self.timeout
            ))),
        }
    }
}

impl Drop for Fetcher {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn classify_clone_failure(url: &str, stderr: &str) -> Error {
    let stderr = stderr.trim();

    if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("could not read Username")
    {
        return Error::Fetch(format!("Authentication failed for {}", url));
    }

    if stderr.contains("Could not resolve host") || stderr.contains("unable to access") {
        return Error::Fetch(format!("Network error cloning {}: {}", url, stderr));
    }

    if stderr.contains("not found") || stderr.contains("does not exist") {
        return Error::Fetch(format!("Repository not found: {}", url));
    }

    Error::Fetch(format!("git clone failed: {}", stderr))
}

fn parse_revision(stdout: &[u8]) -> Result<String> {
    let revision = String::from_utf8_lossy(stdout).trim().to_string();

    if revision.is_empty() || !revision.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::Fetch(format!(
            "Unexpected output from git rev-parse: {:?}",
            revision
        )));
    }

    Ok(revision)
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use crate::test_support::FakeGit;
    use crate::test_support::GitFixture;
    #[cfg(unix)]
    use std::time::Duration;
    use tempfile::TempDir;

    fn config_in(root: &TempDir) -> FetchConfig {
        FetchConfig {
            scratch_root: Some(root.path().to_path_buf()),
            ..FetchConfig::default()
        }
    }

    #[test]
    fn test_new_does_not_touch_filesystem() {
        let scratch = TempDir::new().unwrap();
        let fetcher = Fetcher::new("https://github.com/owner/theme", &config_in(&scratch)).unwrap();

        assert_eq!(fetcher.url(), "https://github.com/owner/theme.git");
        assert!(fetcher.scratch_dir().starts_with(scratch.path()));
        assert!(!fetcher.scratch_dir().exists());
    }

    #[test]
    fn test_scratch_dirs_are_unique() {
        let scratch = TempDir::new().unwrap();
        let config = config_in(&scratch);
        let a = Fetcher::new("/srv/theme", &config).unwrap();
        let b = Fetcher::new("/srv/theme", &config).unwrap();

        assert_ne!(a.scratch_dir(), b.scratch_dir());
    }

    #[test]
    fn test_revision_before_fetch_is_state_error() {
        let scratch = TempDir::new().unwrap();
        let fetcher = Fetcher::new("/srv/theme", &config_in(&scratch)).unwrap();

        assert!(fetcher.revision().unwrap_err().is_state());
        assert!(fetcher.read("about.json").unwrap_err().is_state());
    }

    #[test]
    fn test_parse_revision() {
        assert_eq!(
            parse_revision(b"0123456789abcdef0123456789abcdef01234567\n").unwrap(),
            "0123456789abcdef0123456789abcdef01234567"
        );
        assert!(parse_revision(b"").unwrap_err().is_fetch());
        assert!(parse_revision(b"fatal: not a git repository").unwrap_err().is_fetch());
    }

    #[test]
    fn test_classify_clone_failure() {
        let err = classify_clone_failure(
            "https://example.com/theme.git",
            "fatal: could not read Username for 'https://example.com': terminal prompts disabled",
        );
        assert!(err.to_string().contains("Authentication failed"));

        let err =
            classify_clone_failure("/srv/none", "fatal: repository '/srv/none' does not exist");
        assert!(err.to_string().contains("Repository not found"));
        assert!(err.is_fetch());
    }

    #[tokio::test]
    async fn test_fetch_and_read() {
        let repo = GitFixture::new(&[
            ("about.json", r#"{"name": "fixture"}"#),
            ("common/header.html", "I AM HEADER"),
        ]);
        let scratch = TempDir::new().unwrap();
        let mut fetcher = Fetcher::new(repo.url(), &config_in(&scratch)).unwrap();

        fetcher.fetch().await.unwrap();

        assert_eq!(fetcher.revision().unwrap(), repo.head());
        assert_eq!(
            fetcher.read("common/header.html").unwrap().as_deref(),
            Some(&b"I AM HEADER"[..])
        );
        assert_eq!(fetcher.read("common/footer.html").unwrap(), None);
        assert_eq!(fetcher.read("common").unwrap(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_read_refuses_escaping_symlink() {
        let repo = GitFixture::new(&[("about.json", r#"{"name": "fixture"}"#)]);
        repo.symlink("common/header.html", "/etc/passwd");
        repo.symlink("desktop/desktop.scss", "../../../../../../../etc/hostname");

        let scratch = TempDir::new().unwrap();
        let mut fetcher = Fetcher::new(repo.url(), &config_in(&scratch)).unwrap();
        fetcher.fetch().await.unwrap();

        assert_eq!(fetcher.read("common/header.html").unwrap(), None);
        assert_eq!(fetcher.read("desktop/desktop.scss").unwrap(), None);
        assert_eq!(fetcher.read("../../../../etc/passwd").unwrap(), None);
        assert_eq!(fetcher.read("/etc/passwd").unwrap(), None);
    }

    #[tokio::test]
    async fn test_fetch_missing_remote_is_fetch_error() {
        let missing = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let url = missing.path().join("nope");
        let mut fetcher = Fetcher::new(url.to_str().unwrap(), &config_in(&scratch)).unwrap();

        let err = fetcher.fetch().await.unwrap_err();
        assert!(err.is_fetch());

        fetcher.cleanup();
        assert!(!fetcher.scratch_dir().exists());
    }

    #[tokio::test]
    async fn test_missing_git_binary_is_fetch_error() {
        let scratch = TempDir::new().unwrap();
        let config = FetchConfig {
            git_path: "/nonexistent/bin/git-12345".to_string(),
            ..config_in(&scratch)
        };
        let mut fetcher = Fetcher::new("/srv/theme", &config).unwrap();

        assert!(fetcher.fetch().await.unwrap_err().is_fetch());
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let repo = GitFixture::new(&[("about.json", r#"{"name": "fixture"}"#)]);
        let scratch = TempDir::new().unwrap();
        let mut fetcher = Fetcher::new(repo.url(), &config_in(&scratch)).unwrap();
        fetcher.fetch().await.unwrap();
        assert!(fetcher.scratch_dir().exists());

        fetcher.cleanup();
        assert!(!fetcher.scratch_dir().exists());
        fetcher.cleanup();
        assert!(!fetcher.scratch_dir().exists());
    }

    #[tokio::test]
    async fn test_drop_removes_scratch_dir() {
        let repo = GitFixture::new(&[("about.json", r#"{"name": "fixture"}"#)]);
        let scratch = TempDir::new().unwrap();
        let dir = {
            let mut fetcher = Fetcher::new(repo.url(), &config_in(&scratch)).unwrap();
            fetcher.fetch().await.unwrap();
            fetcher.scratch_dir().to_path_buf()
        };

        assert!(!dir.exists());
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_second_fetch_is_state_error() {
        let repo = GitFixture::new(&[("about.json", r#"{"name": "fixture"}"#)]);
        let scratch = TempDir::new().unwrap();
        let mut fetcher = Fetcher::new(repo.url(), &config_in(&scratch)).unwrap();
        fetcher.fetch().await.unwrap();

        assert!(fetcher.fetch().await.unwrap_err().is_state());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_clone_timeout_is_fetch_error_and_cleans_up() {
        let git =
            FakeGit::new("mkdir -p \"$dest\"\necho partial > \"$dest/about.json\"\nexec sleep 30");
        let scratch = TempDir::new().unwrap();
        let config = FetchConfig {
            git_path: git.path(),
            timeout: Duration::from_millis(500),
            ..config_in(&scratch)
        };
        let mut fetcher = Fetcher::new("/srv/theme", &config).unwrap();

        let err = fetcher.fetch().await.unwrap_err();
        assert!(err.is_fetch());
        assert!(err.to_string().contains("timed out"));
        assert!(fetcher.revision().unwrap_err().is_state());

        fetcher.cleanup();
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cleanup_failure_keeps_fetch_error() {
        // A regular file at the checkout path cannot be removed as a directory
        let git = FakeGit::new(
            "echo leftover > \"$dest\"\necho \"fatal: repository '/srv/theme' does not exist\" >&2\nexit 128",
        );
        let scratch = TempDir::new().unwrap();
        let config = FetchConfig {
            git_path: git.path(),
            ..config_in(&scratch)
        };
        let mut fetcher = Fetcher::new("/srv/theme", &config).unwrap();

        let err = fetcher.fetch().await.unwrap_err();
        fetcher.cleanup();

        assert!(err.is_fetch());
        assert!(err.to_string().contains("Repository not found"));
        assert!(fetcher.scratch_dir().is_file());
    }
}
