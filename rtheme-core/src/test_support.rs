//! Throwaway git repositories for tests

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// A local git repository usable as a clone remote
pub struct GitFixture {
    dir: TempDir,
}

impl GitFixture {
    /// Create a repository containing `files` in a single commit
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().unwrap();
        let fixture = Self { dir };
        fixture.git(&["init", "--quiet", "."]);
        for (name, data) in files {
            fixture.put(name, data);
        }
        fixture.commit("first commit");
        fixture
    }

    /// Path of the repository, usable as a remote URL
    pub fn url(&self) -> &str {
        self.dir.path().to_str().unwrap()
    }

    /// Current HEAD revision
    pub fn head(&self) -> String {
        let output = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(self.dir.path())
            .output()
            .unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    /// Write a file and commit it
    pub fn write(&self, name: &str, data: &str) {
        self.put(name, data);
        self.commit(&format!("update {}", name));
    }

    /// Delete a file and commit the removal
    pub fn remove(&self, name: &str) {
        self.git(&["rm", "--quiet", name]);
        self.commit(&format!("remove {}", name));
    }

    /// Commit a symlink at `name` pointing to `target`
    #[cfg(unix)]
    pub fn symlink(&self, name: &str, target: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::os::unix::fs::symlink(Path::new(target), &path).unwrap();
        self.commit(&format!("link {}", name));
    }

    fn put(&self, name: &str, data: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, data).unwrap();
    }

    fn commit(&self, message: &str) {
        self.git(&["add", "--all"]);
        self.git(&[
            "-c",
            "user.name=Fixture",
            "-c",
            "user.email=fixture@example.com",
            "-c",
            "commit.gpgsign=false",
            "commit",
            "--quiet",
            "--allow-empty",
            "-m",
            message,
        ]);
    }

    fn git(&self, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }
}

/// A stand-in `git` executable running a shell script
///
/// The script sees git's arguments; `$dest` holds the last one, which for
/// `git clone` is the checkout directory.
#[cfg(unix)]
pub struct FakeGit {
    dir: TempDir,
}

#[cfg(unix)]
impl FakeGit {
    pub fn new(body: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("git");
        let script = format!("#!/bin/sh\nfor dest; do :; done\n{}\n", body);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> String {
        self.dir.path().join("git").to_str().unwrap().to_string()
    }
}
