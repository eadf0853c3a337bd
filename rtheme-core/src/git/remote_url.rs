//! Remote URL normalization

use crate::{Error, Result};

/// Hosts whose HTTPS clone URLs get a `.git` suffix appended
const SUFFIXED_HOSTS: &[&str] = &["github.com"];

/// Normalize a remote URL before cloning
///
/// HTTPS URLs on GitHub that lack the `.git` suffix get it appended. Every
/// other form (SSH, other hosts, local paths) is passed through as given.
pub fn normalize_remote_url(input: &str) -> Result<String> {
    let input = input.trim();

    if input.is_empty() {
        return Err(Error::Config("Remote URL must not be empty".to_string()));
    }

    if !input.starts_with("https://") {
        return Ok(input.to_string());
    }

    let Ok(url) = url::Url::parse(input) else {
        return Ok(input.to_string());
    };

    let host = url.host_str().unwrap_or("");
    if !SUFFIXED_HOSTS.contains(&host) {
        return Ok(input.to_string());
    }

    let trimmed = input.trim_end_matches('/');
    if trimmed.ends_with(".git") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{}.git", trimmed))
    }
}
