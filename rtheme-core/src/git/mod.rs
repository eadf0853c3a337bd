//! Git operations for remote themes
//!
//! This module provides URL normalization, the shallow-clone fetcher and the
//! sandbox that confines reads to the fetched checkout.

mod fetcher;
mod remote_url;
mod sandbox;

pub use fetcher::{FetchSession, Fetcher};
pub use remote_url::normalize_remote_url;
pub use sandbox::{resolve_within, FsResolver, PathResolver};
