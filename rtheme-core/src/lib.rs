//! rtheme core - import and re-synchronize themes hosted in git repositories
//!
//! A [`git::Fetcher`] makes a shallow checkout of a remote into a private
//! scratch directory and reads files from it without ever following a path
//! out of that directory. The [`theme::FieldMapper`] maps the checkout onto a
//! fixed schema of theme fields, and [`sync::RemoteThemeSync`] ties both to a
//! [`store::ThemeStore`] while guaranteeing scratch cleanup.

pub mod config;
pub mod error;
pub mod git;
pub mod store;
pub mod sync;
pub mod theme;

#[cfg(test)]
mod test_support;

pub use config::{Config, FetchConfig, StoreConfig};
pub use error::{Error, Result};
pub use git::Fetcher;
pub use store::{MemoryThemeStore, ThemeStore};
pub use sync::{RemoteThemeSync, SyncReport};
pub use theme::{Field, FieldMapper, RemoteOrigin, Target, Theme, ThemeCache, ThemeFields};
