//! Database layer for remote themes
//!
//! SQLite persistence for themes, their remote origin and their fields.

pub mod db;
pub mod error;
pub mod repos;

pub use db::Database;
pub use error::{Error, Result};
pub use repos::ThemeRepository;
