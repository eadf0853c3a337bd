//! Repository modules for database operations

pub mod themes;

pub use themes::ThemeRepository;
