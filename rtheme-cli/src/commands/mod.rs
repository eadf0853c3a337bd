//! CLI command implementations

pub mod import;
pub mod resync;
pub mod show;

pub use import::ImportArgs;
pub use resync::ResyncArgs;
pub use show::{ListArgs, ShowArgs};

use rtheme_core::Config;
use rtheme_db::Database;

/// Open the configured theme database
pub fn open_database(config: &Config) -> anyhow::Result<Database> {
    let path = config.store.path()?;
    Ok(Database::open_at(&path)?)
}
