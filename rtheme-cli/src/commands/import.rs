//! Import command - Create a theme from a git repository

use clap::Args;
use rtheme_core::{Config, RemoteThemeSync, ThemeCache};
use rtheme_db::ThemeRepository;

use super::open_database;
use super::show::print_theme;

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Repository URL or local path
    #[arg(required = true)]
    pub url: String,

    /// Owning user id (defaults to the system user)
    #[arg(short, long)]
    pub owner: Option<i64>,
}

impl ImportArgs {
    /// Execute the import command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let db = open_database(config)?;
        let store = ThemeRepository::new(&db);
        let cache = ThemeCache::new();
        let sync = RemoteThemeSync::new(&store, &cache, config.fetch.clone());

        let theme = sync.import_theme(&self.url, self.owner).await?;

        println!("Imported theme #{}", theme.id.unwrap_or_default());
        println!();
        print_theme(&theme);

        Ok(())
    }
}
