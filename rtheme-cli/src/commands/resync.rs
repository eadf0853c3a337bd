//! Resync command - Update remote themes from their repositories

use clap::Args;
use rtheme_core::{Config, RemoteThemeSync, ThemeCache, ThemeStore};
use rtheme_db::ThemeRepository;

use super::open_database;

/// Arguments for the resync command
#[derive(Args, Debug)]
pub struct ResyncArgs {
    /// Theme ids to resync
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub ids: Vec<i64>,

    /// Resync every theme that has a remote
    #[arg(long)]
    pub all: bool,
}

impl ResyncArgs {
    /// Execute the resync command
    ///
    /// Themes are processed one at a time; a failure is reported and the
    /// remaining themes are still attempted.
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let db = open_database(config)?;
        let store = ThemeRepository::new(&db);
        let cache = ThemeCache::new();
        let sync = RemoteThemeSync::new(&store, &cache, config.fetch.clone());

        let themes = if self.all {
            store.list()?
        } else {
            let mut themes = Vec::with_capacity(self.ids.len());
            for id in &self.ids {
                match store.find(*id)? {
                    Some(theme) => themes.push(theme),
                    None => anyhow::bail!("Theme #{} not found", id),
                }
            }
            themes
        };

        let mut failures = 0;
        for mut theme in themes {
            let id = theme.id.unwrap_or_default();
            match sync.resync(&mut theme).await {
                Ok(report) if report.is_skipped() => {
                    if !self.all {
                        println!("#{} {}: no remote, skipped", id, theme.name);
                    }
                }
                Ok(report) => {
                    println!(
                        "#{} {}: at {} ({} field(s) changed)",
                        id,
                        theme.name,
                        report.revision.as_deref().unwrap_or_default(),
                        report.changed.len()
                    );
                    for (target, field) in &report.changed {
                        println!("    {}/{}", target, field);
                    }
                }
                Err(e) => {
                    failures += 1;
                    eprintln!("#{} {}: {}", id, theme.name, e);
                }
            }
        }

        if failures > 0 {
            anyhow::bail!("{} theme(s) failed to resync", failures);
        }

        Ok(())
    }
}
