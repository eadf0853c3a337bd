//! Show and list commands

use clap::Args;
use rtheme_core::{Config, Theme, ThemeStore};
use rtheme_db::ThemeRepository;

use super::open_database;

/// Arguments for the show command
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Theme id
    pub id: i64,

    /// Print field contents, not just their names
    #[arg(long)]
    pub content: bool,
}

impl ShowArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let db = open_database(config)?;
        let store = ThemeRepository::new(&db);

        let Some(theme) = store.find(self.id)? else {
            anyhow::bail!("Theme #{} not found", self.id);
        };

        print_theme(&theme);
        if self.content {
            for (target, field, value) in theme.fields.iter() {
                println!();
                println!("--- {}/{} ---", target, field);
                println!("{}", value);
            }
        }

        Ok(())
    }
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list themes imported from a remote
    #[arg(long)]
    pub remote: bool,
}

impl ListArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let db = open_database(config)?;
        let store = ThemeRepository::new(&db);

        for theme in store.list()? {
            if self.remote && theme.remote.is_none() {
                continue;
            }

            let source = theme.remote_url().unwrap_or("(local)");
            println!(
                "#{:<4} {:<30} {:>2} field(s)  {}",
                theme.id.unwrap_or_default(),
                theme.name,
                theme.fields.len(),
                source
            );
        }

        Ok(())
    }
}

/// Print a theme summary
pub fn print_theme(theme: &Theme) {
    println!("Name: {}", theme.name);
    println!("Owner: {}", theme.user_id);

    if let Some(remote) = &theme.remote {
        println!("Remote: {}", remote.remote_url());
        println!("  remote revision: {}", remote.remote_revision);
        println!("  local revision:  {}", remote.local_revision);
        if let Some(url) = &remote.about_url {
            println!("  about: {}", url);
        }
        if let Some(url) = &remote.license_url {
            println!("  license: {}", url);
        }
    }

    println!("Fields ({}):", theme.fields.len());
    for (target, field, value) in theme.fields.iter() {
        println!("  {}/{} ({} bytes)", target, field, value.len());
    }
}
