//! First import and re-synchronization of remote themes
//!
//! Every operation owns one [`Fetcher`] and removes its scratch checkout on
//! every exit path. Nothing is persisted, and no recorded revision moves,
//! unless the fetch and the field mapping both succeeded.
//!
//! Concurrent resyncs of the *same* theme are not coordinated here; callers
//! must serialize them.

use chrono::Utc;

use crate::config::FetchConfig;
use crate::git::Fetcher;
use crate::store::ThemeStore;
use crate::theme::{
    FieldKey, FieldMapper, FileSource, RemoteOrigin, Theme, ThemeCache, ThemeDescriptor,
    DESCRIPTOR_FILE,
};
use crate::{Error, Result};

/// Outcome of a resync
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Revision the fields now reflect; `None` if the theme has no remote
    pub revision: Option<String>,
    /// Fields whose content changed
    pub changed: Vec<FieldKey>,
}

impl SyncReport {
    /// Whether the theme was left alone because it has no remote origin
    pub fn is_skipped(&self) -> bool {
        self.revision.is_none()
    }
}

/// Orchestrates fetcher, field mapper, store and cache
pub struct RemoteThemeSync<'a, S: ThemeStore + ?Sized> {
    store: &'a S,
    cache: &'a ThemeCache,
    config: FetchConfig,
}

impl<'a, S: ThemeStore + ?Sized> RemoteThemeSync<'a, S> {
    pub fn new(store: &'a S, cache: &'a ThemeCache, config: FetchConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// Import the theme at `url` as a new theme owned by `owner_id`
    ///
    /// Themes without an owner belong to the system user.
    pub async fn import_theme(&self, url: &str, owner_id: Option<i64>) -> Result<Theme> {
        let mut fetcher = Fetcher::new(url, &self.config)?;
        let result = self.import_from(&mut fetcher, owner_id).await;
        fetcher.cleanup();

        if let Err(e) = &result {
            tracing::warn!(url = %fetcher.url(), error = %e, "Remote theme import failed");
        }
        result
    }

    async fn import_from(&self, fetcher: &mut Fetcher, owner_id: Option<i64>) -> Result<Theme> {
        fetcher.fetch().await?;

        let descriptor = read_descriptor(&*fetcher)?;
        let revision = fetcher.revision()?.to_string();

        let mut origin = RemoteOrigin::new(fetcher.url(), &revision);
        origin.apply_descriptor(&descriptor);
        let mut theme = Theme::new(descriptor.name, owner_id).with_remote(origin);

        let changed = FieldMapper::apply(&*fetcher, &mut theme.fields)?;

        let id = self.store.insert(&theme)?;
        theme.id = Some(id);
        self.cache.invalidate(id);

        tracing::info!(
            theme_id = id,
            name = %theme.name,
            revision = %revision,
            fields = changed.len(),
            "Imported remote theme"
        );

        Ok(theme)
    }

    /// Re-fetch a theme's remote and re-apply its fields
    ///
    /// Themes without a remote origin are returned untouched. On error the
    /// theme, its stored copy and its recorded revisions are unchanged.
    pub async fn resync(&self, theme: &mut Theme) -> Result<SyncReport> {
        let Some(url) = theme.remote_url().map(str::to_string) else {
            tracing::debug!(name = %theme.name, "Theme has no remote origin, skipping resync");
            return Ok(SyncReport::default());
        };
        let id = theme.require_id()?;

        let mut fetcher = Fetcher::new(&url, &self.config)?;
        let result = self.resync_from(&mut fetcher, theme).await;
        fetcher.cleanup();

        match result {
            Ok((updated, report)) => {
                *theme = updated;
                self.cache.invalidate(id);
                tracing::info!(
                    theme_id = id,
                    revision = report.revision.as_deref().unwrap_or_default(),
                    changed = report.changed.len(),
                    "Resynchronized remote theme"
                );
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(theme_id = id, url = %url, error = %e, "Remote theme resync failed");
                Err(e)
            }
        }
    }

    async fn resync_from(
        &self,
        fetcher: &mut Fetcher,
        theme: &Theme,
    ) -> Result<(Theme, SyncReport)> {
        fetcher.fetch().await?;
        let revision = fetcher.revision()?.to_string();

        let mut updated = theme.clone();
        let changed = FieldMapper::apply(&*fetcher, &mut updated.fields)?;

        let descriptor = match read_descriptor(&*fetcher) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                tracing::warn!(error = %e, "Keeping previous remote metadata");
                None
            }
        };

        let origin = updated
            .remote
            .as_mut()
            .ok_or_else(|| Error::State("Remote origin vanished during resync".to_string()))?;
        if let Some(descriptor) = &descriptor {
            origin.apply_descriptor(descriptor);
        }
        origin.mark_synced(&revision);
        updated.updated_at = Utc::now();

        self.store.update(&updated)?;

        Ok((
            updated,
            SyncReport {
                revision: Some(revision),
                changed,
            },
        ))
    }
}

/// Read and parse the repository's descriptor
fn read_descriptor<F: FileSource + ?Sized>(source: &F) -> Result<ThemeDescriptor> {
    let bytes = source
        .read_file(DESCRIPTOR_FILE)?
        .ok_or_else(|| Error::Import(format!("Repository has no {}", DESCRIPTOR_FILE)))?;
    ThemeDescriptor::parse(&bytes)
}
