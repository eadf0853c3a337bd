//! Per-theme field cache with explicit invalidation

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::ThemeFields;
use crate::store::ThemeStore;
use crate::Result;

/// Field snapshots keyed by theme id
///
/// Passed by reference to whatever mutates field sets; a theme's entry is
/// invalidated whenever its fields are persisted.
#[derive(Debug, Default)]
pub struct ThemeCache {
    entries: RwLock<HashMap<i64, Arc<ThemeFields>>>,
}

impl ThemeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, theme_id: i64) -> Option<Arc<ThemeFields>> {
        self.read().get(&theme_id).cloned()
    }

    pub fn insert(&self, theme_id: i64, fields: ThemeFields) -> Arc<ThemeFields> {
        let fields = Arc::new(fields);
        self.write().insert(theme_id, Arc::clone(&fields));
        fields
    }

    /// Cached fields for `theme_id`, loading them from `store` on a miss
    ///
    /// Returns `None` if the store has no such theme.
    pub fn get_or_load<S>(&self, theme_id: i64, store: &S) -> Result<Option<Arc<ThemeFields>>>
    where
        S: ThemeStore + ?Sized,
    {
        if let Some(fields) = self.get(theme_id) {
            return Ok(Some(fields));
        }

        Ok(store
            .find(theme_id)?
            .map(|theme| self.insert(theme_id, theme.fields)))
    }

    /// Drop the entry for `theme_id`
    pub fn invalidate(&self, theme_id: i64) {
        if self.write().remove(&theme_id).is_some() {
            tracing::debug!(theme_id, "Invalidated cached theme fields");
        }
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Poisoning is ignored: entries are whole snapshots, never partially written
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<i64, Arc<ThemeFields>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<i64, Arc<ThemeFields>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryThemeStore;
    use crate::theme::{Field, FieldStore, Target, Theme};

    fn fields_with_header(header: &str) -> ThemeFields {
        let mut fields = ThemeFields::new();
        fields.set_field(Target::Common, Field::Header, Some(header.to_string()));
        fields
    }

    #[test]
    fn test_insert_get_invalidate() {
        let cache = ThemeCache::new();
        assert!(cache.get(1).is_none());

        cache.insert(1, fields_with_header("one"));
        assert_eq!(cache.get(1).unwrap().get(Target::Common, Field::Header), Some("one"));
        assert_eq!(cache.len(), 1);

        cache.invalidate(1);
        assert!(cache.get(1).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_or_load_hits_store_once() {
        let store = MemoryThemeStore::new();
        let mut theme = Theme::new("cached", None);
        theme.fields = fields_with_header("from store");
        let id = store.insert(&theme).unwrap();

        let cache = ThemeCache::new();
        let loaded = cache.get_or_load(id, &store).unwrap().unwrap();
        assert_eq!(loaded.get(Target::Common, Field::Header), Some("from store"));

        // A stale snapshot is served until invalidated
        theme.id = Some(id);
        theme.fields = fields_with_header("updated");
        store.update(&theme).unwrap();
        let cached = cache.get_or_load(id, &store).unwrap().unwrap();
        assert_eq!(cached.get(Target::Common, Field::Header), Some("from store"));

        cache.invalidate(id);
        let reloaded = cache.get_or_load(id, &store).unwrap().unwrap();
        assert_eq!(reloaded.get(Target::Common, Field::Header), Some("updated"));
    }

    #[test]
    fn test_get_or_load_missing_theme() {
        let cache = ThemeCache::new();
        assert!(cache.get_or_load(99, &MemoryThemeStore::new()).unwrap().is_none());
        assert!(cache.is_empty());
    }
}
