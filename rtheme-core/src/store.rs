//! Theme persistence seam

use std::collections::HashMap;
use std::sync::Mutex;

use crate::theme::Theme;
use crate::{Error, Result};

/// Persistence for themes, their remote origin and their fields
///
/// Implementations must write a theme as a unit: after `update` returns an
/// error, the previously stored theme is still intact.
pub trait ThemeStore {
    /// Persist a new theme and return its id
    fn insert(&self, theme: &Theme) -> Result<i64>;

    /// Replace a persisted theme
    fn update(&self, theme: &Theme) -> Result<()>;

    /// Load a theme by id
    fn find(&self, id: i64) -> Result<Option<Theme>>;

    /// Every stored theme, ordered by id
    fn list(&self) -> Result<Vec<Theme>>;
}

/// In-process store, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryThemeStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: i64,
    themes: HashMap<i64, Theme>,
}

impl MemoryThemeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>> {
        self.inner
            .lock()
            .map_err(|_| Error::Store("Theme store lock poisoned".to_string()))
    }
}

impl ThemeStore for MemoryThemeStore {
    fn insert(&self, theme: &Theme) -> Result<i64> {
        let mut inner = self.lock()?;
        inner.next_id += 1;
        let id = inner.next_id;

        let mut stored = theme.clone();
        stored.id = Some(id);
        inner.themes.insert(id, stored);

        Ok(id)
    }

    fn update(&self, theme: &Theme) -> Result<()> {
        let id = theme.require_id()?;
        let mut inner = self.lock()?;

        match inner.themes.get_mut(&id) {
            Some(stored) => {
                *stored = theme.clone();
                Ok(())
            }
            None => Err(Error::Store(format!("Theme with id {} not found", id))),
        }
    }

    fn find(&self, id: i64) -> Result<Option<Theme>> {
        Ok(self.lock()?.themes.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<Theme>> {
        let inner = self.lock()?;
        let mut themes: Vec<Theme> = inner.themes.values().cloned().collect();
        themes.sort_by_key(|t| t.id);
        Ok(themes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_assigns_ids() {
        let store = MemoryThemeStore::new();
        let a = store.insert(&Theme::new("a", None)).unwrap();
        let b = store.insert(&Theme::new("b", None)).unwrap();

        assert_ne!(a, b);
        assert_eq!(store.find(a).unwrap().unwrap().id, Some(a));
        let names: Vec<_> = store.list().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_update_requires_persisted_theme() {
        let store = MemoryThemeStore::new();
        assert!(matches!(store.update(&Theme::new("x", None)), Err(Error::Store(_))));

        let mut ghost = Theme::new("ghost", None);
        ghost.id = Some(404);
        assert!(matches!(store.update(&ghost), Err(Error::Store(_))));
    }

    #[test]
    fn test_find_missing() {
        assert!(MemoryThemeStore::new().find(1).unwrap().is_none());
    }
}
