//! Light/dark theme preference, persisted under `THEME_KEY`.

use std::sync::Arc;

use crate::db::{DatabaseError, LocalStorage, THEME_KEY};
use crate::models::Theme;

pub struct ThemeService {
    storage: Arc<dyn LocalStorage>,
    current: Theme,
}

impl ThemeService {
    pub fn load(storage: Arc<dyn LocalStorage>) -> Self {
        let current = storage
            .get_item(THEME_KEY)
            .ok()
            .flatten()
            .and_then(|tag| tag.parse::<Theme>().ok())
            .unwrap_or_default();
        Self { storage, current }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), DatabaseError> {
        self.storage.set_item(THEME_KEY, theme.as_str())?;
        self.current = theme;
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<Theme, DatabaseError> {
        let next = match self.current {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        self.set_theme(next)?;
        Ok(next)
    }
}
