#[cfg(test)]
#[path = "themes_test.rs"]
mod tests;

use anyhow::anyhow;
use anyhow::Result;
use once_cell::sync::Lazy;
use syntect::highlighting::Theme;
use syntect::highlighting::ThemeSet;

static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

pub struct Themes {}

impl Themes {
    pub fn list() -> Vec<String> {
        let mut themes = THEME_SET
            .themes
            .keys()
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        themes.sort();

        return themes;
    }

    pub fn get(theme_name: &str) -> Result<Theme> {
        return THEME_SET
            .themes
            .get(theme_name)
            .cloned()
            .ok_or_else(|| return anyhow!("Theme {theme_name} does not exist"));
    }
}
