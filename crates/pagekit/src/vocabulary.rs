//! Built-in selector vocabularies for the movie catalog.
//!
//! Both UI revisions expose the same screens and controls but name them
//! differently: v1 uses `movie-*` test ids and classes, v2 renamed everything
//! to `film-*` and action-style test ids. Page models only see the semantic
//! names below, so one page model drives either revision.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::locator::{LocatorRegistry, Selector};
use crate::result::{PageError, PageResult};

/// Locator group of the catalog list
pub const CATALOG: &str = "catalog";
/// Locator group of the favorites list
pub const FAVORITES: &str = "favorites";
/// Locator group of the detail view
pub const DETAIL: &str = "detail";

/// Semantic locator names shared by every vocabulary
pub mod names {
    /// Root container of a screen
    pub const ROOT: &str = "root";
    /// One card per item
    pub const CARDS: &str = "cards";
    /// Title text (inside a card or the detail view)
    pub const TITLE: &str = "title";
    /// Release year text
    pub const YEAR: &str = "year";
    /// Genre text
    pub const GENRE: &str = "genre";
    /// Favorite toggle (inside a card or the detail view)
    pub const FAV_BUTTON: &str = "fav_button";
    /// Sort by title control
    pub const SORT_TITLE: &str = "sort_title";
    /// Sort by year control
    pub const SORT_YEAR: &str = "sort_year";
    /// Clear sorting control
    pub const CLEAR_SORT: &str = "clear_sort";
    /// Navigation link to the favorites list
    pub const FAVORITES_LINK: &str = "favorites_link";
    /// Navigation link back to the catalog
    pub const CATALOG_LINK: &str = "catalog_link";
    /// Transient notification shown after toggling a favorite
    pub const TOAST: &str = "toast";
}

/// UI revision of the movie catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vocabulary {
    /// Plain `movie-*` test ids and classes
    #[default]
    V1,
    /// Renamed `film-*` / `*-action` test ids
    V2,
}

struct Markup {
    catalog_root: &'static str,
    favorites_root: &'static str,
    detail_root: &'static str,
    card: &'static str,
    title: &'static str,
    year: &'static str,
    genre: &'static str,
    fav_button: &'static str,
    sort_title: &'static str,
    sort_year: &'static str,
    clear_sort: &'static str,
    favorites_link: &'static str,
    catalog_link: &'static str,
    toast: &'static str,
}

const V1: Markup = Markup {
    catalog_root: "movie-list",
    favorites_root: "favorites-list",
    detail_root: "movie-detail",
    card: "movie-card",
    title: ".movie-title",
    year: ".movie-year",
    genre: ".movie-genre",
    fav_button: "fav-btn",
    sort_title: "sort-by-name-button",
    sort_year: "sort-by-year-button",
    clear_sort: "clear-sorting-button",
    favorites_link: "favorites-link",
    catalog_link: "home-link",
    toast: "toast",
};

const V2: Markup = Markup {
    catalog_root: "film-grid",
    favorites_root: "favorites-grid",
    detail_root: "film-details",
    card: "film-entry",
    title: ".film-name",
    year: ".film-release-year",
    genre: ".film-genre",
    fav_button: "favorite-icon",
    sort_title: "sort-name-action",
    sort_year: "sort-year-action",
    clear_sort: "clear-sort-action",
    favorites_link: "nav-favorites",
    catalog_link: "nav-home",
    toast: "notification",
};

impl Vocabulary {
    /// All built-in vocabularies
    pub const ALL: [Self; 2] = [Self::V1, Self::V2];

    /// Short name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }

    const fn markup(self) -> &'static Markup {
        match self {
            Self::V1 => &V1,
            Self::V2 => &V2,
        }
    }

    /// Build the locator registry for this revision
    pub fn registry(self) -> PageResult<LocatorRegistry> {
        use names::*;
        let m = self.markup();
        LocatorRegistry::builder()
            .group(CATALOG, |g| {
                g.locator(ROOT, Selector::test_id(m.catalog_root))
                    .list(CARDS, Selector::test_id(m.card), 0)
                    .locator(TITLE, Selector::css(m.title))
                    .locator(YEAR, Selector::css(m.year))
                    .locator(GENRE, Selector::css(m.genre))
                    .locator(FAV_BUTTON, Selector::test_id(m.fav_button))
                    .locator(SORT_TITLE, Selector::test_id(m.sort_title))
                    .locator(SORT_YEAR, Selector::test_id(m.sort_year))
                    .locator(CLEAR_SORT, Selector::test_id(m.clear_sort))
                    .locator(FAVORITES_LINK, Selector::test_id(m.favorites_link))
                    .locator(TOAST, Selector::test_id(m.toast))
            })
            .group(FAVORITES, |g| {
                g.locator(ROOT, Selector::test_id(m.favorites_root))
                    .list(CARDS, Selector::test_id(m.card), 0)
                    .locator(TITLE, Selector::css(m.title))
                    .locator(YEAR, Selector::css(m.year))
                    .locator(GENRE, Selector::css(m.genre))
                    .locator(FAV_BUTTON, Selector::test_id(m.fav_button))
                    .locator(CATALOG_LINK, Selector::test_id(m.catalog_link))
                    .locator(TOAST, Selector::test_id(m.toast))
            })
            .group(DETAIL, |g| {
                g.locator(ROOT, Selector::test_id(m.detail_root))
                    .locator(TITLE, Selector::css(m.title))
                    .locator(YEAR, Selector::css(m.year))
                    .locator(GENRE, Selector::css(m.genre))
                    .locator(FAV_BUTTON, Selector::test_id(m.fav_button))
                    .locator(TOAST, Selector::test_id(m.toast))
            })
            .build()
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Vocabulary {
    type Err = PageError;

    /// Accepts `v1`, `page_v1` and module paths such as `page_selectors.page_v1`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let last = s.trim().rsplit(['.', ':', '/']).next().unwrap_or_default();
        match last.to_ascii_lowercase().trim_start_matches("page_") {
            "v1" => Ok(Self::V1),
            "v2" => Ok(Self::V2),
            _ => Err(PageError::Config {
                message: format!("unknown selector vocabulary '{s}' (expected v1 or v2)"),
            }),
        }
    }
}
