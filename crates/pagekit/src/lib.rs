//! Pagekit: Page-Model Framework for Browser UI Automation
//!
//! Test scenarios talk to semantic page models ("sort by year", "toggle the
//! favorite of the third card") instead of raw selectors. Page models resolve
//! named locators from a registry, wait for the DOM through a polling
//! [`Waiter`], and act through an [`Executor`] that absorbs a single re-render
//! between resolving an element and touching it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PAGEKIT Architecture                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │    │ Page       │    │ Executor / │            │
//! │   │ (tokio     │───►│ Models     │───►│ Waiter     │            │
//! │   │  test)     │    │            │    │            │            │
//! │   └────────────┘    └─────┬──────┘    └─────┬──────┘            │
//! │                           │ names           │ selectors         │
//! │                     ┌─────▼──────┐    ┌─────▼──────┐            │
//! │                     │ Locator    │    │ Session    │            │
//! │                     │ Registry   │    │ (driver)   │            │
//! │                     └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use pagekit::{sample_movies, CatalogPage, FakeSession, HarnessConfig, SortCriterion};
//!
//! # async fn scenario() -> pagekit::PageResult<()> {
//! let config = HarnessConfig::from_env()?;
//! let session = FakeSession::new(&config.registry()?, sample_movies());
//!
//! let catalog: CatalogPage<'_, _> = config.launch(&session).await?;
//! catalog.sort_by(SortCriterion::Year).await?;
//! let title = catalog.add_first_to_favorites().await?;
//!
//! let favorites = catalog.open_favorites().await?;
//! assert_eq!(favorites.item_titles().await?, vec![title]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod catalog;
pub mod config;
mod executor;
pub mod fake;
pub mod logging;
mod locator;
mod page;
mod result;
mod session;
pub mod vocabulary;
pub mod wait;

pub use catalog::{
    CatalogPage, DetailPage, FavoritesPage, ItemRef, ItemSummary, SortCriterion,
};
pub use config::{HarnessConfig, HarnessConfigBuilder};
pub use executor::{Executor, Target};
pub use fake::{sample_movies, ClearControl, FakeMovie, FakeSession};
pub use locator::{
    GroupBuilder, Locator, LocatorGroup, LocatorRegistry, LocatorRegistryBuilder, Selector,
};
pub use page::{PageContext, PageModel};
pub use result::{Action, PageError, PageResult};
pub use session::{BoundingBox, DriverError, DriverResult, ElementHandle, Session};
pub use vocabulary::Vocabulary;
pub use wait::{WaitCondition, WaitOptions, Waiter};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        Action, CatalogPage, DetailPage, FavoritesPage, HarnessConfig, ItemRef, ItemSummary,
        Locator, LocatorRegistry, PageContext, PageError, PageModel, PageResult, Selector,
        Session, SortCriterion, Target, Vocabulary, WaitCondition, WaitOptions,
    };
}
