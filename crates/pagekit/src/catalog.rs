//! Page models of the movie catalog application.
//!
//! Three screens: the catalog list (sortable, with a favorite toggle on every
//! card), the favorites list, and the detail view of one movie. The screens
//! only know the semantic locator names from [`crate::vocabulary::names`], so
//! the same code drives every UI revision.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::executor::Target;
use crate::locator::{Locator, LocatorGroup};
use crate::page::{PageContext, PageModel};
use crate::result::{Action, PageError, PageResult};
use crate::session::{ElementHandle, Session};
use crate::vocabulary::{names, CATALOG, DETAIL, FAVORITES};
use crate::wait::{driver_failure, WaitCondition, WaitOptions};

// =============================================================================
// VALUE TYPES
// =============================================================================

/// What one card shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    /// Title
    pub title: String,
    /// Release year
    pub year: u16,
    /// Genre
    pub genre: String,
}

/// Sort controls of the catalog list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortCriterion {
    /// Ascending by title, case-insensitive
    Title,
    /// Newest first
    Year,
    /// Original order
    None,
}

impl SortCriterion {
    const fn control(self) -> &'static str {
        match self {
            Self::Title => names::SORT_TITLE,
            Self::Year => names::SORT_YEAR,
            Self::None => names::CLEAR_SORT,
        }
    }
}

/// Identifies one item of a list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemRef {
    /// Position in DOM order
    Index(usize),
    /// Exact title
    Title(String),
}

impl From<usize> for ItemRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for ItemRef {
    fn from(title: &str) -> Self {
        Self::Title(title.to_string())
    }
}

impl From<String> for ItemRef {
    fn from(title: String) -> Self {
        Self::Title(title)
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Title(title) => write!(f, "{title:?}"),
        }
    }
}

#[allow(clippy::expect_used)]
fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(\d{4})\b").expect("year pattern is valid"))
}

/// Parse "(1999)", "1999" or "Released 1999"
fn parse_year(locator: &Locator, text: &str) -> PageResult<u16> {
    year_pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| PageError::UnexpectedText {
            locator: locator.name().to_string(),
            text: text.to_string(),
        })
}

// =============================================================================
// CARD LISTS (shared by catalog and favorites)
// =============================================================================

/// Card-list operations over one locator group
struct CardList<'a, 's, S: Session + ?Sized> {
    ctx: &'a PageContext<'s, S>,
    group: &'a LocatorGroup,
}

impl<'a, 's, S: Session + ?Sized> CardList<'a, 's, S> {
    fn new(ctx: &'a PageContext<'s, S>, group: &str) -> PageResult<Self> {
        Ok(Self {
            ctx,
            group: ctx.locators(group)?,
        })
    }

    fn locator(&self, name: &str) -> PageResult<&'a Locator> {
        self.group.resolve(name)
    }

    async fn items(&self) -> PageResult<Vec<ItemSummary>> {
        // Root first: an empty list only counts once the screen has rendered.
        let root = self.locator(names::ROOT)?;
        self.ctx
            .waiter()
            .wait_for(root, WaitCondition::Present)
            .await?;

        match self.items_once().await {
            Err(err) if err.is_transient() => {
                warn!(group = self.group.name(), "list re-rendered while reading, retrying");
                self.items_once().await
            }
            other => other,
        }
    }

    async fn items_once(&self) -> PageResult<Vec<ItemSummary>> {
        let cards = self.locator(names::CARDS)?;
        let title = self.locator(names::TITLE)?;
        let year = self.locator(names::YEAR)?;
        let genre = self.locator(names::GENRE)?;

        let handles = self
            .ctx
            .waiter()
            .wait_for(cards, WaitCondition::PresentAll)
            .await?;

        let mut items = Vec::with_capacity(handles.len());
        for card in &handles {
            let year_text = self.text_within(card, year).await?;
            items.push(ItemSummary {
                title: self.text_within(card, title).await?,
                year: parse_year(year, &year_text)?,
                genre: self.text_within(card, genre).await?,
            });
        }
        debug!(group = self.group.name(), count = items.len(), "listed items");
        Ok(items)
    }

    async fn text_within(&self, card: &ElementHandle, locator: &Locator) -> PageResult<String> {
        let session = self.ctx.session();
        let found = session
            .find_elements_within(card, locator.selector())
            .await
            .map_err(|err| driver_failure(locator, Action::Find, err))?;
        let Some(first) = found.first() else {
            return Err(PageError::ItemNotFound {
                locator: locator.name().to_string(),
                item: card.id.clone(),
            });
        };
        session
            .get_text(first)
            .await
            .map(|text| text.trim().to_string())
            .map_err(|err| driver_failure(locator, Action::ReadText, err))
    }

    /// DOM position of `item`
    async fn position(&self, item: &ItemRef) -> PageResult<usize> {
        let cards = self.locator(names::CARDS)?;
        match item {
            ItemRef::Index(index) => Ok(*index),
            ItemRef::Title(wanted) => self
                .items()
                .await?
                .iter()
                .position(|summary| &summary.title == wanted)
                .ok_or_else(|| PageError::ItemNotFound {
                    locator: cards.name().to_string(),
                    item: item.to_string(),
                }),
        }
    }

    /// Click the favorite toggle inside the card for `item`; returns its title
    async fn toggle_favorite(&self, item: &ItemRef) -> PageResult<String> {
        let cards = self.locator(names::CARDS)?;
        let title = self.locator(names::TITLE)?;
        let fav = self.locator(names::FAV_BUTTON)?;
        let index = self.position(item).await?;

        let executor = self.ctx.executor();
        let name = executor
            .read_text(&Target::first(title).within(cards, index))
            .await?
            .trim()
            .to_string();
        executor
            .click(
                &Target::first(fav)
                    .within(cards, index)
                    .when(WaitCondition::Visible),
            )
            .await?;
        debug!(group = self.group.name(), item = %item, title = %name, "toggled favorite");

        wait_for_toast(self.ctx, self.group).await?;
        Ok(name)
    }
}

/// Wait for the group's toast, if it declares one, to clear
async fn wait_for_toast<S: Session + ?Sized>(
    ctx: &PageContext<'_, S>,
    group: &LocatorGroup,
) -> PageResult<()> {
    if let Some(toast) = group.get(names::TOAST) {
        ctx.waiter().wait_for(toast, WaitCondition::Absent).await?;
    }
    Ok(())
}

// =============================================================================
// CATALOG LIST
// =============================================================================

/// The sortable catalog list
#[derive(Debug)]
pub struct CatalogPage<'s, S: Session + ?Sized> {
    ctx: PageContext<'s, S>,
}

impl<'s, S: Session + ?Sized + 's> PageModel<'s, S> for CatalogPage<'s, S> {
    const GROUP: &'static str = CATALOG;

    fn attach(ctx: PageContext<'s, S>) -> Self {
        Self { ctx }
    }

    fn context(&self) -> &PageContext<'s, S> {
        &self.ctx
    }
}

impl<'s, S: Session + ?Sized + 's> CatalogPage<'s, S> {
    fn cards(&self) -> PageResult<CardList<'_, 's, S>> {
        CardList::new(&self.ctx, Self::GROUP)
    }

    /// Click the sort control for `criterion`.
    ///
    /// `SortCriterion::None` clears sorting; when the list is already unsorted
    /// and the clear control is absent or hidden this does nothing.
    pub async fn sort_by(&self, criterion: SortCriterion) -> PageResult<()> {
        let control = self.locator(criterion.control())?;
        let executor = self.ctx.executor();

        if criterion == SortCriterion::None {
            self.wait_until_loaded().await?;
            let probe = WaitOptions::new()
                .with_timeout(0)
                .with_poll_interval(self.ctx.options().poll_interval_ms);
            match executor
                .waiter()
                .wait_for_with(control, WaitCondition::Visible, &probe)
                .await
            {
                Ok(_) => {}
                Err(PageError::Timeout { .. }) => {
                    debug!("clear-sort control not shown, list already unsorted");
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }

        executor
            .click(&Target::first(control).when(WaitCondition::Visible))
            .await?;
        debug!(criterion = ?criterion, "sorted");
        Ok(())
    }

    /// Every card in DOM order
    pub async fn list_visible_items(&self) -> PageResult<Vec<ItemSummary>> {
        self.cards()?.items().await
    }

    /// Titles in DOM order
    pub async fn item_titles(&self) -> PageResult<Vec<String>> {
        Ok(self
            .list_visible_items()
            .await?
            .into_iter()
            .map(|item| item.title)
            .collect())
    }

    /// Years in DOM order
    pub async fn item_years(&self) -> PageResult<Vec<u16>> {
        Ok(self
            .list_visible_items()
            .await?
            .into_iter()
            .map(|item| item.year)
            .collect())
    }

    /// Toggle the favorite state of one item; returns its title
    pub async fn toggle_favorite(&self, item: impl Into<ItemRef>) -> PageResult<String> {
        self.cards()?.toggle_favorite(&item.into()).await
    }

    /// Mark the first card as favorite; returns its title
    pub async fn add_first_to_favorites(&self) -> PageResult<String> {
        self.toggle_favorite(0).await
    }

    /// Go to the favorites list
    pub async fn open_favorites(&self) -> PageResult<FavoritesPage<'s, S>> {
        self.navigate_to(names::FAVORITES_LINK).await
    }

    /// Open the detail view of one item
    pub async fn open_detail(&self, item: impl Into<ItemRef>) -> PageResult<DetailPage<'s, S>> {
        let cards = self.cards()?;
        let index = cards.position(&item.into()).await?;
        let card = cards.locator(names::CARDS)?;
        let title = cards.locator(names::TITLE)?;
        self.ctx
            .executor()
            .click(
                &Target::first(title)
                    .within(card, index)
                    .when(WaitCondition::Visible),
            )
            .await?;
        self.ctx.open().await
    }
}

// =============================================================================
// FAVORITES LIST
// =============================================================================

/// The favorites list
#[derive(Debug)]
pub struct FavoritesPage<'s, S: Session + ?Sized> {
    ctx: PageContext<'s, S>,
}

impl<'s, S: Session + ?Sized + 's> PageModel<'s, S> for FavoritesPage<'s, S> {
    const GROUP: &'static str = FAVORITES;

    fn attach(ctx: PageContext<'s, S>) -> Self {
        Self { ctx }
    }

    fn context(&self) -> &PageContext<'s, S> {
        &self.ctx
    }
}

impl<'s, S: Session + ?Sized + 's> FavoritesPage<'s, S> {
    fn cards(&self) -> PageResult<CardList<'_, 's, S>> {
        CardList::new(&self.ctx, Self::GROUP)
    }

    /// Every favorite in DOM order; empty when nothing is favorited
    pub async fn list_visible_items(&self) -> PageResult<Vec<ItemSummary>> {
        self.cards()?.items().await
    }

    /// Titles in DOM order
    pub async fn item_titles(&self) -> PageResult<Vec<String>> {
        Ok(self
            .list_visible_items()
            .await?
            .into_iter()
            .map(|item| item.title)
            .collect())
    }

    /// Toggle (remove) a favorite; returns its title
    pub async fn toggle_favorite(&self, item: impl Into<ItemRef>) -> PageResult<String> {
        self.cards()?.toggle_favorite(&item.into()).await
    }

    /// Go back to the catalog list
    pub async fn open_catalog(&self) -> PageResult<CatalogPage<'s, S>> {
        self.navigate_to(names::CATALOG_LINK).await
    }
}

// =============================================================================
// DETAIL VIEW
// =============================================================================

/// Detail view of one item
#[derive(Debug)]
pub struct DetailPage<'s, S: Session + ?Sized> {
    ctx: PageContext<'s, S>,
}

impl<'s, S: Session + ?Sized + 's> PageModel<'s, S> for DetailPage<'s, S> {
    const GROUP: &'static str = DETAIL;

    fn attach(ctx: PageContext<'s, S>) -> Self {
        Self { ctx }
    }

    fn context(&self) -> &PageContext<'s, S> {
        &self.ctx
    }
}

impl<'s, S: Session + ?Sized + 's> DetailPage<'s, S> {
    /// Title, year and genre of the shown item
    pub async fn summary(&self) -> PageResult<ItemSummary> {
        let executor = self.ctx.executor();
        let year = self.locator(names::YEAR)?;
        let year_text = executor.read_text(&Target::first(year)).await?;
        Ok(ItemSummary {
            title: executor
                .read_text(&Target::first(self.locator(names::TITLE)?))
                .await?
                .trim()
                .to_string(),
            year: parse_year(year, &year_text)?,
            genre: executor
                .read_text(&Target::first(self.locator(names::GENRE)?))
                .await?
                .trim()
                .to_string(),
        })
    }

    /// Toggle the favorite state of the shown item
    pub async fn toggle_favorite(&self) -> PageResult<()> {
        let fav = self.locator(names::FAV_BUTTON)?;
        self.ctx
            .executor()
            .click(&Target::first(fav).when(WaitCondition::Visible))
            .await?;
        wait_for_toast(&self.ctx, self.ctx.locators(Self::GROUP)?).await
    }

    /// History back to the catalog list
    pub async fn back_to_catalog(&self) -> PageResult<CatalogPage<'s, S>> {
        self.go_back().await
    }
}
