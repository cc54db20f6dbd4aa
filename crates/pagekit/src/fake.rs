//! In-memory movie catalog implementing [`Session`].
//!
//! `FakeSession` renders the catalog application from plain state and answers
//! selector queries by looking the selector up in the same [`LocatorRegistry`]
//! the page models use. It is what the test suite drives instead of a browser.
//!
//! Every state change (sort, favorite toggle, navigation, page load) re-renders
//! the page: the render generation is bumped, so handles resolved earlier go
//! stale, just like nodes replaced by a framework re-render. Knobs inject the
//! failures a real browser produces:
//!
//! - [`FakeSession::set_render_delay`]: content stays empty for N queries after
//!   each re-render
//! - [`FakeSession::stale_next`]: the next N actions hit a detached node
//! - [`FakeSession::block`]: clicks on a control report "not interactable"
//! - [`FakeSession::set_toast_polls`]: a toast stays up for N queries after a
//!   favorite toggle

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::locator::{LocatorRegistry, Selector};
use crate::session::{BoundingBox, DriverError, DriverResult, ElementHandle, Session};
use crate::vocabulary::{names, CATALOG, DETAIL, FAVORITES};

/// One movie in the fake catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeMovie {
    /// Title
    pub title: String,
    /// Release year
    pub year: u16,
    /// Genre
    pub genre: String,
}

impl FakeMovie {
    /// Create a movie
    #[must_use]
    pub fn new(title: impl Into<String>, year: u16, genre: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            year,
            genre: genre.into(),
        }
    }
}

/// Six movies in insertion order, as the demo application ships them
#[must_use]
pub fn sample_movies() -> Vec<FakeMovie> {
    vec![
        FakeMovie::new("The Matrix", 1999, "Sci-Fi"),
        FakeMovie::new("Inception", 2010, "Sci-Fi"),
        FakeMovie::new("Spirited Away", 2001, "Animation"),
        FakeMovie::new("Parasite", 2019, "Thriller"),
        FakeMovie::new("amélie", 2001, "Romance"),
        FakeMovie::new("Interstellar", 2014, "Sci-Fi"),
    ]
}

/// How the clear-sort control renders while the list is unsorted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearControl {
    /// Always rendered
    #[default]
    Shown,
    /// Rendered with zero size
    Hidden,
    /// Not in the DOM
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sort {
    None,
    Title,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Catalog,
    Favorites,
    Detail(usize),
}

impl View {
    const fn group(self) -> &'static str {
        match self {
            Self::Catalog => CATALOG,
            Self::Favorites => FAVORITES,
            Self::Detail(_) => DETAIL,
        }
    }
}

#[derive(Debug)]
struct State {
    movies: Vec<FakeMovie>,
    favorites: Vec<usize>,
    sort: Sort,
    view: View,
    history: Vec<View>,
    generation: u64,
    render_delay: u32,
    pending_render: u32,
    toast_polls: u32,
    toast_remaining: u32,
    stale_remaining: u32,
    clear_control: ClearControl,
    blocked: HashMap<String, String>,
    clicks: Vec<String>,
    typed: Vec<(String, String)>,
    visited: Vec<String>,
}

impl State {
    fn rerender(&mut self) {
        self.generation += 1;
        self.pending_render = self.render_delay;
    }

    /// Movie indices of the current list view, in DOM order
    fn listed(&self) -> Vec<usize> {
        match self.view {
            View::Catalog => {
                let mut order: Vec<usize> = (0..self.movies.len()).collect();
                match self.sort {
                    Sort::None => {}
                    Sort::Title => {
                        order.sort_by_key(|&i| self.movies[i].title.to_lowercase());
                    }
                    Sort::Year => {
                        order.sort_by(|&a, &b| self.movies[b].year.cmp(&self.movies[a].year));
                    }
                }
                order
            }
            View::Favorites => self.favorites.clone(),
            View::Detail(_) => Vec::new(),
        }
    }

    fn handle(&self, name: &str, item: Option<usize>, visible: bool) -> ElementHandle {
        let item = item.map_or_else(|| "-".to_string(), |i| i.to_string());
        let size = if visible { 100.0 } else { 0.0 };
        ElementHandle::new(
            format!("{}/{}/{}/{}", self.generation, self.view.group(), name, item),
            "div",
        )
        .with_bounding_box(BoundingBox::new(0.0, 0.0, size, size))
    }
}

/// Parsed form of a handle id
#[derive(Debug, PartialEq, Eq)]
struct NodeRef {
    generation: u64,
    name: String,
    item: Option<usize>,
}

impl NodeRef {
    fn parse(id: &str) -> DriverResult<Self> {
        let mut parts = id.splitn(4, '/');
        let generation = parts.next().and_then(|g| g.parse().ok());
        let _group = parts.next();
        let name = parts.next();
        let item = parts.next();
        match (generation, name, item) {
            (Some(generation), Some(name), Some(item)) => Ok(Self {
                generation,
                name: name.to_string(),
                item: item.parse().ok(),
            }),
            _ => Err(DriverError::other(format!("unknown node id '{id}'"))),
        }
    }
}

/// In-memory movie catalog session
#[derive(Debug)]
pub struct FakeSession {
    roles: HashMap<Selector, Vec<(String, String)>>,
    state: Mutex<State>,
}

impl FakeSession {
    /// Render `movies` using the markup described by `registry`
    #[must_use]
    pub fn new(registry: &LocatorRegistry, movies: Vec<FakeMovie>) -> Self {
        let mut roles: HashMap<Selector, Vec<(String, String)>> = HashMap::new();
        for group_name in registry.group_names() {
            if let Ok(group) = registry.group(group_name) {
                for name in group.names() {
                    if let Ok(locator) = group.resolve(name) {
                        roles
                            .entry(locator.selector().clone())
                            .or_default()
                            .push((group_name.to_string(), name.to_string()));
                    }
                }
            }
        }

        Self {
            roles,
            state: Mutex::new(State {
                movies,
                favorites: Vec::new(),
                sort: Sort::None,
                view: View::Catalog,
                history: Vec::new(),
                generation: 0,
                render_delay: 0,
                pending_render: 0,
                toast_polls: 0,
                toast_remaining: 0,
                stale_remaining: 0,
                clear_control: ClearControl::Shown,
                blocked: HashMap::new(),
                clicks: Vec::new(),
                typed: Vec::new(),
                visited: Vec::new(),
            }),
        }
    }

    /// Content stays empty for `queries` lookups after every re-render
    pub fn set_render_delay(&self, queries: u32) {
        let mut state = self.state.lock();
        state.render_delay = queries;
        state.pending_render = queries;
    }

    /// Keep the toast up for `queries` lookups after each favorite toggle
    pub fn set_toast_polls(&self, queries: u32) {
        self.state.lock().toast_polls = queries;
    }

    /// The next `actions` clicks/reads/typing hit a detached node
    pub fn stale_next(&self, actions: u32) {
        self.state.lock().stale_remaining = actions;
    }

    /// Clicks on the control named `name` fail as not interactable
    pub fn block(&self, name: &str, reason: &str) {
        let _ = self
            .state
            .lock()
            .blocked
            .insert(name.to_string(), reason.to_string());
    }

    /// Remove a block set by [`FakeSession::block`]
    pub fn unblock(&self, name: &str) {
        let _ = self.state.lock().blocked.remove(name);
    }

    /// Rendering of the clear-sort control while unsorted
    pub fn set_clear_control(&self, clear_control: ClearControl) {
        self.state.lock().clear_control = clear_control;
    }

    /// Titles of favorited movies, in the order they were added
    #[must_use]
    pub fn favorite_titles(&self) -> Vec<String> {
        let state = self.state.lock();
        state
            .favorites
            .iter()
            .map(|&i| state.movies[i].title.clone())
            .collect()
    }

    /// Names of clicked controls, in order
    #[must_use]
    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().clicks.clone()
    }

    /// `(control, text)` pairs typed so far
    #[must_use]
    pub fn typed(&self) -> Vec<(String, String)> {
        self.state.lock().typed.clone()
    }

    /// URLs loaded through [`Session::goto`], in order
    #[must_use]
    pub fn visited(&self) -> Vec<String> {
        self.state.lock().visited.clone()
    }

    /// Current render generation
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    fn render(&self, selector: &Selector, scope: Option<&NodeRef>) -> Vec<ElementHandle> {
        let Some(roles) = self.roles.get(selector) else {
            return Vec::new();
        };
        let mut state = self.state.lock();
        if state.pending_render > 0 {
            state.pending_render -= 1;
            return Vec::new();
        }

        let group = state.view.group();
        let Some(name) = roles
            .iter()
            .find(|(g, _)| g == group)
            .map(|(_, name)| name.as_str())
        else {
            return Vec::new();
        };

        let scoped_item = scope.and_then(|node| {
            (node.name == names::CARDS)
                .then_some(node.item)
                .flatten()
        });

        match (name, state.view) {
            (names::ROOT, _) => vec![state.handle(name, None, true)],
            (names::CARDS, _) => state
                .listed()
                .into_iter()
                .map(|i| state.handle(name, Some(i), true))
                .collect(),
            (names::TITLE | names::YEAR | names::GENRE | names::FAV_BUTTON, View::Detail(i)) => {
                vec![state.handle(name, Some(i), true)]
            }
            (names::TITLE | names::YEAR | names::GENRE | names::FAV_BUTTON, _) => {
                match scoped_item {
                    Some(i) => vec![state.handle(name, Some(i), true)],
                    None => state
                        .listed()
                        .into_iter()
                        .map(|i| state.handle(name, Some(i), true))
                        .collect(),
                }
            }
            (names::CLEAR_SORT, _) => match (state.sort, state.clear_control) {
                (Sort::None, ClearControl::Absent) => Vec::new(),
                (Sort::None, ClearControl::Hidden) => vec![state.handle(name, None, false)],
                _ => vec![state.handle(name, None, true)],
            },
            (names::TOAST, _) => {
                if state.toast_remaining > 0 {
                    state.toast_remaining -= 1;
                    vec![state.handle(name, None, true)]
                } else {
                    Vec::new()
                }
            }
            _ => vec![state.handle(name, None, true)],
        }
    }

    /// Validate a handle before acting on it
    fn live(&self, handle: &ElementHandle) -> DriverResult<NodeRef> {
        let node = NodeRef::parse(&handle.id)?;
        let mut state = self.state.lock();
        if state.stale_remaining > 0 {
            state.stale_remaining -= 1;
            state.rerender();
            return Err(DriverError::Stale);
        }
        if node.generation != state.generation {
            return Err(DriverError::Stale);
        }
        Ok(node)
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn find_elements(&self, selector: &Selector) -> DriverResult<Vec<ElementHandle>> {
        Ok(self.render(selector, None))
    }

    async fn find_elements_within(
        &self,
        parent: &ElementHandle,
        selector: &Selector,
    ) -> DriverResult<Vec<ElementHandle>> {
        let parent = NodeRef::parse(&parent.id)?;
        if parent.generation != self.generation() {
            return Err(DriverError::Stale);
        }
        Ok(self.render(selector, Some(&parent)))
    }

    async fn is_visible(&self, handle: &ElementHandle) -> DriverResult<bool> {
        let node = NodeRef::parse(&handle.id)?;
        if node.generation != self.generation() {
            return Err(DriverError::Stale);
        }
        Ok(handle.bounding_box.is_some_and(|b| b.has_area()))
    }

    async fn click(&self, handle: &ElementHandle) -> DriverResult<()> {
        let node = self.live(handle)?;
        let mut state = self.state.lock();
        if let Some(reason) = state.blocked.get(&node.name) {
            return Err(DriverError::blocked(reason.clone()));
        }
        state.clicks.push(node.name.clone());

        match (node.name.as_str(), node.item) {
            (names::SORT_TITLE, _) => state.sort = Sort::Title,
            (names::SORT_YEAR, _) => state.sort = Sort::Year,
            (names::CLEAR_SORT, _) => state.sort = Sort::None,
            (names::FAV_BUTTON, Some(i)) => {
                if let Some(pos) = state.favorites.iter().position(|&f| f == i) {
                    let _ = state.favorites.remove(pos);
                } else {
                    state.favorites.push(i);
                }
                state.toast_remaining = state.toast_polls;
            }
            (names::FAVORITES_LINK, _) => {
                let from = state.view;
                state.history.push(from);
                state.view = View::Favorites;
            }
            (names::CATALOG_LINK, _) => {
                let from = state.view;
                state.history.push(from);
                state.view = View::Catalog;
            }
            (names::TITLE, Some(i)) if !matches!(state.view, View::Detail(_)) => {
                let from = state.view;
                state.history.push(from);
                state.view = View::Detail(i);
            }
            _ => return Ok(()),
        }
        state.rerender();
        Ok(())
    }

    async fn get_text(&self, handle: &ElementHandle) -> DriverResult<String> {
        let node = self.live(handle)?;
        let state = self.state.lock();
        let movie = node.item.and_then(|i| state.movies.get(i));
        Ok(match (node.name.as_str(), movie) {
            (names::TITLE, Some(movie)) => movie.title.clone(),
            (names::YEAR, Some(movie)) => format!("({})", movie.year),
            (names::GENRE, Some(movie)) => movie.genre.clone(),
            (names::CARDS, Some(movie)) => {
                format!("{}\n({})\n{}", movie.title, movie.year, movie.genre)
            }
            _ => String::new(),
        })
    }

    async fn type_text(&self, handle: &ElementHandle, text: &str) -> DriverResult<()> {
        let node = self.live(handle)?;
        self.state.lock().typed.push((node.name, text.to_string()));
        Ok(())
    }

    async fn navigate_back(&self) -> DriverResult<()> {
        let mut state = self.state.lock();
        let previous = state
            .history
            .pop()
            .ok_or_else(|| DriverError::other("no history entry to go back to"))?;
        state.view = previous;
        state.rerender();
        Ok(())
    }

    async fn goto(&self, url: &str) -> DriverResult<()> {
        if url.is_empty() {
            return Err(DriverError::other("cannot load an empty URL"));
        }
        let mut state = self.state.lock();
        state.visited.push(url.to_string());
        state.view = View::Catalog;
        state.sort = Sort::None;
        state.history.clear();
        state.favorites.clear();
        state.toast_remaining = 0;
        state.rerender();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::vocabulary::Vocabulary;

    fn session(vocabulary: Vocabulary) -> (LocatorRegistry, FakeSession) {
        let registry = vocabulary.registry().unwrap();
        let session = FakeSession::new(&registry, sample_movies());
        (registry, session)
    }

    fn selector(registry: &LocatorRegistry, group: &str, name: &str) -> Selector {
        registry.resolve(group, name).unwrap().selector().clone()
    }

    #[test]
    fn test_node_ref_parse() {
        let node = NodeRef::parse("3/catalog/cards/2").unwrap();
        assert_eq!(node.generation, 3);
        assert_eq!(node.name, "cards");
        assert_eq!(node.item, Some(2));
        assert!(NodeRef::parse("garbage").is_err());
    }

    #[tokio::test]
    async fn test_renders_catalog_for_each_vocabulary() {
        for vocabulary in Vocabulary::ALL {
            let (registry, session) = session(vocabulary);
            let cards = session
                .find_elements(&selector(&registry, CATALOG, names::CARDS))
                .await
                .unwrap();
            assert_eq!(cards.len(), 6);
            let favorites_root = session
                .find_elements(&selector(&registry, FAVORITES, names::ROOT))
                .await
                .unwrap();
            assert!(favorites_root.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unknown_selector_matches_nothing() {
        let (_, session) = session(Vocabulary::V1);
        let found = session
            .find_elements(&Selector::css(".film-name"))
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_rerender_makes_handles_stale() {
        let (registry, session) = session(Vocabulary::V1);
        let cards = session
            .find_elements(&selector(&registry, CATALOG, names::CARDS))
            .await
            .unwrap();
        let sort = session
            .find_elements(&selector(&registry, CATALOG, names::SORT_YEAR))
            .await
            .unwrap();
        session.click(&sort[0]).await.unwrap();
        assert_eq!(session.get_text(&cards[0]).await, Err(DriverError::Stale));
    }

    #[tokio::test]
    async fn test_scoped_title() {
        let (registry, session) = session(Vocabulary::V2);
        let cards = session
            .find_elements(&selector(&registry, CATALOG, names::CARDS))
            .await
            .unwrap();
        let titles = session
            .find_elements_within(&cards[3], &selector(&registry, CATALOG, names::TITLE))
            .await
            .unwrap();
        assert_eq!(titles.len(), 1);
        assert_eq!(session.get_text(&titles[0]).await.unwrap(), "Parasite");
    }

    #[tokio::test]
    async fn test_render_delay() {
        let (registry, session) = session(Vocabulary::V1);
        session.set_render_delay(2);
        let cards = selector(&registry, CATALOG, names::CARDS);
        assert!(session.find_elements(&cards).await.unwrap().is_empty());
        assert!(session.find_elements(&cards).await.unwrap().is_empty());
        assert_eq!(session.find_elements(&cards).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_blocked_click() {
        let (registry, session) = session(Vocabulary::V1);
        session.block(names::SORT_TITLE, "covered by cookie banner");
        let sort = session
            .find_elements(&selector(&registry, CATALOG, names::SORT_TITLE))
            .await
            .unwrap();
        assert_eq!(
            session.click(&sort[0]).await,
            Err(DriverError::blocked("covered by cookie banner"))
        );
        assert!(session.clicks().is_empty());
    }

    #[tokio::test]
    async fn test_back_without_history() {
        let (_, session) = session(Vocabulary::V1);
        assert!(matches!(
            session.navigate_back().await,
            Err(DriverError::Other { .. })
        ));
    }

    #[tokio::test]
    async fn test_goto_resets_application_state() {
        let (registry, session) = session(Vocabulary::V1);
        let fav = session
            .find_elements(&selector(&registry, CATALOG, names::FAV_BUTTON))
            .await
            .unwrap();
        session.click(&fav[0]).await.unwrap();
        let link = session
            .find_elements(&selector(&registry, CATALOG, names::FAVORITES_LINK))
            .await
            .unwrap();
        session.click(&link[0]).await.unwrap();
        let before = session.generation();

        session.goto("http://localhost:3000").await.unwrap();
        assert_eq!(session.visited(), vec!["http://localhost:3000".to_string()]);
        assert!(session.favorite_titles().is_empty());
        assert!(session.generation() > before);
        let cards = session
            .find_elements(&selector(&registry, CATALOG, names::CARDS))
            .await
            .unwrap();
        assert_eq!(cards.len(), 6);
        assert!(session.navigate_back().await.is_err());
    }

    #[tokio::test]
    async fn test_goto_rejects_empty_url() {
        let (_, session) = session(Vocabulary::V1);
        assert!(matches!(session.goto("").await, Err(DriverError::Other { .. })));
        assert!(session.visited().is_empty());
    }
}
