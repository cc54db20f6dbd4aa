//! Page Model support
//!
//! A page model is a stateless facade over one screen of the application. It
//! borrows the session, shares the locator registry, and exposes semantic
//! operations only; raw selectors never leave the registry.
//!
//! # Example
//!
//! ```ignore
//! let registry = Arc::new(Vocabulary::V1.registry()?);
//! let ctx = PageContext::new(&session, registry);
//!
//! let catalog: CatalogPage<'_, _> = ctx.open().await?;
//! catalog.sort_by(SortCriterion::Year).await?;
//! let favorites = catalog.open_favorites().await?;
//! ```

use std::sync::Arc;
use tracing::debug;

use crate::executor::{Executor, Target};
use crate::locator::{Locator, LocatorGroup, LocatorRegistry};
use crate::result::PageResult;
use crate::session::Session;
use crate::wait::{WaitCondition, WaitOptions, Waiter};

/// Everything a page model needs: the borrowed session, the shared registry
/// and the wait policy.
#[derive(Debug)]
pub struct PageContext<'s, S: Session + ?Sized> {
    session: &'s S,
    registry: Arc<LocatorRegistry>,
    options: WaitOptions,
}

impl<'s, S: Session + ?Sized> Clone for PageContext<'s, S> {
    fn clone(&self) -> Self {
        Self {
            session: self.session,
            registry: Arc::clone(&self.registry),
            options: self.options,
        }
    }
}

impl<'s, S: Session + ?Sized> PageContext<'s, S> {
    /// Create a context with default wait options
    #[must_use]
    pub fn new(session: &'s S, registry: Arc<LocatorRegistry>) -> Self {
        Self {
            session,
            registry,
            options: WaitOptions::default(),
        }
    }

    /// Override the wait options
    #[must_use]
    pub const fn with_options(mut self, options: WaitOptions) -> Self {
        self.options = options;
        self
    }

    /// The borrowed session
    #[must_use]
    pub const fn session(&self) -> &'s S {
        self.session
    }

    /// The shared registry
    #[must_use]
    pub fn registry(&self) -> &LocatorRegistry {
        &self.registry
    }

    /// Wait options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Locators of one page model
    pub fn locators(&self, group: &str) -> PageResult<&LocatorGroup> {
        self.registry.group(group)
    }

    /// Waiter bound to this context
    #[must_use]
    pub const fn waiter(&self) -> Waiter<'s, S> {
        Waiter::new(self.session, self.options)
    }

    /// Executor bound to this context
    #[must_use]
    pub const fn executor(&self) -> Executor<'s, S> {
        Executor::new(self.waiter())
    }

    /// Wait for `P`'s root container and attach to it
    pub async fn open<P: PageModel<'s, S>>(&self) -> PageResult<P> {
        let root = self.registry.resolve(P::GROUP, P::ROOT)?;
        self.waiter().wait_for(root, WaitCondition::Present).await?;
        debug!(page = P::GROUP, "page loaded");
        Ok(P::attach(self.clone()))
    }

    /// Load `url` in the session, then open `P`
    pub async fn load<P: PageModel<'s, S>>(&self, url: &str) -> PageResult<P> {
        let root = self.registry.resolve(P::GROUP, P::ROOT)?;
        self.executor().goto(url, root).await?;
        self.open::<P>().await
    }
}

/// A logical screen of the application under test.
///
/// Implementors provide the locator group and a way to attach to a context;
/// loading, navigation and history are provided.
#[allow(async_fn_in_trait)]
pub trait PageModel<'s, S: Session + ?Sized + 's>: Sized {
    /// Locator group of this screen
    const GROUP: &'static str;

    /// Locator name of the root container
    const ROOT: &'static str = "root";

    /// Wrap a context
    fn attach(ctx: PageContext<'s, S>) -> Self;

    /// The wrapped context
    fn context(&self) -> &PageContext<'s, S>;

    /// Resolve one of this screen's locators
    fn locator<'a>(&'a self, name: &str) -> PageResult<&'a Locator>
    where
        's: 'a,
    {
        self.context().registry().resolve(Self::GROUP, name)
    }

    /// Wait until the root container is present
    async fn wait_until_loaded(&self) -> PageResult<()> {
        let root = self.locator(Self::ROOT)?;
        self.context()
            .waiter()
            .wait_for(root, WaitCondition::Present)
            .await?;
        Ok(())
    }

    /// Click the navigation control `control` and wait for `P` to load
    async fn navigate_to<P: PageModel<'s, S>>(&self, control: &str) -> PageResult<P> {
        let control = self.locator(control)?;
        debug!(from = Self::GROUP, to = P::GROUP, "navigating");
        self.context()
            .executor()
            .click(&Target::first(control).when(WaitCondition::Visible))
            .await?;
        self.context().open::<P>().await
    }

    /// Go back in history and wait for `P` to load
    async fn go_back<P: PageModel<'s, S>>(&self) -> PageResult<P> {
        let root = self.locator(Self::ROOT)?;
        self.context().executor().navigate_back(root).await?;
        self.context().open::<P>().await
    }
}
