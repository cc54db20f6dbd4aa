//! Action Executor
//!
//! Performs clicks, text reads and typing against the session. Actions take a
//! [`Target`] rather than a handle: the executor resolves the target through
//! the [`Waiter`] right before acting, and again if the node detaches in
//! between. A stale handle is retried exactly once; a blocked or zero-size
//! element is never retried.

use std::fmt;
use std::future::Future;
use tracing::{debug, warn};

use crate::locator::Locator;
use crate::result::{Action, PageError, PageResult};
use crate::session::{DriverResult, ElementHandle, Session};
use crate::wait::{driver_failure, WaitCondition, Waiter};

/// Blocked reason for a present element without a layout box
const ZERO_SIZE: &str = "zero-size";

/// Recipe for resolving one element
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    locator: &'a Locator,
    index: usize,
    within: Option<(&'a Locator, usize)>,
    condition: WaitCondition,
}

impl<'a> Target<'a> {
    /// First element matching `locator` once it is present
    #[must_use]
    pub const fn first(locator: &'a Locator) -> Self {
        Self {
            locator,
            index: 0,
            within: None,
            condition: WaitCondition::Present,
        }
    }

    /// The `index`th element matching `locator`
    #[must_use]
    pub const fn nth(locator: &'a Locator, index: usize) -> Self {
        Self {
            locator,
            index,
            within: None,
            condition: WaitCondition::Present,
        }
    }

    /// Restrict the search to the `index`th `container` match
    #[must_use]
    pub const fn within(mut self, container: &'a Locator, index: usize) -> Self {
        self.within = Some((container, index));
        self
    }

    /// Condition the element must satisfy before acting
    #[must_use]
    pub const fn when(mut self, condition: WaitCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Locator of the element itself
    #[must_use]
    pub const fn locator(&self) -> &'a Locator {
        self.locator
    }
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.within {
            Some((container, index)) => write!(
                f,
                "{}[{}] > {}[{}]",
                container.name(),
                index,
                self.locator.name(),
                self.index
            ),
            None => write!(f, "{}[{}]", self.locator.name(), self.index),
        }
    }
}

/// Performs interactions against a borrowed session
#[derive(Debug)]
pub struct Executor<'s, S: Session + ?Sized> {
    waiter: Waiter<'s, S>,
}

impl<'s, S: Session + ?Sized> Clone for Executor<'s, S> {
    fn clone(&self) -> Self {
        Self {
            waiter: self.waiter.clone(),
        }
    }
}

impl<'s, S: Session + ?Sized> Executor<'s, S> {
    /// Create an executor that resolves targets through `waiter`
    #[must_use]
    pub const fn new(waiter: Waiter<'s, S>) -> Self {
        Self { waiter }
    }

    /// The waiter used for resolution
    #[must_use]
    pub const fn waiter(&self) -> &Waiter<'s, S> {
        &self.waiter
    }

    /// Resolve a target to a fresh handle
    pub async fn resolve(&self, target: &Target<'_>) -> PageResult<ElementHandle> {
        let handles = match target.within {
            Some((container, index)) => {
                let parent = self.nth(container, WaitCondition::Present, index).await?;
                self.waiter
                    .wait_for_within(&parent, target.locator, target.condition)
                    .await?
            }
            None => {
                self.waiter
                    .wait_for(target.locator, target.condition)
                    .await?
            }
        };
        pick(handles, target.locator, target.index)
    }

    async fn nth(
        &self,
        locator: &Locator,
        condition: WaitCondition,
        index: usize,
    ) -> PageResult<ElementHandle> {
        let handles = self.waiter.wait_for(locator, condition).await?;
        pick(handles, locator, index)
    }

    /// Click the target
    pub async fn click(&self, target: &Target<'_>) -> PageResult<()> {
        self.with_stale_retry(target, Action::Click, |session, handle| async move {
            session.click(&handle).await
        })
        .await
    }

    /// Read the target's visible text
    pub async fn read_text(&self, target: &Target<'_>) -> PageResult<String> {
        self.with_stale_retry(target, Action::ReadText, |session, handle| async move {
            session.get_text(&handle).await
        })
        .await
    }

    /// Type `text` into the target
    pub async fn type_text(&self, target: &Target<'_>, text: &str) -> PageResult<()> {
        self.with_stale_retry(target, Action::Type, |session, handle| async move {
            session.type_text(&handle, text).await
        })
        .await
    }

    /// Text of every element matching `locator` after presence-all, in DOM order
    pub async fn read_all_text(&self, locator: &Locator) -> PageResult<Vec<String>> {
        match self.read_all_once(locator).await {
            Err(PageError::StaleElement { .. }) => {
                warn!(locator = locator.name(), "list re-rendered while reading, retrying");
                self.read_all_once(locator).await
            }
            other => other,
        }
    }

    async fn read_all_once(&self, locator: &Locator) -> PageResult<Vec<String>> {
        let handles = self
            .waiter
            .wait_for(locator, WaitCondition::PresentAll)
            .await?;
        let session = self.waiter.session();
        let mut texts = Vec::with_capacity(handles.len());
        for handle in &handles {
            let text = session
                .get_text(handle)
                .await
                .map_err(|err| driver_failure(locator, Action::ReadText, err))?;
            texts.push(text);
        }
        Ok(texts)
    }

    /// Trigger history navigation
    pub async fn navigate_back(&self, locator: &Locator) -> PageResult<()> {
        debug!(locator = locator.name(), "navigating back");
        self.waiter
            .session()
            .navigate_back()
            .await
            .map_err(|err| driver_failure(locator, Action::NavigateBack, err))
    }

    /// Load `url` in the session; failures are reported against `root`
    pub async fn goto(&self, url: &str, root: &Locator) -> PageResult<()> {
        debug!(locator = root.name(), url, "loading");
        self.waiter
            .session()
            .goto(url)
            .await
            .map_err(|err| driver_failure(root, Action::Navigate, err))
    }

    /// Resolve, act, and on staleness resolve through the waiter and act once more.
    ///
    /// Staleness during resolution (a container re-rendered before the scoped
    /// lookup) counts as the first attempt too.
    async fn with_stale_retry<T, F, Fut>(
        &self,
        target: &Target<'_>,
        action: Action,
        act: F,
    ) -> PageResult<T>
    where
        F: Fn(&'s S, ElementHandle) -> Fut,
        Fut: Future<Output = DriverResult<T>>,
    {
        let session = self.waiter.session();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = match self.resolve_for(target, action).await {
                Ok(handle) => {
                    debug!(element = %target, %action, attempt, "acting");
                    act(session, handle)
                        .await
                        .map_err(|err| driver_failure(target.locator, action, err))
                }
                Err(err) => Err(err),
            };
            match outcome {
                Err(failure) if failure.is_transient() && attempt == 1 => {
                    warn!(element = %target, %action, "stale element, re-resolving once");
                }
                other => return other,
            }
        }
    }

    /// Resolve `target` for `action`; clicks and typing need a node with area.
    ///
    /// A `Visible` condition is waited on as `Present`; a present node without
    /// area is blocked, not waited out.
    async fn resolve_for(&self, target: &Target<'_>, action: Action) -> PageResult<ElementHandle> {
        if !matches!(action, Action::Click | Action::Type) {
            return self.resolve(target).await;
        }
        let present = match target.condition {
            WaitCondition::Visible => target.when(WaitCondition::Present),
            _ => *target,
        };
        let handle = self.resolve(&present).await?;
        let visible = self
            .waiter
            .session()
            .is_visible(&handle)
            .await
            .map_err(|err| driver_failure(target.locator, Action::IsVisible, err))?;
        if visible {
            return Ok(handle);
        }
        warn!(element = %target, %action, "target has no area");
        Err(PageError::InteractionBlocked {
            locator: target.locator.name().to_string(),
            action,
            reason: ZERO_SIZE.to_string(),
        })
    }
}

fn pick(handles: Vec<ElementHandle>, locator: &Locator, index: usize) -> PageResult<ElementHandle> {
    let available = handles.len();
    handles
        .into_iter()
        .nth(index)
        .ok_or_else(|| PageError::ItemNotFound {
            locator: locator.name().to_string(),
            item: format!("#{index} of {available}"),
        })
}
