//! Wait Strategy
//!
//! Every page model operation goes through [`Waiter`] before it touches an
//! element. The waiter re-queries the session on a fixed poll interval until a
//! [`WaitCondition`] holds or the timeout elapses. It never sleeps for a fixed
//! period.
//!
//! The last evaluation happens exactly at the deadline: each sleep is
//! `min(poll_interval, remaining)`. A wait that never succeeds therefore fails
//! no earlier than `timeout` and no later than `timeout + poll_interval`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::locator::Locator;
use crate::result::{Action, PageError, PageResult};
use crate::session::{DriverError, ElementHandle, Session};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// WAIT CONDITION
// =============================================================================

/// Predicate over the current DOM state for one locator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitCondition {
    /// At least one match
    Present,
    /// The locator's declared minimum count reached
    PresentAll,
    /// Present, and the first match rendered with nonzero geometry
    Visible,
    /// No matches
    Absent,
}

impl WaitCondition {
    /// Human-readable name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::PresentAll => "present (all)",
            Self::Visible => "visible",
            Self::Absent => "absent",
        }
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject a zero poll interval
    pub fn validate(&self) -> PageResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(PageError::Config {
                message: "poll interval must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// WAITER
// =============================================================================

/// Polls a session until a locator satisfies a condition
#[derive(Debug)]
pub struct Waiter<'s, S: Session + ?Sized> {
    session: &'s S,
    options: WaitOptions,
}

impl<'s, S: Session + ?Sized> Clone for Waiter<'s, S> {
    fn clone(&self) -> Self {
        Self {
            session: self.session,
            options: self.options,
        }
    }
}

impl<'s, S: Session + ?Sized> Waiter<'s, S> {
    /// Create a waiter over a borrowed session
    #[must_use]
    pub const fn new(session: &'s S, options: WaitOptions) -> Self {
        Self { session, options }
    }

    /// Default options of this waiter
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// The borrowed session
    #[must_use]
    pub const fn session(&self) -> &'s S {
        self.session
    }

    /// Wait with this waiter's default options
    pub async fn wait_for(
        &self,
        locator: &Locator,
        condition: WaitCondition,
    ) -> PageResult<Vec<ElementHandle>> {
        self.poll(None, locator, condition, &self.options).await
    }

    /// Wait with explicit options
    pub async fn wait_for_with(
        &self,
        locator: &Locator,
        condition: WaitCondition,
        options: &WaitOptions,
    ) -> PageResult<Vec<ElementHandle>> {
        self.poll(None, locator, condition, options).await
    }

    /// Wait for descendants of `parent`
    pub async fn wait_for_within(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
        condition: WaitCondition,
    ) -> PageResult<Vec<ElementHandle>> {
        self.poll(Some(parent), locator, condition, &self.options)
            .await
    }

    async fn poll(
        &self,
        scope: Option<&ElementHandle>,
        locator: &Locator,
        condition: WaitCondition,
        options: &WaitOptions,
    ) -> PageResult<Vec<ElementHandle>> {
        let start = Instant::now();
        let timeout = options.timeout();
        let poll_interval = options.poll_interval();
        let mut polls: u32 = 0;

        debug!(
            locator = locator.name(),
            %condition,
            timeout_ms = options.timeout_ms,
            "waiting"
        );

        loop {
            polls += 1;
            if let Some(handles) = self.evaluate(scope, locator, condition).await? {
                debug!(
                    locator = locator.name(),
                    %condition,
                    polls,
                    matched = handles.len(),
                    elapsed_ms = elapsed_ms(start),
                    "wait satisfied"
                );
                return Ok(handles);
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                warn!(
                    locator = locator.name(),
                    %condition,
                    polls,
                    elapsed_ms = elapsed_ms(start),
                    "wait timed out"
                );
                return Err(PageError::Timeout {
                    locator: locator.name().to_string(),
                    condition,
                    elapsed_ms: elapsed_ms(start),
                });
            }

            trace!(locator = locator.name(), %condition, polls, "not yet satisfied");
            tokio::time::sleep(poll_interval.min(timeout - elapsed)).await;
        }
    }

    /// One evaluation of `condition`; `None` means "not yet".
    async fn evaluate(
        &self,
        scope: Option<&ElementHandle>,
        locator: &Locator,
        condition: WaitCondition,
    ) -> PageResult<Option<Vec<ElementHandle>>> {
        let found = match scope {
            Some(parent) => {
                self.session
                    .find_elements_within(parent, locator.selector())
                    .await
            }
            None => self.session.find_elements(locator.selector()).await,
        }
        .map_err(|err| driver_failure(locator, Action::Find, err))?;

        let satisfied = match condition {
            WaitCondition::Present => !found.is_empty(),
            WaitCondition::PresentAll => found.len() >= locator.min_count(),
            WaitCondition::Absent => found.is_empty(),
            WaitCondition::Visible => match found.first() {
                Some(first) => match self.session.is_visible(first).await {
                    Ok(visible) => visible,
                    // Re-rendered between query and probe; query again next poll.
                    Err(DriverError::Stale) => false,
                    Err(err) => return Err(driver_failure(locator, Action::IsVisible, err)),
                },
                None => false,
            },
        };

        Ok(satisfied.then_some(found))
    }
}

/// Map a driver error to the typed taxonomy
pub(crate) fn driver_failure(locator: &Locator, action: Action, err: DriverError) -> PageError {
    let locator = locator.name().to_string();
    match err {
        DriverError::Stale => PageError::StaleElement { locator, action },
        DriverError::Blocked { reason } => PageError::InteractionBlocked {
            locator,
            action,
            reason,
        },
        DriverError::Other { message } => PageError::Driver {
            locator,
            action,
            message,
        },
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

// =============================================================================
// TESTS
// =============================================================================
