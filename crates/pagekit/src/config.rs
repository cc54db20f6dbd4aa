//! Harness Configuration
//!
//! Which selector vocabulary to drive, where the application lives and how
//! long to wait. Values come from defaults, the builder, or `PAGEKIT_*`
//! environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::locator::LocatorRegistry;
use crate::page::{PageContext, PageModel};
use crate::result::{PageError, PageResult};
use crate::session::Session;
use crate::vocabulary::Vocabulary;
use crate::wait::WaitOptions;

/// Selector vocabulary (`v1`, `v2`, `page_v2`, ...)
pub const ENV_VOCABULARY: &str = "PAGEKIT_VOCABULARY";
/// Path of a YAML or JSON locator registry; overrides the vocabulary
pub const ENV_LOCATORS: &str = "PAGEKIT_LOCATORS";
/// URL [`HarnessConfig::launch`] loads before attaching the first page
pub const ENV_APP_URL: &str = "PAGEKIT_APP_URL";
/// Wait timeout in milliseconds
pub const ENV_TIMEOUT_MS: &str = "PAGEKIT_TIMEOUT_MS";
/// Wait poll interval in milliseconds
pub const ENV_POLL_INTERVAL_MS: &str = "PAGEKIT_POLL_INTERVAL_MS";

/// Default application URL
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";

/// Configuration of one test harness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Built-in selector vocabulary
    pub vocabulary: Vocabulary,
    /// Locator registry file used instead of the vocabulary
    pub locators: Option<PathBuf>,
    /// Application URL
    pub app_url: String,
    /// Wait policy
    pub wait: WaitOptions,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            vocabulary: Vocabulary::default(),
            locators: None,
            app_url: DEFAULT_APP_URL.to_string(),
            wait: WaitOptions::default(),
        }
    }
}

impl HarnessConfig {
    /// Create a new builder
    #[must_use]
    pub fn builder() -> HarnessConfigBuilder {
        HarnessConfigBuilder::default()
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> PageResult<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Defaults overridden by `vars`; unrelated keys are ignored
    pub fn from_vars<I, K, V>(vars: I) -> PageResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (key, value) in vars {
            let value: String = value.into();
            match key.as_ref() {
                ENV_VOCABULARY => config.vocabulary = value.parse()?,
                ENV_LOCATORS if !value.trim().is_empty() => {
                    config.locators = Some(PathBuf::from(value));
                }
                ENV_APP_URL => config.app_url = value,
                ENV_TIMEOUT_MS => config.wait.timeout_ms = parse_millis(ENV_TIMEOUT_MS, &value)?,
                ENV_POLL_INTERVAL_MS => {
                    config.wait.poll_interval_ms = parse_millis(ENV_POLL_INTERVAL_MS, &value)?;
                }
                _ => {}
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no harness can run with
    pub fn validate(&self) -> PageResult<()> {
        self.wait.validate()?;
        if self.app_url.trim().is_empty() {
            return Err(PageError::Config {
                message: "application URL must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Locator registry for the configured source
    pub fn registry(&self) -> PageResult<LocatorRegistry> {
        match &self.locators {
            Some(path) => {
                debug!(path = %path.display(), "loading locator registry");
                LocatorRegistry::from_path(path)
            }
            None => {
                debug!(vocabulary = %self.vocabulary, "using built-in vocabulary");
                self.vocabulary.registry()
            }
        }
    }

    /// Page context over `session` with this configuration's registry and waits
    pub fn page_context<'s, S: Session + ?Sized>(
        &self,
        session: &'s S,
    ) -> PageResult<PageContext<'s, S>> {
        self.validate()?;
        Ok(PageContext::new(session, Arc::new(self.registry()?)).with_options(self.wait))
    }

    /// Load the application URL in `session` and open the first page `P`
    pub async fn launch<'s, S, P>(&self, session: &'s S) -> PageResult<P>
    where
        S: Session + ?Sized,
        P: PageModel<'s, S>,
    {
        let ctx = self.page_context(session)?;
        debug!(url = %self.app_url, page = P::GROUP, "launching");
        ctx.load::<P>(&self.app_url).await
    }
}

fn parse_millis(key: &str, value: &str) -> PageResult<u64> {
    value.trim().parse().map_err(|_| PageError::Config {
        message: format!("{key} must be a whole number of milliseconds, got '{value}'"),
    })
}

/// Builder for `HarnessConfig`
#[derive(Debug, Clone, Default)]
pub struct HarnessConfigBuilder {
    config: HarnessConfig,
}

impl HarnessConfigBuilder {
    /// Set the selector vocabulary
    #[must_use]
    pub fn vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.config.vocabulary = vocabulary;
        self
    }

    /// Load locators from a registry file instead
    #[must_use]
    pub fn locators(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.locators = Some(path.into());
        self
    }

    /// Set the application URL
    #[must_use]
    pub fn app_url(mut self, url: impl Into<String>) -> Self {
        self.config.app_url = url.into();
        self
    }

    /// Set the wait timeout
    #[must_use]
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.wait.timeout_ms = timeout_ms;
        self
    }

    /// Set the wait poll interval
    #[must_use]
    pub fn poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.config.wait.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> HarnessConfig {
        self.config
    }
}
