//! Named locators and the registry that groups them per page model.
//!
//! Page models never hold raw selector strings. They ask the registry for a
//! locator by its semantic name ("favorite_button"), and the registry maps that
//! name to whatever markup the UI revision under test happens to use. Swapping
//! registries is how one page model drives several UI revisions.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use crate::result::{PageError, PageResult};

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// CSS selector (e.g., ".movie-title")
    Css(String),
    /// XPath selector
    XPath(String),
    /// Text content selector
    Text(String),
    /// Test ID selector (data-testid attribute)
    TestId(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::XPath(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Strategy name, as used in registry documents
    #[must_use]
    pub const fn strategy(&self) -> &'static str {
        match self {
            Self::Css(_) => "css",
            Self::XPath(_) => "xpath",
            Self::Text(_) => "text",
            Self::TestId(_) => "test_id",
        }
    }

    /// Render to the query string handed to drivers
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Css(s) | Self::XPath(s) => s.clone(),
            Self::Text(t) => format!("text={t}"),
            Self::TestId(id) => format!("[data-testid='{id}']"),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.strategy(), self.to_query())
    }
}

/// A named, immutable element query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    name: String,
    selector: Selector,
    min_count: usize,
}

impl Locator {
    /// Create a locator that expects at least one match
    #[must_use]
    pub fn new(name: impl Into<String>, selector: Selector) -> Self {
        Self {
            name: name.into(),
            selector,
            min_count: 1,
        }
    }

    /// Minimum number of matches for the presence-all condition
    #[must_use]
    pub const fn with_min_count(mut self, min_count: usize) -> Self {
        self.min_count = min_count;
        self
    }

    /// Semantic name, stable across UI revisions
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw selector for the current UI revision
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Declared minimum match count
    #[must_use]
    pub const fn min_count(&self) -> usize {
        self.min_count
    }
}

/// The locators of one page model
#[derive(Debug, Clone, Default)]
pub struct LocatorGroup {
    name: String,
    locators: HashMap<String, Locator>,
}

impl LocatorGroup {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locators: HashMap::new(),
        }
    }

    fn insert(&mut self, locator: Locator) -> PageResult<()> {
        if self.locators.contains_key(locator.name()) {
            return Err(PageError::DuplicateLocator {
                group: self.name.clone(),
                name: locator.name().to_string(),
            });
        }
        let _ = self.locators.insert(locator.name().to_string(), locator);
        Ok(())
    }

    /// Group name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve a locator by name
    pub fn resolve(&self, name: &str) -> PageResult<&Locator> {
        self.locators
            .get(name)
            .ok_or_else(|| PageError::UnknownLocator {
                group: self.name.clone(),
                name: name.to_string(),
            })
    }

    /// Look up an optional locator
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Locator> {
        self.locators.get(name)
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.locators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of locators
    #[must_use]
    pub fn len(&self) -> usize {
        self.locators.len()
    }

    /// Whether the group declares no locators
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

/// Locator groups keyed by page model name.
#[derive(Debug, Clone, Default)]
pub struct LocatorRegistry {
    groups: HashMap<String, LocatorGroup>,
}

impl LocatorRegistry {
    /// Start building a registry
    #[must_use]
    pub fn builder() -> LocatorRegistryBuilder {
        LocatorRegistryBuilder::default()
    }

    /// Get a group by name
    pub fn group(&self, name: &str) -> PageResult<&LocatorGroup> {
        self.groups
            .get(name)
            .ok_or_else(|| PageError::UnknownLocator {
                group: name.to_string(),
                name: name.to_string(),
            })
    }

    /// Resolve `name` inside `group`
    pub fn resolve(&self, group: &str, name: &str) -> PageResult<&Locator> {
        self.group(group)?.resolve(name)
    }

    /// Registered group names, sorted
    #[must_use]
    pub fn group_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.groups.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parse a YAML registry document
    pub fn from_yaml(source: &str) -> PageResult<Self> {
        let doc: RegistryDocument = serde_yaml_ng::from_str(source)?;
        doc.into_registry()
    }

    /// Parse a JSON registry document
    pub fn from_json(source: &str) -> PageResult<Self> {
        let doc: RegistryDocument = serde_json::from_str(source)?;
        doc.into_registry()
    }

    /// Load a registry file; `.json` files are read as JSON, anything else as YAML
    pub fn from_path(path: impl AsRef<Path>) -> PageResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&source)
        } else {
            Self::from_yaml(&source)
        }
    }
}

/// Builder for [`LocatorRegistry`]
#[derive(Debug, Default)]
pub struct LocatorRegistryBuilder {
    groups: Vec<(String, Vec<Locator>)>,
}

impl LocatorRegistryBuilder {
    /// Declare a group with its locators
    #[must_use]
    pub fn group<F>(mut self, name: impl Into<String>, declare: F) -> Self
    where
        F: FnOnce(GroupBuilder) -> GroupBuilder,
    {
        let group = declare(GroupBuilder::default());
        self.groups.push((name.into(), group.locators));
        self
    }

    /// Build the registry, rejecting duplicate names within a group
    pub fn build(self) -> PageResult<LocatorRegistry> {
        let mut groups: HashMap<String, LocatorGroup> = HashMap::new();
        for (name, locators) in self.groups {
            let group = groups
                .entry(name.clone())
                .or_insert_with(|| LocatorGroup::new(name));
            for locator in locators {
                group.insert(locator)?;
            }
        }
        Ok(LocatorRegistry { groups })
    }
}

/// Collects the locators of one group
#[derive(Debug, Default)]
pub struct GroupBuilder {
    locators: Vec<Locator>,
}

impl GroupBuilder {
    /// Add a locator expecting at least one match
    #[must_use]
    pub fn locator(mut self, name: impl Into<String>, selector: Selector) -> Self {
        self.locators.push(Locator::new(name, selector));
        self
    }

    /// Add a list locator with an explicit minimum count
    #[must_use]
    pub fn list(mut self, name: impl Into<String>, selector: Selector, min_count: usize) -> Self {
        self.locators
            .push(Locator::new(name, selector).with_min_count(min_count));
        self
    }
}

// =============================================================================
// REGISTRY DOCUMENTS
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct RegistryDocument {
    groups: BTreeMap<String, Vec<LocatorSpec>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LocatorSpec {
    name: String,
    #[serde(default)]
    css: Option<String>,
    #[serde(default)]
    xpath: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    test_id: Option<String>,
    #[serde(default)]
    min_count: Option<usize>,
}

impl LocatorSpec {
    fn into_locator(self, group: &str) -> PageResult<Locator> {
        let mut selectors = [
            self.css.map(Selector::Css),
            self.xpath.map(Selector::XPath),
            self.text.map(Selector::Text),
            self.test_id.map(Selector::TestId),
        ]
        .into_iter()
        .flatten();

        let selector = match (selectors.next(), selectors.next()) {
            (Some(selector), None) => selector,
            (None, _) => {
                return Err(PageError::Config {
                    message: format!("locator '{group}.{}' declares no selector", self.name),
                })
            }
            (Some(_), Some(_)) => {
                return Err(PageError::Config {
                    message: format!(
                        "locator '{group}.{}' declares more than one selector",
                        self.name
                    ),
                })
            }
        };

        Ok(Locator::new(self.name, selector).with_min_count(self.min_count.unwrap_or(1)))
    }
}

impl RegistryDocument {
    fn into_registry(self) -> PageResult<LocatorRegistry> {
        let mut groups = HashMap::new();
        for (name, specs) in self.groups {
            let mut group = LocatorGroup::new(name.clone());
            for spec in specs {
                group.insert(spec.into_locator(&name)?)?;
            }
            let _ = groups.insert(name, group);
        }
        Ok(LocatorRegistry { groups })
    }
}
