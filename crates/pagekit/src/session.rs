//! Session boundary: the capabilities a browser driver must offer.
//!
//! Page models never talk to a concrete automation library. Any driver
//! (CDP, WebDriver, an in-memory fake) is adapted to [`Session`] and injected.
//!
//! ```text
//! ┌──────────────┐   find / click / text   ┌───────────────────────┐
//! │ Waiter       │ ──────────────────────► │ Session (trait)       │
//! │ Executor     │                         │  ├─ CDP adapter       │
//! └──────────────┘                         │  ├─ WebDriver adapter │
//!                                          │  └─ FakeSession       │
//!                                          └───────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locator::Selector;

/// Bounding box of a rendered element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the box has nonzero geometry
    #[must_use]
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Reference to a live DOM node.
///
/// Valid only for the interaction step that resolved it. Deliberately not
/// `Clone`: a re-render may detach the node at any time, so handles are
/// re-resolved for every step instead of being stored.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned node identifier
    pub id: String,
    /// Element tag name
    pub tag_name: String,
    /// Bounding box if the driver reported one
    pub bounding_box: Option<BoundingBox>,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            bounding_box: None,
        }
    }

    /// Attach geometry
    #[must_use]
    pub const fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }
}

/// Failure reported by a driver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The handle's node is no longer attached to the DOM
    #[error("stale element reference")]
    Stale,
    /// The node is present but cannot receive the interaction
    #[error("element not interactable: {reason}")]
    Blocked {
        /// Covered, disabled, zero-size, ...
        reason: String,
    },
    /// Anything else (connection lost, protocol error, ...)
    #[error("{message}")]
    Other {
        /// Driver message
        message: String,
    },
}

impl DriverError {
    /// Create a blocked error
    #[must_use]
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self::Blocked {
            reason: reason.into(),
        }
    }

    /// Create a generic driver error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Result type for driver calls
pub type DriverResult<T> = Result<T, DriverError>;

/// A live browser-automation connection.
///
/// Commands on one session are issued sequentially; the connection behind it
/// is not expected to handle concurrent commands. Independent sessions may run
/// in parallel.
#[async_trait]
pub trait Session: Send + Sync {
    /// All elements matching `selector`, in document order
    async fn find_elements(&self, selector: &Selector) -> DriverResult<Vec<ElementHandle>>;

    /// All descendants of `parent` matching `selector`, in document order
    async fn find_elements_within(
        &self,
        parent: &ElementHandle,
        selector: &Selector,
    ) -> DriverResult<Vec<ElementHandle>>;

    /// Whether the element is rendered with nonzero geometry
    async fn is_visible(&self, handle: &ElementHandle) -> DriverResult<bool>;

    /// Click the element
    async fn click(&self, handle: &ElementHandle) -> DriverResult<()>;

    /// Visible text of the element
    async fn get_text(&self, handle: &ElementHandle) -> DriverResult<String>;

    /// Type text into the element
    async fn type_text(&self, handle: &ElementHandle, text: &str) -> DriverResult<()>;

    /// Go back in history
    async fn navigate_back(&self) -> DriverResult<()>;

    /// Load `url` as a fresh document
    async fn goto(&self, url: &str) -> DriverResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_area() {
        assert!(BoundingBox::new(0.0, 0.0, 10.0, 5.0).has_area());
        assert!(!BoundingBox::new(0.0, 0.0, 0.0, 5.0).has_area());
        assert!(!BoundingBox::new(3.0, 3.0, 10.0, 0.0).has_area());
    }

    #[test]
    fn test_element_handle_builder() {
        let handle = ElementHandle::new("card-1", "article")
            .with_bounding_box(BoundingBox::new(0.0, 0.0, 100.0, 40.0));
        assert_eq!(handle.id, "card-1");
        assert_eq!(handle.tag_name, "article");
        assert!(handle.bounding_box.is_some());
    }

    #[test]
    fn test_driver_error_display() {
        assert_eq!(DriverError::Stale.to_string(), "stale element reference");
        assert_eq!(
            DriverError::blocked("covered by overlay").to_string(),
            "element not interactable: covered by overlay"
        );
        assert_eq!(DriverError::other("socket closed").to_string(), "socket closed");
    }
}
