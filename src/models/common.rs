//! Common types shared across all models.

use serde::{Deserialize, Serialize};

/// External links for a catalog object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExternalUrls {
    /// Link to the object in the Spotify web player.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spotify: Option<String>,
}

/// An offset-paged list as returned by the Web API.
///
/// `total` is informational only: callers detect the last page by a short
/// `items` list, since totals can be stale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,

    /// Total number of items reported by the server.
    #[serde(default)]
    pub total: u32,

    /// Requested page size.
    #[serde(default)]
    pub limit: u32,

    /// Offset of the first item.
    #[serde(default)]
    pub offset: u32,

    /// URL of the next page, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            limit: 0,
            offset: 0,
            next: None,
        }
    }
}

impl<T> Page<T> {
    /// Build a page from a slice of items.
    pub fn new(items: Vec<T>, limit: u32, offset: u32, total: u32) -> Self {
        Self {
            items,
            total,
            limit,
            offset,
            next: None,
        }
    }

    /// True when this page is the last one for a request of `limit` items.
    pub fn is_last(&self, limit: u32) -> bool {
        self.items.len() < limit as usize
    }
}

/// A Spotify user profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// User ID.
    pub id: String,

    /// Display name of the user.
    #[serde(default)]
    pub display_name: Option<String>,
}
