//! Content handles hosted in dock leaves.
//!
//! The tree stores handles by value but never owns the content they name:
//! creation and destruction belong to the embedding application. Handles are
//! immutable snapshots; identity is the [`ContentId`] alone.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Application-chosen identity of one piece of dockable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(u64);

impl ContentId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "content:{}", self.0)
    }
}

/// Display snapshot and drag/close flags for one content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentHandle {
    pub id: ContentId,
    pub label: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default = "default_true")]
    pub allow_drag: bool,
    #[serde(default = "default_true")]
    pub can_close: bool,
}

fn default_true() -> bool {
    true
}

impl ContentHandle {
    /// Draggable, closable handle with no icon.
    #[must_use]
    pub fn new(id: u64, label: impl Into<String>) -> Self {
        Self {
            id: ContentId(id),
            label: label.into(),
            icon: None,
            allow_drag: true,
            can_close: true,
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn allow_drag(mut self, allow: bool) -> Self {
        self.allow_drag = allow;
        self
    }

    #[must_use]
    pub fn can_close(mut self, allow: bool) -> Self {
        self.can_close = allow;
        self
    }
}

impl PartialEq for ContentHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ContentHandle {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_ignores_label() {
        let a = ContentHandle::new(1, "Scene");
        let b = ContentHandle::new(1, "Renamed").allow_drag(false);
        assert_eq!(a, b);
        assert_ne!(a, ContentHandle::new(2, "Scene"));
    }

    #[test]
    fn flags_default_to_true_when_missing() {
        let handle: ContentHandle =
            serde_json::from_str(r#"{"id": 4, "label": "Log"}"#).expect("valid handle json");
        assert!(handle.allow_drag);
        assert!(handle.can_close);
        assert_eq!(handle.icon, None);
        assert_eq!(handle.id, ContentId::new(4));
    }
}
