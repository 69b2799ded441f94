use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn parse(value: &str) -> Option<Self> {
                Uuid::parse_str(value).ok().map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a workspace (a tab in the sidebar).
    WorkspaceId
);
uuid_id!(
    /// Identifier of a surface; stable across moves between workspaces.
    SurfaceId
);
uuid_id!(
    /// Identifier of a workspace manager, independent of the window owning it.
    ManagerId
);

/// Leaf region of a workspace's split tree, numbered by the pane-tree service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaneId(pub u64);

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pane:{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitOrientation {
    Horizontal,
    Vertical,
}

/// What a surface renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SurfaceKind {
    Terminal {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cwd: Option<String>,
    },
    Browser {
        url: String,
    },
}

/// A unit of rendered content hosted in a pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub id: SurfaceId,
    pub title: String,
    pub kind: SurfaceKind,
}

impl Surface {
    pub fn terminal(cwd: Option<&str>) -> Self {
        Self {
            id: SurfaceId::new(),
            title: "Terminal".to_string(),
            kind: SurfaceKind::Terminal {
                cwd: cwd.map(str::to_string),
            },
        }
    }

    pub fn browser(url: &str) -> Self {
        Self {
            id: SurfaceId::new(),
            title: url.to_string(),
            kind: SurfaceKind::Browser {
                url: url.to_string(),
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, SurfaceKind::Terminal { .. })
    }
}

/// Transferable pane item produced by detaching a surface from a pane tree.
///
/// Consumed by `attach`; a failed attach hands it back so the caller can
/// roll the item back into its origin.
#[derive(Debug, PartialEq, Eq)]
pub struct TransferHandle {
    item: SurfaceId,
    title: String,
}

impl TransferHandle {
    pub fn new(item: SurfaceId, title: impl Into<String>) -> Self {
        Self {
            item,
            title: title.into(),
        }
    }

    pub fn item(&self) -> SurfaceId {
        self.item
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}
