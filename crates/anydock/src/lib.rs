#![forbid(unsafe_code)]

//! Binary dock tree.
//!
//! A dock tree arranges tabbed content in a recursive binary layout. Every
//! node is either a [`DockLeaf`] (a tab container) or a [`DockSplit`] dividing
//! its area between exactly two children.
//!
//! - Dropping content on an edge of a leaf splits it; dropping on the centre
//!   or on a tab label re-tabs it ([`DockTree::apply_drop`], [`DragMachine`]).
//! - When a non-root leaf loses its last item, its sibling is promoted into
//!   the parent split's place and the emptied nodes are abandoned.
//! - [`DockTree::begin_batch`] defers that collapse until one commit.
//!
//! The tree holds no view state: the view layer renders from [`DockNode`]s,
//! drains [`DockEvent`]s after each call, and may keep a [`ViewBinding`].
//!
//! ```
//! use anydock::{ContentHandle, DockConfig, DockLayout, DockTree, DropRegion, DropRequest, DropTarget};
//!
//! let layout = DockLayout::tabs(vec![ContentHandle::new(1, "Scene"), ContentHandle::new(2, "Log")]);
//! let mut tree = DockTree::from_layout(layout, DockConfig::default()).unwrap();
//! let root = tree.root();
//! tree.apply_drop(DropRequest {
//!     content: ContentHandle::new(2, "Log"),
//!     target: DropTarget::Panel { node: root, region: DropRegion::Down },
//! })
//! .unwrap();
//! assert!(tree.split(root).is_ok());
//! tree.validate().unwrap();
//! ```

pub mod batch;
pub mod binding;
pub mod config;
pub mod content;
pub mod drag;
pub mod error;
pub mod event;
pub mod layout;
pub mod node;
pub mod snapshot;
pub mod tree;

pub use anydock_core::{PointerPosition, Rect};
pub use batch::DockBatch;
pub use binding::{AllowAll, CloseOutcome, ClosePolicy, CloseRequest, ViewBinding};
pub use config::DockConfig;
pub use content::{ContentHandle, ContentId};
pub use drag::{
    DragDecision, DragMachine, DragPayload, DragRejection, DragSession, DropOutcome, DropRegion,
    DropRequest, DropTarget,
};
pub use error::{DockError, Result};
pub use event::DockEvent;
pub use layout::DockLayoutMap;
pub use node::{
    DividerRatio, DockLeaf, DockNode, DockNodeId, DockNodeKind, DockSplit, Orientation,
    TabStripPlacement, Visibility,
};
pub use snapshot::{
    AbandonedRecord, DOCK_TREE_SCHEMA_VERSION, DockLayout, DockTreeSnapshot, MAX_LAYOUT_DEPTH,
};
pub use tree::{CollapseOutcome, DockTree};
