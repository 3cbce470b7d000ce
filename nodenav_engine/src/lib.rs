//! Tree reconstruction, viewport fitting and cursor navigation over the BSP
//! nodes of a loaded map.

pub mod navigator;
pub mod tree;
pub mod viewport;

pub use navigator::{Command, Navigator, NodeView, Outcome};
pub use tree::{build_parent_map, ParentMap, TreeError};
pub use viewport::{Axis, Bounds, Viewport, ViewportError, DEFAULT_MARGIN};
