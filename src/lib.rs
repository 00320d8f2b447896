//! Docking layouts for terminal applications.
//!
//! A layout is a tree of rows, columns and tabbed stacks with components at
//! the leaves. [`LayoutManager`] builds the tree from a [`LayoutConfig`],
//! sizes it inside a container, and moves items around in response to
//! splitter drags and tab drag-and-drop. The current arrangement can be
//! written back out with [`LayoutManager::to_config`].

pub mod config;
pub mod constants;
pub mod controls;
pub mod drivers;
pub mod error;
pub mod event_loop;
pub mod events;
pub mod geometry;
pub mod items;
pub mod manager;
pub mod pointer;
pub mod popout;
pub mod render;
pub mod theme;
pub mod tracing_sub;

pub use config::{ItemConfig, LayoutConfig};
pub use error::{ConfigurationError, LayoutError, Result};
pub use events::{EventKind, LayoutEvent};
pub use geometry::Rect;
pub use items::{ComponentRegistry, ItemContainer, LayoutTree, NodeId, Panel};
pub use manager::LayoutManager;
pub use pointer::PointerState;
pub use popout::{PopoutHost, PopoutWindowId};
