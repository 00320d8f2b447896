//! Error types for building and mutating a layout.

use std::path::PathBuf;

use thiserror::Error;

use crate::items::NodeId;

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Problems with a layout description, raised before any node is touched.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("missing parameter 'type'")]
    MissingType,
    #[error("unknown type '{found}'. Valid types are {}", valid.join(", "))]
    UnknownType {
        found: String,
        valid: &'static [&'static str],
    },
    #[error("missing setting 'content' on top level of configuration")]
    MissingContent,
    #[error("configuration parameter 'content' must be an array")]
    ContentNotArray,
    #[error("top level content can't contain more than one element")]
    TooManyTopLevelItems,
    #[error("unknown component '{0}' and no fallback component registered")]
    UnknownComponent(String),
    #[error("invalid layout json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read layout from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("unknown content item {0:?}")]
    UnknownContentItem(NodeId),
    #[error("content item {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("root node can only have a single child")]
    RootOccupied,
    #[error("id '{0}' not found")]
    IdNotFound(String),
    #[error("content item {0:?} is not controlled by this header")]
    TabNotFound(NodeId),
    #[error("configured activeItemIndex {index} out of bounds ({len} items)")]
    ActiveItemIndexOutOfBounds { index: usize, len: usize },
    #[error("splitter {index} does not exist on {owner:?}")]
    SplitterNotFound { owner: NodeId, index: usize },
    #[error("content item {0:?} already has a parent")]
    AlreadyAttached(NodeId),
    #[error("content item {0:?} is a leaf and has no children")]
    LeafHasNoChildren(NodeId),
    #[error("operation expects a {expected} but {node:?} is a {found}")]
    WrongItemType {
        node: NodeId,
        expected: &'static str,
        found: &'static str,
    },
    #[error("selection is disabled in the layout settings")]
    SelectionDisabled,
    #[error("popout window was blocked by the host")]
    PopoutBlocked,
    #[error("popout window {0} is not open")]
    PopoutNotFound(u64),
    #[error("no popout host is registered")]
    NoPopoutHost,
    #[error("a drag is already in progress")]
    DragInProgress,
    #[error("the layout manager has not been initialised")]
    NotInitialised,
}
