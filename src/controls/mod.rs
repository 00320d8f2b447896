pub mod drag_proxy;
pub mod header;
pub mod splitter;

pub use drag_proxy::{
    AreaRegistry, DragProxy, DropOutcome, DropSegment, DropZone, StackDrop,
};
pub use header::{Header, HeaderControl, HeaderDrop, Tab};
pub use splitter::{Splitter, SplitterDrag};
