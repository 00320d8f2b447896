//! Shared crate-wide constants.

/// Width of the highlight shown when a tab is dragged over a header that
/// has no tabs yet.
pub const EMPTY_HEADER_HIGHLIGHT_WIDTH: f64 = 100.0;

/// Fraction of a stack's width, measured from either side, that selects the
/// left or right drop segment.
pub const SIDE_SEGMENT_FRACTION: f64 = 0.25;

/// Id attached to the currently maximised item so it survives a
/// `to_config` round trip.
pub const MAXIMISED_ITEM_ID: &str = "__glMaximised";

/// Percentage assigned to children that declare no size when the declared
/// sizes of their siblings already exceed 100.
pub const OVERFLOW_DEFAULT_PERCENT: f64 = 50.0;

/// Default size of a popout window created from a config rather than from
/// a live item.
pub const DEFAULT_POPOUT_WIDTH: f64 = 500.0;
pub const DEFAULT_POPOUT_HEIGHT: f64 = 309.0;
