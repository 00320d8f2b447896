//! Popout windows.
//!
//! The layout core does not create windows. It hands a [`PopoutConfig`] to a
//! [`PopoutHost`] and keeps a [`PopoutRecord`] for every window the host
//! accepted, so that `to_config` can list them and `pop_in` can put their
//! content back.

use crate::config::PopoutConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PopoutWindowId(pub u64);

/// Creates and closes the windows popouts live in.
pub trait PopoutHost {
    /// Opens a window for `config`. Returning false reports the window as
    /// blocked.
    fn open(&mut self, window: PopoutWindowId, config: &PopoutConfig) -> bool;

    fn close(&mut self, window: PopoutWindowId);
}

/// A popout the host accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct PopoutRecord {
    pub window: PopoutWindowId,
    pub config: PopoutConfig,
}
