use std::io;
use std::time::Duration;

use crossterm::event::Event;

use crate::drivers::InputDriver;
use crate::manager::LayoutManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Continue,
    Quit,
}

/// Message pump for a layout front-end.
///
/// Each iteration runs one layout frame (deferred resizes and coalesced
/// events via [`LayoutManager::next_frame`]), repaints, then waits up to the
/// poll interval for input. Queued input is drained before the next frame so
/// a burst of mouse drags lands in one repaint.
pub struct EventLoop<D> {
    driver: D,
    poll_interval: Duration,
}

impl<D: InputDriver> EventLoop<D> {
    pub fn new(driver: D, poll_interval: Duration) -> Self {
        Self {
            driver,
            poll_interval,
        }
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Runs until `handler` returns [`ControlFlow::Quit`] or the driver
    /// fails. Layout errors from a frame are surfaced as `io::Error`.
    pub fn run<R, H>(
        &mut self,
        manager: &mut LayoutManager,
        mut render: R,
        mut handler: H,
    ) -> io::Result<()>
    where
        R: FnMut(&mut LayoutManager) -> io::Result<()>,
        H: FnMut(&mut LayoutManager, Event) -> io::Result<ControlFlow>,
    {
        loop {
            manager.next_frame().map_err(io::Error::other)?;
            render(manager)?;

            let mut timeout = self.poll_interval;
            while self.driver.poll(timeout)? {
                let event = self.driver.read()?;
                if handler(manager, event)? == ControlFlow::Quit {
                    tracing::debug!("event loop quit");
                    return Ok(());
                }
                timeout = Duration::ZERO;
            }
        }
    }
}
