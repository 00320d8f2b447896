//! Terminal input and output behind small traits so the demo loop can be
//! driven by scripted events in tests.

pub mod console;

use std::io;
use std::time::Duration;

use ::crossterm::event::Event;
use ratatui::Frame;

pub trait InputDriver {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool>;
    fn read(&mut self) -> io::Result<Event>;
    fn set_mouse_capture(&mut self, _enabled: bool) -> io::Result<()> {
        Ok(())
    }
}

impl<T: InputDriver + ?Sized> InputDriver for &mut T {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        (**self).poll(timeout)
    }

    fn read(&mut self) -> io::Result<Event> {
        (**self).read()
    }

    fn set_mouse_capture(&mut self, enabled: bool) -> io::Result<()> {
        (**self).set_mouse_capture(enabled)
    }
}

pub trait OutputDriver {
    fn enter(&mut self) -> io::Result<()>;
    fn exit(&mut self) -> io::Result<()>;
    fn draw<F>(&mut self, f: F) -> io::Result<()>
    where
        F: FnOnce(&mut Frame<'_>);
}

/// Replays a fixed list of events, then reports no input.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    events: std::collections::VecDeque<Event>,
}

impl ScriptedInput {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl InputDriver for ScriptedInput {
    fn poll(&mut self, _timeout: Duration) -> io::Result<bool> {
        Ok(!self.events.is_empty())
    }

    fn read(&mut self) -> io::Result<Event> {
        self.events
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn blanket_impl_for_mut_ref_works() {
        let mut script = ScriptedInput::new([Event::Key(KeyEvent::new(
            KeyCode::Char('x'),
            KeyModifiers::NONE,
        ))]);
        let mut driver = &mut script;
        assert!(InputDriver::poll(&mut driver, Duration::from_millis(0)).unwrap());
        let ev = InputDriver::read(&mut driver).unwrap();
        assert!(matches!(ev, Event::Key(k) if k.code == KeyCode::Char('x')));
        assert_eq!(script.remaining(), 0);
        assert!(script.read().is_err());
    }
}
