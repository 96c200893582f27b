//! Terminal event polling

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use std::time::Duration;

use crate::error::{PointsError, Result};

/// Polls crossterm for key presses
pub struct EventHandler {
    /// Timeout for polling events
    timeout: Duration,
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_millis(100),
        }
    }

    /// Next key press, if one arrived within the poll timeout.
    ///
    /// Release and repeat events are dropped so a key acts once per press.
    pub fn next(&self) -> Result<Option<KeyEvent>> {
        let ready = event::poll(self.timeout).map_err(terminal_error)?;
        if !ready {
            return Ok(None);
        }
        match event::read().map_err(terminal_error)? {
            Event::Key(key_event) if key_event.kind == KeyEventKind::Press => Ok(Some(key_event)),
            _ => Ok(None),
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn terminal_error(err: std::io::Error) -> PointsError {
    PointsError::Terminal(err.to_string())
}
