
use std::collections::VecDeque;
use std::io::{self, Write, stdout};
use std::sync::Mutex;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use crate::io::Console;

/// Holds the host terminal in raw mode so keys arrive one at a time, with no
/// echo. Dropping it restores the previous mode, on every exit path.
pub struct RawModeGuard(());

impl RawModeGuard {
    pub fn new() -> io::Result<RawModeGuard> {
        terminal::enable_raw_mode()?;
        Ok(RawModeGuard(()))
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Interactive console over the host terminal's key events.
#[derive(Default)]
pub struct StdConsole {
    // Bytes decoded from events during a poll, not yet consumed by a read.
    pending: Mutex<VecDeque<u8>>,
}

// In raw mode Ctrl-C arrives as an ordinary key, not a signal; surface it as
// an error so the run loop unwinds and the raw-mode guard gets to restore the
// terminal.
fn byte_of(ev: &Event) -> io::Result<Option<u8>> {
    let Event::Key(key) = ev else {
        return Ok(None);
    };
    if key.kind == KeyEventKind::Release {
        return Ok(None);
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('c') {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted"));
        }
        return Ok(None);
    }

    let byte = match key.code {
        KeyCode::Char(c) if c.is_ascii() => Some(c as u8),
        KeyCode::Enter => Some(b'\n'),
        KeyCode::Tab => Some(b'\t'),
        KeyCode::Backspace => Some(0x08),
        KeyCode::Esc => Some(0x1b),
        _ => None,
    };
    Ok(byte)
}

impl Console for StdConsole {
    fn key_available(&self) -> io::Result<bool> {
        let mut pending = self.pending.lock().unwrap();
        while event::poll(Duration::ZERO)? {
            if let Some(byte) = byte_of(&event::read()?)? {
                pending.push_back(byte);
            }
        }
        Ok(!pending.is_empty())
    }

    fn read_byte(&self) -> io::Result<u8> {
        let mut pending = self.pending.lock().unwrap();
        loop {
            if let Some(byte) = pending.pop_front() {
                return Ok(byte);
            }
            if let Some(byte) = byte_of(&event::read()?)? {
                return Ok(byte);
            }
        }
    }

    fn write_byte(&self, val: u8) -> io::Result<()> {
        let mut out = stdout().lock();
        // Raw mode turns off output post-processing; keep newlines working.
        if val == b'\n' {
            out.write_all(b"\r\n")
        } else {
            out.write_all(&[val])
        }
    }

    fn flush(&self) -> io::Result<()> {
        stdout().lock().flush()
    }
}
