use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

use crate::io::Console;

/// In-memory console: tests push input and drain output.
#[derive(Default)]
pub struct PipeConsole {
    in_buf: Mutex<VecDeque<u8>>,
    out_buf: Mutex<VecDeque<u8>>,
}

impl PipeConsole {
    pub fn push_input(&self, val: u8) {
        self.in_buf.lock().unwrap().push_back(val);
    }

    pub fn write_input(&self, vals: &[u8]) {
        for val in vals.iter() {
            self.push_input(*val);
        }
    }

    pub fn take_output(&self) -> VecDeque<u8> {
        std::mem::take(&mut self.out_buf.lock().unwrap())
    }

    pub fn is_out_empty(&self) -> bool {
        self.out_buf.lock().unwrap().is_empty()
    }
}

impl Console for PipeConsole {
    fn key_available(&self) -> io::Result<bool> {
        Ok(!self.in_buf.lock().unwrap().is_empty())
    }

    fn read_byte(&self) -> io::Result<u8> {
        // A real keyboard would block here; an exhausted pipe can only fail.
        self.in_buf.lock().unwrap().pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "pipe console input exhausted")
        })
    }

    fn write_byte(&self, val: u8) -> io::Result<()> {
        self.out_buf.lock().unwrap().push_back(val);
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}
