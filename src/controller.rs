//! NES controller input handling.
//!
//! Implements the standard NES controller shift register protocol:
//! write $01 to $4016 to latch current state; then read $4016 repeatedly
//! to get one bit per read (A, B, Select, Start, Up, Down, Left, Right).

use bitflags::bitflags;

bitflags! {
    /// Buttons held on the pad. Bit order is the order the pad shifts them out.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Buttons: u8 {
        const A = 1 << 0;
        const B = 1 << 1;
        const SELECT = 1 << 2;
        const START = 1 << 3;
        const UP = 1 << 4;
        const DOWN = 1 << 5;
        const LEFT = 1 << 6;
        const RIGHT = 1 << 7;
    }
}

/// Represents a single NES controller connected to port 1 ($4016).
#[derive(Debug, Default)]
pub struct Controller {
    /// Buttons held right now, as handed in by the host.
    pub state: Buttons,
    /// Shift register: latched from `state`; shifted out LSB-first on read.
    shift: u8,
    /// $4016 bit 0. While high the shift register keeps reloading.
    strobe: bool,
}

impl Controller {
    /// Create a new controller with no buttons pressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one button state from $4016. Returns bit 0 of the shift register OR'd with open bus ($40).
    /// After all eight buttons have been read, further reads return 1.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            self.shift = self.state.bits();
        }
        let bit = self.shift & 1;
        self.shift = (self.shift >> 1) | 0x80;
        bit | 0x40
    }

    /// What the next `read` would return, without shifting.
    pub fn peek(&self) -> u8 {
        let shift = if self.strobe { self.state.bits() } else { self.shift };
        (shift & 1) | 0x40
    }

    /// Write to $4016. Bit 0 is the strobe; the current state is latched while it is set.
    pub fn write(&mut self, data: u8) {
        self.strobe = data & 1 != 0;
        if self.strobe {
            self.shift = self.state.bits();
        }
    }
}
