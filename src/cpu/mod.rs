//! 6502 CPU emulation for the NES.
//!
//! Official instruction set plus the stable unofficial opcodes; JAM opcodes halt the core.
//! Memory and interrupt lines are reached through the [`Bus`](crate::bus::Bus) trait.

pub mod cpu;
pub mod flags;
