//! PPU (Picture Processing Unit) emulation for the NES.
//!
//! See [PPU](https://www.nesdev.org/wiki/PPU), [PPU registers](https://www.nesdev.org/wiki/PPU_registers),
//! [PPU rendering](https://www.nesdev.org/wiki/PPU_rendering). Handles 341-dot scanlines, 262
//! scanlines per frame, vblank NMI, the per-dot background pipeline, sprite evaluation, OAM,
//! nametables, and palette.

pub mod ppu;
pub mod registers;
