//! Mapper trait: PRG/CHR bank translation, register writes, and mirroring.

use crate::cartridge::mapper::Mirroring;

/// Trait for NES cartridge mappers. The cartridge owns the ROM/RAM bytes; a mapper only turns a
/// CPU or PPU address into an offset into them, using whatever banks are currently selected.
pub trait Mapper {
    /// Offset into PRG ROM for a CPU address in $8000–$FFFF.
    fn map_prg(&self, addr: u16) -> usize;
    /// Offset into CHR ROM/RAM for a PPU address in $0000–$1FFF.
    fn map_chr(&self, addr: u16) -> usize;
    /// CPU write into $8000–$FFFF: updates bank registers, never the ROM itself.
    fn write(&mut self, addr: u16, data: u8);
    /// Current nametable mirroring for the PPU.
    fn mirroring(&self) -> Mirroring;
    /// One scanline has elapsed with rendering enabled.
    fn on_scanline(&mut self) {}
    /// Whether the board is holding the CPU IRQ line low.
    fn irq_pending(&self) -> bool {
        false
    }
}
