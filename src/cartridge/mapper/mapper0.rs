//! Mapper 0 (NROM): no bank switching, 16/32KB PRG, 8KB CHR.

use crate::cartridge::mapper::{BankLayout, Mirroring, mapper::Mapper};

/// NROM mapper: fixed PRG and CHR, 16KB PRG mirrored into $C000.
pub struct Mapper0 {
    prg_len: usize,
    mirroring: Mirroring,
}

impl Mapper0 {
    /// Mirroring is wired on the board (solder pads), so it comes straight from the header.
    pub fn new(layout: BankLayout, mirroring: Mirroring) -> Self {
        Self {
            prg_len: layout.prg_len.max(1),
            mirroring,
        }
    }
}

impl Mapper for Mapper0 {
    fn map_prg(&self, addr: u16) -> usize {
        (addr as usize - 0x8000) % self.prg_len
    }

    fn map_chr(&self, addr: u16) -> usize {
        addr as usize & 0x1FFF
    }

    fn write(&mut self, _addr: u16, _data: u8) {}

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
