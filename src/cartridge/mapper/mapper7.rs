//! Mapper 7 (AxROM): 32 KiB PRG switching and single-screen mirroring.
//!
//! [AxROM](https://www.nesdev.org/wiki/AxROM): bits 0–2 of a write to $8000–$FFFF select the
//! 32 KiB PRG bank, bit 4 selects which 1 KiB VRAM page backs all four nametables.

use crate::cartridge::mapper::{BankLayout, Mirroring, bank_offset, mapper::Mapper};

const PRG_BANK: usize = 0x8000;

pub struct Mapper7 {
    prg_bank: usize,
    prg_banks: usize,
    /// A 16 KiB image repeats inside the 32 KiB window.
    prg_len: usize,
    mirroring: Mirroring,
}

impl Mapper7 {
    pub fn new(layout: BankLayout) -> Self {
        Self {
            prg_bank: 0,
            prg_banks: layout.prg_banks(PRG_BANK),
            prg_len: layout.prg_len.max(1),
            mirroring: Mirroring::SingleScreenLower,
        }
    }
}

impl Mapper for Mapper7 {
    fn map_prg(&self, addr: u16) -> usize {
        bank_offset(self.prg_bank, self.prg_banks, PRG_BANK, addr) % self.prg_len
    }

    fn map_chr(&self, addr: u16) -> usize {
        addr as usize & 0x1FFF
    }

    fn write(&mut self, _addr: u16, data: u8) {
        self.prg_bank = (data & 0x07) as usize;
        self.mirroring = if data & 0x10 != 0 {
            Mirroring::SingleScreenUpper
        } else {
            Mirroring::SingleScreenLower
        };
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
