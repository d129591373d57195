//! Mapper 2 (UxROM): switchable 16 KiB PRG bank at $8000, last bank fixed at $C000.
//!
//! [UxROM](https://www.nesdev.org/wiki/UxROM): any write to $8000–$FFFF selects the low bank.
//! CHR is a single 8 KiB bank, almost always RAM.

use crate::cartridge::mapper::{BankLayout, Mirroring, bank_offset, mapper::Mapper};

const PRG_BANK: usize = 0x4000;

pub struct Mapper2 {
    prg_bank: usize,
    prg_banks: usize,
    mirroring: Mirroring,
}

impl Mapper2 {
    pub fn new(layout: BankLayout, mirroring: Mirroring) -> Self {
        Self {
            prg_bank: 0,
            prg_banks: layout.prg_banks(PRG_BANK),
            mirroring,
        }
    }
}

impl Mapper for Mapper2 {
    fn map_prg(&self, addr: u16) -> usize {
        let bank = if addr < 0xC000 {
            self.prg_bank
        } else {
            self.prg_banks - 1
        };
        bank_offset(bank, self.prg_banks, PRG_BANK, addr)
    }

    fn map_chr(&self, addr: u16) -> usize {
        addr as usize & 0x1FFF
    }

    fn write(&mut self, _addr: u16, data: u8) {
        self.prg_bank = (data & 0x1F) as usize;
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
