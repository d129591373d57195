//! Mapper 3 (CNROM): fixed PRG, switchable 8 KiB CHR bank.
//!
//! [CNROM](https://www.nesdev.org/wiki/CNROM): bits 0–1 of any write to $8000–$FFFF select the
//! CHR bank. PRG is 16 or 32 KiB and never switches.

use crate::cartridge::mapper::{BankLayout, Mirroring, bank_offset, mapper::Mapper};

const CHR_BANK: usize = 0x2000;

pub struct Mapper3 {
    chr_bank: usize,
    chr_banks: usize,
    prg_len: usize,
    mirroring: Mirroring,
}

impl Mapper3 {
    pub fn new(layout: BankLayout, mirroring: Mirroring) -> Self {
        Self {
            chr_bank: 0,
            chr_banks: layout.chr_banks(CHR_BANK),
            prg_len: layout.prg_len.max(1),
            mirroring,
        }
    }
}

impl Mapper for Mapper3 {
    fn map_prg(&self, addr: u16) -> usize {
        (addr as usize - 0x8000) % self.prg_len
    }

    fn map_chr(&self, addr: u16) -> usize {
        bank_offset(self.chr_bank, self.chr_banks, CHR_BANK, addr)
    }

    fn write(&mut self, _addr: u16, data: u8) {
        self.chr_bank = (data & 0x03) as usize;
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_selects_chr_bank() {
        let mut m = Mapper3::new(
            BankLayout { prg_len: 0x8000, chr_len: 4 * 0x2000 },
            Mirroring::Horizontal,
        );
        m.write(0x8000, 0xF2);
        assert_eq!(m.map_chr(0x0000), 2 * CHR_BANK);
        assert_eq!(m.map_chr(0x1FFF), 3 * CHR_BANK - 1);
        assert_eq!(m.map_prg(0xC000), 0x4000);
    }
}
