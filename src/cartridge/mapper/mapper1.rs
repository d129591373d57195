//! Mapper 1 (MMC1): bank switching via 5-bit shift register.
//!
//! [MMC1](https://www.nesdev.org/wiki/MMC1): writes to $8000–$9FFF (control), $A000–$BFFF (CHR0),
//! $C000–$DFFF (CHR1), $E000–$FFFF (PRG bank). Any write with bit 7 set resets the shift register.
//! Otherwise, bit 0 is shifted in (LSB first); after 5 writes, the value is latched to the selected
//! register. Control (bits 0–1) = mirroring; bits 2–3 = PRG mode; bit 4 = CHR mode.

use crate::cartridge::mapper::{BankLayout, Mirroring, bank_offset, mapper::Mapper};

const PRG_BANK: usize = 0x4000;
const CHR_BANK: usize = 0x1000;

/// MMC1 state: shift register, the four internal registers, and the banks they resolve to.
pub struct Mapper1 {
    shift_reg: u8,
    shift_count: u8,
    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,
    mirroring: Mirroring,
    /// 16 KiB banks at $8000 and $C000.
    prg: [usize; 2],
    /// 4 KiB banks at PPU $0000 and $1000.
    chr: [usize; 2],
    prg_banks: usize,
    chr_banks: usize,
}

impl Mapper1 {
    /// Control powers up as $0C (PRG mode 3: $8000 switchable, $C000 fixed to the last bank).
    /// Mirroring follows the header until the game first writes the control register.
    pub fn new(layout: BankLayout, mirroring: Mirroring) -> Self {
        let mut mapper = Self {
            shift_reg: 0,
            shift_count: 0,
            control: 0x0C,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
            mirroring,
            prg: [0; 2],
            chr: [0; 2],
            prg_banks: layout.prg_banks(PRG_BANK),
            chr_banks: layout.chr_banks(CHR_BANK),
        };
        mapper.update_banks();
        mapper
    }

    /// PRG bank mode from control bits 2–3: 0/1 = 32 KiB mode; 2 = $8000 fixed first, $C000 switchable; 3 = $8000 switchable, $C000 fixed last.
    fn prg_bank_mode(&self) -> u8 {
        (self.control >> 2) & 0b11
    }

    /// Recompute effective banks from the register file.
    fn update_banks(&mut self) {
        self.chr = if self.control & 0x10 != 0 {
            [self.chr_bank0 as usize, self.chr_bank1 as usize]
        } else {
            let base = (self.chr_bank0 & !1) as usize;
            [base, base | 1]
        };

        let bank = (self.prg_bank & 0x0F) as usize;
        let last = self.prg_banks - 1;
        self.prg = match self.prg_bank_mode() {
            0 | 1 => [bank & !1, bank | 1],
            2 => [0, bank],
            _ => [bank, last],
        };
    }

    fn commit(&mut self, addr: u16, value: u8) {
        match (addr >> 13) & 0b11 {
            0 => {
                self.control = value;
                self.mirroring = match value & 0b11 {
                    0 => Mirroring::SingleScreenLower,
                    1 => Mirroring::SingleScreenUpper,
                    2 => Mirroring::Vertical,
                    _ => Mirroring::Horizontal,
                };
            }
            1 => self.chr_bank0 = value,
            2 => self.chr_bank1 = value,
            _ => self.prg_bank = value,
        }
        self.update_banks();
    }
}

impl Mapper for Mapper1 {
    fn map_prg(&self, addr: u16) -> usize {
        let slot = ((addr >> 14) & 1) as usize;
        bank_offset(self.prg[slot], self.prg_banks, PRG_BANK, addr)
    }

    fn map_chr(&self, addr: u16) -> usize {
        let slot = ((addr >> 12) & 1) as usize;
        bank_offset(self.chr[slot], self.chr_banks, CHR_BANK, addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        // Bit 7 set: reset the shift register and force PRG mode 3.
        if data & 0x80 != 0 {
            self.shift_reg = 0;
            self.shift_count = 0;
            self.control |= 0x0C;
            self.update_banks();
            return;
        }

        self.shift_reg = (self.shift_reg >> 1) | ((data & 1) << 4);
        self.shift_count += 1;

        if self.shift_count == 5 {
            let value = self.shift_reg & 0x1F;
            self.shift_reg = 0;
            self.shift_count = 0;
            self.commit(addr, value);
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Eight 16 KiB PRG banks, 32 KiB of CHR ROM (eight 4 KiB banks).
    fn mmc1() -> Mapper1 {
        Mapper1::new(BankLayout { prg_len: 8 * 0x4000, chr_len: 4 * 0x2000 }, Mirroring::Vertical)
    }

    /// Feed a 5-bit value LSB first, the way games do with five `STA`/`LSR` pairs.
    fn load(m: &mut Mapper1, addr: u16, value: u8) {
        for i in 0..5 {
            m.write(addr, (value >> i) & 1);
        }
    }

    fn prg_bank_at(m: &Mapper1, addr: u16) -> usize {
        m.map_prg(addr) / PRG_BANK
    }

    #[test]
    fn power_on_fixes_last_bank_at_c000() {
        let m = mmc1();
        assert_eq!(prg_bank_at(&m, 0x8000), 0);
        assert_eq!(prg_bank_at(&m, 0xC000), 7);
        assert_eq!(m.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn four_writes_do_not_commit() {
        let mut m = mmc1();
        for _ in 0..4 {
            m.write(0xE000, 1);
        }
        assert_eq!(prg_bank_at(&m, 0x8000), 0);
        m.write(0xE000, 0);
        // $0F wraps into the eight available banks.
        assert_eq!(prg_bank_at(&m, 0x8000), 7);
    }

    #[test]
    fn fixed_first_mode_pins_bank_zero_at_8000() {
        let mut m = mmc1();
        load(&mut m, 0x8000, 0b01000); // PRG mode 2
        load(&mut m, 0xE000, 5);
        assert_eq!(prg_bank_at(&m, 0x8000), 0);
        assert_eq!(prg_bank_at(&m, 0xC000), 5);
    }

    #[test]
    fn thirty_two_k_mode_switches_both_halves() {
        let mut m = mmc1();
        load(&mut m, 0x8000, 0b00000); // PRG mode 0, one-screen lower
        load(&mut m, 0xE000, 0b00010);
        assert_eq!(prg_bank_at(&m, 0x8000), 2);
        assert_eq!(prg_bank_at(&m, 0xC000), 3);
        assert_eq!(m.mirroring(), Mirroring::SingleScreenLower);

        load(&mut m, 0xE000, 0b00101);
        assert_eq!(prg_bank_at(&m, 0x8000), 4);
        assert_eq!(prg_bank_at(&m, 0xC000), 5);
    }

    #[test]
    fn reset_write_restores_fixed_last_mode() {
        let mut m = mmc1();
        load(&mut m, 0x8000, 0b00000);
        m.write(0x8000, 1);
        m.write(0x8000, 0x80);
        assert_eq!(prg_bank_at(&m, 0xC000), 7);
        // The partial write above was discarded.
        load(&mut m, 0xE000, 3);
        assert_eq!(prg_bank_at(&m, 0x8000), 3);
    }

    #[test]
    fn chr_switches_in_4k_or_8k_units() {
        let mut m = mmc1();
        load(&mut m, 0xA000, 3);
        // 8 KiB mode ignores bit 0 of CHR0 and all of CHR1.
        assert_eq!(m.map_chr(0x0000), 2 * CHR_BANK);
        assert_eq!(m.map_chr(0x1000), 3 * CHR_BANK);

        load(&mut m, 0x8000, 0b11111); // 4 KiB CHR, PRG mode 3, horizontal
        load(&mut m, 0xC000, 6);
        assert_eq!(m.map_chr(0x0010), 3 * CHR_BANK + 0x10);
        assert_eq!(m.map_chr(0x1010), 6 * CHR_BANK + 0x10);
        assert_eq!(m.mirroring(), Mirroring::Horizontal);
    }
}
