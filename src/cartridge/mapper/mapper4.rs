//! Mapper 4 (MMC3): bank switching, switchable mirroring, scanline IRQ.
//!
//! [MMC3](https://www.nesdev.org/wiki/MMC3): Bank select at $8000–$9FFE (even), bank data at
//! $8001–$9FFF (odd). R0/R1 = 2 KiB CHR, R2–R5 = 1 KiB CHR, R6/R7 = 8 KiB PRG. Mirroring at
//! $A000–$BFFE (even). IRQ latch $C000, reload $C001, disable $E000, enable $E001. The PPU clocks
//! the IRQ counter once per rendered scanline.

use crate::cartridge::mapper::{BankLayout, Mirroring, bank_offset, mapper::Mapper};

const PRG_BANK: usize = 0x2000;
const CHR_BANK: usize = 0x0400;

/// MMC3 state: bank registers, the resolved 8 KiB PRG / 1 KiB CHR windows, mirroring, IRQ counter.
pub struct Mapper4 {
    /// Bank select ($8000): bits 0–2 = register index, bit 6 = PRG mode, bit 7 = CHR A12 invert.
    bank_select: u8,
    /// R0–R5 CHR, R6–R7 PRG.
    regs: [u8; 8],
    /// 8 KiB PRG banks at $8000, $A000, $C000, $E000.
    prg: [usize; 4],
    /// 1 KiB CHR banks at PPU $0000, $0400, ... $1C00.
    chr: [usize; 8],
    prg_banks: usize,
    chr_banks: usize,
    mirroring: Mirroring,
    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_pending: bool,
}

impl Mapper4 {
    pub fn new(layout: BankLayout, mirroring: Mirroring) -> Self {
        let mut mapper = Self {
            bank_select: 0,
            regs: [0; 8],
            prg: [0; 4],
            chr: [0; 8],
            prg_banks: layout.prg_banks(PRG_BANK),
            chr_banks: layout.chr_banks(CHR_BANK),
            mirroring,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
        };
        mapper.update_banks();
        mapper
    }

    /// Spread R0–R7 over the CHR and PRG windows according to the two mode bits.
    fn update_banks(&mut self) {
        let r = self.regs.map(|v| v as usize);

        // Bit 7 swaps the 2 KiB pair ($0000) with the four 1 KiB banks ($1000).
        let (pairs, singles) = if self.bank_select & 0x80 != 0 { (4, 0) } else { (0, 4) };
        self.chr[pairs] = r[0] & !1;
        self.chr[pairs + 1] = r[0] | 1;
        self.chr[pairs + 2] = r[1] & !1;
        self.chr[pairs + 3] = r[1] | 1;
        self.chr[singles..singles + 4].copy_from_slice(&r[2..6]);

        // Bit 6 swaps R6 with the fixed second-to-last bank.
        let last = self.prg_banks - 1;
        let second_last = self.prg_banks.saturating_sub(2);
        self.prg = if self.bank_select & 0x40 != 0 {
            [second_last, r[7], r[6], last]
        } else {
            [r[6], r[7], second_last, last]
        };
    }
}

impl Mapper for Mapper4 {
    fn map_prg(&self, addr: u16) -> usize {
        let slot = ((addr >> 13) & 3) as usize;
        bank_offset(self.prg[slot], self.prg_banks, PRG_BANK, addr)
    }

    fn map_chr(&self, addr: u16) -> usize {
        let slot = ((addr >> 10) & 7) as usize;
        bank_offset(self.chr[slot], self.chr_banks, CHR_BANK, addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        let even = addr & 1 == 0;
        match (addr, even) {
            (0x8000..=0x9FFF, true) => {
                self.bank_select = data;
                self.update_banks();
            }
            (0x8000..=0x9FFF, false) => {
                self.regs[(self.bank_select & 7) as usize] = data;
                self.update_banks();
            }
            (0xA000..=0xBFFF, true) => {
                self.mirroring = if data & 1 != 0 {
                    Mirroring::Horizontal
                } else {
                    Mirroring::Vertical
                };
            }
            // PRG RAM protect: accepted, not enforced.
            (0xA000..=0xBFFF, false) => {}
            (0xC000..=0xDFFF, true) => self.irq_latch = data,
            (0xC000..=0xDFFF, false) => {
                self.irq_counter = 0;
                self.irq_reload = true;
            }
            (0xE000..=0xFFFF, true) => {
                self.irq_enabled = false;
                self.irq_pending = false;
            }
            (0xE000..=0xFFFF, false) => self.irq_enabled = true,
            _ => {}
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Reload from the latch when empty (or on request), otherwise count down.
    fn on_scanline(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }

    fn irq_pending(&self) -> bool {
        self.irq_pending
    }
}
