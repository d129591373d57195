//! NES mappers for PRG/CHR memory mapping.
//!
//! Each supported board lives in its own `mapperN` module and implements [`mapper::Mapper`].
//! [`Board`] is the closed set of boards the cartridge loader can pick from; the choice is made
//! once from the iNES header and never changes while the emulator runs.

pub mod mapper;

pub mod mapper0;
pub mod mapper1;
pub mod mapper2;
pub mod mapper3;
pub mod mapper4;
pub mod mapper7;

use crate::cartridge::cartridge::CartridgeError;
use crate::cartridge::mapper::mapper::Mapper;
use crate::cartridge::mapper::{
    mapper0::Mapper0, mapper1::Mapper1, mapper2::Mapper2, mapper3::Mapper3, mapper4::Mapper4,
    mapper7::Mapper7,
};

/// Nametable mirroring mode for PPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    SingleScreenLower,
    SingleScreenUpper,
}

impl Mirroring {
    /// Map a PPU nametable address ($2000–$3EFF) to an offset into the 2 KiB of console VRAM.
    ///
    /// $3000–$3EFF repeats $2000–$2EFF. The four logical 1 KiB tables (0 = $2000, 1 = $2400,
    /// 2 = $2800, 3 = $2C00) land on physical page 0 or 1:
    ///
    /// | mode       | 0 | 1 | 2 | 3 |
    /// |------------|---|---|---|---|
    /// | horizontal | 0 | 0 | 1 | 1 |
    /// | vertical   | 0 | 1 | 0 | 1 |
    /// | one-screen | n | n | n | n |
    pub fn nametable_offset(self, addr: u16) -> usize {
        let addr = (addr & 0x0FFF) as usize;
        let table = addr >> 10;
        let offset = addr & 0x03FF;
        let page = match self {
            Mirroring::Horizontal => table >> 1,
            Mirroring::Vertical => table & 1,
            Mirroring::SingleScreenLower => 0,
            Mirroring::SingleScreenUpper => 1,
        };
        page * 0x400 + offset
    }
}

/// PRG/CHR sizes a board needs to know to keep its bank numbers in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankLayout {
    /// PRG ROM length in bytes (a multiple of 16 KiB).
    pub prg_len: usize,
    /// CHR ROM or RAM length in bytes (a multiple of 8 KiB).
    pub chr_len: usize,
}

impl BankLayout {
    /// Number of `size`-byte PRG banks, never zero.
    pub fn prg_banks(&self, size: usize) -> usize {
        (self.prg_len / size).max(1)
    }

    /// Number of `size`-byte CHR banks, never zero.
    pub fn chr_banks(&self, size: usize) -> usize {
        (self.chr_len / size).max(1)
    }
}

/// Byte offset of `addr` inside bank `bank` of `size` bytes, wrapping the bank number into range.
pub(crate) fn bank_offset(bank: usize, bank_count: usize, size: usize, addr: u16) -> usize {
    (bank % bank_count) * size + (addr as usize & (size - 1))
}

/// The cartridge circuit, picked once at load time from the iNES mapper number.
pub enum Board {
    Nrom(Mapper0),
    Sxrom(Mapper1),
    Uxrom(Mapper2),
    Cnrom(Mapper3),
    Txrom(Mapper4),
    Axrom(Mapper7),
}

macro_rules! dispatch {
    ($board:expr, $m:ident => $call:expr) => {
        match $board {
            Board::Nrom($m) => $call,
            Board::Sxrom($m) => $call,
            Board::Uxrom($m) => $call,
            Board::Cnrom($m) => $call,
            Board::Txrom($m) => $call,
            Board::Axrom($m) => $call,
        }
    };
}

impl Board {
    /// Build the board for iNES mapper `id`. Fails with `UnsupportedMapper` for anything else.
    pub fn new(id: u8, layout: BankLayout, mirroring: Mirroring) -> Result<Self, CartridgeError> {
        let board = match id {
            0 => Board::Nrom(Mapper0::new(layout, mirroring)),
            1 => Board::Sxrom(Mapper1::new(layout, mirroring)),
            2 => Board::Uxrom(Mapper2::new(layout, mirroring)),
            3 => Board::Cnrom(Mapper3::new(layout, mirroring)),
            4 => Board::Txrom(Mapper4::new(layout, mirroring)),
            7 => Board::Axrom(Mapper7::new(layout)),
            _ => return Err(CartridgeError::UnsupportedMapper(id)),
        };
        Ok(board)
    }

    /// Board family name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Board::Nrom(_) => "NROM",
            Board::Sxrom(_) => "SxROM (MMC1)",
            Board::Uxrom(_) => "UxROM",
            Board::Cnrom(_) => "CNROM",
            Board::Txrom(_) => "TxROM (MMC3)",
            Board::Axrom(_) => "AxROM",
        }
    }
}

impl Mapper for Board {
    fn map_prg(&self, addr: u16) -> usize {
        dispatch!(self, m => m.map_prg(addr))
    }

    fn map_chr(&self, addr: u16) -> usize {
        dispatch!(self, m => m.map_chr(addr))
    }

    fn write(&mut self, addr: u16, data: u8) {
        dispatch!(self, m => m.write(addr, data))
    }

    fn mirroring(&self) -> Mirroring {
        dispatch!(self, m => m.mirroring())
    }

    fn on_scanline(&mut self) {
        dispatch!(self, m => m.on_scanline())
    }

    fn irq_pending(&self) -> bool {
        dispatch!(self, m => m.irq_pending())
    }
}
