//! NES cartridge loading and mapper support.
//!
//! - **cartridge**: Parses iNES images, holds PRG/CHR and PRG RAM, routes accesses through the mapper.
//! - **mapper**: NROM (0), MMC1 (1), UxROM (2), CNROM (3), MMC3 (4), AxROM (7); PRG/CHR bank
//!   switching, nametable mirroring, and the MMC3 scanline IRQ.

pub mod cartridge;
pub mod mapper;
