//! NES cartridge loading from iNES images.
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte header (magic "NES\x1A",
//! PRG size in 16 KiB units, CHR size in 8 KiB units, flags 6–7 for mapper, etc.), an optional
//! 512-byte trainer, then PRG ROM, then CHR ROM. CHR is RAM when the header declares no CHR ROM.
//! The [Mapper](https://www.nesdev.org/wiki/Mapper) turns CPU PRG ($8000–$FFFF) and PPU CHR
//! ($0000–$1FFF) addresses into offsets into the data held here.

use std::error::Error;
use std::fmt;

use crate::cartridge::mapper::mapper::Mapper;
use crate::cartridge::mapper::{BankLayout, Board, Mirroring};

pub const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const MAGIC: [u8; 4] = *b"NES\x1A";
const PRG_UNIT: usize = 16 * 1024;
const CHR_UNIT: usize = 8 * 1024;
const PRG_RAM_LEN: usize = 8 * 1024;

/// Why a cartridge image was rejected. Only returned at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartridgeError {
    /// Too short, wrong signature, or the header promises more data than the image holds.
    InvalidImage(&'static str),
    /// The iNES mapper number is not one of the boards this emulator implements.
    UnsupportedMapper(u8),
}

impl fmt::Display for CartridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartridgeError::InvalidImage(reason) => write!(f, "invalid cartridge image: {reason}"),
            CartridgeError::UnsupportedMapper(id) => write!(f, "unsupported mapper {id}"),
        }
    }
}

impl Error for CartridgeError {}

/// Fields decoded from the 16-byte iNES header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// PRG ROM size in 16 KiB units.
    pub prg_banks: u8,
    /// CHR ROM size in 8 KiB units; 0 means the board carries 8 KiB of CHR RAM.
    pub chr_banks: u8,
    pub mapper_id: u8,
    /// Byte 6 bit 0: 0 = horizontal, 1 = vertical (board solder pads).
    pub mirroring: Mirroring,
    pub has_battery: bool,
    pub has_trainer: bool,
    pub four_screen: bool,
    pub nes2: bool,
}

impl Header {
    pub fn parse(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_LEN {
            return Err(CartridgeError::InvalidImage("shorter than the 16-byte header"));
        }
        if data[0..4] != MAGIC {
            return Err(CartridgeError::InvalidImage("missing NES\\x1A signature"));
        }

        let flags6 = data[6];
        let flags7 = data[7];
        let nes2 = flags7 & 0x0C == 0x08;
        // Old dumps often carry junk ("DiskDude!") in bytes 7–15; byte 7 is then meaningless.
        let dirty = !nes2 && data[12..16].iter().any(|&b| b != 0);
        let mapper_hi = if dirty { 0 } else { flags7 & 0xF0 };

        Ok(Self {
            prg_banks: data[4],
            chr_banks: data[5],
            mapper_id: mapper_hi | (flags6 >> 4),
            mirroring: if flags6 & 1 != 0 {
                Mirroring::Vertical
            } else {
                Mirroring::Horizontal
            },
            has_battery: flags6 & 0x02 != 0,
            has_trainer: flags6 & 0x04 != 0,
            four_screen: flags6 & 0x08 != 0,
            nes2,
        })
    }
}

/// Cartridge: PRG ROM, CHR ROM or RAM, 8 KiB PRG RAM, and the board that maps them.
pub struct Cartridge {
    pub header: Header,
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: Vec<u8>,
    pub mapper: Board,
}

impl Cartridge {
    /// Parse an iNES image. Fails with `InvalidImage` or `UnsupportedMapper`; never panics.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        let header = Header::parse(data)?;
        if header.prg_banks == 0 {
            return Err(CartridgeError::InvalidImage("header declares no PRG ROM"));
        }

        let prg_start = HEADER_LEN + if header.has_trainer { TRAINER_LEN } else { 0 };
        let prg_end = prg_start + header.prg_banks as usize * PRG_UNIT;
        let chr_end = prg_end + header.chr_banks as usize * CHR_UNIT;
        if data.len() < chr_end {
            return Err(CartridgeError::InvalidImage("image shorter than its PRG/CHR sizes"));
        }

        let prg_rom = data[prg_start..prg_end].to_vec();
        let chr_is_ram = header.chr_banks == 0;
        let chr = if chr_is_ram {
            vec![0; CHR_UNIT]
        } else {
            data[prg_end..chr_end].to_vec()
        };

        let layout = BankLayout {
            prg_len: prg_rom.len(),
            chr_len: chr.len(),
        };
        let mapper = Board::new(header.mapper_id, layout, header.mirroring)?;

        crate::info!(
            "cartridge: mapper {} ({}), PRG {} KiB, CHR {} KiB {}, {:?} mirroring{}",
            header.mapper_id,
            mapper.name(),
            prg_rom.len() / 1024,
            chr.len() / 1024,
            if chr_is_ram { "RAM" } else { "ROM" },
            header.mirroring,
            if header.has_battery { ", battery-backed RAM" } else { "" },
        );
        if header.has_trainer {
            crate::warn!("cartridge: skipping 512-byte trainer");
        }
        if header.four_screen {
            crate::warn!("cartridge: four-screen VRAM not supported, using header mirroring");
        }
        if header.nes2 {
            crate::warn!("cartridge: NES 2.0 header read as plain iNES");
        }

        Ok(Self {
            header,
            prg_rom,
            chr,
            chr_is_ram,
            prg_ram: vec![0; PRG_RAM_LEN],
            mapper,
        })
    }

    /// CPU read from PRG ROM ($8000–$FFFF) through the current banks.
    pub fn read_prg(&self, addr: u16) -> u8 {
        self.prg_rom[self.mapper.map_prg(addr)]
    }

    /// CPU write into $8000–$FFFF: goes to the mapper registers, PRG ROM is read-only.
    pub fn write_register(&mut self, addr: u16, data: u8) {
        self.mapper.write(addr, data);
    }

    /// PRG RAM at $6000–$7FFF.
    pub fn read_prg_ram(&self, addr: u16) -> u8 {
        self.prg_ram[addr as usize & (PRG_RAM_LEN - 1)]
    }

    pub fn write_prg_ram(&mut self, addr: u16, data: u8) {
        self.prg_ram[addr as usize & (PRG_RAM_LEN - 1)] = data;
    }

    /// PPU read from the pattern tables ($0000–$1FFF).
    pub fn read_chr(&self, addr: u16) -> u8 {
        self.chr[self.mapper.map_chr(addr)]
    }

    /// PPU write to the pattern tables; dropped unless the board has CHR RAM.
    pub fn write_chr(&mut self, addr: u16, data: u8) {
        if self.chr_is_ram {
            let offset = self.mapper.map_chr(addr);
            self.chr[offset] = data;
        }
    }

    pub fn chr_is_ram(&self) -> bool {
        self.chr_is_ram
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring()
    }

    /// Clock the board's scanline counter (MMC3).
    pub fn on_scanline(&mut self) {
        self.mapper.on_scanline();
    }

    /// Whether the board is asserting IRQ.
    pub fn irq_pending(&self) -> bool {
        self.mapper.irq_pending()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build an iNES image whose PRG bytes encode their bank number and CHR bytes their 1 KiB index.
    pub(crate) fn image(mapper: u8, prg_banks: u8, chr_banks: u8, flags6_low: u8) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data[0..4].copy_from_slice(&MAGIC);
        data[4] = prg_banks;
        data[5] = chr_banks;
        data[6] = (mapper << 4) | (flags6_low & 0x0F);
        data[7] = mapper & 0xF0;
        for bank in 0..prg_banks as usize * 2 {
            data.extend(std::iter::repeat_n(bank as u8, 0x2000));
        }
        for kib in 0..chr_banks as usize * 8 {
            data.extend(std::iter::repeat_n(0x80 | kib as u8, 0x400));
        }
        data
    }

    #[test]
    fn parses_header_fields() {
        let cart = Cartridge::from_bytes(&image(1, 2, 1, 0x03)).unwrap();
        assert_eq!(cart.header.prg_banks, 2);
        assert_eq!(cart.header.chr_banks, 1);
        assert_eq!(cart.header.mapper_id, 1);
        assert_eq!(cart.header.mirroring, Mirroring::Vertical);
        assert!(cart.header.has_battery);
        assert!(!cart.chr_is_ram());
    }

    #[test]
    fn mapper_number_uses_both_nibbles() {
        let mut data = image(0, 1, 1, 0);
        data[6] = 0x20;
        data[7] = 0x40;
        let header = Header::parse(&data).unwrap();
        assert_eq!(header.mapper_id, 0x42);
    }

    #[test]
    fn dirty_byte_seven_is_ignored() {
        let mut data = image(4, 2, 1, 0);
        data[7] = 0x40;
        data[12..16].copy_from_slice(b"ude!");
        let header = Header::parse(&data).unwrap();
        assert_eq!(header.mapper_id, 4);
    }

    #[test]
    fn rejects_short_buffer_and_bad_magic() {
        assert!(matches!(
            Cartridge::from_bytes(&[0x4E, 0x45, 0x53]),
            Err(CartridgeError::InvalidImage(_))
        ));

        let mut data = image(0, 1, 1, 0);
        data[3] = 0;
        assert!(matches!(
            Cartridge::from_bytes(&data),
            Err(CartridgeError::InvalidImage(_))
        ));
    }

    #[test]
    fn rejects_truncated_data() {
        let mut data = image(0, 2, 1, 0);
        data.truncate(data.len() - 1);
        assert!(matches!(
            Cartridge::from_bytes(&data),
            Err(CartridgeError::InvalidImage(_))
        ));
    }

    #[test]
    fn rejects_unsupported_mapper() {
        let err = Cartridge::from_bytes(&image(9, 2, 1, 0)).err();
        assert_eq!(err, Some(CartridgeError::UnsupportedMapper(9)));
        assert_eq!(
            CartridgeError::UnsupportedMapper(9).to_string(),
            "unsupported mapper 9"
        );
    }

    #[test]
    fn trainer_is_skipped() {
        let mut data = image(0, 1, 1, 0x04);
        let trainer = vec![0xEE; TRAINER_LEN];
        data.splice(HEADER_LEN..HEADER_LEN, trainer);
        let cart = Cartridge::from_bytes(&data).unwrap();
        assert_eq!(cart.read_prg(0x8000), 0);
        assert_eq!(cart.read_prg(0xA000), 1);
    }

    #[test]
    fn chr_ram_accepts_writes_chr_rom_does_not() {
        let mut ram = Cartridge::from_bytes(&image(2, 2, 0, 0)).unwrap();
        assert!(ram.chr_is_ram());
        ram.write_chr(0x0123, 0x5A);
        assert_eq!(ram.read_chr(0x0123), 0x5A);

        let mut rom = Cartridge::from_bytes(&image(0, 1, 1, 0)).unwrap();
        rom.write_chr(0x0123, 0x5A);
        assert_eq!(rom.read_chr(0x0123), 0x80);
    }

    #[test]
    fn prg_ram_is_eight_kib() {
        let mut cart = Cartridge::from_bytes(&image(0, 1, 1, 0)).unwrap();
        cart.write_prg_ram(0x6001, 0x11);
        assert_eq!(cart.read_prg_ram(0x6001), 0x11);
        assert_eq!(cart.read_prg_ram(0x7FFF), 0);
    }

    #[test]
    fn uxrom_register_write_reaches_the_mapper() {
        let mut cart = Cartridge::from_bytes(&image(2, 4, 0, 0)).unwrap();
        cart.write_register(0x8000, 2);
        assert_eq!(cart.read_prg(0x8000), 4); // 16 KiB bank 2 starts at 8 KiB tag 4
        assert_eq!(cart.read_prg(0xC000), 6);
    }

    #[test]
    fn axrom_with_one_16k_bank_reads_in_range() {
        let mut cart = Cartridge::from_bytes(&image(7, 1, 1, 0)).unwrap();
        assert_eq!(cart.read_prg(0x8000), 0);
        assert_eq!(cart.read_prg(0xC000), 0);
        assert_eq!(cart.read_prg(0xFFFC), 1);

        cart.write_register(0x8000, 0x07);
        assert_eq!(cart.read_prg(0xFFFF), 1);
    }
}
