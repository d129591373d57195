//! PPU register bit-fields.
//!
//! See [PPU registers](https://www.nesdev.org/wiki/PPU_registers) and
//! [PPU scrolling](https://www.nesdev.org/wiki/PPU_scrolling) for the internal `v`/`t` layout.

use bitflags::bitflags;

bitflags! {
    /// PPUCTRL ($2000).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Control: u8 {
        const NAMETABLE_X = 1 << 0;
        const NAMETABLE_Y = 1 << 1;
        /// VRAM address increment per $2007 access: 0 = +1 (across), 1 = +32 (down).
        const INCREMENT_32 = 1 << 2;
        /// 8x8 sprite pattern table: 0 = $0000, 1 = $1000.
        const SPRITE_TABLE = 1 << 3;
        const BACKGROUND_TABLE = 1 << 4;
        /// 8x16 sprites.
        const TALL_SPRITES = 1 << 5;
        const MASTER_SLAVE = 1 << 6;
        /// Generate an NMI at the start of vblank.
        const NMI_ENABLE = 1 << 7;
    }
}

bitflags! {
    /// PPUMASK ($2001).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Mask: u8 {
        const GREYSCALE = 1 << 0;
        const SHOW_BACKGROUND_LEFT = 1 << 1;
        const SHOW_SPRITES_LEFT = 1 << 2;
        const SHOW_BACKGROUND = 1 << 3;
        const SHOW_SPRITES = 1 << 4;
        const EMPHASIZE_RED = 1 << 5;
        const EMPHASIZE_GREEN = 1 << 6;
        const EMPHASIZE_BLUE = 1 << 7;
    }
}

bitflags! {
    /// PPUSTATUS ($2002). The low five bits are not driven; reads fill them from the I/O latch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status: u8 {
        const SPRITE_OVERFLOW = 1 << 5;
        const SPRITE_ZERO_HIT = 1 << 6;
        const VBLANK = 1 << 7;
    }
}

impl Mask {
    pub fn rendering_enabled(self) -> bool {
        self.intersects(Mask::SHOW_BACKGROUND | Mask::SHOW_SPRITES)
    }
}

/// A 15-bit loopy VRAM address (`v` or `t`).
///
/// ```text
/// yyy NN YYYYY XXXXX
/// ||| || ||||| +++++-- coarse X scroll
/// ||| || +++++-------- coarse Y scroll
/// ||| ++-------------- nametable select
/// +++----------------- fine Y scroll
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VramAddr(u16);

impl VramAddr {
    pub fn new(raw: u16) -> Self {
        Self(raw & 0x7FFF)
    }

    pub fn raw(self) -> u16 {
        self.0
    }

    pub fn coarse_x(self) -> u8 {
        (self.0 & 0x001F) as u8
    }

    pub fn coarse_y(self) -> u8 {
        ((self.0 >> 5) & 0x1F) as u8
    }

    pub fn nametable(self) -> u8 {
        ((self.0 >> 10) & 0x03) as u8
    }

    pub fn fine_y(self) -> u8 {
        ((self.0 >> 12) & 0x07) as u8
    }

    pub fn set_coarse_x(&mut self, value: u8) {
        self.0 = (self.0 & !0x001F) | (value as u16 & 0x1F);
    }

    pub fn set_coarse_y(&mut self, value: u8) {
        self.0 = (self.0 & !0x03E0) | ((value as u16 & 0x1F) << 5);
    }

    pub fn set_nametable(&mut self, value: u8) {
        self.0 = (self.0 & !0x0C00) | ((value as u16 & 0x03) << 10);
    }

    pub fn set_fine_y(&mut self, value: u8) {
        self.0 = (self.0 & !0x7000) | ((value as u16 & 0x07) << 12);
    }

    /// First $2006 write: bits 8-13 from `data`, bit 14 cleared.
    pub fn set_high_byte(&mut self, data: u8) {
        self.0 = (self.0 & 0x00FF) | ((data as u16 & 0x3F) << 8);
    }

    /// Second $2006 write.
    pub fn set_low_byte(&mut self, data: u8) {
        self.0 = (self.0 & 0x7F00) | data as u16;
    }

    /// $2007 auto-increment.
    pub fn advance(&mut self, step: u16) {
        self.0 = self.0.wrapping_add(step) & 0x7FFF;
    }

    /// Next tile to the right, wrapping into the horizontally adjacent nametable.
    pub fn increment_x(&mut self) {
        if self.coarse_x() == 31 {
            self.set_coarse_x(0);
            self.0 ^= 0x0400;
        } else {
            self.0 += 1;
        }
    }

    /// Next pixel row. Coarse Y wraps at row 29 into the vertically adjacent nametable; rows 30
    /// and 31 (attribute memory) wrap to 0 without switching.
    pub fn increment_y(&mut self) {
        if self.fine_y() < 7 {
            self.0 += 0x1000;
            return;
        }
        self.set_fine_y(0);
        match self.coarse_y() {
            29 => {
                self.set_coarse_y(0);
                self.0 ^= 0x0800;
            }
            31 => self.set_coarse_y(0),
            y => self.set_coarse_y(y + 1),
        }
    }

    /// Dot 257: coarse X and horizontal nametable bit from `t`.
    pub fn copy_horizontal(&mut self, t: VramAddr) {
        self.0 = (self.0 & !0x041F) | (t.0 & 0x041F);
    }

    /// Pre-render dots 280-304: fine Y, coarse Y and vertical nametable bit from `t`.
    pub fn copy_vertical(&mut self, t: VramAddr) {
        self.0 = (self.0 & !0x7BE0) | (t.0 & 0x7BE0);
    }

    /// Nametable byte for the current tile.
    pub fn tile_address(self) -> u16 {
        0x2000 | (self.0 & 0x0FFF)
    }

    /// Attribute byte covering the current tile's 32x32 pixel block.
    pub fn attribute_address(self) -> u16 {
        0x23C0 | (self.0 & 0x0C00) | ((self.0 >> 4) & 0x38) | ((self.0 >> 2) & 0x07)
    }

    /// Shift that moves the current 16x16 quadrant's palette into bits 0-1 of the attribute byte.
    pub fn attribute_shift(self) -> u8 {
        (((self.0 >> 4) & 0x04) | (self.0 & 0x02)) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_pack_into_fifteen_bits() {
        let mut v = VramAddr::default();
        v.set_coarse_x(0x1F);
        v.set_coarse_y(0x1A);
        v.set_nametable(2);
        v.set_fine_y(5);
        assert_eq!(v.raw(), 0b101_10_11010_11111);
        assert_eq!(v.coarse_x(), 0x1F);
        assert_eq!(v.coarse_y(), 0x1A);
        assert_eq!(v.nametable(), 2);
        assert_eq!(v.fine_y(), 5);
    }

    #[test]
    fn increment_x_switches_nametable_at_column_31() {
        let mut v = VramAddr::default();
        v.set_coarse_x(31);
        v.increment_x();
        assert_eq!(v.coarse_x(), 0);
        assert_eq!(v.nametable(), 1);
    }

    #[test]
    fn increment_y_wraps_at_row_29_and_31() {
        let mut v = VramAddr::default();
        v.set_fine_y(7);
        v.set_coarse_y(29);
        v.increment_y();
        assert_eq!((v.fine_y(), v.coarse_y(), v.nametable()), (0, 0, 2));

        let mut v = VramAddr::default();
        v.set_fine_y(7);
        v.set_coarse_y(31);
        v.increment_y();
        assert_eq!((v.fine_y(), v.coarse_y(), v.nametable()), (0, 0, 0));

        let mut v = VramAddr::default();
        v.set_fine_y(3);
        v.increment_y();
        assert_eq!(v.fine_y(), 4);
    }

    #[test]
    fn copies_take_only_their_half() {
        let t = VramAddr::new(0x7FFF);
        let mut v = VramAddr::default();
        v.copy_horizontal(t);
        assert_eq!(v.raw(), 0x041F);
        v.copy_vertical(t);
        assert_eq!(v.raw(), 0x7FFF);
    }

    #[test]
    fn address_writes_clear_bit_14() {
        let mut t = VramAddr::new(0x4000);
        t.set_high_byte(0xFF);
        t.set_low_byte(0x12);
        assert_eq!(t.raw(), 0x3F12);
    }

    #[test]
    fn attribute_lookup() {
        // Tile (coarse_x 6, coarse_y 10) in nametable 1: bottom-right quadrant of its block.
        let mut v = VramAddr::default();
        v.set_coarse_x(6);
        v.set_coarse_y(10);
        v.set_nametable(1);
        assert_eq!(v.tile_address(), 0x2400 + 10 * 32 + 6);
        assert_eq!(v.attribute_address(), 0x27C0 + (10 / 4) * 8 + 6 / 4);
        assert_eq!(v.attribute_shift(), 6);
    }
}
