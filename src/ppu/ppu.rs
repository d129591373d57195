//! NES PPU (Picture Processing Unit) implementation.
//!
//! One [`PPU::tick`] is one dot. A frame is 262 scanlines of 341 dots: 0–239 visible, 240 idle,
//! 241–260 vblank, 261 pre-render. Every frame has the full 341 × 262 dots (no odd-frame skip).
//! Background pixels come out of 16-bit shift registers fed by the nametable / attribute /
//! pattern fetch every 8 dots; sprites for the next line are evaluated at dot 257.

use crate::cartridge::cartridge::Cartridge;
use crate::ppu::registers::{Control, Mask, Status, VramAddr};

/// NES 2C02-style 64-color palette (0xRRGGBB). Index 0 = backdrop.
pub const NES_PALETTE_RGB: [u32; 64] = [
    0x545454, 0x001E74, 0x081090, 0x300088, 0x440064, 0x5C0030, 0x540400, 0x3C1800, 0x202A00,
    0x083A00, 0x004000, 0x003C00, 0x00302C, 0x000000, 0x000000, 0x000000, 0x989698, 0x084CC4,
    0x3032EC, 0x5C1EE4, 0x8814B0, 0xA01464, 0x982220, 0x783C00, 0x545A00, 0x287200, 0x087C00,
    0x007628, 0x006678, 0x000000, 0x000000, 0x000000, 0xECEEEC, 0x3C7EEC, 0x5C5CEC, 0x8844EC,
    0xB02CEC, 0xE028B0, 0xD83C50, 0xC45400, 0xAC7000, 0x808800, 0x409C30, 0x20A458, 0x209A88,
    0x404040, 0x000000, 0x000000, 0xECEEEC, 0xA8BCEC, 0xBCACEC, 0xD4A0EC, 0xEC94EC, 0xEC90D4,
    0xEC9CB4, 0xE4B090, 0xDCC878, 0xD4DC78, 0xB8EC98, 0xA8ECBC, 0xA0E4E4, 0xA0A0A0, 0x000000,
    0x000000,
];

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 240;
/// Rows at the top and bottom of the frame that are left black.
pub const OVERSCAN_ROWS: usize = 8;

pub const DOTS_PER_SCANLINE: u16 = 341;
pub const SCANLINES_PER_FRAME: u16 = 262;
pub const VBLANK_SCANLINE: u16 = 241;
pub const PRE_RENDER_SCANLINE: u16 = 261;

/// OAM (Object Attribute Memory): 64 sprites × 4 bytes. Each entry: Y, tile, attr, X.
pub const OAM_LEN: usize = 256;
const MAX_SPRITES_PER_LINE: usize = 8;
const SPRITE_COUNT: usize = OAM_LEN / 4;

/// Dot at which boards with a scanline counter (MMC3) get clocked.
const SCANLINE_CLOCK_DOT: u16 = 260;

/// One visible sprite pixel, already resolved against flipping.
#[derive(Debug, Clone, Copy)]
struct SpritePixel {
    pixel: u8,
    palette: u8,
    behind_background: bool,
    sprite_zero: bool,
}

/// PPU state: registers, loopy scroll, VRAM, palettes, OAM, fetch pipeline, and framebuffer.
pub struct PPU {
    scanline: u16,
    dot: u16,

    ctrl: Control,
    mask: Mask,
    status: Status,
    /// OAM address for $2003/$2004 (byte index 0..255).
    pub oam_addr: u8,
    /// OAM: 64 sprites × 4 bytes (Y, tile, attr, X). Written via $2003/$2004 or $4014 DMA.
    pub oam: [u8; OAM_LEN],

    /// Current VRAM address.
    pub(crate) v: VramAddr,
    /// Temporary VRAM address (top-left of the screen between frames).
    pub(crate) t: VramAddr,
    pub(crate) fine_x: u8,
    /// Shared $2005/$2006 write toggle.
    pub(crate) w: bool,

    /// $2007 read buffer.
    read_buffer: u8,
    /// Last value written to any PPU port.
    io_latch: u8,
    nmi_pending: bool,
    frame_complete: bool,

    nametable: [u8; 0x800],
    /// Palette RAM $3F00-$3F1F.
    palette: [u8; 32],

    bg_next_tile: u8,
    bg_next_attr: u8,
    bg_next_lo: u8,
    bg_next_hi: u8,
    bg_pattern_lo: u16,
    bg_pattern_hi: u16,
    bg_attr_lo: u16,
    bg_attr_hi: u16,

    sprite_count: usize,
    sprite_lo: [u8; SPRITE_COUNT],
    sprite_hi: [u8; SPRITE_COUNT],
    sprite_attr: [u8; SPRITE_COUNT],
    sprite_x: [u8; SPRITE_COUNT],
    sprite_zero_on_line: bool,

    /// 256×240 framebuffer (0xRRGGBB per pixel). Row-major, left-to-right, top-to-bottom.
    framebuffer: Vec<u32>,
}

impl Default for PPU {
    fn default() -> Self {
        Self::new()
    }
}

impl PPU {
    /// Power-on state: scanline 0, dot 0, everything cleared.
    pub fn new() -> Self {
        Self {
            scanline: 0,
            dot: 0,
            ctrl: Control::empty(),
            mask: Mask::empty(),
            status: Status::empty(),
            oam_addr: 0,
            oam: [0; OAM_LEN],
            v: VramAddr::default(),
            t: VramAddr::default(),
            fine_x: 0,
            w: false,
            read_buffer: 0,
            io_latch: 0,
            nmi_pending: false,
            frame_complete: false,
            nametable: [0; 0x800],
            palette: [0; 32],
            bg_next_tile: 0,
            bg_next_attr: 0,
            bg_next_lo: 0,
            bg_next_hi: 0,
            bg_pattern_lo: 0,
            bg_pattern_hi: 0,
            bg_attr_lo: 0,
            bg_attr_hi: 0,
            sprite_count: 0,
            sprite_lo: [0; SPRITE_COUNT],
            sprite_hi: [0; SPRITE_COUNT],
            sprite_attr: [0; SPRITE_COUNT],
            sprite_x: [0; SPRITE_COUNT],
            sprite_zero_on_line: false,
            framebuffer: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    pub fn dot(&self) -> u16 {
        self.dot
    }

    pub fn framebuffer(&self) -> &[u32] {
        &self.framebuffer
    }

    /// Consume the NMI edge raised at vblank start (or by enabling NMI during vblank).
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    /// True once per frame, right after dot 1 of scanline 241.
    pub fn take_frame_complete(&mut self) -> bool {
        std::mem::take(&mut self.frame_complete)
    }

    fn rendering_enabled(&self) -> bool {
        self.mask.rendering_enabled()
    }

    /// Advance one dot.
    pub fn tick(&mut self, cart: &mut Cartridge) {
        match self.scanline {
            0..=239 => self.tick_visible(cart),
            VBLANK_SCANLINE if self.dot == 1 => self.enter_vblank(),
            PRE_RENDER_SCANLINE => self.tick_pre_render(cart),
            _ => {}
        }

        if self.dot == SCANLINE_CLOCK_DOT
            && self.rendering_enabled()
            && (self.scanline < 240 || self.scanline == PRE_RENDER_SCANLINE)
        {
            cart.on_scanline();
        }

        self.dot += 1;
        if self.dot == DOTS_PER_SCANLINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline == SCANLINES_PER_FRAME {
                self.scanline = 0;
            }
        }
    }

    fn enter_vblank(&mut self) {
        self.status.insert(Status::VBLANK);
        if self.ctrl.contains(Control::NMI_ENABLE) {
            self.nmi_pending = true;
        }
        self.frame_complete = true;
    }

    fn tick_visible(&mut self, cart: &Cartridge) {
        if !self.rendering_enabled() {
            if (1..=256).contains(&self.dot) {
                let x = (self.dot - 1) as usize;
                let backdrop = self.palette[0];
                self.put_pixel(x, backdrop);
            }
            return;
        }

        match self.dot {
            1..=256 => {
                self.render_pixel();
                self.fetch_background(cart);
                self.shift_background();
            }
            321..=336 => {
                self.fetch_background(cart);
                self.shift_background();
            }
            _ => {}
        }
        if self.dot == 256 {
            self.v.increment_y();
        }
        if self.dot == 257 {
            self.v.copy_horizontal(self.t);
            self.evaluate_sprites(cart);
        }
    }

    fn tick_pre_render(&mut self, cart: &Cartridge) {
        if self.dot == 1 {
            self.status
                .remove(Status::VBLANK | Status::SPRITE_ZERO_HIT | Status::SPRITE_OVERFLOW);
            self.sprite_count = 0;
            self.sprite_zero_on_line = false;
        }
        if !self.rendering_enabled() {
            return;
        }

        if matches!(self.dot, 1..=256 | 321..=336) {
            self.fetch_background(cart);
            self.shift_background();
        }
        match self.dot {
            256 => self.v.increment_y(),
            257 => self.v.copy_horizontal(self.t),
            280..=304 => self.v.copy_vertical(self.t),
            _ => {}
        }
    }

    /// One step of the 8-dot nametable / attribute / pattern low / pattern high fetch.
    fn fetch_background(&mut self, cart: &Cartridge) {
        let phase = if self.dot >= 321 { self.dot - 321 } else { self.dot - 1 };
        match phase & 7 {
            0 => {
                if self.dot != 321 {
                    self.load_background();
                }
                self.bg_next_tile = self.read_vram(cart, self.v.tile_address());
            }
            2 => {
                let attr = self.read_vram(cart, self.v.attribute_address());
                self.bg_next_attr = (attr >> self.v.attribute_shift()) & 3;
            }
            4 => self.bg_next_lo = self.read_vram(cart, self.background_row_address()),
            6 => self.bg_next_hi = self.read_vram(cart, self.background_row_address() + 8),
            7 => self.v.increment_x(),
            _ => {}
        }
    }

    fn background_row_address(&self) -> u16 {
        let table = if self.ctrl.contains(Control::BACKGROUND_TABLE) { 0x1000 } else { 0 };
        table + self.bg_next_tile as u16 * 16 + self.v.fine_y() as u16
    }

    fn load_background(&mut self) {
        self.bg_pattern_lo = (self.bg_pattern_lo & 0xFF00) | self.bg_next_lo as u16;
        self.bg_pattern_hi = (self.bg_pattern_hi & 0xFF00) | self.bg_next_hi as u16;
        let fill = |bit: u8| if self.bg_next_attr & bit != 0 { 0xFF } else { 0x00 };
        let (attr_lo, attr_hi) = (fill(1), fill(2));
        self.bg_attr_lo = (self.bg_attr_lo & 0xFF00) | attr_lo;
        self.bg_attr_hi = (self.bg_attr_hi & 0xFF00) | attr_hi;
    }

    fn shift_background(&mut self) {
        self.bg_pattern_lo <<= 1;
        self.bg_pattern_hi <<= 1;
        self.bg_attr_lo <<= 1;
        self.bg_attr_hi <<= 1;
    }

    /// Background (pixel, palette) at screen column `x`; pixel 0 is transparent.
    fn background_pixel(&self, x: usize) -> (u8, u8) {
        if !self.mask.contains(Mask::SHOW_BACKGROUND)
            || (x < 8 && !self.mask.contains(Mask::SHOW_BACKGROUND_LEFT))
        {
            return (0, 0);
        }
        let select = 0x8000 >> self.fine_x;
        let bit = |reg: u16| u8::from(reg & select != 0);
        let pixel = (bit(self.bg_pattern_hi) << 1) | bit(self.bg_pattern_lo);
        let palette = (bit(self.bg_attr_hi) << 1) | bit(self.bg_attr_lo);
        (pixel, palette)
    }

    /// Frontmost opaque sprite pixel at screen column `x`.
    fn sprite_pixel(&self, x: usize) -> Option<SpritePixel> {
        if !self.mask.contains(Mask::SHOW_SPRITES)
            || (x < 8 && !self.mask.contains(Mask::SHOW_SPRITES_LEFT))
        {
            return None;
        }
        (0..self.sprite_count).find_map(|i| {
            let offset = x.checked_sub(self.sprite_x[i] as usize).filter(|&o| o < 8)?;
            let shift = 7 - offset;
            let pixel = (((self.sprite_hi[i] >> shift) & 1) << 1) | ((self.sprite_lo[i] >> shift) & 1);
            (pixel != 0).then(|| SpritePixel {
                pixel,
                palette: (self.sprite_attr[i] & 3) + 4,
                behind_background: self.sprite_attr[i] & 0x20 != 0,
                sprite_zero: i == 0 && self.sprite_zero_on_line,
            })
        })
    }

    fn render_pixel(&mut self) {
        let x = (self.dot - 1) as usize;
        let (bg_pixel, bg_palette) = self.background_pixel(x);
        let sprite = self.sprite_pixel(x);

        let (pixel, palette) = match (bg_pixel, sprite) {
            (0, None) => (0, 0),
            (0, Some(s)) => (s.pixel, s.palette),
            (_, None) => (bg_pixel, bg_palette),
            (_, Some(s)) => {
                if s.sprite_zero
                    && x != 255
                    && self.mask.contains(Mask::SHOW_BACKGROUND | Mask::SHOW_SPRITES)
                {
                    self.status.insert(Status::SPRITE_ZERO_HIT);
                }
                if s.behind_background {
                    (bg_pixel, bg_palette)
                } else {
                    (s.pixel, s.palette)
                }
            }
        };

        let entry = if pixel == 0 { 0 } else { (palette << 2) | pixel };
        let colour = self.palette[palette_index(entry as u16)];
        self.put_pixel(x, colour);
    }

    fn put_pixel(&mut self, x: usize, colour: u8) {
        let y = self.scanline as usize;
        let colour = if self.mask.contains(Mask::GREYSCALE) { colour & 0x30 } else { colour };
        let rgb = if (OVERSCAN_ROWS..SCREEN_HEIGHT - OVERSCAN_ROWS).contains(&y) {
            NES_PALETTE_RGB[(colour & 0x3F) as usize]
        } else {
            0
        };
        self.framebuffer[y * SCREEN_WIDTH + x] = rgb;
    }

    /// Pick every sprite that covers the next scanline, in OAM order, and fetch its pattern row.
    /// OAM Y is one less than the first screen row a sprite covers.
    fn evaluate_sprites(&mut self, cart: &Cartridge) {
        let line = self.scanline;
        let height: u16 = if self.ctrl.contains(Control::TALL_SPRITES) { 16 } else { 8 };

        self.sprite_count = 0;
        self.sprite_zero_on_line = false;

        for (index, entry) in self.oam.chunks_exact(4).enumerate() {
            let row = line.wrapping_sub(entry[0] as u16);
            if row >= height {
                continue;
            }
            // Past eight on a line: raise overflow, keep drawing.
            if self.sprite_count == MAX_SPRITES_PER_LINE {
                self.status.insert(Status::SPRITE_OVERFLOW);
            }

            let (tile, attr, x) = (entry[1], entry[2], entry[3]);
            let row = if attr & 0x80 != 0 { height - 1 - row } else { row };
            let addr = if height == 16 {
                let table = (tile as u16 & 1) * 0x1000;
                let tile = (tile & 0xFE) as u16 + row / 8;
                table + tile * 16 + row % 8
            } else {
                let table = if self.ctrl.contains(Control::SPRITE_TABLE) { 0x1000 } else { 0 };
                table + tile as u16 * 16 + row
            };
            let mut lo = cart.read_chr(addr);
            let mut hi = cart.read_chr(addr + 8);
            if attr & 0x40 != 0 {
                lo = lo.reverse_bits();
                hi = hi.reverse_bits();
            }

            let slot = self.sprite_count;
            self.sprite_lo[slot] = lo;
            self.sprite_hi[slot] = hi;
            self.sprite_attr[slot] = attr;
            self.sprite_x[slot] = x;
            if index == 0 {
                self.sprite_zero_on_line = true;
            }
            self.sprite_count += 1;
        }
    }

    /// PPU-side read of the $0000–$3FFF address space.
    fn read_vram(&self, cart: &Cartridge, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => cart.read_chr(addr),
            0x2000..=0x3EFF => self.nametable[cart.mirroring().nametable_offset(addr)],
            _ => self.palette[palette_index(addr)],
        }
    }

    fn write_vram(&mut self, cart: &mut Cartridge, addr: u16, data: u8) {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => cart.write_chr(addr, data),
            0x2000..=0x3EFF => self.nametable[cart.mirroring().nametable_offset(addr)] = data,
            _ => self.palette[palette_index(addr)] = data & 0x3F,
        }
    }

    fn advance_vram_addr(&mut self) {
        let step = if self.ctrl.contains(Control::INCREMENT_32) { 32 } else { 1 };
        self.v.advance(step);
    }

    /// CPU read of $2000–$2007 (`addr` may be any mirror).
    pub fn read_register(&mut self, addr: u16, cart: &Cartridge) -> u8 {
        match addr & 7 {
            2 => {
                let value = self.status.bits() | (self.io_latch & 0x1F);
                self.status.remove(Status::VBLANK);
                self.w = false;
                value
            }
            4 => self.oam[self.oam_addr as usize],
            7 => self.read_data(cart),
            _ => self.io_latch,
        }
    }

    /// What [`read_register`](Self::read_register) would return, without touching any state.
    pub fn peek_register(&self, addr: u16) -> u8 {
        match addr & 7 {
            2 => self.status.bits() | (self.io_latch & 0x1F),
            4 => self.oam[self.oam_addr as usize],
            7 => self.read_buffer,
            _ => self.io_latch,
        }
    }

    /// PPUDATA read. CHR and nametable reads return the previous buffer contents; palette reads
    /// are immediate and refill the buffer with the nametable byte underneath.
    fn read_data(&mut self, cart: &Cartridge) -> u8 {
        let addr = self.v.raw() & 0x3FFF;
        let value = if addr >= 0x3F00 {
            self.read_buffer = self.read_vram(cart, addr & 0x2FFF);
            self.palette[palette_index(addr)]
        } else {
            let fresh = self.read_vram(cart, addr);
            std::mem::replace(&mut self.read_buffer, fresh)
        };
        self.advance_vram_addr();
        value
    }

    /// CPU write of $2000–$2007 (`addr` may be any mirror).
    pub fn write_register(&mut self, addr: u16, data: u8, cart: &mut Cartridge) {
        self.io_latch = data;
        match addr & 7 {
            0 => {
                let nmi_was_enabled = self.ctrl.contains(Control::NMI_ENABLE);
                self.ctrl = Control::from_bits_retain(data);
                self.t.set_nametable(data & 3);
                if !nmi_was_enabled
                    && self.ctrl.contains(Control::NMI_ENABLE)
                    && self.status.contains(Status::VBLANK)
                {
                    self.nmi_pending = true;
                }
            }
            1 => self.mask = Mask::from_bits_retain(data),
            2 => {}
            3 => self.oam_addr = data,
            4 => self.write_oam_data(data),
            5 => {
                if !self.w {
                    self.t.set_coarse_x(data >> 3);
                    self.fine_x = data & 7;
                } else {
                    self.t.set_fine_y(data & 7);
                    self.t.set_coarse_y(data >> 3);
                }
                self.w = !self.w;
            }
            6 => {
                if !self.w {
                    self.t.set_high_byte(data);
                } else {
                    self.t.set_low_byte(data);
                    self.v = self.t;
                }
                self.w = !self.w;
            }
            _ => {
                self.write_vram(cart, self.v.raw(), data);
                self.advance_vram_addr();
            }
        }
    }

    /// Write OAMDATA ($2004, also used by OAM DMA); writes OAM and increments OAMADDR.
    pub fn write_oam_data(&mut self, data: u8) {
        self.oam[self.oam_addr as usize] = data;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }
}

/// Resolve palette address $3F00–$3FFF to a 32-byte index.
/// Addresses $3F10, $3F14, $3F18, $3F1C mirror $3F00, $3F04, $3F08, $3F0C.
pub fn palette_index(addr: u16) -> usize {
    let i = (addr & 0x1F) as usize;
    if i & 0x13 == 0x10 { i & 0x0F } else { i }
}
