//! Memory bus and address decoding for the NES.
//!
//! Maps CPU addresses to RAM, PPU registers, controller, cartridge RAM and cartridge ROM
//! ([CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map)):
//!
//! | range         | target                                        |
//! |---------------|-----------------------------------------------|
//! | $0000–$1FFF   | 2 KiB work RAM, `addr & $07FF`                |
//! | $2000–$3FFF   | PPU ports, `addr & 7`                         |
//! | $4014         | OAM DMA                                       |
//! | $4016 / $4017 | controller 1 / controller 2 (not connected)   |
//! | $4000–$5FFF   | APU and expansion: open bus                   |
//! | $6000–$7FFF   | 8 KiB cartridge RAM                           |
//! | $8000–$FFFF   | PRG ROM through the mapper; writes hit its registers |

use crate::{cartridge::cartridge::Cartridge, controller::Controller, ppu::ppu::PPU};

/// Value returned for addresses nothing drives.
pub const OPEN_BUS: u8 = 0xFF;

/// Trait for memory-mapped I/O and bus access used by the CPU.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);

    /// Read without side effects (used by the trace). Plain memory can just read.
    fn peek(&mut self, addr: u16) -> u8 {
        self.read(addr)
    }

    /// Consume a pending NMI edge.
    fn poll_nmi(&mut self) -> bool {
        false
    }

    /// Level of the shared IRQ line.
    fn irq_line(&self) -> bool {
        false
    }
}

/// Main NES bus: RAM, PPU, cartridge, and controller.
pub struct NesBus {
    pub ram: [u8; 0x800],
    pub cart: Cartridge,
    pub ppu: PPU,
    pub controller: Controller,
}

impl NesBus {
    /// Create a new bus with the given cartridge.
    pub fn new(cart: Cartridge) -> Self {
        Self {
            ram: [0; 0x800],
            cart,
            ppu: PPU::new(),
            controller: Controller::new(),
        }
    }

    /// Run the PPU for `cycles` CPU cycles (3 dots each).
    pub fn tick(&mut self, cycles: usize) {
        for _ in 0..cycles * 3 {
            self.ppu.tick(&mut self.cart);
        }
    }

    /// True once per frame when the PPU has entered vblank.
    pub fn take_frame_complete(&mut self) -> bool {
        self.ppu.take_frame_complete()
    }

    /// $4014: copy CPU page `page` into OAM starting at the current OAMADDR.
    /// Runs synchronously through the normal read path; the 513-cycle CPU stall is not modelled.
    fn oam_dma(&mut self, page: u8) {
        let base = (page as u16) << 8;
        for offset in 0..=0xFF {
            let data = self.read(base | offset);
            self.ppu.write_oam_data(data);
        }
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.ppu.read_register(addr, &self.cart),
            0x4016 => self.controller.read(),
            // Only bit 6 (open bus on the data lines) comes back from the empty second port.
            0x4017 => 0x40,
            0x4000..=0x5FFF => OPEN_BUS,
            0x6000..=0x7FFF => self.cart.read_prg_ram(addr),
            0x8000..=0xFFFF => self.cart.read_prg(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,
            0x2000..=0x3FFF => self.ppu.write_register(addr, data, &mut self.cart),
            0x4014 => self.oam_dma(data),
            0x4016 => self.controller.write(data),
            0x4000..=0x5FFF => {}
            0x6000..=0x7FFF => self.cart.write_prg_ram(addr, data),
            0x8000..=0xFFFF => self.cart.write_register(addr, data),
        }
    }

    fn peek(&mut self, addr: u16) -> u8 {
        match addr {
            0x2000..=0x3FFF => self.ppu.peek_register(addr),
            0x4016 => self.controller.peek(),
            0x4017 => 0x40,
            0x4000..=0x5FFF => OPEN_BUS,
            _ => self.read(addr),
        }
    }

    fn poll_nmi(&mut self) -> bool {
        self.ppu.take_nmi()
    }

    fn irq_line(&self) -> bool {
        self.cart.irq_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::cartridge::tests::image;
    use crate::controller::Buttons;

    fn bus(mapper: u8) -> NesBus {
        NesBus::new(Cartridge::from_bytes(&image(mapper, 2, 1, 0)).unwrap())
    }

    #[test]
    fn work_ram_is_mirrored_every_2k() {
        let mut bus = bus(0);
        bus.write(0x0001, 0x11);
        assert_eq!(bus.read(0x0801), 0x11);
        assert_eq!(bus.read(0x1801), 0x11);
        bus.write(0x1FFF, 0x22);
        assert_eq!(bus.read(0x07FF), 0x22);
    }

    #[test]
    fn ppu_ports_repeat_every_eight_bytes() {
        let mut bus = bus(0);
        bus.write(0x3FFE, 0x21); // $2006
        bus.write(0x2006, 0x08);
        bus.write(0x2007, 0x99);
        bus.write(0x2006, 0x21);
        bus.write(0x200E, 0x08);
        bus.read(0x2007);
        assert_eq!(bus.read(0x3FFF), 0x99);
    }

    #[test]
    fn unmapped_reads_are_open_bus() {
        let mut bus = bus(0);
        assert_eq!(bus.read(0x4000), OPEN_BUS);
        assert_eq!(bus.read(0x4015), OPEN_BUS);
        assert_eq!(bus.read(0x5000), OPEN_BUS);
        assert_eq!(bus.read(0x4017), 0x40);
    }

    #[test]
    fn prg_ram_and_rom() {
        let mut bus = bus(0);
        bus.write(0x6000, 0x12);
        assert_eq!(bus.read(0x6000), 0x12);
        assert_eq!(bus.read(0x8000), 0);
        assert_eq!(bus.read(0xFFFF), 3);
        // NROM ignores ROM writes.
        bus.write(0x8000, 0x55);
        assert_eq!(bus.read(0x8000), 0);
    }

    #[test]
    fn rom_writes_reach_the_mapper() {
        let mut bus = bus(2);
        bus.write(0xC000, 1);
        assert_eq!(bus.read(0x8000), 2);
        assert_eq!(bus.read(0xC000), 2);
    }

    #[test]
    fn oam_dma_copies_a_page_from_oamaddr() {
        let mut bus = bus(0);
        for i in 0..256u16 {
            bus.write(0x0200 + i, i as u8);
        }
        bus.write(0x2003, 0x10);
        bus.write(0x4014, 0x02);
        assert_eq!(bus.ppu.oam[0x10], 0x00);
        assert_eq!(bus.ppu.oam[0xFF], 0xEF);
        assert_eq!(bus.ppu.oam[0x00], 0xF0);
        assert_eq!(bus.ppu.oam[0x0F], 0xFF);
    }

    #[test]
    fn controller_port_shifts_buttons() {
        let mut bus = bus(0);
        bus.controller.state = Buttons::B | Buttons::UP;
        bus.write(0x4016, 1);
        bus.write(0x4016, 0);
        let bits: Vec<u8> = (0..8).map(|_| bus.read(0x4016) & 1).collect();
        assert_eq!(bits, vec![0, 1, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn peek_has_no_side_effects() {
        let mut bus = bus(0);
        bus.tick(28_000); // scanline 246, inside vblank
        assert_eq!(bus.peek(0x2002) & 0x80, 0x80);
        assert_eq!(bus.peek(0x2002) & 0x80, 0x80);
        assert_eq!(bus.read(0x2002) & 0x80, 0x80);
        assert_eq!(bus.peek(0x2002) & 0x80, 0);
        assert_eq!(bus.peek(0x8000), 0);
    }

    #[test]
    fn peek_sees_the_next_controller_bit() {
        let mut bus = bus(0);
        bus.controller.state = Buttons::A;
        bus.write(0x4016, 1);
        bus.write(0x4016, 0);
        assert_eq!(bus.peek(0x4016), 0x41);
        assert_eq!(bus.peek(0x4016), 0x41);
        assert_eq!(bus.read(0x4016), 0x41);
        assert_eq!(bus.peek(0x4016), 0x40);
    }

    #[test]
    fn tick_runs_three_dots_per_cycle() {
        let mut bus = bus(0);
        bus.tick(114);
        assert_eq!((bus.ppu.scanline(), bus.ppu.dot()), (1, 1));
    }
}
