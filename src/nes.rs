//! Timing coordinator: runs the CPU and keeps the PPU three dots per CPU cycle behind it.

use crate::{
    bus::NesBus,
    cartridge::cartridge::{Cartridge, CartridgeError},
    controller::Buttons,
    cpu::cpu::CPU,
};

/// A powered-on console with a cartridge inserted.
pub struct Nes {
    cpu: CPU<NesBus>,
    frame_count: u64,
}

impl Nes {
    /// Parse an iNES image, build the bus and run the power-on reset.
    pub fn new(image: &[u8]) -> Result<Self, CartridgeError> {
        let cart = Cartridge::from_bytes(image)?;
        let mut cpu = CPU::new(NesBus::new(cart));
        cpu.reset();
        crate::debug!("nes: reset vector ${:04X}", cpu.pc);
        Ok(Self {
            cpu,
            frame_count: 0,
        })
    }

    /// Run until the PPU reaches vblank and return the finished frame (256×240, 0xRRGGBB).
    ///
    /// `buttons` is what the pad reports for the whole frame.
    pub fn run_frame(&mut self, buttons: Buttons) -> &[u32] {
        self.cpu.bus.controller.state = buttons;
        loop {
            let cycles = self.cpu.step();
            self.cpu.bus.tick(cycles as usize);
            if self.cpu.bus.take_frame_complete() {
                break;
            }
        }
        self.frame_count += 1;
        self.frame()
    }

    /// The reset button.
    pub fn reset(&mut self) {
        self.cpu.soft_reset();
        crate::info!("nes: reset");
    }

    /// Frame buffer; holds a complete frame between `run_frame` calls.
    pub fn frame(&self) -> &[u32] {
        self.cpu.bus.ppu.framebuffer()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn cpu(&self) -> &CPU<NesBus> {
        &self.cpu
    }
}
