//! Famicore: an NES (Nintendo Entertainment System) emulator core written in Rust.
//!
//! Implements the NES chipset as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/NES_reference_guide): the Ricoh 2A03 CPU, the
//! 2C02 PPU, cartridge mappers, and controller I/O. Audio is not emulated.
//!
//! ## Modules (NESdev references)
//!
//! - **log** – leveled stderr logging with colored tags
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map): RAM, PPU,
//!   controller, cartridge; 3 PPU dots per CPU cycle
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) loading;
//!   [mappers](https://www.nesdev.org/wiki/Mapper) NROM (0), MMC1 (1), UxROM (2), CNROM (3),
//!   MMC3 (4), AxROM (7)
//! - **controller** – [Controller reading](https://www.nesdev.org/wiki/Controller_reading): $4016 latch, shift-out
//! - **cpu** – [6502](https://www.nesdev.org/wiki/CPU) / 2A03: official + unofficial opcodes, [NMI](https://www.nesdev.org/wiki/NMI) and IRQ
//! - **nes** – frame-at-a-time driver tying CPU and PPU together
//! - **ppu** – [PPU](https://www.nesdev.org/wiki/PPU), [PPU registers](https://www.nesdev.org/wiki/PPU_registers), OAM, nametables, 256×240
//!
//! ```no_run
//! use famicore::{Buttons, Nes};
//!
//! let rom = std::fs::read("game.nes").unwrap();
//! let mut nes = Nes::new(&rom).unwrap();
//! let frame = nes.run_frame(Buttons::START);
//! assert_eq!(frame.len(), 256 * 240);
//! ```

pub mod log;

pub mod bus;
pub mod cartridge;
pub mod controller;
pub mod cpu;
pub mod nes;
pub mod ppu;

pub use cartridge::cartridge::CartridgeError;
pub use controller::Buttons;
pub use nes::Nes;
