//! Mapper behaviour observed by programs running on the CPU.

mod common;

use common::{cartridge, spin};
use famicore::{Buttons, Nes};

#[test]
fn sxrom_serial_write_selects_the_8000_bank() {
    let mut code = vec![
        0xA9, 0x03, 0x8D, 0x00, 0xE0, // LDA #%00011; STA $E000
        0x4A, 0x8D, 0x00, 0xE0, // LSR A; STA $E000
        0x4A, 0x8D, 0x00, 0xE0, // LSR A; STA $E000
        0x4A, 0x8D, 0x00, 0xE0, // LSR A; STA $E000
        0x4A, 0x8D, 0x00, 0xE0, // LSR A; STA $E000 (commit to PRG bank)
        0xAD, 0x00, 0x80, 0x85, 0x10, // LDA $8000; STA $10
        0xAD, 0x00, 0xC0, 0x85, 0x11, // LDA $C000; STA $11
    ];
    spin(&mut code);
    let mut nes = Nes::new(&cartridge(1, 8, 1, &code, &[0x40], &[0x40])).unwrap();

    nes.run_frame(Buttons::empty());

    assert_eq!(nes.cpu().bus.ram[0x10], 3);
    assert_eq!(nes.cpu().bus.ram[0x11], 7); // $C000 stays on the last bank
}

#[test]
fn uxrom_switches_the_low_window() {
    let mut code = vec![
        0xA9, 0x02, 0x8D, 0x00, 0x80, // LDA #2; STA $8000
        0xAD, 0x00, 0x80, 0x85, 0x10, // LDA $8000; STA $10
    ];
    spin(&mut code);
    let mut nes = Nes::new(&cartridge(2, 4, 0, &code, &[0x40], &[0x40])).unwrap();

    nes.run_frame(Buttons::empty());

    assert_eq!(nes.cpu().bus.ram[0x10], 2);
}

#[test]
fn txrom_scanline_irq_reaches_the_cpu() {
    let mut code = vec![
        0xA9, 0x04, 0x8D, 0x00, 0xC0, // LDA #4; STA $C000 (latch)
        0x8D, 0x01, 0xC0, // STA $C001 (reload)
        0x8D, 0x01, 0xE0, // STA $E001 (enable)
        0xA9, 0x18, 0x8D, 0x01, 0x20, // LDA #$18; STA $2001 (rendering on)
        0x58, // CLI
    ];
    spin(&mut code);
    let irq = [
        0x8D, 0x00, 0xE0, // STA $E000 (acknowledge and disable)
        0xE6, 0x01, // INC $01
        0x40, // RTI
    ];
    let mut nes = Nes::new(&cartridge(4, 4, 1, &code, &[0x40], &irq)).unwrap();

    nes.run_frame(Buttons::empty());
    assert_eq!(nes.cpu().bus.ram[0x01], 1);

    // Disabled by the handler: no further interrupts.
    nes.run_frame(Buttons::empty());
    assert_eq!(nes.cpu().bus.ram[0x01], 1);
}

#[test]
fn txrom_irq_stays_quiet_with_rendering_off() {
    let mut code = vec![
        0xA9, 0x04, 0x8D, 0x00, 0xC0, // LDA #4; STA $C000
        0x8D, 0x01, 0xC0, // STA $C001
        0x8D, 0x01, 0xE0, // STA $E001
        0x58, // CLI
    ];
    spin(&mut code);
    let irq = [0x8D, 0x00, 0xE0, 0xE6, 0x01, 0x40];
    let mut nes = Nes::new(&cartridge(4, 4, 1, &code, &[0x40], &irq)).unwrap();

    nes.run_frame(Buttons::empty());
    nes.run_frame(Buttons::empty());

    assert_eq!(nes.cpu().bus.ram[0x01], 0);
}
