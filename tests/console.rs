//! Whole-console tests: CPU, PPU, bus and cartridge running together through `Nes`.

mod common;

use common::{CODE, cartridge, read_pad, spin};
use famicore::{Buttons, CartridgeError, Nes};

const DOTS_PER_FRAME: usize = 341 * 262;

fn nes(code: &[u8], nmi: &[u8]) -> Nes {
    Nes::new(&cartridge(0, 1, 1, code, nmi, &[0x40])).unwrap()
}

/// PPU dots run so far; the PPU only moves while the CPU consumes cycles after reset.
fn dots(nes: &Nes) -> usize {
    3 * (nes.cpu().cycles - 7)
}

#[test]
fn powers_on_at_the_reset_vector() {
    let mut code = vec![];
    spin(&mut code);
    let nes = nes(&code, &[0x40]);

    let cpu = nes.cpu();
    assert_eq!(cpu.pc, CODE);
    assert_eq!(cpu.sp, 0xFD);
    assert_eq!(cpu.status, 0x24);
    assert_eq!(nes.frame_count(), 0);
}

#[test]
fn every_frame_is_341_by_262_dots() {
    let mut code = vec![];
    spin(&mut code);
    let mut nes = nes(&code, &[0x40]);

    for frame in 0..4 {
        assert_eq!(nes.run_frame(Buttons::empty()).len(), 256 * 240);

        let ppu = &nes.cpu().bus.ppu;
        assert_eq!(ppu.scanline(), 241);
        let position = ppu.scanline() as usize * 341 + ppu.dot() as usize;
        assert_eq!(dots(&nes) % DOTS_PER_FRAME, position);
        assert_eq!(dots(&nes) / DOTS_PER_FRAME, frame);
    }
    assert_eq!(nes.frame_count(), 4);
}

#[test]
fn exactly_one_nmi_per_frame() {
    let mut code = vec![
        0xA9, 0x80, 0x8D, 0x00, 0x20, // LDA #$80; STA $2000
    ];
    spin(&mut code);
    let nmi = [
        0xE6, 0x00, // INC $00
        0x40, // RTI
    ];
    let mut nes = nes(&code, &nmi);

    // Each vblank's NMI is taken at the start of the following frame.
    for frame in 1..=5u8 {
        nes.run_frame(Buttons::empty());
        assert_eq!(nes.cpu().bus.ram[0x00], frame - 1);
    }
}

#[test]
fn no_nmi_while_disabled() {
    let mut code = vec![];
    spin(&mut code);
    let mut nes = nes(&code, &[0xE6, 0x00, 0x40]);

    for _ in 0..3 {
        nes.run_frame(Buttons::empty());
    }
    assert_eq!(nes.cpu().bus.ram[0x00], 0);
}

#[test]
fn controller_reports_the_frame_buttons() {
    let mut code = vec![];
    read_pad(&mut code);
    spin(&mut code);
    let mut nes = nes(&code, &[0x40]);

    nes.run_frame(Buttons::A | Buttons::START);

    // Serial order: A, B, Select, Start, Up, Down, Left, Right.
    assert_eq!(nes.cpu().bus.ram[0x20], 0b1001_0000);
}

/// Palette $3F01 = white, scroll at the origin, background on, then read the pad forever.
fn drawing_program() -> Vec<u8> {
    let mut code = vec![
        0xA9, 0x3F, 0x8D, 0x06, 0x20, // LDA #$3F; STA $2006
        0xA9, 0x01, 0x8D, 0x06, 0x20, // LDA #$01; STA $2006
        0xA9, 0x30, 0x8D, 0x07, 0x20, // LDA #$30; STA $2007
        0xA9, 0x00, 0x8D, 0x00, 0x20, // LDA #$00; STA $2000
        0x8D, 0x05, 0x20, 0x8D, 0x05, 0x20, // STA $2005; STA $2005
        0xA9, 0x1E, 0x8D, 0x01, 0x20, // LDA #$1E; STA $2001
    ];
    let loop_start = CODE + code.len() as u16;
    read_pad(&mut code);
    code.extend([0x4C, loop_start as u8, (loop_start >> 8) as u8]);
    code
}

#[test]
fn draws_the_background() {
    let mut nes = nes(&drawing_program(), &[0x40]);
    nes.run_frame(Buttons::empty());
    let frame = nes.run_frame(Buttons::empty());

    // Every tile lights its leftmost column.
    let row = 100 * 256;
    assert_ne!(frame[row], frame[row + 1]);
    assert_eq!(frame[row], frame[row + 8]);
    assert_eq!(frame[row + 1], frame[row + 7]);
    // Overscan stays black.
    assert!(frame[..8 * 256].iter().all(|&pixel| pixel == 0));
}

#[test]
fn identical_inputs_give_identical_frames() {
    let image = cartridge(0, 1, 1, &drawing_program(), &[0x40], &[0x40]);
    let inputs = [
        Buttons::empty(),
        Buttons::A,
        Buttons::LEFT | Buttons::B,
        Buttons::START,
        Buttons::empty(),
    ];

    let run = || {
        let mut nes = Nes::new(&image).unwrap();
        let frames: Vec<Vec<u32>> = inputs
            .iter()
            .map(|&buttons| nes.run_frame(buttons).to_vec())
            .collect();
        (frames, nes.cpu().cycles, nes.cpu().bus.ram)
    };

    assert!(run() == run());
}

#[test]
fn reset_button_restarts_the_program() {
    let mut code = vec![
        0xE6, 0x01, // INC $01
    ];
    spin(&mut code);
    let mut nes = nes(&code, &[0x40]);

    nes.run_frame(Buttons::empty());
    assert_eq!(nes.cpu().bus.ram[0x01], 1);

    nes.reset();
    assert_eq!(nes.cpu().pc, CODE);
    assert_eq!(nes.cpu().sp, 0xFA);

    nes.run_frame(Buttons::empty());
    assert_eq!(nes.cpu().bus.ram[0x01], 2);
}

#[test]
fn rejects_bad_images() {
    assert!(matches!(
        Nes::new(b"not a rom"),
        Err(CartridgeError::InvalidImage(_))
    ));

    let image = cartridge(5, 1, 1, &[], &[], &[]);
    assert!(matches!(
        Nes::new(&image),
        Err(CartridgeError::UnsupportedMapper(5))
    ));
}
