//! In-memory iNES images for driving the whole console.
#![allow(dead_code)]

/// Reset entry point; lives in the last 8 KiB of PRG so every board maps it at power-on.
pub const CODE: u16 = 0xE000;
pub const NMI_HANDLER: u16 = 0xE800;
pub const IRQ_HANDLER: u16 = 0xEC00;

const PRG_BANK: usize = 0x4000;
const CHR_BANK: usize = 0x2000;

/// Build an iNES image. Every 16 KiB PRG bank is filled with its own index; the last one also
/// carries `code`, the two handlers and the vectors. CHR tiles have a single lit column on the left.
pub fn cartridge(
    mapper: u8,
    prg_banks: usize,
    chr_banks: usize,
    code: &[u8],
    nmi: &[u8],
    irq: &[u8],
) -> Vec<u8> {
    let mut image = vec![0u8; 16];
    image[0..4].copy_from_slice(b"NES\x1A");
    image[4] = prg_banks as u8;
    image[5] = chr_banks as u8;
    image[6] = (mapper << 4) | 0x01; // vertical mirroring
    image[7] = mapper & 0xF0;

    let mut prg: Vec<u8> = (0..prg_banks)
        .flat_map(|bank| std::iter::repeat_n(bank as u8, PRG_BANK))
        .collect();
    let last = (prg_banks - 1) * PRG_BANK;
    let place = |prg: &mut Vec<u8>, addr: u16, bytes: &[u8]| {
        let at = last + (addr as usize - 0xC000);
        prg[at..at + bytes.len()].copy_from_slice(bytes);
    };
    place(&mut prg, CODE, code);
    place(&mut prg, NMI_HANDLER, nmi);
    place(&mut prg, IRQ_HANDLER, irq);
    let vectors = [NMI_HANDLER, CODE, IRQ_HANDLER]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect::<Vec<u8>>();
    place(&mut prg, 0xFFFA, &vectors);
    image.extend(prg);

    for _ in 0..chr_banks * CHR_BANK / 16 {
        image.extend([0x80; 8]); // plane 0
        image.extend([0x00; 8]); // plane 1
    }
    image
}

/// Append `JMP *` at the end of a program that starts at [`CODE`].
pub fn spin(code: &mut Vec<u8>) {
    let here = CODE + code.len() as u16;
    code.extend([0x4C, here as u8, (here >> 8) as u8]);
}

/// Strobe the pad and shift its eight buttons into $20 (first button read ends up in bit 7).
pub fn read_pad(code: &mut Vec<u8>) {
    code.extend([
        0xA9, 0x01, 0x8D, 0x16, 0x40, // LDA #1; STA $4016
        0xA9, 0x00, 0x8D, 0x16, 0x40, // LDA #0; STA $4016
        0xA2, 0x08, // LDX #8
        0xAD, 0x16, 0x40, // LDA $4016
        0x4A, // LSR A
        0x26, 0x20, // ROL $20
        0xCA, // DEX
        0xD0, 0xF7, // BNE -9
    ]);
}
