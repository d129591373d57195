//! Ricoh 2A03 CPU core: a 6502 without decimal mode.
//!
//! [`CPU::step`] runs one instruction (or services one interrupt) and returns the cycles it took.
//! The addressing mode comes from the opcode's `aaabbbcc` bit pattern ([`Mode::decode`]), the
//! operation from an exhaustive match; base costs live in [`CYCLES`] and page-crossing / taken
//! branch penalties are added on top.
//! See [CPU](https://www.nesdev.org/wiki/CPU) and
//! [unofficial opcodes](https://www.nesdev.org/wiki/CPU_unofficial_opcodes).

use crate::{
    bus::Bus,
    cpu::flags::{
        FLAG_BREAK, FLAG_CARRY, FLAG_DECIMAL, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE, FLAG_OVERFLOW,
        FLAG_UNUSED, FLAG_ZERO,
    },
    log::{self, Level},
};

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Cycles consumed by a halted CPU per step, so the rest of the console keeps running.
const JAMMED_STEP_CYCLES: u8 = 2;
const INTERRUPT_CYCLES: u8 = 7;

/// Base cycle count for every opcode, before page-crossing and branch penalties.
#[rustfmt::skip]
pub const CYCLES: [u8; 256] = [
//  0  1  2  3  4  5  6  7  8  9  A  B  C  D  E  F
    7, 6, 2, 8, 3, 3, 5, 5, 3, 2, 2, 2, 4, 4, 6, 6, // 0
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 1
    6, 6, 2, 8, 3, 3, 5, 5, 4, 2, 2, 2, 4, 4, 6, 6, // 2
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 3
    6, 6, 2, 8, 3, 3, 5, 5, 3, 2, 2, 2, 3, 4, 6, 6, // 4
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 5
    6, 6, 2, 8, 3, 3, 5, 5, 4, 2, 2, 2, 5, 4, 6, 6, // 6
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 7
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4, // 8
    2, 6, 2, 6, 4, 4, 4, 4, 2, 5, 2, 5, 5, 5, 5, 5, // 9
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4, // A
    2, 5, 2, 5, 4, 4, 4, 4, 2, 4, 2, 4, 4, 4, 4, 4, // B
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6, // C
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // D
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6, // E
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // F
];

/// 6502 addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

impl Mode {
    /// Addressing mode of `opcode`, read from its `aaabbbcc` layout: `bbb` picks the mode within
    /// a `cc` group, with a handful of exceptions.
    pub fn decode(opcode: u8) -> Mode {
        match opcode {
            0x20 => return Mode::Absolute,
            0x6C => return Mode::Indirect,
            0x00 | 0x40 | 0x60 => return Mode::Implied,
            // STX/LDX and SAX/LAX index with Y instead of X.
            0x96 | 0x97 | 0xB6 | 0xB7 => return Mode::ZeroPageY,
            0x9E | 0x9F | 0xBE | 0xBF => return Mode::AbsoluteY,
            _ => {}
        }

        let odd_column = opcode & 1 != 0;
        match (opcode >> 2) & 7 {
            0 if odd_column => Mode::IndirectX,
            0 if opcode >= 0x80 => Mode::Immediate,
            0 => Mode::Implied,
            1 => Mode::ZeroPage,
            2 if odd_column => Mode::Immediate,
            2 if opcode & 2 != 0 && opcode < 0x80 => Mode::Accumulator,
            2 => Mode::Implied,
            3 => Mode::Absolute,
            4 if odd_column => Mode::IndirectY,
            4 if opcode & 3 == 0 => Mode::Relative,
            4 => Mode::Implied,
            5 => Mode::ZeroPageX,
            6 if odd_column => Mode::AbsoluteY,
            6 => Mode::Implied,
            _ => Mode::AbsoluteX,
        }
    }

    /// Instruction length in bytes, opcode included.
    pub fn instruction_len(self) -> u16 {
        match self {
            Mode::Implied | Mode::Accumulator => 1,
            Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY | Mode::Indirect => 3,
            _ => 2,
        }
    }
}

pub struct CPU<B: Bus> {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
    pub cycles: usize,
    pub bus: B,
    /// Set by a JAM opcode; only reset clears it.
    pub halted: bool,
}

impl<B: Bus> CPU<B> {
    /// CPU with cleared registers. Call [`reset`](Self::reset) before stepping.
    pub fn new(bus: B) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0,
            pc: 0,
            status: 0,
            cycles: 0,
            bus,
            halted: false,
        }
    }

    /// Power-on reset.
    pub fn reset(&mut self) {
        self.pc = self.read_word(RESET_VECTOR);
        self.sp = 0xFD; // the reset sequence decrements SP three times from 0
        self.status = FLAG_INTERRUPT_DISABLE | FLAG_UNUSED;

        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.halted = false;

        self.cycles = 7;
    }

    /// Reset button: registers survive, SP drops by three, I is set.
    pub fn soft_reset(&mut self) {
        self.pc = self.read_word(RESET_VECTOR);
        self.sp = self.sp.wrapping_sub(3);
        self.status |= FLAG_INTERRUPT_DISABLE;
        self.halted = false;
        self.cycles += INTERRUPT_CYCLES as usize;
    }

    /// Execute one instruction, or enter a pending interrupt. Returns the cycles consumed.
    pub fn step(&mut self) -> u8 {
        if self.halted {
            self.cycles += JAMMED_STEP_CYCLES as usize;
            return JAMMED_STEP_CYCLES;
        }

        if self.bus.poll_nmi() {
            self.interrupt(NMI_VECTOR);
            return INTERRUPT_CYCLES;
        }
        if self.bus.irq_line() && self.status & FLAG_INTERRUPT_DISABLE == 0 {
            self.interrupt(IRQ_VECTOR);
            return INTERRUPT_CYCLES;
        }

        if log::enabled(Level::Trace) {
            let line = self.trace_line();
            crate::trace!("{line}");
        }

        let start = self.cycles;
        let opcode = self.fetch_byte();
        self.cycles += CYCLES[opcode as usize] as usize;
        self.execute(opcode, Mode::decode(opcode));
        (self.cycles - start) as u8
    }

    /// nestest-style line for the instruction at PC, read without side effects:
    /// `PPPP  OO B1 B2  A:AA X:XX Y:YY P:PP SP:SS CYC:N`.
    pub fn trace_line(&mut self) -> String {
        let opcode = self.bus.peek(self.pc);
        let len = Mode::decode(opcode).instruction_len();
        let bytes: Vec<String> = (0..len)
            .map(|i| format!("{:02X}", self.bus.peek(self.pc.wrapping_add(i))))
            .collect();
        format!(
            "{:04X}  {:<8}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            self.pc,
            bytes.join(" "),
            self.a,
            self.x,
            self.y,
            self.status,
            self.sp,
            self.cycles
        )
    }

    fn execute(&mut self, opcode: u8, mode: Mode) {
        match opcode {
            // Loads and stores
            0xA1 | 0xA5 | 0xA9 | 0xAD | 0xB1 | 0xB5 | 0xB9 | 0xBD => {
                self.a = self.read_operand(mode);
                self.update_zero_and_negative_flags(self.a);
            }
            0xA2 | 0xA6 | 0xAE | 0xB6 | 0xBE => {
                self.x = self.read_operand(mode);
                self.update_zero_and_negative_flags(self.x);
            }
            0xA0 | 0xA4 | 0xAC | 0xB4 | 0xBC => {
                self.y = self.read_operand(mode);
                self.update_zero_and_negative_flags(self.y);
            }
            0xA3 | 0xA7 | 0xAF | 0xB3 | 0xB7 | 0xBF => {
                let value = self.read_operand(mode);
                self.a = value;
                self.x = value;
                self.update_zero_and_negative_flags(value);
            }
            0x81 | 0x85 | 0x8D | 0x91 | 0x95 | 0x99 | 0x9D => self.store(mode, self.a),
            0x86 | 0x8E | 0x96 => self.store(mode, self.x),
            0x84 | 0x8C | 0x94 => self.store(mode, self.y),
            0x83 | 0x87 | 0x8F | 0x97 => self.store(mode, self.a & self.x),

            // ALU
            0x01 | 0x05 | 0x09 | 0x0D | 0x11 | 0x15 | 0x19 | 0x1D => {
                let value = self.read_operand(mode);
                self.ora(value);
            }
            0x21 | 0x25 | 0x29 | 0x2D | 0x31 | 0x35 | 0x39 | 0x3D => {
                let value = self.read_operand(mode);
                self.and(value);
            }
            0x41 | 0x45 | 0x49 | 0x4D | 0x51 | 0x55 | 0x59 | 0x5D => {
                let value = self.read_operand(mode);
                self.eor(value);
            }
            0x61 | 0x65 | 0x69 | 0x6D | 0x71 | 0x75 | 0x79 | 0x7D => {
                let value = self.read_operand(mode);
                self.adc(value);
            }
            0xE1 | 0xE5 | 0xE9 | 0xEB | 0xED | 0xF1 | 0xF5 | 0xF9 | 0xFD => {
                let value = self.read_operand(mode);
                self.sbc(value);
            }
            0xC1 | 0xC5 | 0xC9 | 0xCD | 0xD1 | 0xD5 | 0xD9 | 0xDD => {
                let value = self.read_operand(mode);
                self.compare(self.a, value);
            }
            0xE0 | 0xE4 | 0xEC => {
                let value = self.read_operand(mode);
                self.compare(self.x, value);
            }
            0xC0 | 0xC4 | 0xCC => {
                let value = self.read_operand(mode);
                self.compare(self.y, value);
            }
            0x24 | 0x2C => {
                let value = self.read_operand(mode);
                self.set_flag(FLAG_ZERO, self.a & value == 0);
                self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
                self.set_flag(FLAG_OVERFLOW, value & 0x40 != 0);
            }

            // Read-modify-write
            0x06 | 0x0A | 0x0E | 0x16 | 0x1E => {
                self.read_modify_write(mode, Self::asl);
            }
            0x46 | 0x4A | 0x4E | 0x56 | 0x5E => {
                self.read_modify_write(mode, Self::lsr);
            }
            0x26 | 0x2A | 0x2E | 0x36 | 0x3E => {
                self.read_modify_write(mode, Self::rol);
            }
            0x66 | 0x6A | 0x6E | 0x76 | 0x7E => {
                self.read_modify_write(mode, Self::ror);
            }
            0xE6 | 0xEE | 0xF6 | 0xFE => {
                self.read_modify_write(mode, Self::inc);
            }
            0xC6 | 0xCE | 0xD6 | 0xDE => {
                self.read_modify_write(mode, Self::dec);
            }

            // Unofficial read-modify-write combos
            0x03 | 0x07 | 0x0F | 0x13 | 0x17 | 0x1B | 0x1F => {
                let value = self.read_modify_write(mode, Self::asl);
                self.ora(value);
            }
            0x23 | 0x27 | 0x2F | 0x33 | 0x37 | 0x3B | 0x3F => {
                let value = self.read_modify_write(mode, Self::rol);
                self.and(value);
            }
            0x43 | 0x47 | 0x4F | 0x53 | 0x57 | 0x5B | 0x5F => {
                let value = self.read_modify_write(mode, Self::lsr);
                self.eor(value);
            }
            0x63 | 0x67 | 0x6F | 0x73 | 0x77 | 0x7B | 0x7F => {
                let value = self.read_modify_write(mode, Self::ror);
                self.adc(value);
            }
            0xC3 | 0xC7 | 0xCF | 0xD3 | 0xD7 | 0xDB | 0xDF => {
                let value = self.read_modify_write(mode, Self::dec);
                self.compare(self.a, value);
            }
            0xE3 | 0xE7 | 0xEF | 0xF3 | 0xF7 | 0xFB | 0xFF => {
                let value = self.read_modify_write(mode, Self::inc);
                self.sbc(value);
            }

            // Unofficial immediates
            0x0B | 0x2B => {
                let value = self.read_operand(mode);
                self.and(value);
                self.set_flag(FLAG_CARRY, self.a & 0x80 != 0);
            }
            0x4B => {
                let value = self.read_operand(mode);
                self.and(value);
                self.a = self.lsr(self.a);
            }
            0x6B => {
                let value = self.read_operand(mode);
                self.and(value);
                let carry_in = self.status & FLAG_CARRY;
                self.a = (self.a >> 1) | (carry_in << 7);
                self.update_zero_and_negative_flags(self.a);
                self.set_flag(FLAG_CARRY, self.a & 0x40 != 0);
                self.set_flag(FLAG_OVERFLOW, ((self.a >> 6) ^ (self.a >> 5)) & 1 != 0);
            }
            0x8B => {
                // XAA: unstable on hardware; $EE is the commonly observed magic constant.
                let value = self.read_operand(mode);
                self.a = (self.a | 0xEE) & self.x & value;
                self.update_zero_and_negative_flags(self.a);
            }
            0xAB => {
                let value = self.read_operand(mode);
                self.a = (self.a | 0xEE) & value;
                self.x = self.a;
                self.update_zero_and_negative_flags(self.a);
            }
            0xCB => {
                let value = self.read_operand(mode);
                let ax = self.a & self.x;
                self.set_flag(FLAG_CARRY, ax >= value);
                self.x = ax.wrapping_sub(value);
                self.update_zero_and_negative_flags(self.x);
            }
            0xBB => {
                let value = self.read_operand(mode) & self.sp;
                self.a = value;
                self.x = value;
                self.sp = value;
                self.update_zero_and_negative_flags(value);
            }

            // Unofficial stores ANDed with the high address byte + 1
            0x93 | 0x9F => self.store_high_and(mode, self.a & self.x),
            0x9E => self.store_high_and(mode, self.x),
            0x9C => self.store_high_and(mode, self.y),
            0x9B => {
                self.sp = self.a & self.x;
                self.store_high_and(mode, self.sp);
            }

            // Increments, decrements and transfers
            0xE8 => {
                self.x = self.x.wrapping_add(1);
                self.update_zero_and_negative_flags(self.x);
            }
            0xC8 => {
                self.y = self.y.wrapping_add(1);
                self.update_zero_and_negative_flags(self.y);
            }
            0xCA => {
                self.x = self.x.wrapping_sub(1);
                self.update_zero_and_negative_flags(self.x);
            }
            0x88 => {
                self.y = self.y.wrapping_sub(1);
                self.update_zero_and_negative_flags(self.y);
            }
            0xAA => {
                self.x = self.a;
                self.update_zero_and_negative_flags(self.x);
            }
            0xA8 => {
                self.y = self.a;
                self.update_zero_and_negative_flags(self.y);
            }
            0x8A => {
                self.a = self.x;
                self.update_zero_and_negative_flags(self.a);
            }
            0x98 => {
                self.a = self.y;
                self.update_zero_and_negative_flags(self.a);
            }
            0xBA => {
                self.x = self.sp;
                self.update_zero_and_negative_flags(self.x);
            }
            0x9A => self.sp = self.x,

            // Stack
            0x48 => self.push(self.a),
            0x08 => self.push(self.status | FLAG_BREAK | FLAG_UNUSED),
            0x68 => {
                self.a = self.pop();
                self.update_zero_and_negative_flags(self.a);
            }
            0x28 => self.status = (self.pop() & !FLAG_BREAK) | FLAG_UNUSED,

            // Flags
            0x18 => self.status &= !FLAG_CARRY,
            0x38 => self.status |= FLAG_CARRY,
            0x58 => self.status &= !FLAG_INTERRUPT_DISABLE,
            0x78 => self.status |= FLAG_INTERRUPT_DISABLE,
            0xB8 => self.status &= !FLAG_OVERFLOW,
            0xD8 => self.status &= !FLAG_DECIMAL,
            0xF8 => self.status |= FLAG_DECIMAL,

            // Branches
            0x10 => self.branch(self.status & FLAG_NEGATIVE == 0),
            0x30 => self.branch(self.status & FLAG_NEGATIVE != 0),
            0x50 => self.branch(self.status & FLAG_OVERFLOW == 0),
            0x70 => self.branch(self.status & FLAG_OVERFLOW != 0),
            0x90 => self.branch(self.status & FLAG_CARRY == 0),
            0xB0 => self.branch(self.status & FLAG_CARRY != 0),
            0xD0 => self.branch(self.status & FLAG_ZERO == 0),
            0xF0 => self.branch(self.status & FLAG_ZERO != 0),

            // Jumps, subroutines, interrupts
            0x4C | 0x6C => self.pc = self.operand_address(mode).0,
            0x20 => {
                let target = self.fetch_word();
                let ret = self.pc.wrapping_sub(1);
                self.push_word(ret);
                self.pc = target;
            }
            0x60 => self.pc = self.pop_word().wrapping_add(1),
            0x40 => {
                self.status = (self.pop() & !FLAG_BREAK) | FLAG_UNUSED;
                self.pc = self.pop_word();
            }
            0x00 => {
                self.pc = self.pc.wrapping_add(1); // +1 because of padding byte
                self.push_word(self.pc);
                self.push(self.status | FLAG_BREAK | FLAG_UNUSED);
                self.status |= FLAG_INTERRUPT_DISABLE;
                self.pc = self.read_word(IRQ_VECTOR);
            }

            // NOPs, official and not; the addressed ones still perform their read.
            0xEA | 0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => {}
            0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 | 0x04 | 0x44 | 0x64 | 0x14 | 0x34 | 0x54 | 0x74
            | 0xD4 | 0xF4 | 0x0C | 0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => {
                self.read_operand(mode);
            }

            // $02, $12, $22, $32, $42, $52, $62, $72, $92, $B2, $D2, $F2
            _ => self.jam(opcode),
        }
    }

    fn jam(&mut self, opcode: u8) {
        self.pc = self.pc.wrapping_sub(1);
        self.halted = true;
        crate::warn!("cpu: jammed by opcode ${:02X} at ${:04X}", opcode, self.pc);
    }

    /// Push PC and P (B clear), set I, jump through `vector`.
    fn interrupt(&mut self, vector: u16) {
        self.push_word(self.pc);
        self.push((self.status & !FLAG_BREAK) | FLAG_UNUSED);
        self.status |= FLAG_INTERRUPT_DISABLE;
        self.pc = self.read_word(vector);
        self.cycles += INTERRUPT_CYCLES as usize;
    }

    fn fetch_byte(&mut self) -> u8 {
        let byte = self.bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    fn fetch_word(&mut self) -> u16 {
        let lo = self.fetch_byte() as u16;
        let hi = self.fetch_byte() as u16;
        (hi << 8) | lo
    }

    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.bus.read(addr) as u16;
        let hi = self.bus.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Pointer stored in page zero; the high byte wraps around to $00.
    fn read_zero_page_word(&mut self, ptr: u8) -> u16 {
        let lo = self.bus.read(ptr as u16) as u16;
        let hi = self.bus.read(ptr.wrapping_add(1) as u16) as u16;
        (hi << 8) | lo
    }

    /// Effective address of the operand, and whether indexing crossed a page.
    fn operand_address(&mut self, mode: Mode) -> (u16, bool) {
        match mode {
            Mode::Immediate | Mode::Relative => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                (addr, false)
            }
            Mode::ZeroPage => (self.fetch_byte() as u16, false),
            Mode::ZeroPageX => (self.fetch_byte().wrapping_add(self.x) as u16, false),
            Mode::ZeroPageY => (self.fetch_byte().wrapping_add(self.y) as u16, false),
            Mode::Absolute => (self.fetch_word(), false),
            Mode::AbsoluteX => {
                let base = self.fetch_word();
                indexed(base, self.x)
            }
            Mode::AbsoluteY => {
                let base = self.fetch_word();
                indexed(base, self.y)
            }
            Mode::Indirect => {
                let ptr = self.fetch_word();
                let lo = self.bus.read(ptr) as u16;
                // Page-boundary bug: the high byte is fetched from the start of the same page.
                let hi = self.bus.read((ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF)) as u16;
                ((hi << 8) | lo, false)
            }
            Mode::IndirectX => {
                let ptr = self.fetch_byte().wrapping_add(self.x);
                (self.read_zero_page_word(ptr), false)
            }
            Mode::IndirectY => {
                let ptr = self.fetch_byte();
                let base = self.read_zero_page_word(ptr);
                indexed(base, self.y)
            }
            // No operand in memory.
            Mode::Implied | Mode::Accumulator => (self.pc, false),
        }
    }

    /// Operand for read instructions; crossing a page costs one extra cycle.
    fn read_operand(&mut self, mode: Mode) -> u8 {
        if mode == Mode::Accumulator {
            return self.a;
        }
        let (addr, crossed) = self.operand_address(mode);
        if crossed {
            self.cycles += 1;
        }
        self.bus.read(addr)
    }

    fn store(&mut self, mode: Mode, value: u8) {
        let (addr, _) = self.operand_address(mode);
        self.bus.write(addr, value);
    }

    /// SHA/SHX/SHY/TAS: store `value & (H + 1)`, H being the high byte of the unindexed base.
    /// When indexing crosses a page the result also replaces the high byte of the target.
    fn store_high_and(&mut self, mode: Mode, value: u8) {
        let (addr, crossed) = self.operand_address(mode);
        let hi = (addr >> 8) as u8;
        let base_hi = if crossed { hi.wrapping_sub(1) } else { hi };
        let result = value & base_hi.wrapping_add(1);
        let target = if crossed {
            ((result as u16) << 8) | (addr & 0x00FF)
        } else {
            addr
        };
        self.bus.write(target, result);
    }

    /// Apply `op` to the accumulator or to memory; returns the new value.
    fn read_modify_write(&mut self, mode: Mode, op: fn(&mut Self, u8) -> u8) -> u8 {
        if mode == Mode::Accumulator {
            let value = self.a;
            self.a = op(self, value);
            return self.a;
        }
        let (addr, _) = self.operand_address(mode);
        let value = self.bus.read(addr);
        let result = op(self, value);
        self.bus.write(addr, result);
        result
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.set_flag(FLAG_CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.set_flag(FLAG_CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = self.status & FLAG_CARRY;
        self.set_flag(FLAG_CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = self.status & FLAG_CARRY;
        self.set_flag(FLAG_CARRY, value & 0x01 != 0);
        let result = (value >> 1) | (carry_in << 7);
        self.update_zero_and_negative_flags(result);
        result
    }

    fn inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.update_zero_and_negative_flags(result);
        result
    }

    fn dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.update_zero_and_negative_flags(result);
        result
    }

    fn ora(&mut self, value: u8) {
        self.a |= value;
        self.update_zero_and_negative_flags(self.a);
    }

    fn and(&mut self, value: u8) {
        self.a &= value;
        self.update_zero_and_negative_flags(self.a);
    }

    fn eor(&mut self, value: u8) {
        self.a ^= value;
        self.update_zero_and_negative_flags(self.a);
    }

    /// Binary add with carry. The decimal flag has no effect on the 2A03.
    fn adc(&mut self, value: u8) {
        let sum = self.a as u16 + value as u16 + (self.status & FLAG_CARRY) as u16;
        let result = sum as u8;
        self.set_flag(FLAG_CARRY, sum > 0xFF);
        self.set_flag(
            FLAG_OVERFLOW,
            (!(self.a ^ value) & (self.a ^ result)) & 0x80 != 0,
        );
        self.a = result;
        self.update_zero_and_negative_flags(self.a);
    }

    fn sbc(&mut self, value: u8) {
        self.adc(!value);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.set_flag(FLAG_CARRY, register >= value);
        self.update_zero_and_negative_flags(register.wrapping_sub(value));
    }

    /// Taken branches cost one extra cycle, two if the target is on another page.
    fn branch(&mut self, condition: bool) {
        let offset = self.fetch_byte() as i8;
        if condition {
            let target = self.pc.wrapping_add(offset as u16);
            self.cycles += 1;
            if (self.pc & 0xFF00) != (target & 0xFF00) {
                self.cycles += 1;
            }
            self.pc = target;
        }
    }

    fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.status |= flag;
        } else {
            self.status &= !flag;
        }
    }

    fn update_zero_and_negative_flags(&mut self, value: u8) {
        self.set_flag(FLAG_ZERO, value == 0);
        self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
    }

    fn push(&mut self, value: u8) {
        let addr = 0x0100 | self.sp as u16;
        self.bus.write(addr, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        let addr = 0x0100 | self.sp as u16;
        self.bus.read(addr)
    }

    fn push_word(&mut self, value: u16) {
        self.push((value >> 8) as u8);
        self.push(value as u8);
    }

    fn pop_word(&mut self) -> u16 {
        let lo = self.pop() as u16;
        let hi = self.pop() as u16;
        (hi << 8) | lo
    }
}

fn indexed(base: u16, index: u8) -> (u16, bool) {
    let addr = base.wrapping_add(index as u16);
    (addr, (base & 0xFF00) != (addr & 0xFF00))
}
