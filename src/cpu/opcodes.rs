//! Decode table for the 151 documented 6502 opcodes.

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    ADC, AND, ASL, BCC, BCS, BEQ, BIT, BMI, BNE, BPL, BRK, BVC, BVS, CLC,
    CLD, CLI, CLV, CMP, CPX, CPY, DEC, DEX, DEY, EOR, INC, INX, INY, JMP,
    JSR, LDA, LDX, LDY, LSR, NOP, ORA, PHA, PHP, PLA, PLP, ROL, ROR, RTI,
    RTS, SBC, SEC, SED, SEI, STA, STX, STY, TAX, TAY, TSX, TXA, TXS, TYA,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
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

impl AddressingMode {
    /// Operand bytes following the opcode.
    pub const fn operand_len(self) -> u16 {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub code: u8,
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    pub cycles: u8,
    /// +1 cycle when the effective address crosses a page.
    pub page_penalty: bool,
}

impl Opcode {
    pub const fn len(&self) -> u16 {
        1 + self.mode.operand_len()
    }
}

const fn op(code: u8, mnemonic: Mnemonic, mode: AddressingMode, cycles: u8, page_penalty: bool) -> Opcode {
    Opcode {
        code,
        mnemonic,
        mode,
        cycles,
        page_penalty,
    }
}

use AddressingMode::*;
use Mnemonic::*;

#[rustfmt::skip]
const OFFICIAL: [Opcode; 151] = [
    op(0x69, ADC, Immediate, 2, false), op(0x65, ADC, ZeroPage, 3, false),
    op(0x75, ADC, ZeroPageX, 4, false), op(0x6d, ADC, Absolute, 4, false),
    op(0x7d, ADC, AbsoluteX, 4, true),  op(0x79, ADC, AbsoluteY, 4, true),
    op(0x61, ADC, IndirectX, 6, false), op(0x71, ADC, IndirectY, 5, true),

    op(0x29, AND, Immediate, 2, false), op(0x25, AND, ZeroPage, 3, false),
    op(0x35, AND, ZeroPageX, 4, false), op(0x2d, AND, Absolute, 4, false),
    op(0x3d, AND, AbsoluteX, 4, true),  op(0x39, AND, AbsoluteY, 4, true),
    op(0x21, AND, IndirectX, 6, false), op(0x31, AND, IndirectY, 5, true),

    op(0x0a, ASL, Accumulator, 2, false), op(0x06, ASL, ZeroPage, 5, false),
    op(0x16, ASL, ZeroPageX, 6, false),   op(0x0e, ASL, Absolute, 6, false),
    op(0x1e, ASL, AbsoluteX, 7, false),

    op(0x90, BCC, Relative, 2, false), op(0xb0, BCS, Relative, 2, false),
    op(0xf0, BEQ, Relative, 2, false), op(0x30, BMI, Relative, 2, false),
    op(0xd0, BNE, Relative, 2, false), op(0x10, BPL, Relative, 2, false),
    op(0x50, BVC, Relative, 2, false), op(0x70, BVS, Relative, 2, false),

    op(0x24, BIT, ZeroPage, 3, false), op(0x2c, BIT, Absolute, 4, false),

    op(0x00, BRK, Implied, 7, false),

    op(0x18, CLC, Implied, 2, false), op(0xd8, CLD, Implied, 2, false),
    op(0x58, CLI, Implied, 2, false), op(0xb8, CLV, Implied, 2, false),

    op(0xc9, CMP, Immediate, 2, false), op(0xc5, CMP, ZeroPage, 3, false),
    op(0xd5, CMP, ZeroPageX, 4, false), op(0xcd, CMP, Absolute, 4, false),
    op(0xdd, CMP, AbsoluteX, 4, true),  op(0xd9, CMP, AbsoluteY, 4, true),
    op(0xc1, CMP, IndirectX, 6, false), op(0xd1, CMP, IndirectY, 5, true),

    op(0xe0, CPX, Immediate, 2, false), op(0xe4, CPX, ZeroPage, 3, false),
    op(0xec, CPX, Absolute, 4, false),
    op(0xc0, CPY, Immediate, 2, false), op(0xc4, CPY, ZeroPage, 3, false),
    op(0xcc, CPY, Absolute, 4, false),

    op(0xc6, DEC, ZeroPage, 5, false),  op(0xd6, DEC, ZeroPageX, 6, false),
    op(0xce, DEC, Absolute, 6, false),  op(0xde, DEC, AbsoluteX, 7, false),
    op(0xca, DEX, Implied, 2, false),   op(0x88, DEY, Implied, 2, false),

    op(0x49, EOR, Immediate, 2, false), op(0x45, EOR, ZeroPage, 3, false),
    op(0x55, EOR, ZeroPageX, 4, false), op(0x4d, EOR, Absolute, 4, false),
    op(0x5d, EOR, AbsoluteX, 4, true),  op(0x59, EOR, AbsoluteY, 4, true),
    op(0x41, EOR, IndirectX, 6, false), op(0x51, EOR, IndirectY, 5, true),

    op(0xe6, INC, ZeroPage, 5, false),  op(0xf6, INC, ZeroPageX, 6, false),
    op(0xee, INC, Absolute, 6, false),  op(0xfe, INC, AbsoluteX, 7, false),
    op(0xe8, INX, Implied, 2, false),   op(0xc8, INY, Implied, 2, false),

    op(0x4c, JMP, Absolute, 3, false),  op(0x6c, JMP, Indirect, 5, false),
    op(0x20, JSR, Absolute, 6, false),

    op(0xa9, LDA, Immediate, 2, false), op(0xa5, LDA, ZeroPage, 3, false),
    op(0xb5, LDA, ZeroPageX, 4, false), op(0xad, LDA, Absolute, 4, false),
    op(0xbd, LDA, AbsoluteX, 4, true),  op(0xb9, LDA, AbsoluteY, 4, true),
    op(0xa1, LDA, IndirectX, 6, false), op(0xb1, LDA, IndirectY, 5, true),

    op(0xa2, LDX, Immediate, 2, false), op(0xa6, LDX, ZeroPage, 3, false),
    op(0xb6, LDX, ZeroPageY, 4, false), op(0xae, LDX, Absolute, 4, false),
    op(0xbe, LDX, AbsoluteY, 4, true),

    op(0xa0, LDY, Immediate, 2, false), op(0xa4, LDY, ZeroPage, 3, false),
    op(0xb4, LDY, ZeroPageX, 4, false), op(0xac, LDY, Absolute, 4, false),
    op(0xbc, LDY, AbsoluteX, 4, true),

    op(0x4a, LSR, Accumulator, 2, false), op(0x46, LSR, ZeroPage, 5, false),
    op(0x56, LSR, ZeroPageX, 6, false),   op(0x4e, LSR, Absolute, 6, false),
    op(0x5e, LSR, AbsoluteX, 7, false),

    op(0xea, NOP, Implied, 2, false),

    op(0x09, ORA, Immediate, 2, false), op(0x05, ORA, ZeroPage, 3, false),
    op(0x15, ORA, ZeroPageX, 4, false), op(0x0d, ORA, Absolute, 4, false),
    op(0x1d, ORA, AbsoluteX, 4, true),  op(0x19, ORA, AbsoluteY, 4, true),
    op(0x01, ORA, IndirectX, 6, false), op(0x11, ORA, IndirectY, 5, true),

    op(0x48, PHA, Implied, 3, false), op(0x08, PHP, Implied, 3, false),
    op(0x68, PLA, Implied, 4, false), op(0x28, PLP, Implied, 4, false),

    op(0x2a, ROL, Accumulator, 2, false), op(0x26, ROL, ZeroPage, 5, false),
    op(0x36, ROL, ZeroPageX, 6, false),   op(0x2e, ROL, Absolute, 6, false),
    op(0x3e, ROL, AbsoluteX, 7, false),

    op(0x6a, ROR, Accumulator, 2, false), op(0x66, ROR, ZeroPage, 5, false),
    op(0x76, ROR, ZeroPageX, 6, false),   op(0x6e, ROR, Absolute, 6, false),
    op(0x7e, ROR, AbsoluteX, 7, false),

    op(0x40, RTI, Implied, 6, false), op(0x60, RTS, Implied, 6, false),

    op(0xe9, SBC, Immediate, 2, false), op(0xe5, SBC, ZeroPage, 3, false),
    op(0xf5, SBC, ZeroPageX, 4, false), op(0xed, SBC, Absolute, 4, false),
    op(0xfd, SBC, AbsoluteX, 4, true),  op(0xf9, SBC, AbsoluteY, 4, true),
    op(0xe1, SBC, IndirectX, 6, false), op(0xf1, SBC, IndirectY, 5, true),

    op(0x38, SEC, Implied, 2, false), op(0xf8, SED, Implied, 2, false),
    op(0x78, SEI, Implied, 2, false),

    op(0x85, STA, ZeroPage, 3, false),  op(0x95, STA, ZeroPageX, 4, false),
    op(0x8d, STA, Absolute, 4, false),  op(0x9d, STA, AbsoluteX, 5, false),
    op(0x99, STA, AbsoluteY, 5, false), op(0x81, STA, IndirectX, 6, false),
    op(0x91, STA, IndirectY, 6, false),

    op(0x86, STX, ZeroPage, 3, false),  op(0x96, STX, ZeroPageY, 4, false),
    op(0x8e, STX, Absolute, 4, false),
    op(0x84, STY, ZeroPage, 3, false),  op(0x94, STY, ZeroPageX, 4, false),
    op(0x8c, STY, Absolute, 4, false),

    op(0xaa, TAX, Implied, 2, false), op(0xa8, TAY, Implied, 2, false),
    op(0xba, TSX, Implied, 2, false), op(0x8a, TXA, Implied, 2, false),
    op(0x9a, TXS, Implied, 2, false), op(0x98, TYA, Implied, 2, false),
];

const fn build_table() -> [Option<Opcode>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < OFFICIAL.len() {
        table[OFFICIAL[i].code as usize] = Some(OFFICIAL[i]);
        i += 1;
    }
    table
}

pub static OPCODE_TABLE: [Option<Opcode>; 256] = build_table();

pub fn decode(code: u8) -> Option<&'static Opcode> {
    OPCODE_TABLE[code as usize].as_ref()
}

#[cfg(test)]
mod opcodes_test {
    use super::*;

    #[test]
    fn test_official_count() {
        assert_eq!(OPCODE_TABLE.iter().flatten().count(), 151);
    }

    #[test]
    fn test_entries_sit_at_their_code() {
        for (code, entry) in OPCODE_TABLE.iter().enumerate() {
            if let Some(opcode) = entry {
                assert_eq!(opcode.code as usize, code);
            }
        }
    }

    #[test]
    fn test_known_entries() {
        let lda = decode(0xb1).unwrap();
        assert_eq!((lda.mnemonic, lda.mode, lda.cycles), (LDA, IndirectY, 5));
        assert!(lda.page_penalty);
        assert_eq!(lda.len(), 2);

        let sta = decode(0x9d).unwrap();
        assert!(!sta.page_penalty);
        assert_eq!(sta.cycles, 5);

        assert_eq!(decode(0x6c).unwrap().len(), 3);
        assert!(decode(0x02).is_none());
        assert!(decode(0xff).is_none());
    }
}
