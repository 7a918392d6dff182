// Opcode decode table for the 6502
//
// One entry per opcode byte: mnemonic, addressing mode, base cycle cost,
// instruction length, and whether a page-crossing index read costs an extra
// cycle. Unofficial opcodes decode as 2-cycle single-byte NOPs.

use crate::cpu::addressing::AddressingMode;
use AddressingMode::*;

/// Decoded opcode attributes
pub struct OpcodeInfo {
    pub mnemonic: &'static str,
    pub mode: AddressingMode,
    /// Base cycle cost, before page-cross and branch penalties
    pub cycles: u8,
    /// Instruction length in bytes, including the opcode
    pub bytes: u8,
    /// Whether a crossed page adds one cycle
    pub page_cycle: bool,
}

const fn op(mnemonic: &'static str, mode: AddressingMode, cycles: u8, bytes: u8) -> OpcodeInfo {
    OpcodeInfo {
        mnemonic,
        mode,
        cycles,
        bytes,
        page_cycle: false,
    }
}

/// Variant paying +1 cycle on a crossed page
const fn opx(mnemonic: &'static str, mode: AddressingMode, cycles: u8, bytes: u8) -> OpcodeInfo {
    OpcodeInfo {
        mnemonic,
        mode,
        cycles,
        bytes,
        page_cycle: true,
    }
}

/// Unofficial opcode fallback: implicit 2-cycle NOP
const UND: OpcodeInfo = op("???", Implied, 2, 1);

pub static OPCODE_TABLE: [OpcodeInfo; 256] = [
    // $00-$0F
    op("BRK", Implied, 7, 1),
    op("ORA", IndexedIndirect, 6, 2),
    UND,
    UND,
    UND,
    op("ORA", ZeroPage, 3, 2),
    op("ASL", ZeroPage, 5, 2),
    UND,
    op("PHP", Implied, 3, 1),
    op("ORA", Immediate, 2, 2),
    op("ASL", Accumulator, 2, 1),
    UND,
    UND,
    op("ORA", Absolute, 4, 3),
    op("ASL", Absolute, 6, 3),
    UND,
    // $10-$1F
    op("BPL", Relative, 2, 2),
    opx("ORA", IndirectIndexed, 5, 2),
    UND,
    UND,
    UND,
    op("ORA", ZeroPageX, 4, 2),
    op("ASL", ZeroPageX, 6, 2),
    UND,
    op("CLC", Implied, 2, 1),
    opx("ORA", AbsoluteY, 4, 3),
    UND,
    UND,
    UND,
    opx("ORA", AbsoluteX, 4, 3),
    op("ASL", AbsoluteX, 7, 3),
    UND,
    // $20-$2F
    op("JSR", Absolute, 6, 3),
    op("AND", IndexedIndirect, 6, 2),
    UND,
    UND,
    op("BIT", ZeroPage, 3, 2),
    op("AND", ZeroPage, 3, 2),
    op("ROL", ZeroPage, 5, 2),
    UND,
    op("PLP", Implied, 4, 1),
    op("AND", Immediate, 2, 2),
    op("ROL", Accumulator, 2, 1),
    UND,
    op("BIT", Absolute, 4, 3),
    op("AND", Absolute, 4, 3),
    op("ROL", Absolute, 6, 3),
    UND,
    // $30-$3F
    op("BMI", Relative, 2, 2),
    opx("AND", IndirectIndexed, 5, 2),
    UND,
    UND,
    UND,
    op("AND", ZeroPageX, 4, 2),
    op("ROL", ZeroPageX, 6, 2),
    UND,
    op("SEC", Implied, 2, 1),
    opx("AND", AbsoluteY, 4, 3),
    UND,
    UND,
    UND,
    opx("AND", AbsoluteX, 4, 3),
    op("ROL", AbsoluteX, 7, 3),
    UND,
    // $40-$4F
    op("RTI", Implied, 6, 1),
    op("EOR", IndexedIndirect, 6, 2),
    UND,
    UND,
    UND,
    op("EOR", ZeroPage, 3, 2),
    op("LSR", ZeroPage, 5, 2),
    UND,
    op("PHA", Implied, 3, 1),
    op("EOR", Immediate, 2, 2),
    op("LSR", Accumulator, 2, 1),
    UND,
    op("JMP", Absolute, 3, 3),
    op("EOR", Absolute, 4, 3),
    op("LSR", Absolute, 6, 3),
    UND,
    // $50-$5F
    op("BVC", Relative, 2, 2),
    opx("EOR", IndirectIndexed, 5, 2),
    UND,
    UND,
    UND,
    op("EOR", ZeroPageX, 4, 2),
    op("LSR", ZeroPageX, 6, 2),
    UND,
    op("CLI", Implied, 2, 1),
    opx("EOR", AbsoluteY, 4, 3),
    UND,
    UND,
    UND,
    opx("EOR", AbsoluteX, 4, 3),
    op("LSR", AbsoluteX, 7, 3),
    UND,
    // $60-$6F
    op("RTS", Implied, 6, 1),
    op("ADC", IndexedIndirect, 6, 2),
    UND,
    UND,
    UND,
    op("ADC", ZeroPage, 3, 2),
    op("ROR", ZeroPage, 5, 2),
    UND,
    op("PLA", Implied, 4, 1),
    op("ADC", Immediate, 2, 2),
    op("ROR", Accumulator, 2, 1),
    UND,
    op("JMP", Indirect, 5, 3),
    op("ADC", Absolute, 4, 3),
    op("ROR", Absolute, 6, 3),
    UND,
    // $70-$7F
    op("BVS", Relative, 2, 2),
    opx("ADC", IndirectIndexed, 5, 2),
    UND,
    UND,
    UND,
    op("ADC", ZeroPageX, 4, 2),
    op("ROR", ZeroPageX, 6, 2),
    UND,
    op("SEI", Implied, 2, 1),
    opx("ADC", AbsoluteY, 4, 3),
    UND,
    UND,
    UND,
    opx("ADC", AbsoluteX, 4, 3),
    op("ROR", AbsoluteX, 7, 3),
    UND,
    // $80-$8F
    UND,
    op("STA", IndexedIndirect, 6, 2),
    UND,
    UND,
    op("STY", ZeroPage, 3, 2),
    op("STA", ZeroPage, 3, 2),
    op("STX", ZeroPage, 3, 2),
    UND,
    op("DEY", Implied, 2, 1),
    UND,
    op("TXA", Implied, 2, 1),
    UND,
    op("STY", Absolute, 4, 3),
    op("STA", Absolute, 4, 3),
    op("STX", Absolute, 4, 3),
    UND,
    // $90-$9F
    op("BCC", Relative, 2, 2),
    op("STA", IndirectIndexed, 6, 2),
    UND,
    UND,
    op("STY", ZeroPageX, 4, 2),
    op("STA", ZeroPageX, 4, 2),
    op("STX", ZeroPageY, 4, 2),
    UND,
    op("TYA", Implied, 2, 1),
    op("STA", AbsoluteY, 5, 3),
    op("TXS", Implied, 2, 1),
    UND,
    UND,
    op("STA", AbsoluteX, 5, 3),
    UND,
    UND,
    // $A0-$AF
    op("LDY", Immediate, 2, 2),
    op("LDA", IndexedIndirect, 6, 2),
    op("LDX", Immediate, 2, 2),
    UND,
    op("LDY", ZeroPage, 3, 2),
    op("LDA", ZeroPage, 3, 2),
    op("LDX", ZeroPage, 3, 2),
    UND,
    op("TAY", Implied, 2, 1),
    op("LDA", Immediate, 2, 2),
    op("TAX", Implied, 2, 1),
    UND,
    op("LDY", Absolute, 4, 3),
    op("LDA", Absolute, 4, 3),
    op("LDX", Absolute, 4, 3),
    UND,
    // $B0-$BF
    op("BCS", Relative, 2, 2),
    opx("LDA", IndirectIndexed, 5, 2),
    UND,
    UND,
    op("LDY", ZeroPageX, 4, 2),
    op("LDA", ZeroPageX, 4, 2),
    op("LDX", ZeroPageY, 4, 2),
    UND,
    op("CLV", Implied, 2, 1),
    opx("LDA", AbsoluteY, 4, 3),
    op("TSX", Implied, 2, 1),
    UND,
    opx("LDY", AbsoluteX, 4, 3),
    opx("LDA", AbsoluteX, 4, 3),
    opx("LDX", AbsoluteY, 4, 3),
    UND,
    // $C0-$CF
    op("CPY", Immediate, 2, 2),
    op("CMP", IndexedIndirect, 6, 2),
    UND,
    UND,
    op("CPY", ZeroPage, 3, 2),
    op("CMP", ZeroPage, 3, 2),
    op("DEC", ZeroPage, 5, 2),
    UND,
    op("INY", Implied, 2, 1),
    op("CMP", Immediate, 2, 2),
    op("DEX", Implied, 2, 1),
    UND,
    op("CPY", Absolute, 4, 3),
    op("CMP", Absolute, 4, 3),
    op("DEC", Absolute, 6, 3),
    UND,
    // $D0-$DF
    op("BNE", Relative, 2, 2),
    opx("CMP", IndirectIndexed, 5, 2),
    UND,
    UND,
    UND,
    op("CMP", ZeroPageX, 4, 2),
    op("DEC", ZeroPageX, 6, 2),
    UND,
    op("CLD", Implied, 2, 1),
    opx("CMP", AbsoluteY, 4, 3),
    UND,
    UND,
    UND,
    opx("CMP", AbsoluteX, 4, 3),
    op("DEC", AbsoluteX, 7, 3),
    UND,
    // $E0-$EF
    op("CPX", Immediate, 2, 2),
    op("SBC", IndexedIndirect, 6, 2),
    UND,
    UND,
    op("CPX", ZeroPage, 3, 2),
    op("SBC", ZeroPage, 3, 2),
    op("INC", ZeroPage, 5, 2),
    UND,
    op("INX", Implied, 2, 1),
    op("SBC", Immediate, 2, 2),
    op("NOP", Implied, 2, 1),
    UND,
    op("CPX", Absolute, 4, 3),
    op("SBC", Absolute, 4, 3),
    op("INC", Absolute, 6, 3),
    UND,
    // $F0-$FF
    op("BEQ", Relative, 2, 2),
    opx("SBC", IndirectIndexed, 5, 2),
    UND,
    UND,
    UND,
    op("SBC", ZeroPageX, 4, 2),
    op("INC", ZeroPageX, 6, 2),
    UND,
    op("SED", Implied, 2, 1),
    opx("SBC", AbsoluteY, 4, 3),
    UND,
    UND,
    UND,
    opx("SBC", AbsoluteX, 4, 3),
    op("INC", AbsoluteX, 7, 3),
    UND,
];
