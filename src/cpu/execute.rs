// CPU fetch-decode-execute and interrupt servicing

use crate::bus::Bus;
use crate::cpu::addressing::AddressingMode;
use crate::cpu::opcodes::OPCODE_TABLE;
use crate::cpu::{Cpu, FLAG_BREAK, FLAG_INTERRUPT, FLAG_UNUSED, VECTOR_IRQ, VECTOR_NMI};

/// Cycles consumed by servicing an interrupt
const INTERRUPT_CYCLES: u8 = 7;

impl Cpu {
    /// Execute one step: burn a stall cycle, service a pending interrupt,
    /// or run one instruction.
    ///
    /// Returns the cycles consumed. Stall burns return 1 without touching
    /// the cycle counter, since DMA stalls are accounted when queued.
    pub fn step(&mut self, bus: &mut Bus) -> u8 {
        if self.stall_cycles > 0 {
            self.stall_cycles -= 1;
            return 1;
        }

        // NMI beats IRQ; IRQ is masked by the I flag
        if self.nmi_pending {
            self.nmi_pending = false;
            self.service_interrupt(bus, VECTOR_NMI);
            return INTERRUPT_CYCLES;
        }
        if self.irq_line && !self.get_flag(FLAG_INTERRUPT) {
            self.service_interrupt(bus, VECTOR_IRQ);
            return INTERRUPT_CYCLES;
        }

        let opcode = bus.read(self.pc);
        let info = &OPCODE_TABLE[opcode as usize];
        self.pc = self.pc.wrapping_add(1);

        let addr_result = match info.mode {
            AddressingMode::Implied => self.addr_implied(),
            AddressingMode::Accumulator => self.addr_accumulator(),
            AddressingMode::Immediate => self.addr_immediate(bus),
            AddressingMode::ZeroPage => self.addr_zero_page(bus),
            AddressingMode::ZeroPageX => self.addr_zero_page_x(bus),
            AddressingMode::ZeroPageY => self.addr_zero_page_y(bus),
            AddressingMode::Relative => self.addr_relative(bus),
            AddressingMode::Absolute => self.addr_absolute(bus),
            AddressingMode::AbsoluteX => self.addr_absolute_x(bus),
            AddressingMode::AbsoluteY => self.addr_absolute_y(bus),
            AddressingMode::Indirect => self.addr_indirect(bus),
            AddressingMode::IndexedIndirect => self.addr_indexed_indirect(bus),
            AddressingMode::IndirectIndexed => self.addr_indirect_indexed(bus),
        };

        let extra_cycles = self.execute_instruction(opcode, &addr_result, bus);

        let mut cycles = info.cycles;
        if info.page_cycle && addr_result.page_crossed {
            cycles += 1;
        }
        cycles += extra_cycles;

        self.cycles = self.cycles.wrapping_add(cycles as u64);
        cycles
    }

    /// Push PC and flags (U set, B clear), mask interrupts, load the vector
    fn service_interrupt(&mut self, bus: &mut Bus, vector: u16) {
        self.push_word(bus, self.pc);
        self.push(bus, (self.status | FLAG_UNUSED) & !FLAG_BREAK);
        self.set_flag(FLAG_INTERRUPT, true);
        self.pc = self.read_word(bus, vector);
        self.cycles = self.cycles.wrapping_add(INTERRUPT_CYCLES as u64);
    }

    /// Dispatch one decoded opcode; returns extra cycles (branches only)
    fn execute_instruction(
        &mut self,
        opcode: u8,
        addr_result: &crate::cpu::addressing::AddressingResult,
        bus: &mut Bus,
    ) -> u8 {
        match opcode {
            // Loads and stores
            0xA9 | 0xA5 | 0xB5 | 0xAD | 0xBD | 0xB9 | 0xA1 | 0xB1 => self.lda(bus, addr_result),
            0xA2 | 0xA6 | 0xB6 | 0xAE | 0xBE => self.ldx(bus, addr_result),
            0xA0 | 0xA4 | 0xB4 | 0xAC | 0xBC => self.ldy(bus, addr_result),
            0x85 | 0x95 | 0x8D | 0x9D | 0x99 | 0x81 | 0x91 => self.sta(bus, addr_result),
            0x86 | 0x96 | 0x8E => self.stx(bus, addr_result),
            0x84 | 0x94 | 0x8C => self.sty(bus, addr_result),

            // Arithmetic
            0x69 | 0x65 | 0x75 | 0x6D | 0x7D | 0x79 | 0x61 | 0x71 => self.adc(bus, addr_result),
            0xE9 | 0xE5 | 0xF5 | 0xED | 0xFD | 0xF9 | 0xE1 | 0xF1 => self.sbc(bus, addr_result),
            0xE6 | 0xF6 | 0xEE | 0xFE => self.inc(bus, addr_result),
            0xC6 | 0xD6 | 0xCE | 0xDE => self.dec(bus, addr_result),
            0xE8 => self.inx(),
            0xC8 => self.iny(),
            0xCA => self.dex(),
            0x88 => self.dey(),

            // Logic
            0x29 | 0x25 | 0x35 | 0x2D | 0x3D | 0x39 | 0x21 | 0x31 => self.and(bus, addr_result),
            0x09 | 0x05 | 0x15 | 0x0D | 0x1D | 0x19 | 0x01 | 0x11 => self.ora(bus, addr_result),
            0x49 | 0x45 | 0x55 | 0x4D | 0x5D | 0x59 | 0x41 | 0x51 => self.eor(bus, addr_result),
            0x24 | 0x2C => self.bit(bus, addr_result),

            // Shifts and rotates
            0x0A => self.asl(bus, addr_result, true),
            0x06 | 0x16 | 0x0E | 0x1E => self.asl(bus, addr_result, false),
            0x4A => self.lsr(bus, addr_result, true),
            0x46 | 0x56 | 0x4E | 0x5E => self.lsr(bus, addr_result, false),
            0x2A => self.rol(bus, addr_result, true),
            0x26 | 0x36 | 0x2E | 0x3E => self.rol(bus, addr_result, false),
            0x6A => self.ror(bus, addr_result, true),
            0x66 | 0x76 | 0x6E | 0x7E => self.ror(bus, addr_result, false),

            // Compares
            0xC9 | 0xC5 | 0xD5 | 0xCD | 0xDD | 0xD9 | 0xC1 | 0xD1 => self.cmp(bus, addr_result),
            0xE0 | 0xE4 | 0xEC => self.cpx(bus, addr_result),
            0xC0 | 0xC4 | 0xCC => self.cpy(bus, addr_result),

            // Branches report their own extra cycles
            0x90 => return self.bcc(addr_result),
            0xB0 => return self.bcs(addr_result),
            0xF0 => return self.beq(addr_result),
            0xD0 => return self.bne(addr_result),
            0x30 => return self.bmi(addr_result),
            0x10 => return self.bpl(addr_result),
            0x50 => return self.bvc(addr_result),
            0x70 => return self.bvs(addr_result),

            // Jumps and subroutines
            0x4C | 0x6C => self.jmp(addr_result),
            0x20 => self.jsr(bus, addr_result),
            0x60 => self.rts(bus),

            // Stack
            0x48 => self.pha(bus),
            0x68 => self.pla(bus),
            0x08 => self.php(bus),
            0x28 => self.plp(bus),

            // Transfers
            0xAA => self.tax(),
            0xA8 => self.tay(),
            0x8A => self.txa(),
            0x98 => self.tya(),
            0xBA => self.tsx(),
            0x9A => self.txs(),

            // Flags
            0x18 => self.clc(),
            0xD8 => self.cld(),
            0x58 => self.cli(),
            0xB8 => self.clv(),
            0x38 => self.sec(),
            0xF8 => self.sed(),
            0x78 => self.sei(),

            // Miscellaneous
            0x00 => self.brk(bus),
            0x40 => self.rti(bus),
            0xEA => self.nop(),

            // Unofficial opcodes fall through as NOPs
            _ => {}
        }
        0
    }

    /// One-line execution trace: PC, raw bytes, mnemonic, registers
    pub fn trace(&self, bus: &mut Bus) -> String {
        let opcode = bus.read(self.pc);
        let info = &OPCODE_TABLE[opcode as usize];

        let mut bytes = format!("{:02X}", opcode);
        for i in 1..info.bytes as u16 {
            bytes.push_str(&format!(" {:02X}", bus.read(self.pc.wrapping_add(i))));
        }

        format!(
            "{:04X}  {:<8} {}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            self.pc, bytes, info.mnemonic, self.a, self.x, self.y, self.status, self.sp, self.cycles
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::tests_support::bus_with_prg;
    use crate::cpu::{FLAG_CARRY, FLAG_NEGATIVE, FLAG_OVERFLOW, FLAG_ZERO};

    /// CPU reset against a bus whose cartridge holds `program` at $8000
    fn cpu_with_program(program: &[u8]) -> (Cpu, Bus) {
        let mut bus = bus_with_prg(program, 0x8000);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        (cpu, bus)
    }

    #[test]
    fn test_reset_follows_vector() {
        let (cpu, _bus) = cpu_with_program(&[0xEA]);
        assert_eq!(cpu.pc, 0x8000);
        assert_eq!(cpu.sp, 0xFD);
        assert_eq!(cpu.status, 0x24);
    }

    #[test]
    fn test_lda_immediate_cycles() {
        let (mut cpu, mut bus) = cpu_with_program(&[0xA9, 0x42]);
        let cycles = cpu.step(&mut bus);

        assert_eq!(cycles, 2);
        assert_eq!(cpu.a, 0x42);
        assert_eq!(cpu.pc, 0x8002);
        assert_eq!(cpu.cycles, 2);
    }

    #[test]
    fn test_adc_scenario_from_reference() {
        // A=$50 + #$50: result $A0, C=0, V=1, N=1, Z=0
        let (mut cpu, mut bus) = cpu_with_program(&[0x69, 0x50]);
        cpu.a = 0x50;
        cpu.set_flag(FLAG_CARRY, false);
        cpu.set_flag(FLAG_OVERFLOW, false);

        cpu.step(&mut bus);
        assert_eq!(cpu.a, 0xA0);
        assert!(!cpu.get_flag(FLAG_CARRY));
        assert!(cpu.get_flag(FLAG_OVERFLOW));
        assert!(cpu.get_flag(FLAG_NEGATIVE));
        assert!(!cpu.get_flag(FLAG_ZERO));
    }

    #[test]
    fn test_jmp_indirect_wrap_bug() {
        // JMP ($02FF) with ($02FF)=$34 and ($0200)=$12 lands at $1234
        let (mut cpu, mut bus) = cpu_with_program(&[0x6C, 0xFF, 0x02]);
        bus.write(0x02FF, 0x34);
        bus.write(0x0200, 0x12);

        cpu.step(&mut bus);
        assert_eq!(cpu.pc, 0x1234);
    }

    #[test]
    fn test_branch_timing() {
        // BNE taken, no page cross: 3 cycles
        let (mut cpu, mut bus) = cpu_with_program(&[0xD0, 0x02]);
        cpu.set_flag(FLAG_ZERO, false);
        assert_eq!(cpu.step(&mut bus), 3);

        // Not taken: 2 cycles
        let (mut cpu, mut bus) = cpu_with_program(&[0xD0, 0x02]);
        cpu.set_flag(FLAG_ZERO, true);
        assert_eq!(cpu.step(&mut bus), 2);
    }

    #[test]
    fn test_branch_page_cross_timing() {
        // Branch at $80FD: PC after the operand is $80FF, +$10 crosses into
        // $810F, so the taken branch costs 4 cycles
        let mut program = vec![0xEA; 0xFD];
        program.extend_from_slice(&[0xD0, 0x10]);
        let (mut cpu, mut bus) = cpu_with_program(&program);
        cpu.pc = 0x80FD;
        cpu.set_flag(FLAG_ZERO, false);

        assert_eq!(cpu.step(&mut bus), 4);
        assert_eq!(cpu.pc, 0x810F);
    }

    #[test]
    fn test_page_cross_read_penalty() {
        // LDA $80FF,X with X=1 crosses into $8100: 5 cycles
        let (mut cpu, mut bus) = cpu_with_program(&[0xBD, 0xFF, 0x80]);
        cpu.x = 1;
        assert_eq!(cpu.step(&mut bus), 5);

        // Without the cross: 4 cycles
        let (mut cpu, mut bus) = cpu_with_program(&[0xBD, 0x00, 0x80]);
        cpu.x = 1;
        assert_eq!(cpu.step(&mut bus), 4);
    }

    #[test]
    fn test_sta_absolute_x_fixed_cost() {
        let (mut cpu, mut bus) = cpu_with_program(&[0x9D, 0x00, 0x01]);
        cpu.x = 0;
        assert_eq!(cpu.step(&mut bus), 5);
    }

    #[test]
    fn test_stall_burn_returns_one() {
        let (mut cpu, mut bus) = cpu_with_program(&[0xA9, 0x42]);
        cpu.stall_cycles = 2;

        assert_eq!(cpu.step(&mut bus), 1);
        assert_eq!(cpu.step(&mut bus), 1);
        // Third step executes the instruction
        assert_eq!(cpu.step(&mut bus), 2);
        assert_eq!(cpu.a, 0x42);
    }

    #[test]
    fn test_nmi_service() {
        let (mut cpu, mut bus) = cpu_with_program(&[0xEA]);
        // NMI vector -> $9000
        bus.write_prg_for_test(0xFFFA, 0x00);
        bus.write_prg_for_test(0xFFFB, 0x90);
        cpu.signal_nmi();

        let cycles = cpu.step(&mut bus);
        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc, 0x9000);
        assert!(cpu.get_flag(FLAG_INTERRUPT));
        // Consumed: a second step runs the instruction at the vector
        assert!(!cpu.nmi_pending);

        // Pushed status has B clear, U set
        let pushed = bus.read(0x0100 + cpu.sp as u16 + 1);
        assert_eq!(pushed & 0x30, 0x20);
    }

    #[test]
    fn test_irq_masked_by_i_flag() {
        let (mut cpu, mut bus) = cpu_with_program(&[0xEA, 0xEA]);
        cpu.set_irq_line(true);

        // I is set after reset: IRQ ignored, instruction runs
        cpu.step(&mut bus);
        assert_eq!(cpu.pc, 0x8001);

        cpu.set_flag(FLAG_INTERRUPT, false);
        bus.write_prg_for_test(0xFFFE, 0x00);
        bus.write_prg_for_test(0xFFFF, 0x90);
        let cycles = cpu.step(&mut bus);
        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc, 0x9000);
    }

    #[test]
    fn test_nmi_wins_over_irq() {
        let (mut cpu, mut bus) = cpu_with_program(&[0xEA]);
        bus.write_prg_for_test(0xFFFA, 0x00);
        bus.write_prg_for_test(0xFFFB, 0x90);
        bus.write_prg_for_test(0xFFFE, 0x00);
        bus.write_prg_for_test(0xFFFF, 0xA0);

        cpu.set_flag(FLAG_INTERRUPT, false);
        cpu.signal_nmi();
        cpu.set_irq_line(true);

        cpu.step(&mut bus);
        assert_eq!(cpu.pc, 0x9000);
    }

    #[test]
    fn test_brk_sets_i_and_vectors() {
        let (mut cpu, mut bus) = cpu_with_program(&[0x00]);
        bus.write_prg_for_test(0xFFFE, 0x34);
        bus.write_prg_for_test(0xFFFF, 0x12);

        let cycles = cpu.step(&mut bus);
        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc, 0x1234);
        assert!(cpu.get_flag(FLAG_INTERRUPT));
    }

    #[test]
    fn test_unofficial_opcode_is_nop() {
        let (mut cpu, mut bus) = cpu_with_program(&[0x02, 0xA9, 0x07]);
        assert_eq!(cpu.step(&mut bus), 2);
        assert_eq!(cpu.pc, 0x8001);

        cpu.step(&mut bus);
        assert_eq!(cpu.a, 0x07);
    }

    #[test]
    fn test_trace_format() {
        let (cpu, mut bus) = cpu_with_program(&[0xA9, 0x42]);
        let line = cpu.trace(&mut bus);
        assert!(line.starts_with("8000"));
        assert!(line.contains("LDA"));
        assert!(line.contains("P:24"));
    }
}
