//! 6502 CPU implementation.

use emu_core::{Bus, Cpu, Interrupt, Observable, Value};

use crate::addressing::{Mode, alu_mode, shift_mode};
use crate::flags::{C, D, I, N, V, Z};
use crate::{HALTED, RETURNED, Registers, Status};

const NMI_VECTOR: u16 = 0xFFFA;
const IRQ_VECTOR: u16 = 0xFFFE;

/// The MOS 6502/6510 CPU.
#[derive(Debug)]
pub struct Mos6502 {
    /// CPU registers.
    pub regs: Registers,

    /// IRQ input level.
    irq_line: bool,
    /// NMI input level, kept for edge detection.
    nmi_line: bool,
    /// NMI edge seen and not yet serviced.
    nmi_pending: bool,

    /// Total cycles executed, interrupt sequences included.
    total_cycles: u64,
    /// Instructions executed.
    instructions: u64,
}

impl Default for Mos6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mos6502 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            irq_line: false,
            nmi_line: false,
            nmi_pending: false,
            total_cycles: 0,
            instructions: 0,
        }
    }

    /// Prime the CPU to call a routine at `entry`.
    ///
    /// A, X and Y are cleared, S is $FF so the routine's final `RTS` is
    /// recognised, and only the interrupt-disable flag is set.
    pub fn init(&mut self, entry: u16) {
        self.regs = Registers::routine(entry);
        self.irq_line = false;
        self.nmi_line = false;
        self.nmi_pending = false;
    }

    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    #[must_use]
    pub fn instructions(&self) -> u64 {
        self.instructions
    }

    // =========================================================================
    // Memory access patterns
    // =========================================================================

    fn read_with<B: Bus>(&mut self, bus: &mut B, mode: Mode, op: fn(&mut Self, u8)) -> u32 {
        let (addr, crossed) = self.resolve(bus, mode);
        let value = bus.read(addr);
        op(self, value);
        mode.read_cycles() + u32::from(crossed)
    }

    fn write_with<B: Bus>(&mut self, bus: &mut B, mode: Mode, value: fn(&Self) -> u8) -> u32 {
        let (addr, _) = self.resolve(bus, mode);
        bus.write(addr, value(self));
        mode.write_cycles()
    }

    fn rmw_with<B: Bus>(&mut self, bus: &mut B, mode: Mode, op: fn(&mut Self, u8) -> u8) -> u32 {
        let (addr, _) = self.resolve(bus, mode);
        let original = bus.read(addr);
        let modified = op(self, original);
        bus.write_rmw(addr, original, modified);
        mode.rmw_cycles()
    }

    fn implied(&mut self, op: fn(&mut Self)) -> u32 {
        op(self);
        2
    }

    // =========================================================================
    // ALU operations
    // =========================================================================

    fn do_lda(&mut self, value: u8) {
        self.regs.a = value;
        self.regs.p.update_nz(value);
    }

    fn do_ldx(&mut self, value: u8) {
        self.regs.x = value;
        self.regs.p.update_nz(value);
    }

    fn do_ldy(&mut self, value: u8) {
        self.regs.y = value;
        self.regs.p.update_nz(value);
    }

    fn do_lax(&mut self, value: u8) {
        self.regs.a = value;
        self.regs.x = value;
        self.regs.p.update_nz(value);
    }

    fn do_ora(&mut self, value: u8) {
        self.regs.a |= value;
        self.regs.p.update_nz(self.regs.a);
    }

    fn do_and(&mut self, value: u8) {
        self.regs.a &= value;
        self.regs.p.update_nz(self.regs.a);
    }

    fn do_eor(&mut self, value: u8) {
        self.regs.a ^= value;
        self.regs.p.update_nz(self.regs.a);
    }

    fn do_adc(&mut self, value: u8) {
        if self.regs.p.is_set(D) {
            self.adc_decimal(value);
        } else {
            self.adc_binary(value);
        }
    }

    fn adc_binary(&mut self, value: u8) {
        let a = u16::from(self.regs.a);
        let sum = a + u16::from(value) + u16::from(self.regs.p.is_set(C));
        let result = sum as u8;
        self.regs.p.set_if(C, sum > 0xFF);
        self.regs
            .p
            .set_if(V, (self.regs.a ^ result) & (value ^ result) & 0x80 != 0);
        self.regs.a = result;
        self.regs.p.update_nz(result);
    }

    /// NMOS decimal add: Z comes from the binary sum, N and V from the
    /// intermediate result before the high-nibble fix-up.
    fn adc_decimal(&mut self, value: u8) {
        let a = u16::from(self.regs.a);
        let v = u16::from(value);
        let carry = u16::from(self.regs.p.is_set(C));

        let mut low = (a & 0x0F) + (v & 0x0F) + carry;
        if low > 9 {
            low += 6;
        }
        let mut high = (a >> 4) + (v >> 4) + u16::from(low > 0x0F);

        let binary = (a + v + carry) as u8;
        self.regs.p.set_if(Z, binary == 0);
        self.regs.p.set_if(N, high & 0x08 != 0);
        let intermediate = (high << 4) as u8;
        self.regs
            .p
            .set_if(V, (self.regs.a ^ intermediate) & (value ^ intermediate) & 0x80 != 0);

        if high > 9 {
            high += 6;
        }
        self.regs.p.set_if(C, high > 0x0F);
        self.regs.a = ((high << 4) | (low & 0x0F)) as u8;
    }

    fn do_sbc(&mut self, value: u8) {
        if self.regs.p.is_set(D) {
            self.sbc_decimal(value);
        } else {
            self.adc_binary(!value);
        }
    }

    /// NMOS decimal subtract: all flags come from the binary difference.
    fn sbc_decimal(&mut self, value: u8) {
        let a = i16::from(self.regs.a);
        let v = i16::from(value);
        let borrow = i16::from(!self.regs.p.is_set(C));

        let binary = a - v - borrow;
        let binary_byte = binary as u8;
        self.regs.p.set_if(C, binary >= 0);
        self.regs.p.update_nz(binary_byte);
        self.regs
            .p
            .set_if(V, (self.regs.a ^ value) & (self.regs.a ^ binary_byte) & 0x80 != 0);

        let mut low = (a & 0x0F) - (v & 0x0F) - borrow;
        let mut high = (a >> 4) - (v >> 4);
        if low < 0 {
            low -= 6;
            high -= 1;
        }
        if high < 0 {
            high -= 6;
        }
        self.regs.a = (((high & 0x0F) << 4) | (low & 0x0F)) as u8;
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.regs.p.set_if(C, register >= value);
        self.regs.p.update_nz(register.wrapping_sub(value));
    }

    fn do_cmp(&mut self, value: u8) {
        self.compare(self.regs.a, value);
    }

    fn do_cpx(&mut self, value: u8) {
        self.compare(self.regs.x, value);
    }

    fn do_cpy(&mut self, value: u8) {
        self.compare(self.regs.y, value);
    }

    fn do_bit(&mut self, value: u8) {
        self.regs.p.set_if(Z, self.regs.a & value == 0);
        self.regs.p.set_if(N, value & 0x80 != 0);
        self.regs.p.set_if(V, value & 0x40 != 0);
    }

    fn do_asl(&mut self, value: u8) -> u8 {
        self.regs.p.set_if(C, value & 0x80 != 0);
        let result = value << 1;
        self.regs.p.update_nz(result);
        result
    }

    fn do_lsr(&mut self, value: u8) -> u8 {
        self.regs.p.set_if(C, value & 0x01 != 0);
        let result = value >> 1;
        self.regs.p.update_nz(result);
        result
    }

    fn do_rol(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.regs.p.is_set(C));
        self.regs.p.set_if(C, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.regs.p.update_nz(result);
        result
    }

    fn do_ror(&mut self, value: u8) -> u8 {
        let carry_in = if self.regs.p.is_set(C) { 0x80 } else { 0 };
        self.regs.p.set_if(C, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.regs.p.update_nz(result);
        result
    }

    fn do_inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.regs.p.update_nz(result);
        result
    }

    fn do_dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.regs.p.update_nz(result);
        result
    }

    // Undocumented read-modify-write combinations

    fn do_slo(&mut self, value: u8) -> u8 {
        let result = self.do_asl(value);
        self.do_ora(result);
        result
    }

    fn do_rla(&mut self, value: u8) -> u8 {
        let result = self.do_rol(value);
        self.do_and(result);
        result
    }

    fn do_sre(&mut self, value: u8) -> u8 {
        let result = self.do_lsr(value);
        self.do_eor(result);
        result
    }

    fn do_rra(&mut self, value: u8) -> u8 {
        let result = self.do_ror(value);
        self.do_adc(result);
        result
    }

    fn do_dcp(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.do_cmp(result);
        result
    }

    fn do_isc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.do_sbc(result);
        result
    }

    // Undocumented immediate operations

    fn do_anc(&mut self, value: u8) {
        self.do_and(value);
        self.regs.p.set_if(C, self.regs.a & 0x80 != 0);
    }

    fn do_alr(&mut self, value: u8) {
        self.regs.a &= value;
        self.regs.a = self.do_lsr(self.regs.a);
    }

    fn do_arr(&mut self, value: u8) {
        self.regs.a &= value;
        self.regs.a = self.do_ror(self.regs.a);
        let a = self.regs.a;
        self.regs.p.set_if(C, a & 0x40 != 0);
        self.regs.p.set_if(V, ((a >> 6) ^ (a >> 5)) & 0x01 != 0);
    }

    fn do_sbx(&mut self, value: u8) {
        let masked = self.regs.a & self.regs.x;
        self.regs.p.set_if(C, masked >= value);
        self.regs.x = masked.wrapping_sub(value);
        self.regs.p.update_nz(self.regs.x);
    }

    fn do_nop(&mut self, _value: u8) {}

    // =========================================================================
    // Control flow
    // =========================================================================

    fn op_jsr<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let target = self.fetch_word(bus);
        self.push_word(bus, self.regs.pc.wrapping_sub(1));
        self.regs.pc = target;
        6
    }

    fn op_rts<B: Bus>(&mut self, bus: &mut B) -> u32 {
        if self.regs.stack_empty() {
            self.regs.pc = self.regs.pc.wrapping_sub(1);
            return RETURNED;
        }
        self.regs.pc = self.pull_word(bus).wrapping_add(1);
        6
    }

    fn op_rti<B: Bus>(&mut self, bus: &mut B) -> u32 {
        if self.regs.stack_empty() {
            self.regs.pc = self.regs.pc.wrapping_sub(1);
            return HALTED;
        }
        let p = self.pull(bus);
        self.regs.p = Status::from_byte(p);
        self.regs.pc = self.pull_word(bus);
        6
    }

    fn op_brk<B: Bus>(&mut self, bus: &mut B) -> u32 {
        // Padding byte after BRK is skipped on return.
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.push_word(bus, self.regs.pc);
        self.push(bus, self.regs.p.to_byte_brk());
        self.regs.p.set_if(I, true);
        self.regs.pc = Self::read_word(bus, IRQ_VECTOR);
        7
    }

    fn enter_interrupt<B: Bus>(&mut self, bus: &mut B, vector: u16) -> u32 {
        bus.tick(2);
        self.push_word(bus, self.regs.pc);
        self.push(bus, self.regs.p.to_byte_irq());
        self.regs.p.set_if(I, true);
        self.regs.pc = Self::read_word(bus, vector);
        7
    }

    fn execute<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        match opcode {
            // =================================================================
            // Loads and stores
            // =================================================================
            0xA1 | 0xA5 | 0xA9 | 0xAD | 0xB1 | 0xB5 | 0xB9 | 0xBD => {
                self.read_with(bus, alu_mode(opcode), Self::do_lda)
            }
            0xA2 => self.read_with(bus, Mode::Immediate, Self::do_ldx),
            0xA6 => self.read_with(bus, Mode::ZeroPage, Self::do_ldx),
            0xB6 => self.read_with(bus, Mode::ZeroPageY, Self::do_ldx),
            0xAE => self.read_with(bus, Mode::Absolute, Self::do_ldx),
            0xBE => self.read_with(bus, Mode::AbsoluteY, Self::do_ldx),
            0xA0 => self.read_with(bus, Mode::Immediate, Self::do_ldy),
            0xA4 => self.read_with(bus, Mode::ZeroPage, Self::do_ldy),
            0xB4 => self.read_with(bus, Mode::ZeroPageX, Self::do_ldy),
            0xAC => self.read_with(bus, Mode::Absolute, Self::do_ldy),
            0xBC => self.read_with(bus, Mode::AbsoluteX, Self::do_ldy),

            0x81 | 0x85 | 0x8D | 0x91 | 0x95 | 0x99 | 0x9D => {
                self.write_with(bus, alu_mode(opcode), |cpu| cpu.regs.a)
            }
            0x86 => self.write_with(bus, Mode::ZeroPage, |cpu| cpu.regs.x),
            0x96 => self.write_with(bus, Mode::ZeroPageY, |cpu| cpu.regs.x),
            0x8E => self.write_with(bus, Mode::Absolute, |cpu| cpu.regs.x),
            0x84 => self.write_with(bus, Mode::ZeroPage, |cpu| cpu.regs.y),
            0x94 => self.write_with(bus, Mode::ZeroPageX, |cpu| cpu.regs.y),
            0x8C => self.write_with(bus, Mode::Absolute, |cpu| cpu.regs.y),

            // =================================================================
            // ALU
            // =================================================================
            0x01 | 0x05 | 0x09 | 0x0D | 0x11 | 0x15 | 0x19 | 0x1D => {
                self.read_with(bus, alu_mode(opcode), Self::do_ora)
            }
            0x21 | 0x25 | 0x29 | 0x2D | 0x31 | 0x35 | 0x39 | 0x3D => {
                self.read_with(bus, alu_mode(opcode), Self::do_and)
            }
            0x41 | 0x45 | 0x49 | 0x4D | 0x51 | 0x55 | 0x59 | 0x5D => {
                self.read_with(bus, alu_mode(opcode), Self::do_eor)
            }
            0x61 | 0x65 | 0x69 | 0x6D | 0x71 | 0x75 | 0x79 | 0x7D => {
                self.read_with(bus, alu_mode(opcode), Self::do_adc)
            }
            0xC1 | 0xC5 | 0xC9 | 0xCD | 0xD1 | 0xD5 | 0xD9 | 0xDD => {
                self.read_with(bus, alu_mode(opcode), Self::do_cmp)
            }
            // $EB is an undocumented duplicate of SBC #imm
            0xE1 | 0xE5 | 0xE9 | 0xEB | 0xED | 0xF1 | 0xF5 | 0xF9 | 0xFD => {
                self.read_with(bus, alu_mode(opcode), Self::do_sbc)
            }
            0xE0 => self.read_with(bus, Mode::Immediate, Self::do_cpx),
            0xE4 => self.read_with(bus, Mode::ZeroPage, Self::do_cpx),
            0xEC => self.read_with(bus, Mode::Absolute, Self::do_cpx),
            0xC0 => self.read_with(bus, Mode::Immediate, Self::do_cpy),
            0xC4 => self.read_with(bus, Mode::ZeroPage, Self::do_cpy),
            0xCC => self.read_with(bus, Mode::Absolute, Self::do_cpy),
            0x24 => self.read_with(bus, Mode::ZeroPage, Self::do_bit),
            0x2C => self.read_with(bus, Mode::Absolute, Self::do_bit),

            // =================================================================
            // Read-modify-write
            // =================================================================
            0x06 | 0x0E | 0x16 | 0x1E => self.rmw_with(bus, shift_mode(opcode), Self::do_asl),
            0x46 | 0x4E | 0x56 | 0x5E => self.rmw_with(bus, shift_mode(opcode), Self::do_lsr),
            0x26 | 0x2E | 0x36 | 0x3E => self.rmw_with(bus, shift_mode(opcode), Self::do_rol),
            0x66 | 0x6E | 0x76 | 0x7E => self.rmw_with(bus, shift_mode(opcode), Self::do_ror),
            0xE6 | 0xEE | 0xF6 | 0xFE => self.rmw_with(bus, shift_mode(opcode), Self::do_inc),
            0xC6 | 0xCE | 0xD6 | 0xDE => self.rmw_with(bus, shift_mode(opcode), Self::do_dec),

            0x0A => {
                self.regs.a = self.do_asl(self.regs.a);
                2
            }
            0x4A => {
                self.regs.a = self.do_lsr(self.regs.a);
                2
            }
            0x2A => {
                self.regs.a = self.do_rol(self.regs.a);
                2
            }
            0x6A => {
                self.regs.a = self.do_ror(self.regs.a);
                2
            }

            // =================================================================
            // Registers
            // =================================================================
            0xAA => self.implied(|cpu| cpu.do_ldx(cpu.regs.a)), // TAX
            0xA8 => self.implied(|cpu| cpu.do_ldy(cpu.regs.a)), // TAY
            0x8A => self.implied(|cpu| cpu.do_lda(cpu.regs.x)), // TXA
            0x98 => self.implied(|cpu| cpu.do_lda(cpu.regs.y)), // TYA
            0xBA => self.implied(|cpu| cpu.do_ldx(cpu.regs.s)), // TSX
            0x9A => self.implied(|cpu| cpu.regs.s = cpu.regs.x), // TXS
            0xE8 => self.implied(|cpu| cpu.do_ldx(cpu.regs.x.wrapping_add(1))), // INX
            0xC8 => self.implied(|cpu| cpu.do_ldy(cpu.regs.y.wrapping_add(1))), // INY
            0xCA => self.implied(|cpu| cpu.do_ldx(cpu.regs.x.wrapping_sub(1))), // DEX
            0x88 => self.implied(|cpu| cpu.do_ldy(cpu.regs.y.wrapping_sub(1))), // DEY

            // Flags
            0x18 => self.implied(|cpu| cpu.regs.p.set_if(C, false)),
            0x38 => self.implied(|cpu| cpu.regs.p.set_if(C, true)),
            0x58 => self.implied(|cpu| cpu.regs.p.set_if(I, false)),
            0x78 => self.implied(|cpu| cpu.regs.p.set_if(I, true)),
            0xB8 => self.implied(|cpu| cpu.regs.p.set_if(V, false)),
            0xD8 => self.implied(|cpu| cpu.regs.p.set_if(D, false)),
            0xF8 => self.implied(|cpu| cpu.regs.p.set_if(D, true)),

            // Stack
            0x48 => {
                self.push(bus, self.regs.a);
                3
            }
            0x08 => {
                self.push(bus, self.regs.p.to_byte_brk());
                3
            }
            0x68 => {
                let value = self.pull(bus);
                self.do_lda(value);
                4
            }
            0x28 => {
                let value = self.pull(bus);
                self.regs.p = Status::from_byte(value);
                4
            }

            // =================================================================
            // Control flow
            // =================================================================
            0x4C => {
                self.regs.pc = self.fetch_word(bus);
                3
            }
            0x6C => {
                let pointer = self.fetch_word(bus);
                self.regs.pc = Self::read_word_in_page(bus, pointer);
                5
            }
            0x20 => self.op_jsr(bus),
            0x60 => self.op_rts(bus),
            0x40 => self.op_rti(bus),
            0x00 => self.op_brk(bus),

            0x10 => self.branch_if(bus, !self.regs.p.is_set(N)), // BPL
            0x30 => self.branch_if(bus, self.regs.p.is_set(N)),  // BMI
            0x50 => self.branch_if(bus, !self.regs.p.is_set(V)), // BVC
            0x70 => self.branch_if(bus, self.regs.p.is_set(V)),  // BVS
            0x90 => self.branch_if(bus, !self.regs.p.is_set(C)), // BCC
            0xB0 => self.branch_if(bus, self.regs.p.is_set(C)),  // BCS
            0xD0 => self.branch_if(bus, !self.regs.p.is_set(Z)), // BNE
            0xF0 => self.branch_if(bus, self.regs.p.is_set(Z)),  // BEQ

            // =================================================================
            // Undocumented
            // =================================================================
            0x03 | 0x07 | 0x0F | 0x13 | 0x17 | 0x1B | 0x1F => {
                self.rmw_with(bus, alu_mode(opcode), Self::do_slo)
            }
            0x23 | 0x27 | 0x2F | 0x33 | 0x37 | 0x3B | 0x3F => {
                self.rmw_with(bus, alu_mode(opcode), Self::do_rla)
            }
            0x43 | 0x47 | 0x4F | 0x53 | 0x57 | 0x5B | 0x5F => {
                self.rmw_with(bus, alu_mode(opcode), Self::do_sre)
            }
            0x63 | 0x67 | 0x6F | 0x73 | 0x77 | 0x7B | 0x7F => {
                self.rmw_with(bus, alu_mode(opcode), Self::do_rra)
            }
            0xC3 | 0xC7 | 0xCF | 0xD3 | 0xD7 | 0xDB | 0xDF => {
                self.rmw_with(bus, alu_mode(opcode), Self::do_dcp)
            }
            0xE3 | 0xE7 | 0xEF | 0xF3 | 0xF7 | 0xFB | 0xFF => {
                self.rmw_with(bus, alu_mode(opcode), Self::do_isc)
            }
            0xA3 | 0xA7 | 0xAF | 0xB3 => self.read_with(bus, alu_mode(opcode), Self::do_lax),
            0xB7 => self.read_with(bus, Mode::ZeroPageY, Self::do_lax),
            0xBF => self.read_with(bus, Mode::AbsoluteY, Self::do_lax),
            0xAB => self.read_with(bus, Mode::Immediate, Self::do_lax),
            0x83 | 0x87 | 0x8F => {
                self.write_with(bus, alu_mode(opcode), |cpu| cpu.regs.a & cpu.regs.x)
            }
            0x97 => self.write_with(bus, Mode::ZeroPageY, |cpu| cpu.regs.a & cpu.regs.x),
            0x0B | 0x2B => self.read_with(bus, Mode::Immediate, Self::do_anc),
            0x4B => self.read_with(bus, Mode::Immediate, Self::do_alr),
            0x6B => self.read_with(bus, Mode::Immediate, Self::do_arr),
            0xCB => self.read_with(bus, Mode::Immediate, Self::do_sbx),

            // Multi-byte NOPs still fetch their operands
            0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 => {
                self.read_with(bus, Mode::Immediate, Self::do_nop)
            }
            0x04 | 0x44 | 0x64 => self.read_with(bus, Mode::ZeroPage, Self::do_nop),
            0x14 | 0x34 | 0x54 | 0x74 | 0xD4 | 0xF4 => {
                self.read_with(bus, Mode::ZeroPageX, Self::do_nop)
            }
            0x0C => self.read_with(bus, Mode::Absolute, Self::do_nop),
            0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => {
                self.read_with(bus, Mode::AbsoluteX, Self::do_nop)
            }

            // NOP, single-byte undocumented NOPs, JAM and the unstable
            // store/transfer opcodes
            _ => 2,
        }
    }
}

impl Cpu for Mos6502 {
    fn step<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let opcode = self.fetch(bus);
        let cycles = self.execute(bus, opcode);
        self.instructions += 1;
        if !crate::is_finished(cycles) {
            self.total_cycles += u64::from(cycles);
        }
        cycles
    }

    fn reset(&mut self) {
        self.regs = Registers::new();
        self.irq_line = false;
        self.nmi_line = false;
        self.nmi_pending = false;
    }

    fn set_interrupt_line(&mut self, kind: Interrupt, active: bool) {
        match kind {
            Interrupt::Irq => self.irq_line = active,
            Interrupt::Nmi => {
                if active && !self.nmi_line {
                    self.nmi_pending = true;
                }
                self.nmi_line = active;
            }
        }
    }

    fn service_interrupt<B: Bus>(&mut self, bus: &mut B) -> Option<u32> {
        let cycles = if self.nmi_pending {
            self.nmi_pending = false;
            self.enter_interrupt(bus, NMI_VECTOR)
        } else if self.irq_line && !self.regs.p.is_set(I) {
            self.enter_interrupt(bus, IRQ_VECTOR)
        } else {
            return None;
        };
        self.total_cycles += u64::from(cycles);
        Some(cycles)
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }
}

impl Observable for Mos6502 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "s" | "sp" => Some(self.regs.s.into()),
            "p" | "status" => Some(self.regs.p.0.into()),
            "flags.c" => Some(self.regs.p.is_set(C).into()),
            "flags.z" => Some(self.regs.p.is_set(Z).into()),
            "flags.i" => Some(self.regs.p.is_set(I).into()),
            "flags.d" => Some(self.regs.p.is_set(D).into()),
            "flags.v" => Some(self.regs.p.is_set(V).into()),
            "flags.n" => Some(self.regs.p.is_set(N).into()),
            "irq" => Some(self.irq_line.into()),
            "nmi" => Some(self.nmi_line.into()),
            "cycles" => Some(self.total_cycles.into()),
            "instructions" => Some(self.instructions.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc", "a", "x", "y", "s", "p", "flags.c", "flags.z", "flags.i", "flags.d", "flags.v",
            "flags.n", "irq", "nmi", "cycles", "instructions",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::SimpleBus;

    fn cpu_at(bus: &mut SimpleBus, program: &[u8]) -> Mos6502 {
        bus.load(0x1000, program);
        let mut cpu = Mos6502::new();
        cpu.init(0x1000);
        cpu
    }

    #[test]
    fn init_primes_for_call() {
        let mut cpu = Mos6502::new();
        cpu.regs.a = 0x55;
        cpu.init(0x1234);
        assert_eq!(cpu.regs.pc, 0x1234);
        assert_eq!(cpu.regs.s, 0xFF);
        assert_eq!(cpu.regs.a, 0);
        assert!(cpu.regs.p.is_set(I));
        assert!(!cpu.regs.p.is_set(D));
    }

    #[test]
    fn outermost_rts_returns_sentinel_without_popping() {
        let mut bus = SimpleBus::new();
        let mut cpu = cpu_at(&mut bus, &[0x60]);
        assert_eq!(cpu.step(&mut bus), RETURNED);
        assert_eq!(cpu.regs.s, 0xFF);
        assert_eq!(cpu.regs.pc, 0x1000);
        assert!(crate::is_finished(RETURNED));
        // Stays finished if stepped again
        assert_eq!(cpu.step(&mut bus), RETURNED);
    }

    #[test]
    fn outermost_rti_returns_halted() {
        let mut bus = SimpleBus::new();
        let mut cpu = cpu_at(&mut bus, &[0x40]);
        assert_eq!(cpu.step(&mut bus), HALTED);
    }

    #[test]
    fn nested_rts_returns_normally() {
        let mut bus = SimpleBus::new();
        // JSR $1010 ... $1010: RTS
        let mut cpu = cpu_at(&mut bus, &[0x20, 0x10, 0x10]);
        bus.poke(0x1010, 0x60);
        assert_eq!(cpu.step(&mut bus), 6);
        assert_eq!(cpu.regs.s, 0xFD);
        assert_eq!(cpu.step(&mut bus), 6);
        assert_eq!(cpu.regs.pc, 0x1003);
        assert_eq!(cpu.regs.s, 0xFF);
    }

    #[test]
    fn page_cross_costs_a_cycle_on_reads_only() {
        let mut bus = SimpleBus::new();
        // LDX #$01; LDA $10FF,X; STA $10FF,X
        let mut cpu = cpu_at(&mut bus, &[0xA2, 0x01, 0xBD, 0xFF, 0x10, 0x9D, 0xFF, 0x10]);
        assert_eq!(cpu.step(&mut bus), 2);
        assert_eq!(cpu.step(&mut bus), 5);
        assert_eq!(cpu.step(&mut bus), 5);
    }

    #[test]
    fn branch_cycles() {
        let mut bus = SimpleBus::new();
        // BNE +2 (Z clear after init → taken); BEQ +0 (not taken)
        let mut cpu = cpu_at(&mut bus, &[0xD0, 0x02, 0x00, 0x00, 0xF0, 0x00]);
        assert_eq!(cpu.step(&mut bus), 3);
        assert_eq!(cpu.regs.pc, 0x1004);
        assert_eq!(cpu.step(&mut bus), 2);
    }

    #[test]
    fn branch_across_page_costs_four() {
        let mut bus = SimpleBus::new();
        bus.load(0x10FD, &[0xD0, 0x10]);
        let mut cpu = Mos6502::new();
        cpu.init(0x10FD);
        assert_eq!(cpu.step(&mut bus), 4);
        assert_eq!(cpu.regs.pc, 0x110F);
    }

    #[test]
    fn irq_respects_interrupt_disable() {
        let mut bus = SimpleBus::new();
        bus.load(0xFFFE, &[0x00, 0x20]);
        let mut cpu = cpu_at(&mut bus, &[0x58]); // CLI
        cpu.set_interrupt_line(Interrupt::Irq, true);
        assert_eq!(cpu.service_interrupt(&mut bus), None);
        cpu.step(&mut bus);
        assert_eq!(cpu.service_interrupt(&mut bus), Some(7));
        assert_eq!(cpu.regs.pc, 0x2000);
        assert!(cpu.regs.p.is_set(I));
        // Pushed status has B clear
        assert_eq!(bus.peek(0x01FD) & crate::flags::B, 0);
    }

    #[test]
    fn nmi_is_edge_triggered() {
        let mut bus = SimpleBus::new();
        bus.load(0xFFFA, &[0x00, 0x30]);
        let mut cpu = cpu_at(&mut bus, &[0xEA]);
        cpu.set_interrupt_line(Interrupt::Nmi, true);
        assert_eq!(cpu.service_interrupt(&mut bus), Some(7));
        assert_eq!(cpu.regs.pc, 0x3000);
        // Line still high: no second NMI
        cpu.set_interrupt_line(Interrupt::Nmi, true);
        assert_eq!(cpu.service_interrupt(&mut bus), None);
        cpu.set_interrupt_line(Interrupt::Nmi, false);
        cpu.set_interrupt_line(Interrupt::Nmi, true);
        assert_eq!(cpu.service_interrupt(&mut bus), Some(7));
    }

    #[test]
    fn decimal_adc_and_sbc() {
        let mut bus = SimpleBus::new();
        // SED; CLC; LDA #$19; ADC #$28; SEC; SBC #$08
        let mut cpu = cpu_at(
            &mut bus,
            &[0xF8, 0x18, 0xA9, 0x19, 0x69, 0x28, 0x38, 0xE9, 0x08],
        );
        for _ in 0..5 {
            cpu.step(&mut bus);
        }
        assert_eq!(cpu.regs.a, 0x47);
        cpu.step(&mut bus);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.a, 0x39);
        assert!(cpu.regs.p.is_set(C));
    }

    #[test]
    fn jmp_indirect_page_bug() {
        let mut bus = SimpleBus::new();
        bus.load(0x20FF, &[0x34]);
        bus.load(0x2000, &[0x12]);
        bus.load(0x2100, &[0x56]);
        let mut cpu = cpu_at(&mut bus, &[0x6C, 0xFF, 0x20]);
        assert_eq!(cpu.step(&mut bus), 5);
        assert_eq!(cpu.regs.pc, 0x1234);
    }

    #[test]
    fn observable_paths_resolve() {
        let cpu = Mos6502::new();
        for path in cpu.query_paths() {
            assert!(cpu.query(path).is_some(), "{path}");
        }
    }
}
