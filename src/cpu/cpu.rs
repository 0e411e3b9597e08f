use tracing::error;

use crate::{
    debug::CpuState,
    utils::{as_lo_hi, join_hi_low, page_crossed},
};

use super::{
    opcodes::{decode, AddressingMode, Mnemonic, Opcode},
    CpuBus, CpuError, Status,
};

// Interrupt handlers
const NON_MASKABLE_IH: u16 = 0xfffa;
const POWER_RESET_IH: u16 = 0xfffc;
const BRK_IH: u16 = 0xfffe;

const STACK_BASE: u16 = 0x0100;
const STACK_RESET: u8 = 0xfd;
const INTERRUPT_CYCLES: u32 = 7;

/// Where an instruction's operand lives once addressing is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    Implied,
    Accumulator,
    Memory(u16),
}

pub struct CPU {
    pub pc: u16,
    pub sp: u8,
    pub accum: u8,
    pub rx: u8,
    pub ry: u8,
    pub status: Status,
    pub total_cycles: u64,
}

impl CPU {
    pub fn new() -> CPU {
        CPU {
            pc: 0,
            sp: STACK_RESET,
            accum: 0,
            rx: 0,
            ry: 0,
            status: Status::RESET,
            total_cycles: 0,
        }
    }

    /// Jumps through the reset vector with registers at their power-up
    /// values. Any interrupt or DMA stall still pending on the bus is dropped.
    pub fn reset<B: CpuBus>(&mut self, bus: &mut B) {
        self.accum = 0;
        self.rx = 0;
        self.ry = 0;
        self.sp = STACK_RESET;
        self.status = Status::RESET;
        self.total_cycles = 0;
        self.pc = self.read_word(bus, POWER_RESET_IH);
        bus.poll_nmi();
        bus.take_dma_stall();
    }

    /// Runs one instruction, services one interrupt, or sits out one DMA
    /// stall. Returns the cycles that took.
    pub fn step<B: CpuBus>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let stall = bus.take_dma_stall();
        if stall > 0 {
            self.total_cycles += stall as u64;
            return Ok(stall);
        }

        if bus.poll_nmi() {
            return Ok(self.interrupt(bus, NON_MASKABLE_IH));
        }
        if bus.irq_pending() && !self.status.contains(Status::INTERRUPT_DISABLE) {
            return Ok(self.interrupt(bus, BRK_IH));
        }

        let code = bus.read(self.pc);
        let opcode = match decode(code) {
            Some(opcode) => opcode,
            None => {
                let err = CpuError::UnsupportedOpcode {
                    opcode: code,
                    pc: self.pc,
                };
                error!("{}", err);
                return Err(err);
            }
        };

        let (operand, crossed) = self.resolve(bus, opcode.mode);
        self.pc = self.pc.wrapping_add(opcode.len());

        let mut cycles = opcode.cycles as u32;
        if opcode.page_penalty && crossed {
            cycles += 1
        }
        cycles += self.execute(bus, opcode, operand);

        self.total_cycles += cycles as u64;
        Ok(cycles)
    }

    fn interrupt<B: CpuBus>(&mut self, bus: &mut B, vector: u16) -> u32 {
        self.push_word(bus, self.pc);
        self.push(bus, self.status.pushed(false));
        self.status.insert(Status::INTERRUPT_DISABLE);
        self.pc = self.read_word(bus, vector);
        self.total_cycles += INTERRUPT_CYCLES as u64;
        INTERRUPT_CYCLES
    }

    /// Register state ahead of the next instruction, as a trace line sees it.
    pub fn snapshot<B: CpuBus>(&self, bus: &B) -> CpuState {
        let mut state = CpuState {
            addr: self.pc,
            opcode: bus.peek(self.pc),
            a: self.accum,
            x: self.rx,
            y: self.ry,
            p: 0,
            sp: self.sp,
            cycles: self.total_cycles,
        };
        state.set_status(self.status.bits());
        state
    }

    // Addressing. Operand bytes sit right after the opcode at `pc`.
    // Returns the operand location and whether indexing crossed a page.
    fn resolve<B: CpuBus>(&self, bus: &mut B, mode: AddressingMode) -> (Operand, bool) {
        let arg = self.pc.wrapping_add(1);
        match mode {
            AddressingMode::Implied => (Operand::Implied, false),
            AddressingMode::Accumulator => (Operand::Accumulator, false),
            AddressingMode::Immediate => (Operand::Memory(arg), false),
            AddressingMode::ZeroPage => (Operand::Memory(bus.read(arg) as u16), false),
            AddressingMode::ZeroPageX => {
                let addr = bus.read(arg).wrapping_add(self.rx);
                (Operand::Memory(addr as u16), false)
            }
            AddressingMode::ZeroPageY => {
                let addr = bus.read(arg).wrapping_add(self.ry);
                (Operand::Memory(addr as u16), false)
            }
            AddressingMode::Absolute => (Operand::Memory(self.read_word(bus, arg)), false),
            AddressingMode::AbsoluteX => {
                let base = self.read_word(bus, arg);
                let addr = base.wrapping_add(self.rx as u16);
                (Operand::Memory(addr), page_crossed(base, addr))
            }
            AddressingMode::AbsoluteY => {
                let base = self.read_word(bus, arg);
                let addr = base.wrapping_add(self.ry as u16);
                (Operand::Memory(addr), page_crossed(base, addr))
            }
            AddressingMode::Indirect => {
                let ptr = self.read_word(bus, arg);
                // the high byte is fetched without carrying into the page
                let lo = bus.read(ptr);
                let hi = bus.read((ptr & 0xff00) | (ptr.wrapping_add(1) & 0x00ff));
                (Operand::Memory(join_hi_low(lo, hi)), false)
            }
            AddressingMode::IndirectX => {
                let zp = bus.read(arg).wrapping_add(self.rx);
                (Operand::Memory(self.read_zero_page_word(bus, zp)), false)
            }
            AddressingMode::IndirectY => {
                let zp = bus.read(arg);
                let base = self.read_zero_page_word(bus, zp);
                let addr = base.wrapping_add(self.ry as u16);
                (Operand::Memory(addr), page_crossed(base, addr))
            }
            AddressingMode::Relative => {
                let offset = bus.read(arg) as i8;
                let next = self.pc.wrapping_add(2);
                (Operand::Memory(next.wrapping_add(offset as u16)), false)
            }
        }
    }

    /// Executes a decoded instruction with `pc` already past it. Returns
    /// cycles on top of the table's base count (taken branches only).
    fn execute<B: CpuBus>(&mut self, bus: &mut B, opcode: &Opcode, operand: Operand) -> u32 {
        match opcode.mnemonic {
            Mnemonic::LDA => {
                self.accum = self.load(bus, operand);
                self.status.update_zero_and_negative(self.accum)
            }
            Mnemonic::LDX => {
                self.rx = self.load(bus, operand);
                self.status.update_zero_and_negative(self.rx)
            }
            Mnemonic::LDY => {
                self.ry = self.load(bus, operand);
                self.status.update_zero_and_negative(self.ry)
            }
            Mnemonic::STA => self.store(bus, operand, self.accum),
            Mnemonic::STX => self.store(bus, operand, self.rx),
            Mnemonic::STY => self.store(bus, operand, self.ry),

            Mnemonic::ADC => {
                let v = self.load(bus, operand);
                self.adc(v)
            }
            // A - M - !C is A + !M + C
            Mnemonic::SBC => {
                let v = self.load(bus, operand);
                self.adc(!v)
            }
            Mnemonic::AND => {
                let v = self.load(bus, operand);
                self.accum &= v;
                self.status.update_zero_and_negative(self.accum)
            }
            Mnemonic::ORA => {
                let v = self.load(bus, operand);
                self.accum |= v;
                self.status.update_zero_and_negative(self.accum)
            }
            Mnemonic::EOR => {
                let v = self.load(bus, operand);
                self.accum ^= v;
                self.status.update_zero_and_negative(self.accum)
            }
            Mnemonic::BIT => {
                let v = self.load(bus, operand);
                self.status.set(Status::ZERO, self.accum & v == 0);
                self.status.set(Status::OVERFLOW, v & 0x40 != 0);
                self.status.set(Status::NEGATIVE, v & 0x80 != 0);
            }
            Mnemonic::CMP => {
                let v = self.load(bus, operand);
                self.compare(self.accum, v)
            }
            Mnemonic::CPX => {
                let v = self.load(bus, operand);
                self.compare(self.rx, v)
            }
            Mnemonic::CPY => {
                let v = self.load(bus, operand);
                self.compare(self.ry, v)
            }

            Mnemonic::ASL => self.modify(bus, operand, |cpu, v| {
                cpu.status.set(Status::CARRY, v & 0x80 != 0);
                v << 1
            }),
            Mnemonic::LSR => self.modify(bus, operand, |cpu, v| {
                cpu.status.set(Status::CARRY, v & 0x01 != 0);
                v >> 1
            }),
            Mnemonic::ROL => self.modify(bus, operand, |cpu, v| {
                let carry_in = cpu.status.contains(Status::CARRY) as u8;
                cpu.status.set(Status::CARRY, v & 0x80 != 0);
                v << 1 | carry_in
            }),
            Mnemonic::ROR => self.modify(bus, operand, |cpu, v| {
                let carry_in = (cpu.status.contains(Status::CARRY) as u8) << 7;
                cpu.status.set(Status::CARRY, v & 0x01 != 0);
                v >> 1 | carry_in
            }),
            Mnemonic::INC => self.modify(bus, operand, |_, v| v.wrapping_add(1)),
            Mnemonic::DEC => self.modify(bus, operand, |_, v| v.wrapping_sub(1)),
            Mnemonic::INX => {
                self.rx = self.rx.wrapping_add(1);
                self.status.update_zero_and_negative(self.rx)
            }
            Mnemonic::INY => {
                self.ry = self.ry.wrapping_add(1);
                self.status.update_zero_and_negative(self.ry)
            }
            Mnemonic::DEX => {
                self.rx = self.rx.wrapping_sub(1);
                self.status.update_zero_and_negative(self.rx)
            }
            Mnemonic::DEY => {
                self.ry = self.ry.wrapping_sub(1);
                self.status.update_zero_and_negative(self.ry)
            }

            Mnemonic::BCC => return self.branch(operand, !self.status.contains(Status::CARRY)),
            Mnemonic::BCS => return self.branch(operand, self.status.contains(Status::CARRY)),
            Mnemonic::BNE => return self.branch(operand, !self.status.contains(Status::ZERO)),
            Mnemonic::BEQ => return self.branch(operand, self.status.contains(Status::ZERO)),
            Mnemonic::BPL => return self.branch(operand, !self.status.contains(Status::NEGATIVE)),
            Mnemonic::BMI => return self.branch(operand, self.status.contains(Status::NEGATIVE)),
            Mnemonic::BVC => return self.branch(operand, !self.status.contains(Status::OVERFLOW)),
            Mnemonic::BVS => return self.branch(operand, self.status.contains(Status::OVERFLOW)),

            Mnemonic::JMP => self.pc = self.address(operand),
            Mnemonic::JSR => {
                // pushes the address of the last operand byte
                self.push_word(bus, self.pc.wrapping_sub(1));
                self.pc = self.address(operand)
            }
            Mnemonic::RTS => self.pc = self.pop_word(bus).wrapping_add(1),
            Mnemonic::BRK => {
                // the byte after BRK is skipped
                self.push_word(bus, self.pc.wrapping_add(1));
                self.push(bus, self.status.pushed(true));
                self.status.insert(Status::INTERRUPT_DISABLE);
                self.pc = self.read_word(bus, BRK_IH)
            }
            Mnemonic::RTI => {
                self.status = Status::pulled(self.pop(bus));
                self.pc = self.pop_word(bus)
            }

            Mnemonic::PHA => self.push(bus, self.accum),
            Mnemonic::PHP => self.push(bus, self.status.pushed(true)),
            Mnemonic::PLA => {
                self.accum = self.pop(bus);
                self.status.update_zero_and_negative(self.accum)
            }
            Mnemonic::PLP => self.status = Status::pulled(self.pop(bus)),

            Mnemonic::TAX => {
                self.rx = self.accum;
                self.status.update_zero_and_negative(self.rx)
            }
            Mnemonic::TAY => {
                self.ry = self.accum;
                self.status.update_zero_and_negative(self.ry)
            }
            Mnemonic::TXA => {
                self.accum = self.rx;
                self.status.update_zero_and_negative(self.accum)
            }
            Mnemonic::TYA => {
                self.accum = self.ry;
                self.status.update_zero_and_negative(self.accum)
            }
            Mnemonic::TSX => {
                self.rx = self.sp;
                self.status.update_zero_and_negative(self.rx)
            }
            Mnemonic::TXS => self.sp = self.rx,

            Mnemonic::CLC => self.status.remove(Status::CARRY),
            Mnemonic::CLD => self.status.remove(Status::DECIMAL_MODE),
            Mnemonic::CLI => self.status.remove(Status::INTERRUPT_DISABLE),
            Mnemonic::CLV => self.status.remove(Status::OVERFLOW),
            Mnemonic::SEC => self.status.insert(Status::CARRY),
            Mnemonic::SED => self.status.insert(Status::DECIMAL_MODE),
            Mnemonic::SEI => self.status.insert(Status::INTERRUPT_DISABLE),

            Mnemonic::NOP => {}
        }
        0
    }

    fn address(&self, operand: Operand) -> u16 {
        match operand {
            Operand::Memory(addr) => addr,
            _ => self.pc,
        }
    }

    fn load<B: CpuBus>(&self, bus: &mut B, operand: Operand) -> u8 {
        match operand {
            Operand::Memory(addr) => bus.read(addr),
            Operand::Accumulator => self.accum,
            Operand::Implied => 0,
        }
    }

    fn store<B: CpuBus>(&self, bus: &mut B, operand: Operand, value: u8) {
        if let Operand::Memory(addr) = operand {
            bus.write(addr, value)
        }
    }

    // read-modify-write on memory or the accumulator; sets N and Z from the result
    fn modify<B, F>(&mut self, bus: &mut B, operand: Operand, f: F)
    where
        B: CpuBus,
        F: FnOnce(&mut CPU, u8) -> u8,
    {
        let value = self.load(bus, operand);
        let result = f(self, value);
        match operand {
            Operand::Accumulator => self.accum = result,
            _ => self.store(bus, operand, result),
        }
        self.status.update_zero_and_negative(result)
    }

    fn adc(&mut self, v: u8) {
        let sum = self.accum as u16 + v as u16 + self.status.contains(Status::CARRY) as u16;
        let result = sum as u8;
        self.status.set(Status::CARRY, sum > 0xff);
        // operands agree in sign and the result does not
        self.status.set(Status::OVERFLOW, (self.accum ^ result) & (v ^ result) & 0x80 != 0);
        self.accum = result;
        self.status.update_zero_and_negative(result)
    }

    fn compare(&mut self, reg: u8, v: u8) {
        self.status.set(Status::CARRY, reg >= v);
        self.status.update_zero_and_negative(reg.wrapping_sub(v))
    }

    // +1 when taken, +1 more when the target is on another page
    fn branch(&mut self, operand: Operand, condition: bool) -> u32 {
        if !condition {
            return 0;
        }
        let target = self.address(operand);
        let extra = if page_crossed(self.pc, target) { 2 } else { 1 };
        self.pc = target;
        extra
    }

    // Stack lives in page one, SP wraps within it
    fn push<B: CpuBus>(&mut self, bus: &mut B, value: u8) {
        bus.write(STACK_BASE | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1)
    }

    fn pop<B: CpuBus>(&mut self, bus: &mut B) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(STACK_BASE | self.sp as u16)
    }

    fn push_word<B: CpuBus>(&mut self, bus: &mut B, value: u16) {
        let (lo, hi) = as_lo_hi(value);
        self.push(bus, hi);
        self.push(bus, lo)
    }

    fn pop_word<B: CpuBus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.pop(bus);
        let hi = self.pop(bus);
        join_hi_low(lo, hi)
    }

    fn read_word<B: CpuBus>(&self, bus: &mut B, addr: u16) -> u16 {
        let lo = bus.read(addr);
        let hi = bus.read(addr.wrapping_add(1));
        join_hi_low(lo, hi)
    }

    // pointer fetch that stays in page zero
    fn read_zero_page_word<B: CpuBus>(&self, bus: &mut B, zp: u8) -> u16 {
        let lo = bus.read(zp as u16);
        let hi = bus.read(zp.wrapping_add(1) as u16);
        join_hi_low(lo, hi)
    }
}

impl Default for CPU {
    fn default() -> Self {
        CPU::new()
    }
}
