use crate::cpu::{opcodes::decode, CpuBus, CPU};

#[derive(Default, Debug, PartialEq)]
pub struct CpuState {
    pub addr: u16,
    pub opcode: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub sp: u8,
    pub cycles: u64,
}

impl CpuState {
    pub fn render(&self) -> String {
        format!(
            "Address={:#06x}\tOpcode={:#04x}\tA:{:#04x}\tX:{:#04x}\tY:{:#04x}\tP:{:#04x}\tSP:{:#04x}\tCycles:{}",
            self.addr, self.opcode, self.a, self.x, self.y, self.p, self.sp, self.cycles
        )
    }

    // stored the way nestest-style logs print P
    pub fn set_status(&mut self, data: u8) {
        // bit 5 always reads as 1
        let p = data | (1 << 5);
        // B only exists in pushed copies
        self.p = p & !(1 << 4)
    }
}

/// One nestest-style line for the instruction at the CPU's PC, e.g.
/// `C000  4C F5 C5  JMP  A:00 X:00 Y:00 P:24 SP:FD CYC:7`.
pub fn trace<B: CpuBus>(cpu: &CPU, bus: &B) -> String {
    let state = cpu.snapshot(bus);
    let (len, mnemonic) = match decode(state.opcode) {
        Some(opcode) => (opcode.len(), format!("{:?}", opcode.mnemonic)),
        None => (1, "???".to_string()),
    };
    let bytes = (0..len)
        .map(|i| format!("{:02X}", bus.peek(state.addr.wrapping_add(i))))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "{:04X}  {:<8}  {:<4} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
        state.addr, bytes, mnemonic, state.a, state.x, state.y, state.p, state.sp, state.cycles
    )
}

#[cfg(test)]
mod debug_test {
    use super::*;

    struct Rom([u8; 4]);

    impl CpuBus for Rom {
        fn read(&mut self, addr: u16) -> u8 {
            self.peek(addr)
        }
        fn write(&mut self, _addr: u16, _value: u8) {}
        fn peek(&self, addr: u16) -> u8 {
            self.0[(addr & 0x03) as usize]
        }
    }

    #[test]
    fn test_trace_line_format() {
        let bus = Rom([0x4c, 0xf5, 0xc5, 0x00]);
        let mut cpu = CPU::new();
        cpu.pc = 0xc000;
        cpu.total_cycles = 7;
        assert_eq!(
            trace(&cpu, &bus),
            "C000  4C F5 C5  JMP  A:00 X:00 Y:00 P:24 SP:FD CYC:7"
        );
    }

    #[test]
    fn test_status_drops_break_bit() {
        let mut state = CpuState::default();
        state.set_status(0x10);
        assert_eq!(state.p, 0x20);
    }
}
