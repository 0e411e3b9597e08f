//! 2A03 CPU core: a 6502 without decimal mode, stepped one instruction at a
//! time.

mod cpu;
pub mod opcodes;
mod status;


use std::{error::Error, fmt};

pub use cpu::CPU;
pub use status::Status;

/// What the CPU sees of the machine. Everything it touches goes through here,
/// so the core runs against a plain RAM array in tests as well as the
/// console bus.
pub trait CpuBus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, value: u8);
    /// Read without side effects, for tracing.
    fn peek(&self, addr: u16) -> u8;

    /// Consumes a pending NMI edge.
    fn poll_nmi(&mut self) -> bool {
        false
    }
    /// Level-triggered IRQ line.
    fn irq_pending(&self) -> bool {
        false
    }
    /// Cycles the CPU must sit out for a DMA started by the last write.
    fn take_dma_stall(&mut self) -> u32 {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpuError {
    /// Not one of the 151 documented opcodes. `pc` points at the opcode byte.
    UnsupportedOpcode { opcode: u8, pc: u16 },
}

impl fmt::Display for CpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuError::UnsupportedOpcode { opcode, pc } => {
                write!(f, "unsupported opcode {:#04x} at {:#06x}", opcode, pc)
            }
        }
    }
}

impl Error for CpuError {}
