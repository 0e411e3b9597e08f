//! nesbox: an NES emulator core.
//!
//! - **cartridge** – iNES loading
//! - **mapper** – cartridge boards (NROM)
//! - **bus** – CPU memory map: RAM, PPU registers, OAM DMA, cartridge; 3 PPU dots per CPU cycle
//! - **cpu** – 2A03 core, the 151 documented opcodes, NMI/IRQ entry
//! - **ppu** – registers, loopy scrolling, background and sprite rendering into a 256×240 RGB frame
//! - **emulator** – the console as one value, driven by the host one step or one frame at a time

pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod debug;
pub mod emulator;
pub mod mapper;
pub mod ppu;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

pub use cartridge::{Cartridge, LoadError, Mirroring};
pub use cpu::CpuError;
pub use emulator::Emulator;
