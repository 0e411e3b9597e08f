//! Cartridge mappers: decide which physical PRG/CHR byte answers a CPU or PPU
//! address.

mod nrom;

pub use nrom::Nrom;

use tracing::debug;

use crate::cartridge::{Cartridge, LoadError, Mirroring};

pub trait Mapper {
    /// CPU $8000-$FFFF.
    fn read_prg(&self, addr: u16) -> u8;
    /// Bank select registers live here on boards that have them.
    fn write_prg(&mut self, addr: u16, value: u8);
    /// PPU $0000-$1FFF.
    fn read_chr(&self, addr: u16) -> u8;
    fn write_chr(&mut self, addr: u16, value: u8);
    fn mirroring(&self) -> Mirroring;
}

/// The console's cartridge slot.
pub type MapperSlot = Option<Box<dyn Mapper>>;

/// Builds the mapper a cartridge asks for. Consumes the cartridge; its banks
/// belong to the mapper from here on.
pub fn from_cartridge(cart: Cartridge) -> Result<Box<dyn Mapper>, LoadError> {
    match cart.mapper_id {
        0 => {
            debug!(prg = cart.prg_rom.len(), chr_ram = cart.is_chr_ram, "NROM");
            Ok(Box::new(Nrom::new(cart)))
        }
        n => Err(LoadError::UnsupportedMapper(n)),
    }
}
