use crate::cartridge::{Cartridge, Mirroring, PRG_BANK_SIZE};

use super::Mapper;

/// Mapper 0. 16KB boards mirror $8000-$BFFF into $C000-$FFFF.
pub struct Nrom {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    is_chr_ram: bool,
    mirroring: Mirroring,
}

impl Nrom {
    pub fn new(cart: Cartridge) -> Nrom {
        Nrom {
            prg_rom: cart.prg_rom,
            chr: cart.chr,
            is_chr_ram: cart.is_chr_ram,
            mirroring: cart.mirroring,
        }
    }
}

impl Mapper for Nrom {
    fn read_prg(&self, addr: u16) -> u8 {
        if self.prg_rom.is_empty() {
            return 0;
        }
        let offset = addr.wrapping_sub(0x8000) as usize;
        let offset = if self.prg_rom.len() <= PRG_BANK_SIZE {
            offset & 0x3fff
        } else {
            offset
        };
        self.prg_rom[offset % self.prg_rom.len()]
    }

    fn write_prg(&mut self, _addr: u16, _value: u8) {}

    fn read_chr(&self, addr: u16) -> u8 {
        self.chr[(addr & 0x1fff) as usize]
    }

    fn write_chr(&mut self, addr: u16, value: u8) {
        if self.is_chr_ram {
            self.chr[(addr & 0x1fff) as usize] = value
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
