use crate::{cartridge::Mirroring, mapper::MapperSlot};

pub const BACKGROUND_COLOR: u16 = 0x3f00;

/// PPU address space: pattern tables live on the cartridge, nametables and
/// palettes live here.
pub struct PPUBus {
    name_tables: [u8; 0x800],
    palette_table: [u8; 32], /* stores an index into SYSTEM_PALETTE */
}

impl PPUBus {
    pub fn new() -> PPUBus {
        PPUBus {
            name_tables: [0; 0x800],
            palette_table: [0; 32],
        }
    }

    // $3F10/$3F14/$3F18/$3F1C are the backdrop entries of $3F00/$3F04/$3F08/$3F0C
    fn mirror_palette_addr(addr: u16) -> usize {
        let addr = (addr & 0x1f) as usize;
        match addr {
            0x10 | 0x14 | 0x18 | 0x1c => addr - 0x10,
            _ => addr,
        }
    }
    /*
     Mirroring schemes:
     Addresses
     [0x2000] [0x2400]
     [0x2800] [0x2c00]

     Reality
     [A] [B]

     Horizontal
     [A] [a]
     [B] [b]

     Vertical
     [A] [B]
     [a] [b]
    */
    fn mirror_nametable_addr(addr: u16, mirroring: Mirroring) -> usize {
        let base = addr & 0x0fff;
        let (table, idx) = (base / 0x400, (base % 0x400) as usize);
        match (table, mirroring) {
            (0 | 1, Mirroring::Horizontal) => idx,
            (_, Mirroring::Horizontal) => 0x400 + idx,
            // no extra VRAM on the board, four-screen is treated as vertical
            (0 | 2, Mirroring::Vertical | Mirroring::FourScreen) => idx,
            (_, Mirroring::Vertical | Mirroring::FourScreen) => 0x400 + idx,
        }
    }

    fn mirroring(slot: &MapperSlot) -> Mirroring {
        slot.as_ref()
            .map_or(Mirroring::Horizontal, |mapper| mapper.mirroring())
    }

    pub fn read_memory(&self, slot: &MapperSlot, addr: u16) -> u8 {
        let addr = addr & 0x3fff;
        match addr {
            0x0000..=0x1fff => slot.as_ref().map_or(0, |mapper| mapper.read_chr(addr)),
            0x2000..=0x3eff => {
                self.name_tables[PPUBus::mirror_nametable_addr(addr, PPUBus::mirroring(slot))]
            }
            _ => self.palette_table[PPUBus::mirror_palette_addr(addr)],
        }
    }

    pub fn write_memory(&mut self, slot: &mut MapperSlot, addr: u16, value: u8) {
        let addr = addr & 0x3fff;
        match addr {
            0x0000..=0x1fff => {
                if let Some(mapper) = slot.as_mut() {
                    mapper.write_chr(addr, value)
                }
            }
            0x2000..=0x3eff => {
                let idx = PPUBus::mirror_nametable_addr(addr, PPUBus::mirroring(slot));
                self.name_tables[idx] = value
            }
            _ => self.palette_table[PPUBus::mirror_palette_addr(addr)] = value,
        }
    }

    /// Palette RAM entry `idx` (0..32), mirrors applied.
    pub fn palette(&self, idx: u8) -> u8 {
        self.palette_table[PPUBus::mirror_palette_addr(idx as u16)] & 0x3f
    }
}

impl Default for PPUBus {
    fn default() -> Self {
        PPUBus::new()
    }
}

#[cfg(test)]
mod ppubus_test {
    use crate::{cartridge::Mirroring, mapper::MapperSlot};

    use super::PPUBus;

    #[test]
    fn test_mirror_nametable_addr() {
        let vertical0 = PPUBus::mirror_nametable_addr(0x2005, Mirroring::Vertical);
        assert_eq!(vertical0, 0x05, "actual: {:#x}", vertical0);

        let vertical1 = PPUBus::mirror_nametable_addr(0x2405, Mirroring::Vertical);
        assert_eq!(vertical1, 0x405, "actual: {:#x}", vertical1);

        let vertical2 = PPUBus::mirror_nametable_addr(0x2805, Mirroring::Vertical);
        assert_eq!(vertical2, 0x05, "actual: {:#x}", vertical2);

        let vertical3 = PPUBus::mirror_nametable_addr(0x2c05, Mirroring::Vertical);
        assert_eq!(vertical3, 0x405, "actual: {:#x}", vertical3);

        let horizontal1 = PPUBus::mirror_nametable_addr(0x2405, Mirroring::Horizontal);
        assert_eq!(horizontal1, 0x05, "actual: {:#x}", horizontal1);

        let horizontal2 = PPUBus::mirror_nametable_addr(0x2805, Mirroring::Horizontal);
        assert_eq!(horizontal2, 0x405, "actual: {:#x}", horizontal2);

        // $3000-$3EFF mirrors $2000-$2EFF
        let upper = PPUBus::mirror_nametable_addr(0x3805, Mirroring::Horizontal);
        assert_eq!(upper, 0x405, "actual: {:#x}", upper);
    }

    #[test]
    fn test_palette_mirrors_on_read_and_write() {
        let mut bus = PPUBus::new();
        let mut slot: MapperSlot = None;

        bus.write_memory(&mut slot, 0x3f10, 0x21);
        assert_eq!(bus.read_memory(&slot, 0x3f00), 0x21);

        bus.write_memory(&mut slot, 0x3f08, 0x12);
        assert_eq!(bus.read_memory(&slot, 0x3f18), 0x12);

        // only the backdrop slots alias; $3F11 is its own entry
        bus.write_memory(&mut slot, 0x3f11, 0x05);
        assert_eq!(bus.read_memory(&slot, 0x3f01), 0x00);
        // $3F20-$3FFF repeat the 32 entries
        assert_eq!(bus.read_memory(&slot, 0x3f31), 0x05);
    }
}
