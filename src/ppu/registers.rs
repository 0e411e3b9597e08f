use bitflags::bitflags;

// Memory-mapped registers read from and written to by CPU
bitflags! {
  // 0x2000 - Write
  pub struct PPUCTRL: u8 {
    const BASE_NAMETABLE_0 = 0b00000001;
    const BASE_NAMETABLE_1 = 0b00000010;
    const VRAM_ADDR_INCR = 0b00000100;
    const SPRITE_PATTERN_TABLE = 0b00001000;
    const BACKGROUND_PATTERN_TABLE = 0b00010000;
    const SPRITE_SIZE = 0b00100000;
    const PPU_MASTER_SLAVE = 0b01000000;
    const GENERATE_NMI = 0b10000000;
  }
}

impl PPUCTRL {
  pub fn update(&mut self, value: u8) {
    *self = PPUCTRL::from_bits_truncate(value)
  }
  pub fn nametable_bits(&self) -> u16 {
    (self.bits() & 0b11) as u16
  }
  pub fn vram_increment(&self) -> u16 {
    if self.contains(PPUCTRL::VRAM_ADDR_INCR) { 32 } else { 1 }
  }
  pub fn background_table(&self) -> u16 {
    if self.contains(PPUCTRL::BACKGROUND_PATTERN_TABLE) { 0x1000 } else { 0 }
  }
  pub fn sprite_table(&self) -> u16 {
    if self.contains(PPUCTRL::SPRITE_PATTERN_TABLE) { 0x1000 } else { 0 }
  }
  pub fn sprite_height(&self) -> u16 {
    if self.contains(PPUCTRL::SPRITE_SIZE) { 16 } else { 8 }
  }
}

bitflags! {
  // 0x2001 - Write
  pub struct PPUMASK: u8 {
    const GRAYSCALE = 0b00000001;
    const SHOW_BACKGROUND_LEFTMOST = 0b00000010;
    const SHOW_SPRITES_LEFTMOST = 0b00000100;
    const SHOW_BACKGROUND = 0b00001000;
    const SHOW_SPRITES = 0b00010000;
    const EMPH_RED = 0b00100000;
    const EMPH_GREEN = 0b01000000;
    const EMPH_BLUE = 0b10000000;
  }
}

impl PPUMASK {
  pub fn update(&mut self, value: u8) {
    *self = PPUMASK::from_bits_truncate(value)
  }
  pub fn rendering_enabled(&self) -> bool {
    self.intersects(PPUMASK::SHOW_BACKGROUND | PPUMASK::SHOW_SPRITES)
  }
}

bitflags! {
  // 0x2002 - Read
  pub struct PPUSTATUS: u8 {
    const SPRITE_OVERFLOW = 0b00100000;
    const SPRITE_0_HIT = 0b01000000;
    const VBLANK_STARTED = 0b10000000;
  }
}

/**
 * The internal v/t registers ("loopy" layout):
 *
 *  yyy NN YYYYY XXXXX
 *  ||| || ||||| +++++-- coarse X scroll
 *  ||| || +++++-------- coarse Y scroll
 *  ||| ++-------------- nametable select
 *  +++----------------- fine Y scroll
 */
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VramAddr(pub u16);

impl VramAddr {
  const COARSE_X: u16 = 0x001f;
  const COARSE_Y: u16 = 0x03e0;
  const NAMETABLE: u16 = 0x0c00;
  const FINE_Y: u16 = 0x7000;
  const HORIZONTAL: u16 = 0x041f;
  const VERTICAL: u16 = 0x7be0;

  pub fn get(&self) -> u16 {
    self.0
  }
  pub fn coarse_x(&self) -> u16 {
    self.0 & Self::COARSE_X
  }
  pub fn coarse_y(&self) -> u16 {
    (self.0 & Self::COARSE_Y) >> 5
  }
  pub fn fine_y(&self) -> u16 {
    (self.0 & Self::FINE_Y) >> 12
  }
  pub fn set_nametable(&mut self, bits: u16) {
    self.0 = (self.0 & !Self::NAMETABLE) | ((bits & 0b11) << 10)
  }
  pub fn set_coarse_x(&mut self, value: u8) {
    self.0 = (self.0 & !Self::COARSE_X) | (value as u16 & 0x1f)
  }
  pub fn set_coarse_y(&mut self, value: u8) {
    self.0 = (self.0 & !Self::COARSE_Y) | ((value as u16 & 0x1f) << 5)
  }
  pub fn set_fine_y(&mut self, value: u8) {
    self.0 = (self.0 & !Self::FINE_Y) | ((value as u16 & 0x07) << 12)
  }
  pub fn set_high(&mut self, data: u8) {
    // bit 14 is cleared by the first PPUADDR write
    self.0 = (self.0 & 0x00ff) | ((data as u16 & 0x3f) << 8)
  }
  pub fn set_low(&mut self, data: u8) {
    self.0 = (self.0 & 0xff00) | data as u16
  }
  pub fn increment_by(&mut self, step: u16) {
    self.0 = self.0.wrapping_add(step) & 0x7fff
  }
  /// Wraps into the horizontally adjacent nametable after coarse X 31.
  pub fn increment_x(&mut self) {
    if self.coarse_x() == 31 {
      self.0 &= !Self::COARSE_X;
      self.0 ^= 0x0400;
    } else {
      self.0 += 1;
    }
  }
  /// Row 29 is the last tile row; 30 and 31 are attribute memory and wrap
  /// without switching nametables.
  pub fn increment_y(&mut self) {
    if self.0 & Self::FINE_Y != Self::FINE_Y {
      self.0 += 0x1000;
      return;
    }
    self.0 &= !Self::FINE_Y;
    let y = match self.coarse_y() {
      29 => {
        self.0 ^= 0x0800;
        0
      }
      31 => 0,
      y => y + 1,
    };
    self.0 = (self.0 & !Self::COARSE_Y) | (y << 5);
  }
  pub fn copy_horizontal(&mut self, t: VramAddr) {
    self.0 = (self.0 & !Self::HORIZONTAL) | (t.0 & Self::HORIZONTAL)
  }
  pub fn copy_vertical(&mut self, t: VramAddr) {
    self.0 = (self.0 & !Self::VERTICAL) | (t.0 & Self::VERTICAL)
  }
}
